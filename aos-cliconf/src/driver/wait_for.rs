//! Re-run a command batch until conditionals on its output hold.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use super::Driver;
use super::command::Command;
use super::response::Response;
use crate::conditional::Conditional;
use crate::error::{Error, Result};

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 9;

/// Default pause between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// How many conditionals must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Every conditional must have held on some attempt.
    #[default]
    All,
    /// One conditional holding is enough.
    Any,
}

impl MatchPolicy {
    pub const VALUES: &'static [&'static str] = &["all", "any"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::All => "all",
            MatchPolicy::Any => "any",
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(MatchPolicy::All),
            "any" => Ok(MatchPolicy::Any),
            _ => Err(Error::invalid_option("match", s, Self::VALUES)),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry policy for a command batch.
///
/// Each attempt sends the whole batch again, state-changing commands
/// included. Under [`MatchPolicy::All`] a conditional that held once stays
/// satisfied even if a later attempt would make it false.
#[derive(Debug, Clone)]
pub struct WaitFor {
    conditionals: Vec<Conditional>,
    match_policy: MatchPolicy,
    retries: u32,
    interval: Duration,
}

impl WaitFor {
    pub fn new(conditionals: Vec<Conditional>) -> Self {
        Self {
            conditionals,
            match_policy: MatchPolicy::All,
            retries: DEFAULT_RETRIES,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Parse every expression, failing on the first syntax error.
    pub fn parse<S: AsRef<str>>(expressions: &[S]) -> Result<Self> {
        let conditionals = expressions
            .iter()
            .map(|e| Conditional::parse(e.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(conditionals))
    }

    pub fn with_match(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn conditionals(&self) -> &[Conditional] {
        &self.conditionals
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.match_policy
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `commands` until the conditionals are satisfied.
    ///
    /// Returns the responses of the last attempt. Transport and evaluation
    /// errors abort immediately. Running out of attempts yields
    /// [`Error::UnsatisfiedConditions`] listing the conditionals that never
    /// held.
    pub async fn run<D: Driver>(
        &self,
        driver: &mut D,
        commands: &[Command],
    ) -> Result<Vec<Response>> {
        let mut pending: Vec<&Conditional> = self.conditionals.iter().collect();
        let attempts = u64::from(self.retries) + 1;

        for attempt in 1..=attempts {
            let responses = driver.send_commands(commands).await?;

            match self.match_policy {
                MatchPolicy::Any => {
                    for conditional in &pending {
                        if conditional.evaluate(&responses)? {
                            debug!(
                                "Conditional '{}' satisfied on attempt {}",
                                conditional, attempt
                            );
                            return Ok(responses);
                        }
                    }
                }
                MatchPolicy::All => {
                    let mut unmet = Vec::with_capacity(pending.len());
                    for conditional in pending {
                        if conditional.evaluate(&responses)? {
                            debug!(
                                "Conditional '{}' satisfied on attempt {}",
                                conditional, attempt
                            );
                        } else {
                            unmet.push(conditional);
                        }
                    }
                    pending = unmet;
                }
            }

            if pending.is_empty() {
                return Ok(responses);
            }

            if attempt < attempts {
                debug!(
                    "{} conditional(s) pending after attempt {}/{}, retrying in {:?}",
                    pending.len(),
                    attempt,
                    attempts,
                    self.interval
                );
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(Error::UnsatisfiedConditions {
            failed_conditions: pending.iter().map(|c| c.raw().to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::AosDriverBuilder;
    use crate::error::TransportError;
    use crate::transport::mock::MockTransport;

    fn commands(cmds: &[&str]) -> Vec<Command> {
        cmds.iter().map(|c| Command::new(*c)).collect()
    }

    #[tokio::test]
    async fn test_all_satisfied_across_attempts() {
        let transport = MockTransport::new()
            .reply("show chassis", "ready")
            .reply("show chassis", "booting")
            .reply("show interfaces", "1/1/1 down")
            .reply("show interfaces", "1/1/1 up");
        let mut driver = AosDriverBuilder::new(transport).build();

        let wait_for = WaitFor::parse(&["result[0] contains ready", "result[1] contains up"])
            .unwrap()
            .with_retries(2)
            .with_interval(Duration::ZERO);

        let responses = wait_for
            .run(&mut driver, &commands(&["show chassis", "show interfaces"]))
            .await
            .unwrap();

        assert_eq!(responses[1].text(), "1/1/1 up");
        assert_eq!(driver.transport().sent_count("show chassis"), 2);
        assert_eq!(driver.transport().sent_count("show interfaces"), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let mut driver =
            AosDriverBuilder::new(MockTransport::new().reply("show microcode", "8.9.221.R03")).build();

        let wait_for = WaitFor::parse(&["result[0] contains 9.9.9"])
            .unwrap()
            .with_retries(0)
            .with_interval(Duration::ZERO);

        let err = wait_for
            .run(&mut driver, &commands(&["show microcode"]))
            .await
            .unwrap_err();

        match err {
            Error::UnsatisfiedConditions { failed_conditions } => {
                assert_eq!(failed_conditions, ["result[0] contains 9.9.9"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(driver.transport().sent_count("show microcode"), 1);
    }

    #[tokio::test]
    async fn test_attempts_bounded_by_retries() {
        let mut driver =
            AosDriverBuilder::new(MockTransport::new().reply("show vlan", "vlan 10")).build();

        let wait_for = WaitFor::parse(&["result[0] contains vlan 20", "result[0] contains vlan"])
            .unwrap()
            .with_retries(3)
            .with_interval(Duration::ZERO);

        let err = wait_for
            .run(&mut driver, &commands(&["show vlan"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::UnsatisfiedConditions { ref failed_conditions } if failed_conditions == &["result[0] contains vlan 20"]
        ));
        assert_eq!(driver.transport().sent_count("show vlan"), 4);
    }

    #[tokio::test]
    async fn test_any_stops_on_first_true() {
        let transport = MockTransport::new()
            .reply("show vlan", "vlan 10")
            .reply("show vlan", "vlan 10\nvlan 30");
        let mut driver = AosDriverBuilder::new(transport).build();

        let wait_for = WaitFor::parse(&["result[0] contains vlan 20", "result[0] contains vlan 30"])
            .unwrap()
            .with_match(MatchPolicy::Any)
            .with_retries(5)
            .with_interval(Duration::ZERO);

        wait_for
            .run(&mut driver, &commands(&["show vlan"]))
            .await
            .unwrap();
        assert_eq!(driver.transport().sent_count("show vlan"), 2);
    }

    #[tokio::test]
    async fn test_no_conditionals_runs_once() {
        let mut driver =
            AosDriverBuilder::new(MockTransport::new().reply("show vlan", "vlan 10")).build();

        let responses = WaitFor::new(Vec::new())
            .run(&mut driver, &commands(&["show vlan"]))
            .await
            .unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(driver.transport().sent_count("show vlan"), 1);
    }

    #[tokio::test]
    async fn test_transport_error_aborts() {
        let mut driver =
            AosDriverBuilder::new(MockTransport::new().disconnect("show vlan")).build();

        let err = WaitFor::parse(&["result[0] contains vlan"])
            .unwrap()
            .with_interval(Duration::ZERO)
            .run(&mut driver, &commands(&["show vlan"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
        assert_eq!(driver.transport().sent_count("show vlan"), 1);
    }

    #[tokio::test]
    async fn test_evaluation_error_aborts() {
        let mut driver =
            AosDriverBuilder::new(MockTransport::new().reply("show vlan", "vlan 10")).build();

        let err = WaitFor::parse(&["result[3] contains vlan"])
            .unwrap()
            .with_interval(Duration::ZERO)
            .run(&mut driver, &commands(&["show vlan"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conditional(_)));
        assert_eq!(driver.transport().sent_count("show vlan"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_between_attempts() {
        let mut driver =
            AosDriverBuilder::new(MockTransport::new().reply("show vlan", "vlan 10")).build();

        let start = tokio::time::Instant::now();
        let _ = WaitFor::parse(&["result[0] contains vlan 20"])
            .unwrap()
            .with_retries(2)
            .with_interval(Duration::from_secs(5))
            .run(&mut driver, &commands(&["show vlan"]))
            .await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(11));
    }

    #[test]
    fn test_match_policy_parse() {
        assert_eq!("any".parse::<MatchPolicy>().unwrap(), MatchPolicy::Any);
        assert!(matches!(
            "some".parse::<MatchPolicy>(),
            Err(Error::InvalidOption { .. })
        ));
    }
}
