//! Simulated switch example: run a wait-for task and diff a candidate config
//!
//! This example drives an in-memory AOS switch whose interface comes up on
//! the third poll, so the wait-for loop has something to wait for. It then
//! diffs a candidate configuration against the switch's running config.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example simulated_switch
//! cargo run --example simulated_switch -- --match any --retries 5
//! cargo run --example simulated_switch -- --diff-match strict --diff-replace block
//! ```

use std::collections::HashMap;
use std::env;

use aos_cliconf::driver::{ConfigFormat, ConfigSource};
use aos_cliconf::error::TransportError;
use aos_cliconf::{AosDriverBuilder, Command, CommandTask, DiffOptions, Transport};

const RUNNING_CONFIG: &str = "\
! VLAN:
vlan 1 admin-state enable
vlan 10 admin-state enable
vlan 10 name \"mgmt\"
! IP:
ip interface \"mgmt\" address 10.0.0.1 mask 255.255.255.0 vlan 10
";

const CANDIDATE_CONFIG: &str = "\
vlan 10 admin-state enable
vlan 10 name \"mgmt\"
vlan 20 admin-state enable
vlan 20 name \"voice\"
ip interface \"mgmt\" address 10.0.0.1 mask 255.255.255.0 vlan 10
";

/// A switch that answers from canned output.
struct SimulatedSwitch {
    polls: usize,
    outputs: HashMap<&'static str, &'static str>,
}

impl SimulatedSwitch {
    fn new() -> Self {
        let outputs = HashMap::from([
            (
                "show microcode",
                "/flash/working\n  Package  Release  Size  Description\nUos.img  8.9.221.R03  248054207  Alcatel-Lucent OS",
            ),
            (
                "show system",
                "System:\n  Description:  Alcatel-Lucent Enterprise OS6860E-P24 8.9.221.R03 GA,\n  Name:         lab-sw-01,",
            ),
            ("show configuration snapshot", RUNNING_CONFIG),
        ]);
        Self { polls: 0, outputs }
    }
}

impl Transport for SimulatedSwitch {
    async fn send(&mut self, command: &Command) -> aos_cliconf::Result<String> {
        if command.command == "show interfaces 1/1/1 status" {
            self.polls += 1;
            let state = if self.polls >= 3 { "up" } else { "down" };
            return Ok(format!(" 1/1/1   enable   {state}   1000   Full"));
        }

        self.outputs
            .get(command.command.as_str())
            .map(|out| out.to_string())
            .ok_or_else(|| {
                TransportError::CommandRejected {
                    command: command.command.clone(),
                    message: format!("ERROR: Invalid entry: \"{}\"", command.command),
                }
                .into()
            })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut driver = AosDriverBuilder::new(SimulatedSwitch::new())
        .config_command("write memory")
        .build();

    let info = driver.get_device_info().await?;
    println!(
        "Connected to {} ({}, AOS {})",
        info.hostname.as_deref().unwrap_or("?"),
        info.model.as_deref().unwrap_or("?"),
        info.version.as_deref().unwrap_or("?"),
    );

    // Wait for the uplink to come up
    let params = format!(
        r#"{{
            "commands": ["show microcode", "show interfaces 1/1/1 status"],
            "wait_for": ["result[0] contains Alcatel-Lucent", "result[1] contains up"],
            "match": "{}",
            "retries": {},
            "interval": {}
        }}"#,
        args.match_policy, args.retries, args.interval
    );
    let task = CommandTask::from_json(&params)?;

    println!("\nWaiting for 1/1/1 to come up...");
    println!("{}", "-".repeat(50));
    match task.run(&mut driver).await {
        Ok(result) => {
            for lines in &result.stdout_lines {
                println!("{lines}");
            }
        }
        Err(aos_cliconf::Error::UnsatisfiedConditions { failed_conditions }) => {
            eprintln!("Gave up, still waiting on: {failed_conditions:?}");
        }
        Err(e) => return Err(e.into()),
    }
    println!("{}", "-".repeat(50));

    // Diff a candidate against the running config
    let running = driver
        .get_config(ConfigSource::Running, ConfigFormat::Text, &[])
        .await?;
    let options = DiffOptions::parse(&args.diff_match, &args.diff_replace)?;
    let outcome = driver.get_diff(Some(CANDIDATE_CONFIG), Some(&running), &options)?;

    println!(
        "\nCommands to apply (match={}, replace={}):",
        args.diff_match, args.diff_replace
    );
    println!("{}", outcome.config_diff);

    let caps = driver.get_capabilities().await?;
    println!("\nCapabilities: {}", caps.to_json()?);

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    match_policy: String,
    retries: u32,
    interval: f64,
    diff_match: String,
    diff_replace: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut match_policy = "all".to_string();
        let mut retries = 9u32;
        let mut interval = 0.2f64;
        let mut diff_match = "line".to_string();
        let mut diff_replace = "line".to_string();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--match" => {
                    i += 1;
                    if i < args.len() {
                        match_policy = args[i].clone();
                    }
                }
                "--retries" => {
                    i += 1;
                    if i < args.len() {
                        retries = args[i].parse().unwrap_or(9);
                    }
                }
                "--interval" => {
                    i += 1;
                    if i < args.len() {
                        interval = args[i].parse().unwrap_or(0.2);
                    }
                }
                "--diff-match" => {
                    i += 1;
                    if i < args.len() {
                        diff_match = args[i].clone();
                    }
                }
                "--diff-replace" => {
                    i += 1;
                    if i < args.len() {
                        diff_replace = args[i].clone();
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            match_policy,
            retries,
            interval,
            diff_match,
            diff_replace,
        }
    }

    fn print_help() {
        println!(
            r#"aos-cliconf simulated_switch example

USAGE:
    cargo run --example simulated_switch -- [OPTIONS]

OPTIONS:
    --match <all|any>                    Wait-for match policy [default: all]
    --retries <N>                        Retries after the first attempt [default: 9]
    --interval <SECS>                    Seconds between attempts [default: 0.2]
    --diff-match <line|strict|exact|none>  Diff match policy [default: line]
    --diff-replace <line|block|config>   Diff output granularity [default: line]
    --help                               Print this help message
"#
        );
    }
}
