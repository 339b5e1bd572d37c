//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};

use super::Transport;
use crate::driver::Command;
use crate::error::{Result, TransportError};

/// What the mock does when it sees a command.
#[derive(Debug, Clone)]
pub(crate) enum MockReply {
    Output(String),
    Reject(String),
    Disconnect,
}

/// Replies are queued per command; the last reply repeats once the queue
/// is down to one entry. Unknown commands are rejected.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    replies: HashMap<String, VecDeque<MockReply>>,
    sent: Vec<String>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, command: &str, output: &str) -> Self {
        self.push(command, MockReply::Output(output.to_string()));
        self
    }

    pub(crate) fn reject(mut self, command: &str, message: &str) -> Self {
        self.push(command, MockReply::Reject(message.to_string()));
        self
    }

    pub(crate) fn disconnect(mut self, command: &str) -> Self {
        self.push(command, MockReply::Disconnect);
        self
    }

    fn push(&mut self, command: &str, reply: MockReply) {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Every command text sent so far, in order.
    pub(crate) fn sent(&self) -> &[String] {
        &self.sent
    }

    pub(crate) fn sent_count(&self, command: &str) -> usize {
        self.sent.iter().filter(|c| *c == command).count()
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, command: &Command) -> Result<String> {
        let text = command.command.clone();
        self.sent.push(text.clone());

        let reply = match self.replies.get_mut(&text) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(MockReply::Output(output)) => Ok(output),
            Some(MockReply::Reject(message)) => Err(TransportError::CommandRejected {
                command: text,
                message,
            }
            .into()),
            Some(MockReply::Disconnect) => Err(TransportError::Disconnected.into()),
            None => Err(TransportError::CommandRejected {
                message: format!("ERROR: Invalid entry: \"{text}\""),
                command: text,
            }
            .into()),
        }
    }
}
