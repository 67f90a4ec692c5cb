//! Paced command sequences.
//!
//! Drives a list of commands through one session, leaving the mount a fixed
//! settle time between commands.

use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;
use crate::protocol::{Command, Reply};
use crate::transport::ByteSource;

use super::Session;

/// Default delay between two commands of a sequence.
pub const DEFAULT_PACING: Duration = Duration::from_secs(2);

/// What a completed sequence produced.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    /// Each command with the reply it got, in send order.
    pub exchanges: Vec<(Command, Reply)>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn replies(&self) -> impl Iterator<Item = &Reply> {
        self.exchanges.iter().map(|(_, reply)| reply)
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

/// Orchestrator for command sequences
#[derive(Debug, Clone)]
pub struct SessionRunner {
    pub pacing: Duration,
}

impl Default for SessionRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PACING)
    }
}

impl SessionRunner {
    pub fn new(pacing: Duration) -> Self {
        Self { pacing }
    }

    /// Send `commands` in order, pausing `pacing` between them.
    ///
    /// Stops at the first failure. Commands already sent stay applied.
    pub async fn run<S: ByteSource>(
        &self,
        session: &mut Session<S>,
        commands: &[Command],
    ) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();

        for (i, command) in commands.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing).await;
            }

            let reply = match session.send(command).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(
                        command = %command,
                        sent = i,
                        remaining = commands.len() - i,
                        "Sequence aborted: {e}"
                    );
                    return Err(e);
                }
            };
            tracing::debug!(step = i + 1, total = commands.len(), reply = %reply.text);
            report.exchanges.push((*command, reply));
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }
}

/// Run `commands` with the default pacing.
pub async fn run_sequence<S: ByteSource>(
    session: &mut Session<S>,
    commands: &[Command],
) -> Result<RunReport> {
    SessionRunner::default().run(session, commands).await
}
