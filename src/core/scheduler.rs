//! Scheduler
//!
//! Drives one [`ServerUnit`] per server, either strictly sequentially or on a
//! bounded pool of tokio tasks. A panicking unit is recorded as a `Fatal`
//! entry for its server; the remaining servers are still processed.

use crate::config::ThrottleLimit;
use crate::core::accumulator::{EntryKind, RunAccumulators, RunEntry};
use crate::core::unit::{ServerUnit, UnitOutcome};
use crate::domain::ServerName;
use crate::logging::RunLog;
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs server units with at most `throttle` in flight
pub struct Scheduler {
    throttle: ThrottleLimit,
    accumulators: Arc<RunAccumulators>,
    log: Arc<RunLog>,
}

impl Scheduler {
    pub fn new(throttle: ThrottleLimit, accumulators: Arc<RunAccumulators>, log: Arc<RunLog>) -> Self {
        Self {
            throttle,
            accumulators,
            log,
        }
    }

    /// Process every server; returns once all units have finished
    pub async fn run(&self, servers: &[ServerName], unit: Arc<ServerUnit>) {
        if self.throttle.is_sequential() || servers.len() <= 1 {
            self.log.info(format!(
                "Processing {} server(s) sequentially",
                servers.len()
            ));
            self.run_sequential(servers, &unit).await;
        } else {
            self.log.info(format!(
                "Processing {} servers with throttle limit {}",
                servers.len(),
                self.throttle
            ));
            self.run_parallel(servers, unit).await;
        }
    }

    async fn run_sequential(&self, servers: &[ServerName], unit: &ServerUnit) {
        for server in servers {
            let outcome = AssertUnwindSafe(unit.run(server.clone()))
                .catch_unwind()
                .await;
            if let Err(payload) = outcome {
                self.record_fatal(server, &panic_message(payload.as_ref()));
            }
        }
    }

    async fn run_parallel(&self, servers: &[ServerName], unit: Arc<ServerUnit>) {
        let semaphore = Arc::new(Semaphore::new(self.throttle.get()));
        let mut tasks: JoinSet<(ServerName, Result<UnitOutcome, String>)> = JoinSet::new();
        let mut pending: BTreeSet<ServerName> = BTreeSet::new();

        for server in servers {
            // Acquire before spawning so servers start in list order.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    self.record_fatal(server, &format!("worker pool unavailable: {e}"));
                    continue;
                }
            };

            pending.insert(server.clone());
            let unit = Arc::clone(&unit);
            let server = server.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = AssertUnwindSafe(unit.run(server.clone()))
                    .catch_unwind()
                    .await
                    .map_err(|payload| panic_message(payload.as_ref()));
                (server, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((server, outcome)) => {
                    pending.remove(&server);
                    if let Err(message) = outcome {
                        self.record_fatal(&server, &message);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Worker task failed");
                }
            }
        }

        for server in pending {
            self.record_fatal(&server, "worker task ended without reporting a result");
        }
    }

    fn record_fatal(&self, server: &ServerName, message: &str) {
        self.log.error(format!("[FATAL] {server}: {message}"));
        self.accumulators
            .record(RunEntry::new(EntryKind::Fatal, server.clone(), message));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("unit panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("unit panicked: {s}")
    } else {
        "unit panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "unit panicked: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("index out of range"));
        assert_eq!(
            panic_message(payload.as_ref()),
            "unit panicked: index out of range"
        );

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unit panicked");
    }
}
