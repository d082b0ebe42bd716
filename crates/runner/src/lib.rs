//! Process supervisor for the CRM service.
//!
//! Named processes run side by side until one fails or the service receives
//! SIGINT/SIGTERM. Every process then gets the shared cancellation signal and
//! the registered closers run under a timeout.
//!
//! ```no_run
//! use crm_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Runner::new()
//!         .with_named_process("heartbeat", |ctx| async move {
//!             ctx.cancelled().await;
//!             Ok(())
//!         })
//!         .with_closer(|| async move { Ok(()) })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type BoxedResultFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A long-running process; it must return once the token is cancelled
pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> BoxedResultFuture + Send>;

/// Cleanup run after every process has stopped
pub type Closer = Box<dyn FnOnce() -> BoxedResultFuture + Send>;

struct NamedProcess {
    name: String,
    process: AppProcess,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Stopped by a signal, the token, or all processes returning Ok
    Stopped,
    /// A process failed or panicked
    Failed { process: String, error: anyhow::Error },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Stopped => 0,
            RunOutcome::Failed { .. } => 1,
        }
    }
}

pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// A runner without processes and a 10 second closer timeout
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.processes.push(NamedProcess {
            name: name.into(),
            process: Box::new(|token| Box::pin(process(token))),
        });
        self
    }

    pub fn with_app_process<F, Fut>(self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = format!("process_{}", self.processes.len());
        self.with_named_process(name, process)
    }

    /// Closers run concurrently once all processes are done; a failing
    /// closer does not stop the others
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally owned token; cancelling it stops the runner
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Run until stopped, then exit the process with the outcome's code
    pub async fn run(self) {
        spawn_signal_handlers(self.cancellation_token.clone());

        let outcome = self.run_until_stopped().await;
        match &outcome {
            RunOutcome::Stopped => info!("Application exiting normally"),
            RunOutcome::Failed { process, error } => {
                error!(process = %process, "Application exiting with error: {:#}", error)
            }
        }
        std::process::exit(outcome.exit_code());
    }

    /// Run all processes until the token is cancelled or one of them fails,
    /// then run the closers
    pub async fn run_until_stopped(self) -> RunOutcome {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for NamedProcess { name, process } in self.processes {
            let process_token = token.clone();
            debug!(process = %name, "starting process");
            join_set.spawn(async move { (name, process(process_token).await) });
        }

        let mut outcome = RunOutcome::Stopped;
        loop {
            let joined = tokio::select! {
                _ = token.cancelled() => break,
                joined = join_set.join_next() => joined,
            };

            match joined {
                None => break,
                Some(Ok((name, Ok(())))) => {
                    debug!(process = %name, "process completed");
                }
                Some(Ok((name, Err(err)))) => {
                    error!(process = %name, "process error: {:#}", err);
                    outcome = RunOutcome::Failed {
                        process: name,
                        error: err,
                    };
                    break;
                }
                Some(Err(join_error)) => {
                    error!("process panicked: {}", join_error);
                    outcome = RunOutcome::Failed {
                        process: "unknown".to_string(),
                        error: anyhow::anyhow!("process panicked: {}", join_error),
                    };
                    break;
                }
            }
        }

        token.cancel();
        while let Some(joined) = join_set.join_next().await {
            if let Ok((name, Err(err))) = joined {
                debug!(process = %name, "process returned error during shutdown: {:#}", err);
            }
        }

        run_closers(self.closers, self.closer_timeout).await;
        outcome
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => error!("Error setting up signal handler: {}", err),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => error!("Error setting up SIGTERM handler: {}", err),
        }
    });
}

async fn run_closers(closers: Vec<Closer>, closer_timeout: Duration) {
    if closers.is_empty() {
        return;
    }
    info!("Running closers with timeout of {:?}", closer_timeout);

    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    let drain = async {
        while let Some(result) = closer_set.join_next().await {
            match result {
                Ok(Ok(())) => debug!("Closer completed successfully"),
                Ok(Err(err)) => error!("Closer error: {:#}", err),
                Err(err) => error!("Closer panicked: {}", err),
            }
        }
    };

    match tokio::time::timeout(closer_timeout, drain).await {
        Ok(()) => info!("All closers completed"),
        Err(_) => error!("Closers timed out after {:?}", closer_timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cancellation_stops_processes_and_runs_closers() {
        let closed = Arc::new(AtomicBool::new(false));
        let observed_cancel = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::new();

        let closed_flag = closed.clone();
        let cancel_flag = observed_cancel.clone();
        let runner = Runner::new()
            .with_named_process("server", move |ctx| async move {
                ctx.cancelled().await;
                cancel_flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_closer(move || async move {
                closed_flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_cancellation_token(token.clone());

        let stopper = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stopper.cancel();
        });

        let outcome = runner.run_until_stopped().await;

        assert!(matches!(outcome, RunOutcome::Stopped));
        assert_eq!(outcome.exit_code(), 0);
        assert!(observed_cancel.load(Ordering::SeqCst));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failing_process_cancels_the_others() {
        let sibling_stopped = Arc::new(AtomicBool::new(false));
        let flag = sibling_stopped.clone();

        let outcome = Runner::new()
            .with_named_process("worker", move |ctx| async move {
                ctx.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_named_process("api", |_ctx| async move {
                Err(anyhow::anyhow!("bind failed"))
            })
            .run_until_stopped()
            .await;

        match &outcome {
            RunOutcome::Failed { process, error } => {
                assert_eq!(process, "api");
                assert_eq!(error.to_string(), "bind failed");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 1);
        assert!(sibling_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_all_closers_run_when_one_fails() {
        let completed = Arc::new(AtomicUsize::new(0));
        let first = completed.clone();
        let second = completed.clone();

        let outcome = Runner::new()
            .with_closer(|| async move { Err(anyhow::anyhow!("flush failed")) })
            .with_closer(move || async move {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .with_closer(move || async move {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .run_until_stopped()
            .await;

        assert!(matches!(outcome, RunOutcome::Stopped));
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_closer_is_abandoned_after_timeout() {
        let outcome = Runner::new()
            .with_closer(|| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .with_closer_timeout(Duration::from_millis(20))
            .run_until_stopped()
            .await;

        assert!(matches!(outcome, RunOutcome::Stopped));
    }
}
