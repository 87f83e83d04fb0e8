//! Cooperative cancellation for the download pipeline.
//!
//! A [`CancellationSignal`] is a shared flag set asynchronously by a listener
//! (Ctrl+C, or `q` + Enter on an interactive terminal) and polled by the
//! pipeline at entry boundaries. An in-flight fetch is never interrupted.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Conventional exit status for termination by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared, clonable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    /// Creates a signal that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag and wakes every task waiting in [`cancelled`](Self::cancelled).
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            debug!("cancellation requested");
        }
        self.inner.notify.notify_waiters();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves when the signal is cancelled (immediately if it already is).
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Spawns the Ctrl+C listener, and the `q` + Enter listener when stdin is a terminal.
///
/// Listeners run until the process exits. They only set the flag, except
/// that a second Ctrl+C exits the process at once. That exit skips
/// `PageSource::close` and may leave a `.part` file behind; the next run
/// removes such files before it starts.
pub fn spawn_interrupt_listeners(signal: &CancellationSignal, watch_stdin: bool) {
    let ctrl_c_signal = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Ctrl+C received; stopping after the current article (press again to abort)");
        ctrl_c_signal.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second Ctrl+C; aborting immediately");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    if !watch_stdin {
        return;
    }

    // Not tokio::io::stdin: its blocking read would hold up runtime shutdown.
    let key_signal = signal.clone();
    let spawned = std::thread::Builder::new()
        .name("quit-listener".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if is_quit_command(&line) {
                    info!("quit requested; stopping after the current article");
                    key_signal.cancel();
                    break;
                }
            }
        });
    if let Err(error) = spawned {
        debug!(%error, "could not start quit listener; Ctrl+C still works");
    }
}

fn is_quit_command(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "q" | "quit")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_new_signal_is_not_cancelled() {
        assert!(!CancellationSignal::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let signal = CancellationSignal::new();
        let clone = signal.clone();
        clone.cancel();
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let signal = CancellationSignal::new();
        signal.cancel();
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let signal = CancellationSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_quit_command_recognition() {
        assert!(is_quit_command("q"));
        assert!(is_quit_command(" Q \n"));
        assert!(is_quit_command("quit"));
        assert!(!is_quit_command("query"));
        assert!(!is_quit_command(""));
    }
}
