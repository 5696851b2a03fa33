//! One-shot cancellation signal carrying a reason
//!
//! A [`Cancel`] is handed to the probe runner together with the arguments.
//! When it fires before the probe exits, the runner kills the child and the
//! build fails with `Error::Canceled(reason)`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;

/// Cancellation signal for a single probe invocation
pub struct Cancel {
    fired: Pin<Box<dyn Future<Output = String> + Send + 'static>>,
}

impl Cancel {
    /// A signal that never fires
    pub fn never() -> Self {
        Self::from_future(std::future::pending())
    }

    /// Fire once `deadline` has elapsed
    pub fn after(deadline: Duration) -> Self {
        Self::from_future(async move {
            tokio::time::sleep(deadline).await;
            format!("deadline of {:?} exceeded", deadline)
        })
    }

    /// Fire when a reason is sent on `rx`
    ///
    /// Dropping the sender without sending means "never cancel".
    pub fn from_receiver(rx: oneshot::Receiver<String>) -> Self {
        Self::from_future(async move {
            match rx.await {
                Ok(reason) => reason,
                Err(_) => std::future::pending().await,
            }
        })
    }

    /// Fire when `fut` completes, using its output as the reason
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = String> + Send + 'static,
    {
        Self {
            fired: Box::pin(fut),
        }
    }

    /// Wait for the signal and return its reason
    ///
    /// Cancellation-safe: intended for use as a `tokio::select!` branch.
    pub async fn fired(self) -> String {
        self.fired.await
    }
}

impl Default for Cancel {
    fn default() -> Self {
        Self::never()
    }
}

impl fmt::Debug for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancel").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_with_reason() {
        let reason = Cancel::after(Duration::from_secs(5)).fired().await;
        assert_eq!(reason, "deadline of 5s exceeded");
    }

    #[tokio::test]
    async fn receiver_carries_reason() {
        let (tx, rx) = oneshot::channel();
        let cancel = Cancel::from_receiver(rx);
        tx.send("SIGINT".to_string()).unwrap();
        assert_eq!(cancel.fired().await, "SIGINT");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_never_fires() {
        let (tx, rx) = oneshot::channel::<String>();
        drop(tx);
        let cancel = Cancel::from_receiver(rx);
        let raced = tokio::time::timeout(Duration::from_secs(60), cancel.fired()).await;
        assert!(raced.is_err());
    }
}
