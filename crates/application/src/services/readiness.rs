use tokio::sync::watch;

/// One-shot broadcast event.
///
/// Fires at most once. Every waiter, including ones that subscribe after the
/// event fired, observes the completed state. A new preparation cycle uses a
/// new signal instead of re-arming this one.
#[derive(Debug)]
pub struct ReadinessSignal {
    tx: watch::Sender<bool>,
}

impl ReadinessSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Returns `true` only for the call that actually fired the signal.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}
