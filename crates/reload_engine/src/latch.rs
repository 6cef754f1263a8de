use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::{SettleEvent, SwapOutcome};

/// Creates a one-shot settle latch and the watch that races it against a timeout.
pub fn settle_channel() -> (SettleLatch, SettleWatch) {
    let (tx, rx) = oneshot::channel();
    (
        SettleLatch {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        SettleWatch { rx },
    )
}

/// Signalling side held by the document adapter. Only the first resolution counts.
#[derive(Debug, Clone)]
pub struct SettleLatch {
    sender: Arc<Mutex<Option<oneshot::Sender<SettleEvent>>>>,
}

impl SettleLatch {
    /// Delivers `event` if nothing has settled the swap yet.
    ///
    /// Returns `false` for late signals: a second event, or one arriving after
    /// the watch gave up on a timeout.
    pub fn resolve(&self, event: SettleEvent) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}

/// Waiting side of a settle latch.
#[derive(Debug)]
pub struct SettleWatch {
    rx: oneshot::Receiver<SettleEvent>,
}

impl SettleWatch {
    /// Races load, error and `timeout`; exactly one outcome wins.
    ///
    /// A latch dropped without resolving counts as "no event" and leaves the
    /// timeout to decide.
    pub async fn race(self, timeout: Duration) -> SwapOutcome {
        let rx = self.rx;
        let sleep = tokio::time::sleep(timeout);
        tokio::pin!(sleep);

        tokio::select! {
            biased;
            Ok(event) = rx => match event {
                SettleEvent::Load => SwapOutcome::Loaded,
                SettleEvent::Error => SwapOutcome::Failed,
            },
            _ = &mut sleep => SwapOutcome::TimedOut,
        }
    }
}
