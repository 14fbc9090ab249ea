//! Cooperative cancellation.
//!
//! `CancelHandle` は呼び出し側が持つ「取り消しボタン」、`CancelSignal` は
//! transport / recovery task が受け取る読み取り専用の通知です。
//! 取り消しは進行中の I/O を中断しません。runner は次の判定ポイントで
//! それを見て、以降の retry や callback を抑止します。

use std::sync::Arc;

use tokio::sync::watch;

/// Shared cancellation flag of one task.
///
/// Cloning shares the flag. `cancel()` is idempotent and a no-op once the
/// task has completed.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        // send_replace works even when no receiver is alive
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side handed to sub-operations so they can stop early if they support it.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the task is cancelled.
    pub async fn cancelled(&mut self) {
        let changed = self.rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
        if changed.is_err() {
            // every handle is gone, nobody can cancel anymore
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_is_visible_through_clones_and_signals() {
        let handle = CancelHandle::new();
        let signal = handle.signal();
        let clone = handle.clone();

        assert!(!signal.is_cancelled());
        clone.cancel();
        assert!(handle.is_cancelled());
        assert!(signal.is_cancelled());

        // second cancel is a no-op
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_wakes_up() {
        let handle = CancelHandle::new();
        let mut signal = handle.signal();

        let waiter = tokio::spawn(async move {
            signal.cancelled().await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }
}
