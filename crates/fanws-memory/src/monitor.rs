use crate::manager::MemoryManager;
use crossbeam_channel as channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) struct MonitorHandle {
    stop_tx: channel::Sender<()>,
    done_rx: channel::Receiver<()>,
    thread: thread::JoinHandle<()>,
}

impl MemoryManager {
    /// Start background polling of [`MemoryManager::enforce`] every `interval`.
    ///
    /// Returns `false` when monitoring is already running (or the thread could
    /// not be spawned); synchronous operations work either way.
    pub fn start_monitoring(&self, interval: Duration) -> bool {
        let mut slot = self.inner.monitor.lock();
        if slot.is_some() {
            return false;
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        // Never sent on; the thread drops its sender on exit, which disconnects `done_rx`.
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let weak = Arc::downgrade(&self.inner);
        let interval = interval.max(Duration::from_millis(1));

        let spawned = thread::Builder::new()
            .name("fanws-memory-monitor".to_string())
            .spawn(move || {
                let _done_tx = done_tx;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(channel::RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(channel::RecvTimeoutError::Disconnected) => break,
                    }
                    let Some(inner) = weak.upgrade() else {
                        break;
                    };
                    MemoryManager::from_inner(inner).enforce();
                }
                tracing::debug!(target = "fanws.memory", "memory monitor stopped");
            });

        match spawned {
            Ok(thread) => {
                tracing::debug!(
                    target = "fanws.memory",
                    interval_ms = interval.as_millis() as u64,
                    "memory monitor started"
                );
                *slot = Some(MonitorHandle {
                    stop_tx,
                    done_rx,
                    thread,
                });
                true
            }
            Err(err) => {
                tracing::warn!(
                    target = "fanws.memory",
                    error = %err,
                    "failed to spawn memory monitor thread"
                );
                false
            }
        }
    }

    /// Stop background polling. Idempotent.
    ///
    /// Waits at most two seconds for the thread to exit; a thread still busy
    /// after that is detached and treated as stopped.
    pub fn stop_monitoring(&self) {
        let Some(handle) = self.inner.monitor.lock().take() else {
            return;
        };

        let _ = handle.stop_tx.try_send(());
        match handle.done_rx.recv_timeout(STOP_JOIN_TIMEOUT) {
            Err(channel::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    target = "fanws.memory",
                    timeout_ms = STOP_JOIN_TIMEOUT.as_millis() as u64,
                    "memory monitor did not stop in time; detaching"
                );
            }
            _ => {
                if handle.thread.join().is_err() {
                    tracing::warn!(target = "fanws.memory", "memory monitor thread panicked");
                }
            }
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner.monitor.lock().is_some()
    }
}
