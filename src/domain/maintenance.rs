//! Background maintenance thread for a [`Cache`].

use crate::domain::cache::Cache;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Calls [`Cache::maintain`] once per interval on a dedicated thread.
///
/// Only a weak reference to the cache is held: the thread exits on its own
/// once the cache is dropped. Dropping the `Maintainer` stops and joins it.
pub struct Maintainer {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Maintainer {
    pub fn spawn<T>(cache: &Arc<Cache<T>>, interval: Duration) -> std::io::Result<Self>
    where
        T: Send + Sync + 'static,
    {
        let weak: Weak<Cache<T>> = Arc::downgrade(cache);
        let name = cache.name();
        let (tx, rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(format!("{name}-maintenance"))
            .spawn(move || {
                info!(cache = name, ?interval, "cache maintenance started");
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let Some(cache) = weak.upgrade() else {
                        debug!(cache = name, "cache dropped");
                        break;
                    };
                    cache.maintain();
                }
                info!(cache = name, "cache maintenance stopped");
            })?;

        Ok(Self {
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Maintainer {
    fn drop(&mut self) {
        self.stop();
    }
}
