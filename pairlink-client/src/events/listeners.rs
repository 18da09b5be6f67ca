use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    live: Arc<AtomicBool>,
    handler: Handler<T>,
}

/// Handlers registered for one event, invoked in registration order.
pub struct Listeners<T> {
    entries: Mutex<Vec<Entry<T>>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, id: u64, handler: Handler<T>) {
        self.lock().push(Entry {
            id,
            live: Arc::new(AtomicBool::new(true)),
            handler,
        });
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut entries = self.lock();
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = entries.remove(pos);
        entry.live.store(false, Ordering::Release);
        true
    }

    /// Invokes every registered handler with `payload` and returns how many ran.
    ///
    /// Works on a snapshot so handlers may register or remove listeners while
    /// the pass runs; a handler removed mid-pass is skipped.
    pub fn emit(&self, payload: &T) -> usize {
        let snapshot: Vec<(Arc<AtomicBool>, Handler<T>)> = self
            .lock()
            .iter()
            .map(|e| (e.live.clone(), e.handler.clone()))
            .collect();

        let mut invoked = 0;
        for (live, handler) in snapshot {
            if !live.load(Ordering::Acquire) {
                continue;
            }
            handler(payload);
            invoked += 1;
        }
        invoked
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
