use std::{collections::HashMap, hash::Hash};
use tokio::task::JoinHandle;

/// At most one task per key; spawning under a busy key aborts the old task.
pub struct TaskManager<K> {
    tasks: HashMap<K, JoinHandle<()>>,
}

impl<K: Eq + Hash> Default for TaskManager<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> TaskManager<K> {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub fn spawn(&mut self, key: K, task: JoinHandle<()>) {
        if let Some(handle) = self.tasks.insert(key, task) {
            handle.abort();
        }
    }

    pub fn abort(&mut self, key: &K) {
        if let Some(handle) = self.tasks.remove(key) {
            handle.abort();
        }
    }

    pub fn abort_all(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
        self.tasks.clear();
    }

    /// Whether a task under `key` is still running.
    pub fn is_active(&self, key: &K) -> bool {
        self.tasks.get(key).is_some_and(|h| !h.is_finished())
    }

    pub fn active_count(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}
