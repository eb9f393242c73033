//! Thread pool grouping by name substring.

use serde::Serialize;

use super::thread::Thread;
use crate::config::PoolConfig;

/// Bucket for threads that match no configured pool.
pub const UNPOOLED: &str = "Threads with no pools";

/// Threads (indices into `Analysis::threads`) that belong to one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolGroup {
    pub name: String,
    pub threads: Vec<usize>,
}

impl PoolGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            threads: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

/// Assign every thread to the first pool whose name occurs in the thread's
/// name. Groups come back in config order, with [`UNPOOLED`] last; repeated
/// pool names share the bucket of their first occurrence.
pub fn group_by_pool(threads: &[Thread], config: &PoolConfig) -> Vec<PoolGroup> {
    let mut groups: Vec<PoolGroup> = Vec::new();
    for name in config.pool_names() {
        if name != UNPOOLED && !groups.iter().any(|group| group.name == name) {
            groups.push(PoolGroup::new(name));
        }
    }
    let configured = groups.len();
    groups.push(PoolGroup::new(UNPOOLED));

    for (idx, thread) in threads.iter().enumerate() {
        let slot = groups[..configured]
            .iter()
            .position(|group| thread.name.contains(group.name.as_str()))
            .unwrap_or(configured);
        groups[slot].threads.push(idx);
    }

    groups
}
