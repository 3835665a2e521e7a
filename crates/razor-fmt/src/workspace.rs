//! Reusable scratch workspaces for embedded formatter requests.
//!
//! Building an annotated copy of the embedded document needs a text buffer and an annotation list.
//! The pool keeps a few of them around, most recently used first, and evicts the least recently
//! used one beyond its capacity. A [`WorkspaceLease`] owns its workspace exclusively and hands it
//! back when dropped.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Default number of idle workspaces kept by a pool.
pub const DEFAULT_POOL_CAPACITY: usize = 4;

/// Scratch state for one embedded formatter invocation.
#[derive(Debug, Default)]
pub struct EmbeddedWorkspace {
    /// The annotated copy of the embedded text.
    pub text: String,
    /// Annotated positions in `text`.
    pub annotations: Vec<usize>,
    uses: u64,
}

impl EmbeddedWorkspace {
    /// How many leases this workspace has served, including the current one.
    pub fn uses(&self) -> u64 {
        self.uses
    }

    fn reset(&mut self) {
        self.text.clear();
        self.annotations.clear();
        self.uses += 1;
    }
}

#[derive(Debug)]
struct PoolInner {
    capacity: usize,
    idle: Mutex<VecDeque<EmbeddedWorkspace>>,
}

/// A bounded most-recently-used pool of [`EmbeddedWorkspace`]s, shareable across requests.
#[derive(Debug, Clone)]
pub struct WorkspacePool {
    inner: Arc<PoolInner>,
}

impl Default for WorkspacePool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl WorkspacePool {
    /// Create a pool keeping at most `capacity` idle workspaces.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                idle: Mutex::new(VecDeque::with_capacity(capacity)),
            }),
        }
    }

    /// Take the most recently returned workspace, or a fresh one.
    pub fn acquire(&self) -> WorkspaceLease {
        let mut workspace = self.inner.idle.lock().pop_front().unwrap_or_default();
        workspace.reset();
        WorkspaceLease {
            pool: Arc::clone(&self.inner),
            workspace,
        }
    }

    /// Number of idle workspaces.
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }
}

/// Exclusive access to a pooled workspace. Returns it to the pool on drop.
#[derive(Debug)]
pub struct WorkspaceLease {
    pool: Arc<PoolInner>,
    workspace: EmbeddedWorkspace,
}

impl Deref for WorkspaceLease {
    type Target = EmbeddedWorkspace;

    fn deref(&self) -> &Self::Target {
        &self.workspace
    }
}

impl DerefMut for WorkspaceLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.workspace
    }
}

impl Drop for WorkspaceLease {
    fn drop(&mut self) {
        let workspace = std::mem::take(&mut self.workspace);
        let mut idle = self.pool.idle.lock();
        idle.push_front(workspace);
        idle.truncate(self.pool.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_returns_on_drop() {
        let pool = WorkspacePool::new(2);
        assert_eq!(pool.idle_count(), 0);
        {
            let mut lease = pool.acquire();
            lease.text.push_str("class C {}");
            lease.annotations.push(3);
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 1);

        let lease = pool.acquire();
        assert!(lease.text.is_empty());
        assert!(lease.annotations.is_empty());
        assert_eq!(lease.uses(), 2);
    }

    #[test]
    fn test_concurrent_leases_are_distinct_and_bounded() {
        let pool = WorkspacePool::new(2);
        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();
        assert_eq!(a.uses() + b.uses() + c.uses(), 3);
        drop((a, b, c));
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_release_on_panic() {
        let pool = WorkspacePool::new(1);
        let cloned = pool.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _lease = cloned.acquire();
            panic!("formatter blew up");
        }));
        assert!(result.is_err());
        assert_eq!(pool.idle_count(), 1);
    }
}
