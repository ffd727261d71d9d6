//! Re-entrancy guard
//!
//! A handler that mutates what it observes (e.g. rolls a control back to its
//! committed value) enters the guard first; nested calls check
//! [`Reentrancy::is_active`] and return early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Reentrancy {
    depth: Arc<AtomicUsize>,
}

impl Reentrancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    /// Enter; the returned guard leaves on drop
    pub fn enter(&self) -> ReentrancyGuard {
        self.depth.fetch_add(1, Ordering::SeqCst);
        ReentrancyGuard {
            depth: Arc::clone(&self.depth),
        }
    }

    /// Enter unless already inside
    pub fn try_enter(&self) -> Option<ReentrancyGuard> {
        if self.is_active() {
            None
        } else {
            Some(self.enter())
        }
    }
}

#[must_use = "the guard is released when dropped"]
#[derive(Debug)]
pub struct ReentrancyGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}
