//! Cooperative stop signal
//!
//! A run stops when either the in-process flag is raised (Ctrl-C, tests) or
//! the sentinel file appears. It is only checked between items.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    sentinel: Option<PathBuf>,
}

impl StopSignal {
    /// A signal that can only be raised in-process
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that is also raised by the existence of `path`
    pub fn with_sentinel(path: impl Into<PathBuf>) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            sentinel: Some(path.into()),
        }
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.sentinel.as_ref().map(|p| p.exists()).unwrap_or(false)
    }

    pub fn sentinel(&self) -> Option<&PathBuf> {
        self.sentinel.as_ref()
    }
}
