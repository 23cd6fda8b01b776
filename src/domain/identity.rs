//! Content-addressed identities for cacheable values.
//!
//! An identity is built from an operation name, its parameters and the
//! identities of its operands, so structurally identical computations
//! produce textually identical keys. Values created directly by a user get a
//! process-unique identity from a counter instead.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(Arc<str>);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Identity(Arc::from(value.into()))
    }

    /// A fresh identity that no other value in this process shares.
    pub fn unique(prefix: &str) -> Self {
        let n = NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed);
        Identity::new(format!("{prefix}#{n}"))
    }

    /// `OP[a,b,...]` where `op` already carries its parameters, e.g. `SMA(10)`.
    pub fn derive(op: impl fmt::Display, operands: &[&Identity]) -> Self {
        let operands = operands
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Identity::new(format!("{op}[{operands}]"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity::new(value)
    }
}

/// Anything that can name itself for the cache.
pub trait Identifiable {
    fn id(&self) -> &Identity;
}
