//! Numeric series: raw price fields and derived indicator results.
//!
//! Storage sits behind an `Arc`, so synchronized views and cache handles
//! share one physical buffer. A series with a [`Synchronizer`] attached is a
//! read-only view whose logical index space is the reference time axis.

use crate::domain::error::{Result, SimtraderError};
use crate::domain::identity::{Identifiable, Identity};
use crate::domain::synchronizer::Synchronizer;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Series {
    id: Identity,
    values: Arc<Vec<f64>>,
    sync: Option<Arc<Synchronizer>>,
}

impl Series {
    /// A zero-filled, user-owned series with a process-unique identity.
    pub fn new(len: usize) -> Self {
        Self::from_values(vec![0.0; len])
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self::with_id(Identity::unique("SERIES"), values)
    }

    pub(crate) fn with_id(id: Identity, values: Vec<f64>) -> Self {
        Self {
            id,
            values: Arc::new(values),
            sync: None,
        }
    }

    /// Logical size: the reference axis length when synchronized.
    pub fn len(&self) -> usize {
        match &self.sync {
            Some(sync) => sync.size(),
            None => self.values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn physical_len(&self) -> usize {
        self.values.len()
    }

    fn physical_index(&self, index: usize) -> Result<usize> {
        match &self.sync {
            Some(sync) => sync.index(index),
            None if index < self.values.len() => Ok(index),
            None => Err(SimtraderError::IndexOutOfRange {
                index,
                size: self.values.len(),
            }),
        }
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        let physical = self.physical_index(index)?;
        self.values
            .get(physical)
            .copied()
            .ok_or(SimtraderError::IndexOutOfRange {
                index: physical,
                size: self.values.len(),
            })
    }

    /// Writes a value in place. Shared storage is copied first, so other
    /// holders never observe the write. Synchronized views reject writes.
    ///
    /// Every write gives the series a fresh identity: once changed, its
    /// values no longer match any computation it was named after or fed
    /// into.
    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        if self.sync.is_some() {
            return Err(SimtraderError::DisallowedMutation {
                id: self.id.to_string(),
            });
        }
        let size = self.values.len();
        let slot = Arc::make_mut(&mut self.values)
            .get_mut(index)
            .ok_or(SimtraderError::IndexOutOfRange { index, size })?;
        *slot = value;
        self.id = Identity::unique("SERIES");
        Ok(())
    }

    /// Values in logical order.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        match &self.sync {
            None => Ok(self.values.as_ref().clone()),
            Some(_) => (0..self.len()).map(|i| self.get(i)).collect(),
        }
    }

    /// Physical storage, ignoring any synchronizer.
    pub fn physical(&self) -> &[f64] {
        &self.values
    }

    pub fn last(&self) -> Option<f64> {
        self.len().checked_sub(1).and_then(|i| self.get(i).ok())
    }

    /// A read-only view of the same storage through `sync`'s index space.
    pub fn synchronized(&self, sync: Arc<Synchronizer>) -> Series {
        Series {
            id: Identity::derive("SYNCED", &[&self.id, sync.id()]),
            values: Arc::clone(&self.values),
            sync: Some(sync),
        }
    }

    /// The physical series under `id`, with any synchronizer detached.
    pub(crate) fn base(&self, id: Identity) -> Series {
        Series {
            id,
            values: Arc::clone(&self.values),
            sync: None,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.sync.is_some()
    }

    pub fn synchronizer(&self) -> Option<&Arc<Synchronizer>> {
        self.sync.as_ref()
    }

    /// True when both series read the same physical buffer.
    pub fn shares_storage(&self, other: &Series) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl Identifiable for Series {
    fn id(&self) -> &Identity {
        &self.id
    }
}
