//! Shared network cache keyed by price-slice content.
//!
//! Two analyses that look at the same slice of the same data (the same year
//! under different strategies, say) share one built network. Keys are the
//! BLAKE3 [`DatasetHash`] of the slice, so identical content hits the same
//! entry whatever label or path it came from. Entries are immutable once set
//! and each key is built at most once even under concurrent callers.

use netfolio_core::fingerprint::{dataset_hash, DatasetHash};
use netfolio_core::network::{build_network, NetworkError, PeriodNetwork};
use netfolio_core::pipeline::NetworkSource;
use netfolio_core::PriceMatrix;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

type Slot = Arc<OnceLock<Result<Arc<PeriodNetwork>, NetworkError>>>;

/// Content-addressed cache of period networks.
#[derive(Debug, Default)]
pub struct NetworkCache {
    slots: Mutex<HashMap<DatasetHash, Slot>>,
    builds: AtomicUsize,
    hits: AtomicUsize,
}

impl NetworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `key`, created empty if absent. The map lock is held only
    /// for the lookup, never while a network is built.
    fn slot(&self, key: &DatasetHash) -> Slot {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Network for `prices`, building it on first request.
    ///
    /// Failures are cached too; a degenerate slice stays degenerate.
    pub fn get_or_build(&self, prices: &PriceMatrix) -> Result<Arc<PeriodNetwork>, NetworkError> {
        let key = dataset_hash(prices);
        let slot = self.slot(&key);
        let mut built = false;
        let result = slot.get_or_init(|| {
            built = true;
            self.builds.fetch_add(1, Ordering::Relaxed);
            debug!(dataset = key.short(), symbols = prices.n_symbols(), "building network");
            build_network(prices).map(Arc::new)
        });
        if !built {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        result.clone()
    }

    /// Whether a network (or failure) for this content is already stored.
    pub fn contains(&self, key: &DatasetHash) -> bool {
        let slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.get(key).is_some_and(|slot| slot.get().is_some())
    }

    /// Number of networks actually built.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Number of requests served from an existing entry.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        match self.slots.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NetworkSource for NetworkCache {
    fn network(&self, prices: &PriceMatrix) -> Result<Arc<PeriodNetwork>, NetworkError> {
        self.get_or_build(prices)
    }
}
