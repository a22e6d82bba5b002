//! Deferred results for correlated fetches.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use trellis_data::Value;
use trellis_errors::{internal_err, TrellisResult};

/// What a correlated fetch ultimately produces for one key pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CorrelatedValue {
    /// Every match for the key pair, in row order.
    Collection(Vec<Value>),
    /// A single match.
    Scalar(Value),
}

/// A placeholder handed out while the correlated query is still pending.
///
/// Resolved exactly once; every holder observes the same value afterwards.
/// The set-at-most-once cell enforces this, so a transformer bug that
/// resolves twice surfaces as an error instead of silently clobbering data
/// another view already read.
#[derive(Debug, Default)]
pub struct TuplePromise {
    cell: OnceLock<CorrelatedValue>,
}

impl TuplePromise {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the result. Fails if the promise was already resolved.
    pub fn resolve(&self, value: CorrelatedValue) -> TrellisResult<()> {
        self.cell
            .set(value)
            .map_err(|rejected| internal_err!("promise resolved twice, rejected {rejected:?}"))
    }

    /// The resolved value, or `None` while still pending. Reading before the
    /// owning transformer has run is a usage error in the surrounding system.
    pub fn get(&self) -> Option<&CorrelatedValue> {
        self.cell.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// The outstanding promises of one correlated attribute, keyed by view-root
/// key and correlation key.
///
/// Transformers settle a whole registry per batch, so promises for different
/// correlated attributes must live in different registries.
#[derive(Debug, Default)]
pub struct PromiseRegistry {
    promises: HashMap<Value, HashMap<Value, Arc<TuplePromise>>>,
}

impl PromiseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in the result for `(view_root, correlation)`.
    /// Registering the same key pair again returns the promise already
    /// issued, so every holder of the pair shares one resolution.
    pub fn register(&mut self, view_root: Value, correlation: Value) -> Arc<TuplePromise> {
        Arc::clone(
            self.promises
                .entry(view_root)
                .or_default()
                .entry(correlation)
                .or_default(),
        )
    }

    /// Registers a promise for a transformer that does not partition by view
    /// root. All such promises share one implicit NULL bucket.
    pub fn register_unrooted(&mut self, correlation: Value) -> Arc<TuplePromise> {
        self.register(Value::Null, correlation)
    }

    pub fn get(&self, view_root: &Value, correlation: &Value) -> Option<&Arc<TuplePromise>> {
        self.promises.get(view_root)?.get(correlation)
    }

    /// Promises not yet resolved, in no particular order.
    pub fn pending(&self) -> impl Iterator<Item = &Arc<TuplePromise>> {
        self.promises
            .values()
            .flat_map(HashMap::values)
            .filter(|promise| !promise.is_resolved())
    }
}
