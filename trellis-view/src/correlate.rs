//! Groups flat result rows and resolves correlation promises.
//!
//! A correlated query returns denormalized rows: `(view-root key, correlation
//! key, value)` when the correlation partitions by view root, `(correlation
//! key, value)` when it does not. The transformers here make one pass over a
//! fully-materialized batch, group the values per key pair in row order, and
//! settle the promises issued during planning. A row whose value column is
//! NULL marks the key pair as present with no matches, so the pair resolves
//! to an empty collection rather than staying pending.
//!
//! Row width is part of the caller contract: a row shorter than the declared
//! shape fails with an out-of-range access, it is not handled here.

use std::collections::HashMap;

use tracing::trace;
use trellis_data::Value;
use trellis_errors::{internal, TrellisResult};

use crate::promise::{CorrelatedValue, PromiseRegistry};

/// Reshapes one executed batch of flat rows, settling every promise in the
/// registry: the key pairs the batch produced get their grouped result, the
/// rest get the transformer's default.
pub trait TupleListTransformer {
    fn transform(&self, promises: &PromiseRegistry, rows: &[Vec<Value>]) -> TrellisResult<()>;
}

/// Builds per-key collections from correlated rows.
#[derive(Clone, Copy, Debug)]
pub struct CollectionCorrelator {
    uses_view_root: bool,
}

impl CollectionCorrelator {
    pub fn new(uses_view_root: bool) -> Self {
        Self { uses_view_root }
    }

    /// Groups `rows` by view-root key and correlation key, appending values
    /// in row order, then resolves the promise for every key pair that
    /// appeared. Key pairs the batch never produced are left pending for
    /// [`TupleListTransformer::transform`] to default-resolve.
    pub fn populate_result(
        &self,
        promises: &PromiseRegistry,
        rows: &[Vec<Value>],
    ) -> TrellisResult<()> {
        let null_root = Value::Null;
        let mut collections: HashMap<&Value, HashMap<&Value, Vec<Value>>> = HashMap::new();
        for row in rows {
            let (root, key, value) = if self.uses_view_root {
                (&row[0], &row[1], &row[2])
            } else {
                (&null_root, &row[0], &row[1])
            };
            let collection = collections.entry(root).or_default().entry(key).or_default();
            if !value.is_null() {
                collection.push(value.clone());
            }
        }

        for (root, grouped) in collections {
            for (key, values) in grouped {
                let Some(promise) = promises.get(root, key) else {
                    internal!("no promise registered for correlation key {key} under view root {root}");
                };
                promise.resolve(CorrelatedValue::Collection(values))?;
            }
        }
        Ok(())
    }
}

impl TupleListTransformer for CollectionCorrelator {
    fn transform(&self, promises: &PromiseRegistry, rows: &[Vec<Value>]) -> TrellisResult<()> {
        trace!(rows = rows.len(), "resolving correlated collections");
        self.populate_result(promises, rows)?;
        // Key pairs the batch never mentioned still owe their holders an
        // answer.
        for promise in promises.pending() {
            promise.resolve(CorrelatedValue::Collection(Vec::new()))?;
        }
        Ok(())
    }
}

/// Resolves each key pair to a single value instead of a collection. When
/// several rows share a key pair the last one wins; key pairs the batch never
/// produced default to a NULL scalar.
#[derive(Clone, Copy, Debug)]
pub struct SingularCorrelator {
    uses_view_root: bool,
}

impl SingularCorrelator {
    pub fn new(uses_view_root: bool) -> Self {
        Self { uses_view_root }
    }

    pub fn populate_result(
        &self,
        promises: &PromiseRegistry,
        rows: &[Vec<Value>],
    ) -> TrellisResult<()> {
        let null_root = Value::Null;
        let mut scalars: HashMap<&Value, HashMap<&Value, Value>> = HashMap::new();
        for row in rows {
            let (root, key, value) = if self.uses_view_root {
                (&row[0], &row[1], &row[2])
            } else {
                (&null_root, &row[0], &row[1])
            };
            scalars.entry(root).or_default().insert(key, value.clone());
        }

        for (root, grouped) in scalars {
            for (key, value) in grouped {
                let Some(promise) = promises.get(root, key) else {
                    internal!("no promise registered for correlation key {key} under view root {root}");
                };
                promise.resolve(CorrelatedValue::Scalar(value))?;
            }
        }
        Ok(())
    }
}

impl TupleListTransformer for SingularCorrelator {
    fn transform(&self, promises: &PromiseRegistry, rows: &[Vec<Value>]) -> TrellisResult<()> {
        trace!(rows = rows.len(), "resolving correlated scalars");
        self.populate_result(promises, rows)?;
        for promise in promises.pending() {
            promise.resolve(CorrelatedValue::Scalar(Value::Null))?;
        }
        Ok(())
    }
}
