//! Reshapes the flat, denormalized rows a correlated query produces into the
//! per-entity collections a view expects.
//!
//! During planning, every correlated attribute registers a
//! [`promise::TuplePromise`] for the key pair it will be resolved under. After
//! execution, a [`correlate::TupleListTransformer`] consumes the row batch,
//! groups it, and settles every outstanding promise, including the ones the
//! batch never mentioned.

pub mod correlate;
pub mod promise;
