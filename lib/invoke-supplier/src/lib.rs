//! Determinism-aware optional suppliers.
//!
//! An optional supplier produces a value, or signals that there is none, and reports a [`Determinism`] classification
//! describing whether repeated calls are guaranteed to yield the same value. Callers can decide from the classification
//! alone whether a value may be cached forever, must be recomputed on every use, or can be assumed to never exist.
//!
//! Three implementations are provided:
//!
//! - [`Absence`], which never has a value
//! - [`FixedValueSupplier`], which holds a single value, given up front or computed once on first use
//! - [`OptionalSupplierAdapter`], which wraps any [`Producer`] and works out its classification
#![deny(warnings)]
#![deny(missing_docs)]

mod absence;
pub use self::absence::Absence;

mod adapter;
pub use self::adapter::OptionalSupplierAdapter;

mod determinism;
pub use self::determinism::{CachePolicy, Determinism, ParseDeterminismError};

mod error;
pub use self::error::{is_absent, AdapterError, GenericError, SupplyError};

mod fixed;
pub use self::fixed::FixedValueSupplier;

mod supplier;
pub use self::supplier::{OptionalSupplier, Producer};
