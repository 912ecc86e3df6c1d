use std::{fmt, sync::Arc};

use snafu::OptionExt as _;
use tracing::trace;

use crate::{
    absence::Absence,
    determinism::Determinism,
    error::{AdapterError, GenericError, MissingDeterminism},
    fixed::FixedValueSupplier,
    supplier::{OpaqueFn, OptionalSupplier, Producer},
};

enum Target<T> {
    Absent(Absence<T>),
    Delegated(Arc<dyn OptionalSupplier<Output = T>>),
    Fixed {
        determinism: Determinism,
        producer: Arc<OpaqueFn<T>>,
    },
}

/// Adapts an arbitrary [`Producer`] into an [`OptionalSupplier`].
///
/// How the adapter classifies itself depends on what it was given:
///
/// - no producer: the adapter behaves exactly like [`Absence`], and any classification given alongside is ignored
/// - a producer that reports its own classification: every call to `determinism` is forwarded to it, so changes in the
///   producer's classification are visible immediately
/// - an opaque producer: the classification is fixed at construction, either to the one given explicitly or to
///   [`Determinism::NonDeterministic`]
///
/// Calls to `get` go straight to the producer, and its value or error is returned unchanged.
pub struct OptionalSupplierAdapter<T> {
    target: Target<T>,
}

impl<T> Target<T> {
    fn absent() -> Self {
        trace!("No producer given. Adapter is absent.");
        Self::Absent(Absence::of())
    }

    fn delegated(supplier: Arc<dyn OptionalSupplier<Output = T>>) -> Self {
        trace!("Producer reports its own determinism. Delegating.");
        Self::Delegated(supplier)
    }

    fn fixed(determinism: Determinism, producer: Arc<OpaqueFn<T>>) -> Self {
        trace!(%determinism, "Producer is opaque. Determinism fixed at construction.");
        Self::Fixed { determinism, producer }
    }
}

impl<T> OptionalSupplierAdapter<T> {
    /// Creates an adapter with no producer.
    pub fn new() -> Self {
        Self {
            target: Target::absent(),
        }
    }

    /// Creates an adapter over the given producer.
    ///
    /// Opaque producers are classified as [`Determinism::NonDeterministic`]. Passing `None` yields an adapter that
    /// behaves like [`Absence`].
    pub fn from_producer<P>(producer: P) -> Self
    where
        P: Into<Option<Producer<T>>>,
    {
        let target = match producer.into() {
            None => Target::absent(),
            Some(Producer::Aware(supplier)) => Target::delegated(supplier),
            Some(Producer::Opaque(producer)) => Target::fixed(Determinism::NonDeterministic, producer),
        };

        Self { target }
    }

    /// Creates an adapter over the given producer, using `determinism` to classify it if it is opaque.
    ///
    /// The classification is only consulted for opaque producers. When `producer` is `None`, the adapter is classified
    /// as [`Determinism::Absent`] no matter what is given, and when the producer reports its own classification, that
    /// is used instead.
    ///
    /// # Errors
    ///
    /// If the producer is opaque and `determinism` is `None`, an error is returned.
    pub fn with_determinism<P>(determinism: Option<Determinism>, producer: P) -> Result<Self, AdapterError>
    where
        P: Into<Option<Producer<T>>>,
    {
        let target = match producer.into() {
            None => Target::absent(),
            Some(Producer::Aware(supplier)) => Target::delegated(supplier),
            Some(Producer::Opaque(producer)) => {
                let determinism = determinism.context(MissingDeterminism)?;
                Target::fixed(determinism, producer)
            }
        };

        Ok(Self { target })
    }
}

impl<T> Default for OptionalSupplierAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OptionalSupplier for OptionalSupplierAdapter<T> {
    type Output = T;

    fn determinism(&self) -> Determinism {
        match &self.target {
            Target::Absent(absence) => absence.determinism(),
            Target::Delegated(supplier) => supplier.determinism(),
            Target::Fixed { determinism, .. } => *determinism,
        }
    }

    fn get(&self) -> Result<T, GenericError> {
        match &self.target {
            Target::Absent(absence) => absence.get(),
            Target::Delegated(supplier) => supplier.get(),
            Target::Fixed { producer, .. } => producer(),
        }
    }
}

impl<T> fmt::Debug for OptionalSupplierAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.target {
            Target::Absent(_) => "absent",
            Target::Delegated(_) => "delegated",
            Target::Fixed { .. } => "fixed",
        };

        f.debug_struct("OptionalSupplierAdapter")
            .field("kind", &kind)
            .field("determinism", &self.determinism())
            .finish()
    }
}

impl<T: 'static> From<Absence<T>> for Producer<T> {
    fn from(absence: Absence<T>) -> Self {
        Producer::aware(absence)
    }
}

impl<T> From<FixedValueSupplier<T>> for Producer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(supplier: FixedValueSupplier<T>) -> Self {
        Producer::aware(supplier)
    }
}

impl<T: 'static> From<OptionalSupplierAdapter<T>> for Producer<T> {
    fn from(adapter: OptionalSupplierAdapter<T>) -> Self {
        Producer::aware(adapter)
    }
}
