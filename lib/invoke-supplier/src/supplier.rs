use std::{fmt, sync::Arc};

use crate::{
    determinism::{CachePolicy, Determinism},
    error::{is_absent, GenericError},
};

/// A source of a value that may be absent, and that knows how stable that value is.
///
/// Implementations pair a value-producing operation, [`get`][OptionalSupplier::get], with a self-reported
/// classification, [`determinism`][OptionalSupplier::determinism]. All of the provided query methods are derived from
/// the classification alone and never produce a value themselves, so they are safe to call on a supplier that has never
/// been asked for one.
pub trait OptionalSupplier: Send + Sync {
    /// The type of value produced.
    type Output;

    /// Returns the current classification of this supplier.
    ///
    /// This must not have side effects.
    fn determinism(&self) -> Determinism;

    /// Produces the value.
    ///
    /// # Errors
    ///
    /// If no value is present, an error carrying [`SupplyError::Absent`][crate::SupplyError::Absent] is returned. Any
    /// other error comes from the underlying computation and is returned as-is.
    fn get(&self) -> Result<Self::Output, GenericError>;

    /// Returns `true` if a value may be produced.
    fn is_present(&self) -> bool {
        self.determinism().is_present()
    }

    /// Returns `true` if no value can ever be produced.
    fn is_absent(&self) -> bool {
        self.determinism().is_absent()
    }

    /// Returns `true` if repeated calls to `get` are guaranteed to yield the same value.
    fn is_deterministic(&self) -> bool {
        self.determinism().is_deterministic()
    }

    /// Returns `true` if repeated calls to `get` may yield different values.
    fn is_non_deterministic(&self) -> bool {
        self.determinism().is_non_deterministic()
    }

    /// Returns the cache policy permitted by the current classification.
    fn cache_policy(&self) -> CachePolicy {
        self.determinism().cache_policy()
    }

    /// Produces the value, mapping the absent condition to `None`.
    ///
    /// When the supplier is classified as absent, `get` is not called at all.
    ///
    /// # Errors
    ///
    /// Errors other than the absent condition are returned as-is.
    fn optional(&self) -> Result<Option<Self::Output>, GenericError> {
        if self.is_absent() {
            return Ok(None);
        }

        match self.get() {
            Ok(value) => Ok(Some(value)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Produces the value, or computes a fallback if no value is present.
    ///
    /// # Errors
    ///
    /// Errors other than the absent condition are returned as-is.
    fn get_or_else<F>(&self, fallback: F) -> Result<Self::Output, GenericError>
    where
        F: FnOnce() -> Self::Output,
        Self: Sized,
    {
        Ok(self.optional()?.unwrap_or_else(fallback))
    }
}

impl<S> OptionalSupplier for Arc<S>
where
    S: OptionalSupplier + ?Sized,
{
    type Output = S::Output;

    fn determinism(&self) -> Determinism {
        (**self).determinism()
    }

    fn get(&self) -> Result<Self::Output, GenericError> {
        (**self).get()
    }
}

impl<S> OptionalSupplier for Box<S>
where
    S: OptionalSupplier + ?Sized,
{
    type Output = S::Output;

    fn determinism(&self) -> Determinism {
        (**self).determinism()
    }

    fn get(&self) -> Result<Self::Output, GenericError> {
        (**self).get()
    }
}

pub(crate) type OpaqueFn<T> = dyn Fn() -> Result<T, GenericError> + Send + Sync;

/// A value-producing operation, as handed to an [`OptionalSupplierAdapter`][crate::OptionalSupplierAdapter].
///
/// Producers come in two forms: opaque functions, which say nothing about the stability of what they return, and
/// suppliers which report their own [`Determinism`]. The form is fixed when the producer is created.
pub enum Producer<T> {
    /// A plain function with no classification of its own.
    Opaque(Arc<OpaqueFn<T>>),

    /// A supplier that reports its own classification.
    Aware(Arc<dyn OptionalSupplier<Output = T>>),
}

impl<T> Producer<T> {
    /// Creates an opaque producer from the given function.
    pub fn opaque<F>(f: F) -> Self
    where
        F: Fn() -> Result<T, GenericError> + Send + Sync + 'static,
    {
        Self::Opaque(Arc::new(f))
    }

    /// Creates a producer from a supplier that reports its own classification.
    pub fn aware<S>(supplier: S) -> Self
    where
        S: OptionalSupplier<Output = T> + 'static,
    {
        Self::Aware(Arc::new(supplier))
    }

    /// Returns `true` if this producer reports its own classification.
    pub fn is_aware(&self) -> bool {
        matches!(self, Self::Aware(_))
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Opaque(f) => Self::Opaque(Arc::clone(f)),
            Self::Aware(s) => Self::Aware(Arc::clone(s)),
        }
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opaque(_) => f.write_str("Producer::Opaque"),
            Self::Aware(s) => f
                .debug_struct("Producer::Aware")
                .field("determinism", &s.determinism())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};

    use super::*;
    use crate::SupplyError;

    struct Counting {
        determinism: Determinism,
        calls: AtomicUsize,
    }

    impl Counting {
        fn new(determinism: Determinism) -> Self {
            Self {
                determinism,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl OptionalSupplier for Counting {
        type Output = u32;

        fn determinism(&self) -> Determinism {
            self.determinism
        }

        fn get(&self) -> Result<u32, GenericError> {
            self.calls.fetch_add(1, SeqCst);
            if self.determinism.is_absent() {
                Err(SupplyError::Absent.into_generic())
            } else {
                Ok(7)
            }
        }
    }

    #[test]
    fn derived_queries_never_call_get() {
        let supplier = Counting::new(Determinism::InstanceDeterministic);
        assert!(supplier.is_present());
        assert!(!supplier.is_absent());
        assert!(supplier.is_deterministic());
        assert!(!supplier.is_non_deterministic());
        assert_eq!(supplier.cache_policy(), CachePolicy::CachePerInstance);
        assert_eq!(supplier.calls.load(SeqCst), 0);
    }

    #[test]
    fn optional_skips_get_when_absent() {
        let supplier = Counting::new(Determinism::Absent);
        assert_eq!(supplier.optional().unwrap(), None);
        assert_eq!(supplier.get_or_else(|| 3).unwrap(), 3);
        assert_eq!(supplier.calls.load(SeqCst), 0);
    }

    #[test]
    fn optional_maps_absent_error_to_none() {
        struct LateAbsent;

        impl OptionalSupplier for LateAbsent {
            type Output = u32;

            fn determinism(&self) -> Determinism {
                Determinism::NonDeterministic
            }

            fn get(&self) -> Result<u32, GenericError> {
                Err(SupplyError::Absent.into_generic())
            }
        }

        assert_eq!(LateAbsent.optional().unwrap(), None);
    }

    #[test]
    fn optional_propagates_other_failures() {
        struct Broken;

        impl OptionalSupplier for Broken {
            type Output = u32;

            fn determinism(&self) -> Determinism {
                Determinism::NonDeterministic
            }

            fn get(&self) -> Result<u32, GenericError> {
                Err(GenericError::msg("backend unavailable"))
            }
        }

        let err = Broken.optional().unwrap_err();
        assert_eq!(err.to_string(), "backend unavailable");
        assert!(Broken.get_or_else(|| 1).is_err());
    }

    #[test]
    fn shared_pointers_forward() {
        let shared = Arc::new(Counting::new(Determinism::Deterministic));
        assert_eq!(OptionalSupplier::determinism(&shared), Determinism::Deterministic);
        assert_eq!(OptionalSupplier::get(&shared).unwrap(), 7);

        let boxed: Box<dyn OptionalSupplier<Output = u32>> = Box::new(Counting::new(Determinism::NonDeterministic));
        assert!(boxed.is_non_deterministic());
        assert_eq!(boxed.get().unwrap(), 7);
    }

    #[test]
    fn producer_forms() {
        let opaque = Producer::opaque(|| Ok(1u32));
        assert!(!opaque.is_aware());
        assert_eq!(format!("{:?}", opaque), "Producer::Opaque");

        let aware = Producer::aware(Counting::new(Determinism::Deterministic));
        assert!(aware.is_aware());
        assert!(format!("{:?}", aware.clone()).contains("Deterministic"));
    }
}
