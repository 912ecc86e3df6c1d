use std::{fmt, marker::PhantomData};

use crate::{
    determinism::Determinism,
    error::{Absent, GenericError},
    supplier::OptionalSupplier,
};

/// A supplier that never has a value.
///
/// `Absence` is always classified as [`Determinism::Absent`], and every call to `get` fails with
/// [`SupplyError::Absent`][crate::SupplyError::Absent]. It holds no state: every `Absence<T>` behaves identically to
/// every other, and they all compare equal.
pub struct Absence<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> Absence<T> {
    /// Creates a new `Absence`.
    pub const fn of() -> Self {
        Self { _value: PhantomData }
    }
}

impl<T> OptionalSupplier for Absence<T> {
    type Output = T;

    fn determinism(&self) -> Determinism {
        Determinism::Absent
    }

    fn get(&self) -> Result<T, GenericError> {
        Err(Absent.build().into_generic())
    }
}

impl<T> Default for Absence<T> {
    fn default() -> Self {
        Self::of()
    }
}

impl<T> Clone for Absence<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Absence<T> {}

impl<T> PartialEq for Absence<T> {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl<T> Eq for Absence<T> {}

impl<T> fmt::Debug for Absence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Absence")
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::is_absent;

    #[test]
    fn always_absent() {
        let absence = Absence::<String>::of();
        assert_eq!(absence.determinism(), Determinism::Absent);
        assert!(absence.is_absent());

        for _ in 0..8 {
            let err = absence.get().unwrap_err();
            assert!(is_absent(&err));
            assert_eq!(err.to_string(), "no value present");
        }

        assert_eq!(absence.optional().unwrap(), None);
    }

    #[test]
    fn instances_are_interchangeable() {
        assert_eq!(Absence::<u8>::of(), Absence::default());
        assert_eq!(std::mem::size_of::<Absence<[u8; 64]>>(), 0);
    }

    #[test]
    fn shareable_regardless_of_value_type() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}

        // `Rc` is neither `Send` nor `Sync`, but there is never a value to share.
        let absence = Absence::<Rc<u8>>::of();
        assert_send_sync(&absence);
    }
}
