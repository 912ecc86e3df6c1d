use std::{fmt, sync::Arc, sync::PoisonError};

#[cfg(feature = "loom")]
use loom::sync::{Condvar, Mutex, MutexGuard};

#[cfg(not(feature = "loom"))]
use std::sync::{Condvar, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::{
    determinism::Determinism,
    error::{ComputationFailed, GenericError},
    supplier::OptionalSupplier,
};

type Computation<T> = Box<dyn Fn() -> Result<T, GenericError> + Send + Sync>;

enum Source<T> {
    Value(T),
    Lazy(LazyValue<T>),
}

struct LazyState<T> {
    value: Option<T>,

    // Generation of the attempt currently computing the value, if any.
    running: Option<u64>,
    generation: u64,
    waiting: usize,

    // Generation and message of the most recent failed attempt.
    last_failure: Option<(u64, Arc<str>)>,
}

impl<T> LazyState<T> {
    fn start_attempt(&mut self) -> u64 {
        self.generation += 1;
        self.running = Some(self.generation);
        self.generation
    }

    fn failure_since(&self, attempt: u64) -> Option<Arc<str>> {
        match &self.last_failure {
            Some((generation, message)) if *generation >= attempt => Some(Arc::clone(message)),
            _ => None,
        }
    }
}

struct LazyValue<T> {
    state: Mutex<LazyState<T>>,
    finished: Condvar,
    compute: Computation<T>,
}

impl<T> LazyValue<T> {
    fn new(compute: Computation<T>) -> Self {
        Self {
            state: Mutex::new(LazyState {
                value: None,
                running: None,
                generation: 0,
                waiting: 0,
                last_failure: None,
            }),
            finished: Condvar::new(),
            compute,
        }
    }

    // The value is only ever written once a computation has succeeded, so a poisoned lock never guards a half-written
    // value.
    fn lock(&self) -> MutexGuard<'_, LazyState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_resolved(&self) -> bool {
        self.lock().value.is_some()
    }

    #[cfg(all(test, not(feature = "loom")))]
    fn waiting(&self) -> usize {
        self.lock().waiting
    }
}

impl<T: Clone> LazyValue<T> {
    fn get(&self) -> Result<T, GenericError> {
        let mut state = self.lock();
        let generation = loop {
            if let Some(value) = &state.value {
                return Ok(value.clone());
            }

            let Some(attempt) = state.running else {
                break state.start_attempt();
            };

            // Someone else is computing the value: wait for their attempt to finish and take its outcome, whatever it
            // is. Only callers arriving after an attempt has finished start a new one.
            state.waiting += 1;
            while state.running == Some(attempt) {
                state = self.finished.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
            state.waiting -= 1;

            if let Some(value) = &state.value {
                return Ok(value.clone());
            }
            if let Some(message) = state.failure_since(attempt) {
                return Err(ComputationFailed { message }.build().into_generic());
            }
        };
        drop(state);

        trace!(generation, "Computing fixed value.");
        let attempt = Attempt {
            lazy: self,
            generation,
            completed: false,
        };
        attempt.complete((self.compute)())
    }
}

// An in-flight computation. If the computation panics, dropping this releases the callers waiting on it with a
// failure, and lets the next caller try again.
struct Attempt<'a, T> {
    lazy: &'a LazyValue<T>,
    generation: u64,
    completed: bool,
}

impl<T: Clone> Attempt<'_, T> {
    fn complete(mut self, result: Result<T, GenericError>) -> Result<T, GenericError> {
        self.completed = true;

        let mut state = self.lazy.lock();
        state.running = None;
        let outcome = match result {
            Ok(value) => {
                debug!(generation = self.generation, "Fixed value computed and stored.");
                Ok(state.value.insert(value).clone())
            }
            Err(e) => {
                debug!(
                    generation = self.generation,
                    waiting = state.waiting,
                    error = %e,
                    "Fixed value computation failed. Value remains unset."
                );
                state.last_failure = Some((self.generation, Arc::from(e.to_string())));
                Err(e)
            }
        };
        drop(state);

        self.lazy.finished.notify_all();
        outcome
    }
}

impl<T> Drop for Attempt<'_, T> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let mut state = self.lazy.lock();
        state.running = None;
        state.last_failure = Some((self.generation, Arc::from("fixed value computation panicked")));
        drop(state);

        self.lazy.finished.notify_all();
    }
}

/// A supplier whose value, once known, never changes.
///
/// The value is either given up front ([`of`][FixedValueSupplier::of]) or computed on the first call to `get`
/// ([`lazy`][FixedValueSupplier::lazy]). Either way, the supplier is always classified as
/// [`Determinism::Deterministic`], whether or not the value has been computed yet.
///
/// Every call to `get` returns a clone of the stored value. Use a shared pointer such as `Arc` as the value type when
/// callers need to observe the very same object.
///
/// ## Lazy evaluation
///
/// Only one computation is ever in flight. Callers that arrive while it runs wait for it, and take its outcome instead
/// of computing the value themselves.
///
/// If the computation succeeds, the value is stored, every waiting caller receives it, and the computation is never
/// called again.
///
/// If the computation fails, the caller that ran it gets its error back unchanged. Every caller that was waiting on
/// that attempt also fails, with [`SupplyError::ComputationFailed`][crate::SupplyError::ComputationFailed] carrying the
/// same message. The value stays unset, so the next caller to arrive after the failed attempt finished runs the
/// computation again. A computation that panics is treated as a failed attempt.
///
/// The computation must not call `get` on the supplier it is computing, directly or through an adapter: that call
/// waits on the attempt it is part of, and never returns.
pub struct FixedValueSupplier<T> {
    source: Source<T>,
}

impl<T> FixedValueSupplier<T> {
    /// Creates a new `FixedValueSupplier` with the given value.
    pub fn of(value: T) -> Self {
        Self {
            source: Source::Value(value),
        }
    }

    /// Creates a new `FixedValueSupplier` whose value is computed by `compute` on first use.
    pub fn lazy<F>(compute: F) -> Self
    where
        F: Fn() -> Result<T, GenericError> + Send + Sync + 'static,
    {
        Self {
            source: Source::Lazy(LazyValue::new(Box::new(compute))),
        }
    }

    /// Returns `true` if the value is known.
    ///
    /// This never triggers the computation.
    pub fn is_resolved(&self) -> bool {
        match &self.source {
            Source::Value(_) => true,
            Source::Lazy(lazy) => lazy.is_resolved(),
        }
    }
}

impl<T> OptionalSupplier for FixedValueSupplier<T>
where
    T: Clone + Send + Sync,
{
    type Output = T;

    fn determinism(&self) -> Determinism {
        Determinism::Deterministic
    }

    fn get(&self) -> Result<T, GenericError> {
        match &self.source {
            Source::Value(value) => Ok(value.clone()),
            Source::Lazy(lazy) => lazy.get(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FixedValueSupplier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Value(value) => f.debug_tuple("FixedValueSupplier").field(value).finish(),
            Source::Lazy(_) => f.write_str("FixedValueSupplier(<lazy>)"),
        }
    }
}
