//! Effect Implementation
//!
//! An Effect is a zero-argument, re-runnable procedure. It is the unit of
//! reactive re-computation.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs once immediately as the thread's current
//!    effect. Every trackable property read during that run records the
//!    effect as a dependent.
//!
//! 2. When a dependency is written, the property's dependency map invokes
//!    the effect synchronously, on the writer's call stack.
//!
//! 3. Triggered re-runs are plain invocations. They do not install the effect
//!    as current, so they neither add nor drop dependencies. Call
//!    [`Effect::run`] to re-run with tracking.
//!
//! # Lifetime
//!
//! Dependency maps hold strong handles, so an effect lives as long as any
//! object it read. Dropping the handle returned by [`Effect::new`] does not
//! unsubscribe it; [`Effect::dispose`] turns it into a no-op instead.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

use super::context::ReactiveContext;

/// Unique identity of an effect.
///
/// Effect equality is identity-based: two handles are the same effect iff
/// their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

struct EffectInner {
    id: EffectId,
    run: Box<dyn Fn() + Send + Sync>,
    disposed: AtomicBool,
    run_count: AtomicUsize,
}

/// Handle to a registered effect. Clones refer to the same effect.
///
/// # Example
///
/// ```
/// use zeno_core::reactive::{make_ref, Effect};
///
/// let count = make_ref(0);
/// let seen = count.clone();
/// let effect = Effect::new(move || {
///     let _ = seen.get();
/// });
///
/// count.set(5);
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create an effect and run it once immediately with tracking.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.run();
        effect
    }

    /// Create an effect without running it.
    ///
    /// It records no dependencies until [`Effect::run`] is called.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(EffectInner {
                id: EffectId::next(),
                run: Box::new(run),
                disposed: AtomicBool::new(false),
                run_count: AtomicUsize::new(0),
            }),
        }
    }

    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Run the effect as the current effect, recording its reads.
    pub fn run(&self) {
        if self.is_disposed() {
            return;
        }
        ReactiveContext::run_effect(self);
    }

    /// Call the procedure directly, without touching the current-effect
    /// register.
    pub fn invoke(&self) {
        if self.is_disposed() {
            return;
        }
        self.inner.run_count.fetch_add(1, Ordering::SeqCst);
        (self.inner.run)();
    }

    /// Re-run in response to a write. Honors the thread's depth limit.
    pub(crate) fn notify(&self) {
        let Some(_guard) = ReactiveContext::enter_trigger(self.id()) else {
            return;
        };
        trace!(effect = %self.id(), "re-running effect");
        self.invoke();
    }

    /// Stop the effect from running again.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of times the procedure has been called, tracked or not.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Effect {}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Register `run` as an effect and run it once immediately.
pub fn effect<F>(run: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(run)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
