//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. When a
//! trackable property is read, the property's dependency map consults the
//! context and records the current effect as a dependent.
//!
//! # Implementation
//!
//! The register is a thread-local slot rather than a stack. Exactly one
//! effect is "current" at a time. A nested `run_effect` overwrites the outer
//! effect, and what happens when the inner run finishes is decided by the
//! thread's [`NestingPolicy`]:
//!
//! - `Clear` (default): the slot is emptied. Reads made by the outer effect
//!   after the nested call are no longer tracked.
//! - `Restore`: the outer effect is put back, giving stack discipline.
//!
//! The slot is thread-confined, so effects registered on one thread never
//! observe reads made on another.

use std::cell::RefCell;

use tracing::error;

use super::effect::{Effect, EffectId};
use crate::config::{NestingPolicy, ReactiveConfig};

thread_local! {
    static CONTEXT: RefCell<ContextState> = RefCell::new(ContextState::default());
}

#[derive(Default)]
struct ContextState {
    /// The effect whose synchronous run is in progress, if any.
    current: Option<Effect>,
    config: ReactiveConfig,
    /// How many triggered effect invocations are currently on the stack.
    trigger_depth: usize,
}

/// Access point for the thread's reactive register.
///
/// All methods are associated functions; the state itself lives in a
/// thread-local.
pub struct ReactiveContext;

impl ReactiveContext {
    /// Install a configuration for the current thread.
    pub fn configure(config: ReactiveConfig) {
        CONTEXT.with(|ctx| ctx.borrow_mut().config = config);
    }

    /// The configuration active on the current thread.
    pub fn config() -> ReactiveConfig {
        CONTEXT.with(|ctx| ctx.borrow().config.clone())
    }

    /// Check if an effect is currently running on this thread.
    pub fn is_tracking() -> bool {
        CONTEXT.with(|ctx| ctx.borrow().current.is_some())
    }

    /// The effect currently registered as running, if any.
    pub fn current_effect() -> Option<Effect> {
        CONTEXT.with(|ctx| ctx.borrow().current.clone())
    }

    /// Run `effect` once with it installed as the current effect.
    ///
    /// Every trackable read made during the synchronous call records
    /// `effect` as a dependent.
    pub fn run_effect(effect: &Effect) {
        let previous = CONTEXT.with(|ctx| ctx.borrow_mut().current.replace(effect.clone()));
        let _scope = EffectScope { previous };
        effect.invoke();
    }

    /// Account for one triggered effect invocation.
    ///
    /// Returns `None` when the configured depth limit would be exceeded, in
    /// which case the caller must skip the invocation.
    pub(crate) fn enter_trigger(effect: EffectId) -> Option<TriggerGuard> {
        CONTEXT.with(|ctx| {
            let mut state = ctx.borrow_mut();
            if let Some(limit) = state.config.max_trigger_depth {
                if state.trigger_depth >= limit {
                    error!(
                        effect = %effect,
                        depth = state.trigger_depth,
                        limit,
                        "effect trigger depth limit reached; skipping re-run"
                    );
                    return None;
                }
            }
            state.trigger_depth += 1;
            Some(TriggerGuard { _private: () })
        })
    }

    /// Current depth of nested triggered invocations.
    pub fn trigger_depth() -> usize {
        CONTEXT.with(|ctx| ctx.borrow().trigger_depth)
    }
}

/// Resets the register when an effect's tracked run ends, even on panic.
struct EffectScope {
    previous: Option<Effect>,
}

impl Drop for EffectScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CONTEXT.with(|ctx| {
            let mut state = ctx.borrow_mut();
            state.current = match state.config.nesting {
                NestingPolicy::Clear => None,
                NestingPolicy::Restore => previous,
            };
        });
    }
}

/// Decrements the trigger depth when dropped.
pub(crate) struct TriggerGuard {
    _private: (),
}

impl Drop for TriggerGuard {
    fn drop(&mut self) {
        CONTEXT.with(|ctx| {
            let mut state = ctx.borrow_mut();
            state.trigger_depth = state.trigger_depth.saturating_sub(1);
        });
    }
}
