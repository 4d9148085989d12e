//! Generic finite state machine
//!
//! States are a closed set of `Copy` values (normally a fieldless enum),
//! so a transition target always exists. The machine only owns the current
//! state; everything the states read or mutate lives in the context `C`
//! passed into each hook.
//!
//! Transition order is fixed: log, `on_exit` of the old state, swap,
//! `on_enter` of the new state.

use core::fmt::Debug;

/// Lifecycle hooks of one state
pub trait State<C>: Copy + Eq + Debug {
    /// Runs once when the state becomes current.
    fn on_enter(self, _ctx: &mut C) {}

    /// Runs once when the state stops being current.
    fn on_exit(self, _ctx: &mut C) {}

    /// Runs every cycle. `Some(next)` requests a transition.
    fn update(self, ctx: &mut C) -> Option<Self>;
}

/// State machine driver
#[derive(Debug, Clone, Copy)]
pub struct StateMachine<S> {
    current: Option<S>,
}

impl<S: Copy + Eq + Debug> StateMachine<S> {
    /// Machine that has not been started
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Current state, `None` before `start`
    #[inline]
    pub fn current(&self) -> Option<S> {
        self.current
    }

    /// Enter `initial`
    pub fn start<C>(&mut self, initial: S, ctx: &mut C)
    where
        S: State<C>,
    {
        debug_assert!(self.current.is_none(), "state machine started twice");
        log::info!("started in {:?}", initial);
        self.current = Some(initial);
        initial.on_enter(ctx);
    }

    /// Run one `update` of the current state and apply the transition it asks for.
    ///
    /// Returns `(from, to)` when a transition happened. Does nothing before `start`.
    pub fn run_cycle<C>(&mut self, ctx: &mut C) -> Option<(S, S)>
    where
        S: State<C>,
    {
        let from = self.current?;
        let to = from.update(ctx)?;
        self.transition(from, to, ctx);
        Some((from, to))
    }

    fn transition<C>(&mut self, from: S, to: S, ctx: &mut C)
    where
        S: State<C>,
    {
        log::info!("transition: {:?} -> {:?}", from, to);
        from.on_exit(ctx);
        self.current = Some(to);
        to.on_enter(ctx);
    }
}
