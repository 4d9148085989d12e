//! Lamp control
//!
//! The scheduler loop calls `StateMachine::run_cycle` once per tick; the
//! current `LampState` polls the live-status source through the shared
//! `LampContext` and decides the next state.

pub mod context;
pub mod desk;
pub mod fsm;
pub mod states;

pub use context::{BroadcastSnapshot, LampContext, PollGate, VideoRefresh};
pub use desk::{Desk, Desklight};
pub use fsm::{State, StateMachine};
pub use states::LampState;
