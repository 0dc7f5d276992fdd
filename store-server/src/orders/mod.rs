//! Order domain: numbering, pricing snapshot, state machines, orchestration

pub mod money;
pub mod number;
pub mod service;
pub mod snapshot;
pub mod state_machine;
