//! Command implementations.

pub mod check;
pub mod fetch;
pub mod tags;
pub mod watch;
