//! Command implementations.
//!
//! Each subcommand is implemented in its own module for clean separation.

pub(crate) mod list;
pub(crate) mod receive;
pub(crate) mod send;
pub(crate) mod terminal;
