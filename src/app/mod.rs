//! Application layer of the binary: configuration, logging, run, exit.

pub(crate) mod exit_handler;
pub(crate) mod runtime;
pub(crate) mod terminal;
pub(crate) mod validation;
