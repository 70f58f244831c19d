//! Building blocks of the `s7set` command.

#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod plc;
pub mod session;
pub mod value;

pub use error::{ErrorKind, SetError};
