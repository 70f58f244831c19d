//! S7comm encoding and ISO-on-TCP framing in pure Rust.
//!
//! `s7set-core` encodes and decodes the TPKT, COTP and S7 telegrams needed to
//! open a session with a Siemens S7 CPU and write into one of its data blocks.
//! It works on caller-owned buffers and does not allocate.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

pub mod encoding;
pub mod error;
pub mod frame;
pub mod pdu;

pub use error::{DecodeError, EncodeError};
