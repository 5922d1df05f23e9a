//! Sink contract and shipped sink implementations.

pub mod base;
pub mod memory;
pub mod postgres;

pub use base::{Sink, WriteContext};
