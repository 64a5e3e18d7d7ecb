//! Times generating a large random sample and averaging it.
//!
//! The core is [`Reducer::mean`], which averages a slice with one of several
//! [`Summation`] strategies, most notably a multi-lane unrolled loop. The rest
//! of the crate is the benchmark driver around it.

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod mean;
pub mod sampler;
pub mod stats;

pub use error::{Error, Result};
pub use mean::{Lanes, Reducer, Summation, mean};
