#![forbid(unsafe_code)]

pub mod builder;
pub mod model;
pub mod sampler;

pub use builder::{BuildError, SessionBuilder};
pub use sampler::{Sampler, SamplerError};
