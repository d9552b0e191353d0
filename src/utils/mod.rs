//! Utility modules

pub mod memory_transport;
pub mod validation;

pub use memory_transport::*;
pub use validation::*;
