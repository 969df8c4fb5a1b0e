//! Domain layer: storage rows, event kinds, configuration and the sink port.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
