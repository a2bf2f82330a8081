//! Orders
//!
//! Orders are created exactly once per successful checkout and never
//! deleted. After creation only the status moves, along a fixed state
//! machine.

pub mod errors;
pub mod factory;
pub mod models;
pub mod numbers;
pub(crate) mod repository;
pub mod service;

pub use errors::OrdersServiceError;
pub use service::*;
