//! Product Handlers

pub(crate) mod stock;
