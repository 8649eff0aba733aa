//! Persistence seam: entities, storage errors, and store traits.

pub mod match_store;
pub mod models;
pub mod storage;
