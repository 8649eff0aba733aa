//! Library crate for darts-live-back, exposing modules for binaries and integration tests.
//!
//! The engine scores live 501 double-out matches (first to 3 legs): a pure
//! rule validator, a match/leg/turn state machine, and a concurrent registry
//! of in-progress matches that hands finished matches to persistence.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
