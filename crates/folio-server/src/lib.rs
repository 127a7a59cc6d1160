//! # Folio Server Library
//!
//! Router, dependency injection and startup helpers for the Folio server.

pub mod app;
pub mod di;
pub mod startup;
