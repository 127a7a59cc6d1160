//! # Folio Core
//!
//! Core types and error definitions shared by every Folio crate:
//! the unified error type, the request identity handed to the cache layer,
//! and logging initialisation.

pub mod error;
pub mod identity;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use identity::*;
pub use result::*;
