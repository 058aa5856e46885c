//! Common types, traits, and error definitions for jammer_motion
//!
//! This module provides the foundational building blocks used across
//! the world model, planners and motion strategies.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
