//! Shared helpers for file handling and argument validation.

pub mod io;
pub mod validation;
