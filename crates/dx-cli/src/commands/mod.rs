//! CLI command implementations

pub(crate) mod analyze;
pub(crate) mod common;
pub(crate) mod convert;
pub(crate) mod dialects;
pub(crate) mod segment;
