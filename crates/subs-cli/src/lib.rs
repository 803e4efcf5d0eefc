//! CLI library components for the subscription engine.

pub mod logging;
pub mod validation;
