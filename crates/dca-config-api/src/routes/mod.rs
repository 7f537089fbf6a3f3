//! Route modules, one router per concern.

pub mod config;
pub mod validate;
