//! # parrot-core
//!
//! Core types, traits, configuration, and error handling for the Parrot bot.

pub mod config;
pub mod error;
pub mod message;
pub mod qa;
pub mod traits;

pub use config::shellexpand;
