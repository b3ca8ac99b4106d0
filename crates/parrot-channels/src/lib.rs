//! # parrot-channels
//!
//! Messaging platform integrations for Parrot.

pub mod telegram;
mod utils;
