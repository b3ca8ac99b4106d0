//! # parrot-matcher
//!
//! Decides whether a group message triggers a registered keyword.
//!
//! Strategies run in order and the first success wins:
//! substring, `re:` regex, token coverage, core-word overlap.

pub mod matcher;
pub mod tokenizer;

pub use matcher::{is_match, Matcher, Strategy};
pub use tokenizer::segment;
