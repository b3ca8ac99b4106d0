//! Keyword-vs-message decision procedure.

use parrot_core::config::MatcherConfig;
use regex::RegexBuilder;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::tokenizer::segment;

/// Keywords starting with this prefix are treated as regular expressions.
pub const REGEX_PREFIX: &str = "re:";

/// Keywords with at most this many tokens need every token present.
const SHORT_KEYWORD_TOKENS: usize = 2;

/// Minimum share (percent, inclusive) of longer keywords' tokens that must appear.
const COVERAGE_THRESHOLD_PERCENT: usize = 70;

/// Upper bound on a compiled keyword regex.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

static DEFAULT_MATCHER: LazyLock<Matcher> =
    LazyLock::new(|| Matcher::from_config(&MatcherConfig::default()));

/// Which strategy produced a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Substring,
    Regex,
    TokenCoverage,
    CoreWord(String),
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Substring => f.write_str("substring"),
            Self::Regex => f.write_str("regex"),
            Self::TokenCoverage => f.write_str("token coverage"),
            Self::CoreWord(word) => write!(f, "core word '{word}'"),
        }
    }
}

/// Fuzzy matcher holding the core-word vocabulary.
///
/// Matching is a pure function of `(keyword, message)` and the vocabulary,
/// so one instance can be shared across tasks.
#[derive(Debug, Clone)]
pub struct Matcher {
    core_words: Vec<String>,
}

impl Matcher {
    /// Build a matcher from an explicit vocabulary. Empty and repeated words are skipped.
    pub fn new<I, S>(core_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let core_words = core_words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.is_empty() && seen.insert(w.clone()))
            .collect();
        Self { core_words }
    }

    /// Flatten the per-locale vocabulary (locales in key order).
    pub fn from_config(config: &MatcherConfig) -> Self {
        Self::new(config.core_words.values().flatten().cloned())
    }

    pub fn core_words(&self) -> &[String] {
        &self.core_words
    }

    /// Whether `message` triggers `keyword`.
    pub fn is_match(&self, keyword: &str, message: &str) -> bool {
        self.explain(keyword, message).is_some()
    }

    /// The first strategy that matches, or `None`.
    pub fn explain(&self, keyword: &str, message: &str) -> Option<Strategy> {
        if keyword.is_empty() || message.is_empty() {
            return None;
        }

        if message.contains(keyword) {
            return Some(Strategy::Substring);
        }

        if regex_matches(keyword, message) {
            return Some(Strategy::Regex);
        }

        if token_coverage_matches(keyword, message) {
            return Some(Strategy::TokenCoverage);
        }

        self.core_word_match(keyword, message)
            .map(|word| Strategy::CoreWord(word.to_string()))
    }

    /// First core word present in both strings whose removal leaves at least
    /// one character in common.
    fn core_word_match(&self, keyword: &str, message: &str) -> Option<&str> {
        self.core_words
            .iter()
            .map(String::as_str)
            .find(|word| {
                if !keyword.contains(word) || !message.contains(word) {
                    return false;
                }
                let keyword_rest: HashSet<char> = keyword.replacen(word, "", 1).chars().collect();
                message
                    .replacen(word, "", 1)
                    .chars()
                    .any(|c| keyword_rest.contains(&c))
            })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

/// Match with the default vocabulary.
pub fn is_match(keyword: &str, message: &str) -> bool {
    DEFAULT_MATCHER.is_match(keyword, message)
}

fn regex_matches(keyword: &str, message: &str) -> bool {
    let Some(pattern) = keyword.strip_prefix(REGEX_PREFIX) else {
        return false;
    };

    match RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
    {
        Ok(re) => re.is_match(message),
        Err(e) => {
            debug!("ignoring invalid keyword regex {pattern:?}: {e}");
            false
        }
    }
}

fn token_coverage_matches(keyword: &str, message: &str) -> bool {
    let keyword_tokens = segment(keyword);
    if keyword_tokens.is_empty() {
        return false;
    }
    let message_tokens: HashSet<&str> = segment(message).into_iter().collect();

    if keyword_tokens.len() <= SHORT_KEYWORD_TOKENS {
        return keyword_tokens.iter().all(|t| message_tokens.contains(t));
    }

    let distinct: HashSet<&str> = keyword_tokens.iter().copied().collect();
    let present = distinct
        .iter()
        .filter(|t| message_tokens.contains(*t))
        .count();

    present * 100 >= keyword_tokens.len() * COVERAGE_THRESHOLD_PERCENT
}
