//! Tokenizer strategies for post text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Splits post text into tokens
///
/// Any `Fn(&str) -> Vec<String>` is a tokenizer, so callers can pass a
/// closure or a plain function.
///
/// # Examples
///
/// ```
/// use tagduel_domain::tokenize::{Tokenizer, split_whitespace_tokens};
///
/// let lowercase = |text: &str| -> Vec<String> {
///     text.split_whitespace().map(str::to_lowercase).collect()
/// };
///
/// assert_eq!(lowercase.tokenize("Hello World"), vec!["hello", "world"]);
/// assert_eq!(split_whitespace_tokens.tokenize(" a  b "), vec!["a", "b"]);
/// ```
pub trait Tokenizer {
    /// Tokenize the given text
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Default tokenizer: split on runs of whitespace
///
/// Leading and trailing whitespace never produce empty tokens.
pub fn split_whitespace_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Word tokenizer: runs of word characters, punctuation dropped
pub fn word_tokens(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Named tokenizer choice for configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// [`split_whitespace_tokens`]
    #[default]
    Whitespace,
    /// [`word_tokens`]
    Words,
}

impl TokenizerKind {
    /// Resolve to the tokenizer function
    pub fn as_fn(self) -> fn(&str) -> Vec<String> {
        match self {
            TokenizerKind::Whitespace => split_whitespace_tokens,
            TokenizerKind::Words => word_tokens,
        }
    }
}
