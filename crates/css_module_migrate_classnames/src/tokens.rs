use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WHITESPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TOKEN_OR_WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+|\S+").unwrap());
static HYPHEN_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+([A-Za-z0-9_])").unwrap());

/// Split class text on runs of whitespace.
///
/// Runs never produce empty tokens between two classes, but leading and
/// trailing whitespace produce an empty first or last token so the edges of
/// the text survive a `join(" ")`.
///
/// ```
/// use css_module_migrate_classnames::split_tokens;
///
/// assert_eq!(split_tokens("card  bg-white"), vec!["card", "bg-white"]);
/// assert_eq!(split_tokens(" card"), vec!["", "card"]);
/// ```
pub fn split_tokens(text: &str) -> Vec<&str> {
  WHITESPACE_RUN_REGEX.split(text).collect()
}

/// The classes of `text`, without the empty edge tokens
pub fn class_list(text: &str) -> Vec<&str> {
  split_tokens(text)
    .into_iter()
    .filter(|token| !token.is_empty())
    .collect()
}

/// Split class text into classes and the whitespace runs between them, the
/// pieces concatenate back to `text`
pub fn split_keeping_whitespace(text: &str) -> Vec<&str> {
  TOKEN_OR_WHITESPACE_REGEX
    .find_iter(text)
    .map(|piece| piece.as_str())
    .collect()
}

/// Convert a class token to the name CSS modules export it under.
///
/// Every run of hyphens followed by a word character collapses into that
/// character upper-cased, so `color--red` becomes `colorRed`. A trailing
/// hyphen is kept.
pub fn local_name(token: &str) -> String {
  HYPHEN_RUN_REGEX
    .replace_all(token, |captures: &Captures<'_>| captures[1].to_uppercase())
    .into_owned()
}
