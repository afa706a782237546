use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_SELECTOR_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\.(-?[_a-zA-Z][\w-]*)").unwrap());

/// Classes that must stay global once the style sheet becomes a CSS module,
/// `at-` is the prefix of the Taro UI component classes
pub fn default_global_class_patterns() -> Vec<Regex> {
  vec![Regex::new(r"^at-").unwrap()]
}

/// Wrap class selectors matching one of `patterns` in `:global(...)`.
///
/// Only rule selectors are touched. Declarations, at-rule preludes, comments,
/// strings and `#{}` interpolations are copied as they are. Returns `None`
/// when no selector had to change.
pub fn preserve_global_selectors(source: &str, patterns: &[Regex]) -> Option<String> {
  if patterns.is_empty() {
    return None;
  }

  let bytes = source.as_bytes();
  let mut output = String::with_capacity(source.len());
  let mut copied_until = 0;
  let mut changed = false;

  let mut prelude_start = 0;
  let mut protected: Vec<Range<usize>> = vec![];
  let mut paren_depth = 0usize;
  let mut index = 0;

  while index < bytes.len() {
    match bytes[index] {
      b'/' if bytes.get(index + 1) == Some(&b'*') => {
        let end = source[index + 2..]
          .find("*/")
          .map_or(bytes.len(), |offset| index + 2 + offset + 2);
        protected.push(index..end);
        index = end;
        continue;
      }
      b'/' if bytes.get(index + 1) == Some(&b'/') && paren_depth == 0 => {
        let end = source[index..]
          .find('\n')
          .map_or(bytes.len(), |offset| index + offset);
        protected.push(index..end);
        index = end;
        continue;
      }
      quote @ (b'"' | b'\'') => {
        let end = string_end(bytes, index, quote);
        protected.push(index..end);
        index = end;
        continue;
      }
      b'#' if bytes.get(index + 1) == Some(&b'{') => {
        let end = interpolation_end(bytes, index);
        protected.push(index..end);
        index = end;
        continue;
      }
      b'(' => paren_depth += 1,
      b')' => paren_depth = paren_depth.saturating_sub(1),
      b'{' if paren_depth == 0 => {
        let prelude = &source[prelude_start..index];
        if !is_at_rule(prelude, prelude_start, &protected) {
          if let Some(selector) =
            wrap_global_classes(prelude, prelude_start, &protected, patterns)
          {
            output.push_str(&source[copied_until..prelude_start]);
            output.push_str(&selector);
            copied_until = index;
            changed = true;
          }
        }
        prelude_start = index + 1;
        protected.clear();
      }
      b'}' | b';' if paren_depth == 0 => {
        prelude_start = index + 1;
        protected.clear();
      }
      _ => {}
    }
    index += 1;
  }

  if !changed {
    return None;
  }

  output.push_str(&source[copied_until..]);
  Some(output)
}

fn is_at_rule(prelude: &str, offset: usize, protected: &[Range<usize>]) -> bool {
  prelude
    .char_indices()
    .find(|(index, c)| {
      !c.is_whitespace() && !protected.iter().any(|range| range.contains(&(offset + index)))
    })
    .is_some_and(|(_, c)| c == '@')
}

fn string_end(bytes: &[u8], start: usize, quote: u8) -> usize {
  let mut index = start + 1;
  while index < bytes.len() {
    match bytes[index] {
      b'\\' => index += 2,
      byte if byte == quote => return index + 1,
      b'\n' => return index,
      _ => index += 1,
    }
  }
  bytes.len()
}

fn interpolation_end(bytes: &[u8], start: usize) -> usize {
  let mut depth = 0usize;
  for (index, byte) in bytes.iter().enumerate().skip(start + 1) {
    match byte {
      b'{' => depth += 1,
      b'}' => {
        depth -= 1;
        if depth == 0 {
          return index + 1;
        }
      }
      _ => {}
    }
  }
  bytes.len()
}

/// `protected` holds absolute ranges, `offset` is where `prelude` starts
fn wrap_global_classes(
  prelude: &str,
  offset: usize,
  protected: &[Range<usize>],
  patterns: &[Regex],
) -> Option<String> {
  let mut output = String::with_capacity(prelude.len());
  let mut copied_until = 0;

  for captures in CLASS_SELECTOR_REGEX.captures_iter(prelude) {
    let (Some(selector), Some(class_name)) = (captures.get(0), captures.get(1)) else {
      continue;
    };

    let absolute_start = offset + selector.start();
    let is_protected = protected
      .iter()
      .any(|range| range.contains(&absolute_start));
    let preceding = &prelude[..selector.start()];
    let is_wrapped = preceding.ends_with(":global(") || preceding.trim_end().ends_with(":global");

    if is_protected
      || is_wrapped
      || !patterns
        .iter()
        .any(|pattern| pattern.is_match(class_name.as_str()))
    {
      continue;
    }

    output.push_str(&prelude[copied_until..selector.start()]);
    output.push_str(":global(");
    output.push_str(selector.as_str());
    output.push(')');
    copied_until = selector.end();
  }

  if copied_until == 0 {
    return None;
  }

  output.push_str(&prelude[copied_until..]);
  Some(output)
}
