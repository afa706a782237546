use swc_core::ecma::ast::Str;
use swc_core::ecma::visit::VisitMut;

use crate::QuoteStyle;

/// Gives every synthesized string literal raw text in the configured quote
/// style.
///
/// Literals carried over from the source keep their raw text.
pub struct QuoteNormalizer {
  quote: QuoteStyle,
}

impl QuoteNormalizer {
  pub fn new(quote: QuoteStyle) -> Self {
    QuoteNormalizer { quote }
  }
}

impl VisitMut for QuoteNormalizer {
  fn visit_mut_str(&mut self, node: &mut Str) {
    if node.raw.is_none() {
      node.raw = Some(quote_string(&node.value, self.quote).into());
    }
  }
}

pub fn quote_string(value: &str, quote: QuoteStyle) -> String {
  let quote = quote.as_char();
  let mut quoted = String::with_capacity(value.len() + 2);

  quoted.push(quote);
  for c in value.chars() {
    match c {
      '\\' => quoted.push_str("\\\\"),
      '\n' => quoted.push_str("\\n"),
      '\r' => quoted.push_str("\\r"),
      '\u{2028}' => quoted.push_str("\\u2028"),
      '\u{2029}' => quoted.push_str("\\u2029"),
      c if c == quote => {
        quoted.push('\\');
        quoted.push(c);
      }
      c => quoted.push(c),
    }
  }
  quoted.push(quote);

  quoted
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use swc_core::common::DUMMY_SP;
  use swc_core::ecma::visit::VisitMutWith;

  use super::*;

  #[test]
  fn test_quote_string() {
    assert_eq!(quote_string("bg-white", QuoteStyle::Single), "'bg-white'");
    assert_eq!(quote_string("bg-white", QuoteStyle::Double), "\"bg-white\"");
    assert_eq!(quote_string("it's", QuoteStyle::Single), "'it\\'s'");
    assert_eq!(quote_string("it's", QuoteStyle::Double), "\"it's\"");
    assert_eq!(quote_string("a\\b", QuoteStyle::Single), "'a\\\\b'");
  }

  #[test]
  fn test_raw_text_is_kept() {
    let mut synthesized = Str {
      span: DUMMY_SP,
      value: "card".into(),
      raw: None,
    };
    let mut original = Str {
      span: DUMMY_SP,
      value: "card".into(),
      raw: Some("\"card\"".into()),
    };

    let mut normalizer = QuoteNormalizer::new(QuoteStyle::Single);
    synthesized.visit_mut_with(&mut normalizer);
    original.visit_mut_with(&mut normalizer);

    assert_eq!(synthesized.raw.as_deref(), Some("'card'"));
    assert_eq!(original.raw.as_deref(), Some("\"card\""));
  }
}
