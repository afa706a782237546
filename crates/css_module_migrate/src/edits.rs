use std::cmp::Reverse;
use std::ops::Range;

/// Replace `range` of the original source with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
  pub range: Range<usize>,
  pub text: String,
}

/// Splice `edits` into `source`.
///
/// An edit nested in an earlier, wider edit is dropped, the outer edit was
/// printed from a tree that already contains it.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> String {
  edits.sort_by_key(|edit| (edit.range.start, Reverse(edit.range.end)));

  let mut output = String::with_capacity(source.len());
  let mut copied_until = 0;
  for edit in edits {
    if edit.range.start < copied_until {
      continue;
    }

    output.push_str(&source[copied_until..edit.range.start]);
    output.push_str(&edit.text);
    copied_until = edit.range.end;
  }
  output.push_str(&source[copied_until..]);

  output
}

/// The line terminator of `source`, `\n` when it has no line break
pub fn detect_newline(source: &str) -> &'static str {
  match source.find('\n') {
    Some(index) if source[..index].ends_with('\r') => "\r\n",
    _ => "\n",
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn edit(range: Range<usize>, text: &str) -> TextEdit {
    TextEdit {
      range,
      text: text.to_string(),
    }
  }

  #[test]
  fn test_apply_edits() {
    let source = "let a = 1; let b = 2;";
    let edits = vec![
      edit(19..20, "4"),
      edit(8..9, "3"),
      edit(10..10, " let c = 5;"),
    ];

    assert_eq!(
      apply_edits(source, edits),
      "let a = 3; let c = 5; let b = 4;"
    );
  }

  #[test]
  fn test_nested_edits_are_dropped() {
    let source = "f(g(x))";
    let edits = vec![edit(4..5, "y"), edit(2..6, "h(z)")];

    assert_eq!(apply_edits(source, edits), "f(h(z))");
  }

  #[test]
  fn test_insert_after_replaced_range() {
    let source = "import './a.css';\nrun();";
    let edits = vec![
      edit(17..17, "\nimport cx from 'clsx';"),
      edit(0..17, "import styles from './a.module.css';"),
    ];

    assert_eq!(
      apply_edits(source, edits),
      "import styles from './a.module.css';\nimport cx from 'clsx';\nrun();"
    );
  }

  #[test]
  fn test_detect_newline() {
    assert_eq!(detect_newline("a\r\nb"), "\r\n");
    assert_eq!(detect_newline("a\nb\r\n"), "\n");
    assert_eq!(detect_newline("a"), "\n");
  }
}
