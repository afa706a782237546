use std::path::Path;

use css_module_migrate_classnames::{local_name, ClassNameMap};
use lightningcss::css_modules;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserFlags, ParserOptions, StyleSheet};

use crate::StyleError;

/// Compile `css` as a CSS module and collect the names it exports.
///
/// Keys are converted with [local_name] so they can be looked up with the
/// tokens of a className value.
pub fn class_name_map(css: &str, path: &Path) -> Result<ClassNameMap, StyleError> {
  let invalid_css = |message: String| StyleError::InvalidCss {
    path: path.to_path_buf(),
    message,
  };

  let stylesheet = StyleSheet::parse(
    css,
    ParserOptions {
      filename: path.to_string_lossy().into_owned(),
      css_modules: Some(css_modules::Config::default()),
      source_index: Default::default(),
      error_recovery: false,
      warnings: None,
      flags: ParserFlags::empty(),
    },
  )
  .map_err(|err| invalid_css(err.to_string()))?;

  let result = stylesheet
    .to_css(PrinterOptions::default())
    .map_err(|err| invalid_css(err.to_string()))?;

  Ok(
    result
      .exports
      .unwrap_or_default()
      .into_iter()
      .map(|(name, export)| (local_name(&name), export.name))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use indoc::indoc;

  use super::*;

  #[test]
  fn test_class_name_map() {
    let css = indoc! {r#"
      .card { color: red; }
      .color--red.bg-white { color: red; }
      :global(.at-icon) .card { color: blue; }
    "#};

    let map = class_name_map(css, Path::new("src/a.css")).unwrap();
    let mut locals: Vec<&str> = map.keys().map(|key| key.as_str()).collect();
    locals.sort();

    assert_eq!(locals, vec!["bgWhite", "card", "colorRed"]);
    assert!(map["card"].contains("card"));
    assert!(!map.contains_key("atIcon"));
  }

  #[test]
  fn test_invalid_css() {
    let result = class_name_map(".card { color: red; } }}} .{", Path::new("src/a.css"));
    assert!(matches!(result, Err(StyleError::InvalidCss { .. })));
  }
}
