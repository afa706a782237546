//! Everything the migration needs to know about a style sheet: which of its
//! classes become CSS module classes, and how its source has to change so
//! the classes that must stay global keep working.

use std::path::{Path, PathBuf};

use css_module_migrate_classnames::ClassNameMap;
use regex::Regex;

mod compile;
mod global_selectors;
mod modules;

pub use compile::{compile_style, rewrite_tilde_imports, StyleLanguage};
pub use global_selectors::{default_global_class_patterns, preserve_global_selectors};
pub use modules::class_name_map;

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
  #[error("Failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("No `{compiler}` executable found to compile {}", path.display())]
  MissingCompiler {
    compiler: &'static str,
    path: PathBuf,
  },
  #[error("`{compiler}` failed to compile {}: {stderr}", path.display())]
  CompilerFailed {
    compiler: &'static str,
    path: PathBuf,
    stderr: String,
  },
  #[error("Invalid CSS in {}: {message}", path.display())]
  InvalidCss { path: PathBuf, message: String },
}

#[derive(Debug, Clone)]
pub struct StyleOptions {
  pub project_root: PathBuf,
  /// Classes matching one of these stay global
  pub global_class_patterns: Vec<Regex>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleAnalysis {
  pub class_name_map: ClassNameMap,
  /// The source with global classes wrapped in `:global()`, when any were found
  pub preserved_source: Option<String>,
}

pub struct StyleAnalyzer {
  options: StyleOptions,
}

impl StyleAnalyzer {
  pub fn new(options: StyleOptions) -> Self {
    StyleAnalyzer { options }
  }

  /// Analyze a global style sheet as if it already were a CSS module.
  ///
  /// Nothing is written, the caller decides whether `preserved_source`
  /// replaces the file.
  pub fn analyze(&self, path: &Path) -> Result<StyleAnalysis, StyleError> {
    let source = std::fs::read_to_string(path).map_err(|source| StyleError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let preserved_source =
      preserve_global_selectors(&source, &self.options.global_class_patterns);
    let css = compile_style(
      path,
      preserved_source.as_deref().unwrap_or(&source),
      &self.options.project_root,
    )?;
    let class_name_map = class_name_map(&css, path)?;

    tracing::debug!(
      classes = class_name_map.len(),
      preserved = preserved_source.is_some(),
      "Analyzed {}",
      path.display()
    );

    Ok(StyleAnalysis {
      class_name_map,
      preserved_source,
    })
  }
}

#[cfg(test)]
mod tests {
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_analyze_css_file() {
    let project = tempfile::tempdir().unwrap();
    let path = project.path().join("a.css");
    std::fs::write(
      &path,
      indoc! {r#"
        .card .at-icon { color: red; }
        .color--red { color: red; }
      "#},
    )
    .unwrap();

    let analyzer = StyleAnalyzer::new(StyleOptions {
      project_root: project.path().to_path_buf(),
      global_class_patterns: default_global_class_patterns(),
    });
    let analysis = analyzer.analyze(&path).unwrap();

    let mut locals: Vec<&str> = analysis
      .class_name_map
      .keys()
      .map(|key| key.as_str())
      .collect();
    locals.sort();
    assert_eq!(locals, vec!["card", "colorRed"]);
    assert_eq!(
      analysis.preserved_source.as_deref(),
      Some(indoc! {r#"
        .card :global(.at-icon) { color: red; }
        .color--red { color: red; }
      "#})
    );

    // the file itself is left alone
    assert!(std::fs::read_to_string(&path).unwrap().contains(".card .at-icon"));
  }

  #[test]
  fn test_analyze_missing_file() {
    let analyzer = StyleAnalyzer::new(StyleOptions {
      project_root: PathBuf::from("/"),
      global_class_patterns: vec![],
    });

    assert!(matches!(
      analyzer.analyze(Path::new("/does/not/exist.css")),
      Err(StyleError::Io { .. })
    ));
  }
}
