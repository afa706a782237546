use std::path::{Path, PathBuf};

use anyhow::Context;
use css_module_migrate_classnames::FusedExpressionPolicy;
use css_module_migrate_styles::default_global_class_patterns;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
  #[default]
  Single,
  Double,
}

impl QuoteStyle {
  pub fn as_char(self) -> char {
    match self {
      QuoteStyle::Single => '\'',
      QuoteStyle::Double => '"',
    }
  }
}

/// Settings under the `cssModuleMigrate` key of the project's package.json
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
  #[serde(default)]
  pub ignore_patterns: Vec<String>,
  pub global_class_patterns: Option<Vec<String>>,
  pub attribute_names: Option<Vec<String>>,
  pub merge_packages: Option<Vec<String>>,
  pub merge_package: Option<String>,
  pub merge_import_name: Option<String>,
  pub quote: Option<QuoteStyle>,
  #[serde(default)]
  pub strict_fusion: bool,
  pub git: Option<bool>,
}

#[derive(Deserialize)]
struct PackageJson {
  #[serde(rename = "cssModuleMigrate")]
  config: Option<ProjectConfig>,
}

impl ProjectConfig {
  /// Read the config of a project, a missing package.json or key is the
  /// default config
  pub fn load(project_root: &Path) -> anyhow::Result<Self> {
    let path = project_root.join("package.json");
    let contents = match std::fs::read_to_string(&path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ProjectConfig::default()),
      Err(err) => {
        return Err(err).with_context(|| format!("Failed to read {}", path.display()));
      }
    };

    let package_json: PackageJson = serde_json::from_str(&contents)
      .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(package_json.config.unwrap_or_default())
  }
}

/// Resolved settings of one migration run
#[derive(Debug, Clone)]
pub struct MigrateOptions {
  pub project_root: PathBuf,
  pub dry_run: bool,
  /// Globs relative to the project root, on top of the built in ones
  pub ignore_patterns: Vec<String>,
  pub global_class_patterns: Vec<Regex>,
  /// JSX attributes holding class names
  pub attribute_names: Vec<String>,
  /// Packages whose default export is a class name merge utility
  pub merge_packages: Vec<String>,
  /// Package imported when a file needs a merge utility and has none
  pub merge_package: String,
  pub merge_import_name: String,
  pub quote: QuoteStyle,
  pub fused_expression_policy: FusedExpressionPolicy,
  pub use_git: bool,
}

impl MigrateOptions {
  pub fn new(project_root: PathBuf) -> Self {
    MigrateOptions {
      project_root,
      dry_run: false,
      ignore_patterns: vec![],
      global_class_patterns: default_global_class_patterns(),
      attribute_names: vec!["className".to_string()],
      merge_packages: vec!["classnames".to_string(), "clsx".to_string()],
      merge_package: "classnames".to_string(),
      merge_import_name: "classNames".to_string(),
      quote: QuoteStyle::default(),
      fused_expression_policy: FusedExpressionPolicy::default(),
      use_git: true,
    }
  }

  pub fn from_project_config(project_root: PathBuf, config: ProjectConfig) -> anyhow::Result<Self> {
    let mut options = MigrateOptions::new(project_root);
    options.ignore_patterns = config.ignore_patterns;

    if let Some(patterns) = config.global_class_patterns {
      options.global_class_patterns = compile_patterns(&patterns)?;
    }
    if let Some(attribute_names) = config.attribute_names {
      options.attribute_names = attribute_names;
    }
    if let Some(merge_packages) = config.merge_packages {
      options.merge_packages = merge_packages;
    }
    if let Some(merge_package) = config.merge_package {
      options.set_merge_package(merge_package);
    }
    if let Some(merge_import_name) = config.merge_import_name {
      options.merge_import_name = merge_import_name;
    }
    if let Some(quote) = config.quote {
      options.quote = quote;
    }
    if config.strict_fusion {
      options.fused_expression_policy = FusedExpressionPolicy::Reject;
    }
    if let Some(git) = config.git {
      options.use_git = git;
    }

    Ok(options)
  }

  /// The inserted merge utility import always counts as a merge package
  pub fn set_merge_package(&mut self, merge_package: String) {
    if !self.merge_packages.contains(&merge_package) {
      self.merge_packages.push(merge_package.clone());
    }
    self.merge_package = merge_package;
  }
}

pub fn compile_patterns(patterns: &[String]) -> anyhow::Result<Vec<Regex>> {
  patterns
    .iter()
    .map(|pattern| {
      Regex::new(pattern).with_context(|| format!("Invalid global class pattern {pattern:?}"))
    })
    .collect()
}
