use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use css_module_migrate_classnames::FusedExpressionPolicy;

use crate::config::{compile_patterns, MigrateOptions, ProjectConfig, QuoteStyle};

/// Migrate a project from global style sheets to CSS modules
#[derive(Debug, Parser)]
#[command(name = "css-module-migrate", version, about)]
pub struct Args {
  /// The project root directory, for example "./"
  pub project_dir: PathBuf,

  /// Print the migrated scripts instead of writing them, no file is changed
  #[arg(short, long)]
  pub dry: bool,

  /// Skip scripts matching this glob, relative to the project root. Repeat
  /// the flag for more globs, commas belong to brace sets like `{a,b}`
  #[arg(long = "ignore-pattern")]
  pub ignore_patterns: Vec<String>,

  /// Keep classes matching these regular expressions global [default: ^at-]
  #[arg(long = "global-class-pattern")]
  pub global_class_patterns: Vec<String>,

  /// JSX attributes holding class names [default: className]
  #[arg(long = "attribute", value_delimiter = ',')]
  pub attribute_names: Vec<String>,

  /// Package imported when a script needs a class name merge utility
  #[arg(long, env = "CSS_MODULE_MIGRATE_MERGE_PACKAGE")]
  pub merge_package: Option<String>,

  /// Local name of an inserted merge utility import
  #[arg(long, env = "CSS_MODULE_MIGRATE_MERGE_IMPORT_NAME")]
  pub merge_import_name: Option<String>,

  /// Quotes of inserted string literals
  #[arg(long, value_enum)]
  pub quote: Option<QuoteStyle>,

  /// Fail scripts where a class name is glued to an expression containing
  /// module classes instead of merging them
  #[arg(long)]
  pub strict_fusion: bool,

  /// Rename style sheets without `git mv`
  #[arg(long)]
  pub no_git: bool,
}

impl Args {
  /// Layer the command line over the project's package.json config
  pub fn into_options(self) -> anyhow::Result<MigrateOptions> {
    let project_root = std::fs::canonicalize(&self.project_dir)
      .with_context(|| format!("Invalid project directory {}", self.project_dir.display()))?;
    let project_config = ProjectConfig::load(&project_root)?;
    let mut options = MigrateOptions::from_project_config(project_root, project_config)?;

    options.dry_run = self.dry;
    options.ignore_patterns.extend(self.ignore_patterns);
    if !self.global_class_patterns.is_empty() {
      options.global_class_patterns = compile_patterns(&self.global_class_patterns)?;
    }
    if !self.attribute_names.is_empty() {
      options.attribute_names = self.attribute_names;
    }
    if let Some(merge_package) = self.merge_package {
      options.set_merge_package(merge_package);
    }
    if let Some(merge_import_name) = self.merge_import_name {
      options.merge_import_name = merge_import_name;
    }
    if let Some(quote) = self.quote {
      options.quote = quote;
    }
    if self.strict_fusion {
      options.fused_expression_policy = FusedExpressionPolicy::Reject;
    }
    if self.no_git {
      options.use_git = false;
    }

    Ok(options)
  }
}
