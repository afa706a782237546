//! Migrate a React project from global style sheets to CSS modules.
//!
//! Scripts importing a global style sheet (`import './Card.scss'`) are
//! switched to a default import of the module version of the sheet and their
//! class name attributes reference the module object. The sheets themselves
//! are renamed to `*.module.*` once every script importing them migrated.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use css_module_migrate_styles::{StyleAnalyzer, StyleOptions};
use rayon::prelude::*;

mod bindings;
mod class_name_visitor;
mod cli;
mod config;
mod discovery;
mod edits;
mod merge;
mod quote;
mod report;
mod script;
mod style_imports;
mod vcs;

pub use cli::Args;
pub use config::{MigrateOptions, ProjectConfig, QuoteStyle};
pub use discovery::discover_scripts;
pub use report::{FailedFile, MigrationReport};
pub use script::{migrate_script, scan_script, StyleTable};
pub use style_imports::{is_global_style, module_style_path, module_style_specifier};

/// Run a migration over a whole project.
///
/// Scripts and style sheets are processed in parallel, files are only written
/// at the end and never on a dry run. Style sheets are renamed before the
/// scripts importing them are written. A style sheet and everything importing
/// it stay untouched when any of its importers fails to migrate, or when the
/// sheet itself can't be renamed.
pub fn migrate(options: &MigrateOptions) -> anyhow::Result<MigrationReport> {
  let mut report = MigrationReport::default();

  let scripts = discover_scripts(&options.project_root, &options.ignore_patterns)?;
  tracing::info!(
    "Found {} scripts in {}",
    scripts.len(),
    options.project_root.display()
  );

  let scans: Vec<(PathBuf, anyhow::Result<Vec<PathBuf>>)> = scripts
    .into_par_iter()
    .map(|path| {
      let style_paths = read_file(&path).and_then(|source| scan_script(&path, &source));
      (path, style_paths)
    })
    .collect();

  let mut script_styles: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
  let mut importers: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
  for (path, style_paths) in scans {
    match style_paths {
      Ok(style_paths) if style_paths.is_empty() => report.ignored.push(path),
      Ok(style_paths) => {
        for style_path in &style_paths {
          importers
            .entry(style_path.clone())
            .or_default()
            .push(path.clone());
        }
        script_styles.insert(path, style_paths);
      }
      Err(err) => report.fail(path, format!("{err:#}")),
    }
  }
  report.styles = importers.keys().cloned().collect();

  let (styles, preserved_sources) = analyze_styles(&report.styles.clone(), options, &mut report);

  let results: Vec<(PathBuf, anyhow::Result<Option<String>>)> = script_styles
    .keys()
    .cloned()
    .collect::<Vec<_>>()
    .into_par_iter()
    .map(|path| {
      let code = read_file(&path).and_then(|source| migrate_script(&path, &source, &styles, options));
      (path, code)
    })
    .collect();

  let mut migrated = vec![];
  let mut blocked_scripts = HashSet::new();
  for (path, result) in results {
    match result {
      Ok(Some(code)) => migrated.push((path, code)),
      // the script changed since it was scanned
      Ok(None) => report.ignored.push(path),
      Err(err) => {
        blocked_scripts.insert(path.clone());
        report.fail(path, format!("{err:#}"));
      }
    }
  }

  let mut failed_styles: HashSet<PathBuf> = report
    .styles
    .iter()
    .filter(|path| !styles.is_analyzed(path))
    .cloned()
    .collect();
  for style_path in report.styles.clone() {
    let module_path = module_style_path(&style_path);
    if !failed_styles.contains(&style_path) && module_path.exists() {
      let message = format!(
        "Cannot rename {}, {} already exists",
        style_path.display(),
        module_path.display()
      );
      report.fail(style_path.clone(), message);
      failed_styles.insert(style_path);
    }
  }

  let mut blocked_styles = failed_styles.clone();
  propagate_blocks(&script_styles, &importers, &mut blocked_scripts, &mut blocked_styles);

  // Sheets are renamed before any script is written, a failed rename still
  // blocks its importers
  let mut renamed = vec![];
  if !options.dry_run {
    for style_path in report.styles.clone() {
      if blocked_styles.contains(&style_path) {
        continue;
      }

      let module_path = module_style_path(&style_path);
      match migrate_style(&style_path, &module_path, preserved_sources.get(&style_path), options) {
        Ok(original_source) => renamed.push(RenamedStyle {
          style_path,
          module_path,
          original_source,
        }),
        Err(err) => {
          report.fail(style_path.clone(), format!("{err:#}"));
          blocked_styles.insert(style_path.clone());
          failed_styles.insert(style_path);
        }
      }
    }

    propagate_blocks(&script_styles, &importers, &mut blocked_scripts, &mut blocked_styles);
    for style in renamed.iter().filter(|style| blocked_styles.contains(&style.style_path)) {
      tracing::warn!("Restoring {}, it shares a script with a failed sheet", style.style_path.display());
      if let Err(err) = restore_style(style, options) {
        report.fail(style.style_path.clone(), format!("{err:#}"));
        failed_styles.insert(style.style_path.clone());
      }
    }
    renamed.retain(|style| !blocked_styles.contains(&style.style_path));
  }
  report.renamed = renamed.into_iter().map(|style| style.style_path).collect();

  for (path, code) in migrated {
    if blocked_scripts.contains(&path) {
      report.held_back.push(path);
    } else if options.dry_run {
      report.outputs.push((path.clone(), code));
      report.succeeded.push(path);
    } else {
      match std::fs::write(&path, code) {
        Ok(()) => {
          tracing::info!("Migrated {}", path.display());
          report.succeeded.push(path);
        }
        Err(err) => {
          let message = format!("Failed to write {}: {err}", path.display());
          report.fail(path, message);
        }
      }
    }
  }

  for style_path in report.styles.clone() {
    if blocked_styles.contains(&style_path) {
      if !failed_styles.contains(&style_path) {
        report.kept_styles.push(style_path);
      }
    } else if options.dry_run {
      tracing::info!(
        "Would rename {} to {}",
        style_path.display(),
        module_style_path(&style_path).display()
      );
    }
  }

  Ok(report)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
  std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Analyze every imported style sheet once.
///
/// Returns the class name maps and, for sheets with classes that must stay
/// global, the source to write before renaming.
fn analyze_styles(
  style_paths: &[PathBuf],
  options: &MigrateOptions,
  report: &mut MigrationReport,
) -> (StyleTable, HashMap<PathBuf, String>) {
  let analyzer = StyleAnalyzer::new(StyleOptions {
    project_root: options.project_root.clone(),
    global_class_patterns: options.global_class_patterns.clone(),
  });

  let analyses: Vec<_> = style_paths
    .par_iter()
    .map(|path| (path.clone(), analyzer.analyze(path)))
    .collect();

  let mut styles = StyleTable::default();
  let mut preserved_sources = HashMap::new();
  for (path, analysis) in analyses {
    match analysis {
      Ok(analysis) => {
        if let Some(preserved_source) = analysis.preserved_source {
          preserved_sources.insert(path.clone(), preserved_source);
        }
        styles.insert(path, analysis.class_name_map);
      }
      Err(err) => {
        let message = err.to_string();
        styles.insert_failure(path.clone(), message.clone());
        report.fail(path, message);
      }
    }
  }

  (styles, preserved_sources)
}

/// A failed script keeps importing its sheets globally, so those sheets can't
/// be renamed, and every other script importing one of them has to keep its
/// global import too. Spread that until nothing changes.
fn propagate_blocks(
  script_styles: &BTreeMap<PathBuf, Vec<PathBuf>>,
  importers: &BTreeMap<PathBuf, Vec<PathBuf>>,
  blocked_scripts: &mut HashSet<PathBuf>,
  blocked_styles: &mut HashSet<PathBuf>,
) {
  loop {
    let mut changed = false;

    for (style_path, style_importers) in importers {
      if !blocked_styles.contains(style_path)
        && style_importers
          .iter()
          .any(|importer| blocked_scripts.contains(importer))
      {
        blocked_styles.insert(style_path.clone());
        changed = true;
      }
    }

    for (script_path, style_paths) in script_styles {
      if !blocked_scripts.contains(script_path)
        && style_paths
          .iter()
          .any(|style_path| blocked_styles.contains(style_path))
      {
        blocked_scripts.insert(script_path.clone());
        changed = true;
      }
    }

    if !changed {
      break;
    }
  }
}

/// A renamed style sheet, with what it takes to undo the rename
struct RenamedStyle {
  style_path: PathBuf,
  module_path: PathBuf,
  original_source: Option<String>,
}

/// Rename a sheet to its module name, first writing the source that keeps
/// global classes global. Returns the source it replaced.
fn migrate_style(
  style_path: &Path,
  module_path: &Path,
  preserved_source: Option<&String>,
  options: &MigrateOptions,
) -> anyhow::Result<Option<String>> {
  let original_source = match preserved_source {
    Some(preserved_source) => {
      let original_source = read_file(style_path)?;
      std::fs::write(style_path, preserved_source)
        .with_context(|| format!("Failed to write {}", style_path.display()))?;
      Some(original_source)
    }
    None => None,
  };

  let renamed = vcs::rename_style(
    style_path,
    module_path,
    options.use_git,
    &options.project_root,
  );
  if let (Err(..), Some(original_source)) = (&renamed, &original_source) {
    std::fs::write(style_path, original_source)
      .with_context(|| format!("Failed to restore {}", style_path.display()))?;
  }

  renamed.map(|()| original_source)
}

fn restore_style(style: &RenamedStyle, options: &MigrateOptions) -> anyhow::Result<()> {
  vcs::rename_style(
    &style.module_path,
    &style.style_path,
    options.use_git,
    &options.project_root,
  )?;

  if let Some(original_source) = &style.original_source {
    std::fs::write(&style.style_path, original_source)
      .with_context(|| format!("Failed to restore {}", style.style_path.display()))?;
  }

  Ok(())
}
