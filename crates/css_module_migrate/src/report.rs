use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
  pub path: PathBuf,
  pub message: String,
}

/// Outcome of a migration run
#[derive(Debug, Default)]
pub struct MigrationReport {
  /// Scripts that were migrated
  pub succeeded: Vec<PathBuf>,
  /// Scripts without global style imports
  pub ignored: Vec<PathBuf>,
  /// Scripts and style sheets that could not be migrated
  pub failed: Vec<FailedFile>,
  /// Global style sheets imported by the scripts
  pub styles: Vec<PathBuf>,
  /// Style sheets renamed to their module name
  pub renamed: Vec<PathBuf>,
  /// Scripts that migrated cleanly but were left unchanged, they share a
  /// style sheet with a script or sheet that failed
  pub held_back: Vec<PathBuf>,
  /// Style sheets left global because one of their importers failed
  pub kept_styles: Vec<PathBuf>,
  /// Migrated sources of a dry run, by script
  pub outputs: Vec<(PathBuf, String)>,
}

impl MigrationReport {
  pub fn has_failures(&self) -> bool {
    !self.failed.is_empty()
  }

  pub fn fail(&mut self, path: PathBuf, message: impl Into<String>) {
    self.failed.push(FailedFile {
      path,
      message: message.into(),
    });
  }

  pub fn log_summary(&self) {
    for failed in &self.failed {
      tracing::error!("{}", failed.message);
    }
    for path in &self.held_back {
      tracing::warn!("Left {} unchanged, it shares a style sheet with a failed file", path.display());
    }
    for path in &self.kept_styles {
      tracing::warn!("Kept global style sheet {}", path.display());
    }

    tracing::info!(
      succeeded = self.succeeded.len(),
      ignored = self.ignored.len(),
      failed = self.failed.len(),
      renamed = self.renamed.len(),
      "Migrated {} of {} scripts",
      self.succeeded.len(),
      self.succeeded.len() + self.ignored.len() + self.held_back.len() + self.failed_scripts(),
    );
  }

  fn failed_scripts(&self) -> usize {
    self
      .failed
      .iter()
      .filter(|failed| !self.styles.contains(&failed.path))
      .count()
  }
}
