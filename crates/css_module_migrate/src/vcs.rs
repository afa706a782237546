use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context};

/// Rename a style sheet to its module name.
///
/// With `use_git` the rename goes through `git mv` so history follows the
/// file. Files git does not track, or a missing git, fall back to a plain
/// rename.
pub fn rename_style(from: &Path, to: &Path, use_git: bool, project_root: &Path) -> anyhow::Result<()> {
  if to.exists() {
    return Err(anyhow!(
      "Cannot rename {}, {} already exists",
      from.display(),
      to.display()
    ));
  }

  if use_git {
    match git_mv(from, to, project_root) {
      Ok(()) => return Ok(()),
      Err(err) => tracing::warn!("{err:#}, renaming {} without git", from.display()),
    }
  }

  std::fs::rename(from, to)
    .with_context(|| format!("Failed to rename {} to {}", from.display(), to.display()))
}

fn git_mv(from: &Path, to: &Path, project_root: &Path) -> anyhow::Result<()> {
  let mut command = Command::new("git");
  command.arg("mv").arg(from).arg(to).current_dir(project_root);

  let output = command.output().context("Failed to run git")?;
  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    tracing::debug!("git mv: {}", stderr.trim());
    return Err(anyhow!("git mv failed: {}", stderr.trim()));
  }

  Ok(())
}
