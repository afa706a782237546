use std::path::{Path, PathBuf};

use anyhow::Context;

const SCRIPT_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];

/// Never migrated: declaration files, the app entry, tool configs and
/// anything vendored or built
const DEFAULT_IGNORE_PATTERNS: [&str; 5] = [
  "**/*.d.ts",
  "src/app.{js,ts,jsx,tsx}",
  "**/*.config.*",
  "**/node_modules/**",
  "dist/**",
];

/// Find the script files under `<project_root>/src`, sorted by path.
///
/// `ignore_patterns` are globs relative to the project root and apply on top
/// of the built in ones.
pub fn discover_scripts(
  project_root: &Path,
  ignore_patterns: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
  let src = project_root.join("src");
  if !src.is_dir() {
    tracing::warn!("No src directory in {}", project_root.display());
    return Ok(vec![]);
  }

  let patterns: Vec<&str> = DEFAULT_IGNORE_PATTERNS
    .iter()
    .copied()
    .chain(ignore_patterns.iter().map(String::as_str))
    .collect();

  let mut scripts = vec![];
  for entry in jwalk::WalkDir::new(&src) {
    let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
    if !entry.file_type().is_file() {
      continue;
    }

    let path = entry.path();
    let is_script = path
      .extension()
      .and_then(|extension| extension.to_str())
      .is_some_and(|extension| SCRIPT_EXTENSIONS.contains(&extension));
    if !is_script {
      continue;
    }

    let relative_path = relative_glob_path(project_root, &path);
    if let Some(pattern) = patterns
      .iter()
      .find(|pattern| glob_match::glob_match(pattern, &relative_path))
    {
      tracing::debug!("Ignoring {} ({})", relative_path, pattern);
      continue;
    }

    scripts.push(path);
  }

  scripts.sort();
  Ok(scripts)
}

fn relative_glob_path(project_root: &Path, path: &Path) -> String {
  let relative_path = path.strip_prefix(project_root).unwrap_or(path);
  relative_path
    .components()
    .map(|component| component.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
