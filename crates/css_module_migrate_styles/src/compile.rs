use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::StyleError;

static TILDE_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(@(?:import|use|forward)\s+(?:url\(\s*)?['"]?)~"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleLanguage {
  Css,
  Scss,
  Sass,
  Less,
  Stylus,
}

impl StyleLanguage {
  pub fn from_path(path: &Path) -> Option<Self> {
    match path.extension()?.to_str()? {
      "css" => Some(StyleLanguage::Css),
      "scss" => Some(StyleLanguage::Scss),
      "sass" => Some(StyleLanguage::Sass),
      "less" => Some(StyleLanguage::Less),
      "styl" => Some(StyleLanguage::Stylus),
      _ => None,
    }
  }

  /// The executable compiling this language to CSS
  pub fn compiler(&self) -> Option<&'static str> {
    match self {
      StyleLanguage::Css => None,
      StyleLanguage::Scss | StyleLanguage::Sass => Some("sass"),
      StyleLanguage::Less => Some("lessc"),
      StyleLanguage::Stylus => Some("stylus"),
    }
  }
}

/// Compile a style sheet to plain CSS.
///
/// CSS is returned as is. Preprocessor sources are piped through the
/// compiler's command line tool, resolving imports from the style sheet's
/// directory, the project root and the project's `node_modules`.
pub fn compile_style(path: &Path, source: &str, project_root: &Path) -> Result<String, StyleError> {
  let language = StyleLanguage::from_path(path).unwrap_or(StyleLanguage::Css);
  let Some(compiler) = language.compiler() else {
    return Ok(source.to_string());
  };

  let executable = find_compiler(compiler, project_root).ok_or_else(|| {
    StyleError::MissingCompiler {
      compiler,
      path: path.to_path_buf(),
    }
  })?;

  let load_paths = load_paths(path, project_root);
  let mut command = Command::new(executable);
  match language {
    StyleLanguage::Scss | StyleLanguage::Sass => {
      command.arg("--stdin").arg("--no-source-map").arg("--quiet-deps");
      if language == StyleLanguage::Sass {
        command.arg("--indented");
      }
      for load_path in &load_paths {
        command.arg(format!("--load-path={}", load_path.display()));
      }
    }
    StyleLanguage::Less => {
      if let Ok(joined) = std::env::join_paths(&load_paths) {
        let mut include_path = OsString::from("--include-path=");
        include_path.push(joined);
        command.arg(include_path);
      }
      command.arg("-");
    }
    StyleLanguage::Stylus => {
      for load_path in &load_paths {
        command.arg("--include").arg(load_path);
      }
    }
    StyleLanguage::Css => {}
  }
  command.current_dir(project_root);

  run_compiler(command, compiler, path, rewrite_tilde_imports(source))
}

/// Webpack style `~package/file` imports, resolved from `node_modules` instead
pub fn rewrite_tilde_imports(source: &str) -> String {
  TILDE_IMPORT_REGEX
    .replace_all(source, "${1}node_modules/")
    .into_owned()
}

fn load_paths(path: &Path, project_root: &Path) -> Vec<PathBuf> {
  let mut load_paths = vec![];
  if let Some(dir) = path.parent() {
    load_paths.push(dir.to_path_buf());
  }
  load_paths.push(project_root.to_path_buf());
  load_paths.push(project_root.join("node_modules"));
  load_paths
}

/// Prefer the project's own compiler over a global one
fn find_compiler(name: &str, project_root: &Path) -> Option<PathBuf> {
  let bin_dir = project_root.join("node_modules").join(".bin");
  which::which_in(name, Some(&bin_dir), project_root)
    .or_else(|_| which::which(name))
    .ok()
}

fn run_compiler(
  mut command: Command,
  compiler: &'static str,
  path: &Path,
  input: String,
) -> Result<String, StyleError> {
  tracing::debug!(?command, "Compiling {}", path.display());

  let io_error = |source| StyleError::Io {
    path: path.to_path_buf(),
    source,
  };

  let mut child = command
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .map_err(io_error)?;

  // Written from another thread, the compiler may fill its stdout pipe before
  // it has read all of its input
  let writer = child.stdin.take().map(|mut stdin| {
    std::thread::spawn(move || stdin.write_all(input.as_bytes()))
  });

  let output = child.wait_with_output().map_err(io_error)?;
  if let Some(writer) = writer {
    if let Ok(Err(err)) = writer.join() {
      tracing::debug!("Failed to write {} to {compiler}: {err}", path.display());
    }
  }

  if !output.status.success() {
    return Err(StyleError::CompilerFailed {
      compiler,
      path: path.to_path_buf(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  String::from_utf8(output.stdout).map_err(|err| StyleError::CompilerFailed {
    compiler,
    path: path.to_path_buf(),
    stderr: format!("Output is not valid utf-8: {err}"),
  })
}
