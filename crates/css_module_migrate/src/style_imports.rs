use std::path::{Component, Path, PathBuf};

use swc_core::ecma::ast::{ImportDecl, Module, ModuleDecl, ModuleItem};

const STYLE_EXTENSIONS: [&str; 5] = ["css", "scss", "sass", "less", "styl"];

/// A side effect import of a global style sheet, `import './index.scss'`
#[derive(Debug, Clone)]
pub struct GlobalStyleImport {
  pub decl: ImportDecl,
  pub specifier: String,
  /// The imported file on disk
  pub path: PathBuf,
}

/// Whether `specifier` points at a style sheet that is not a CSS module yet
pub fn is_global_style(specifier: &str) -> bool {
  let path = Path::new(specifier);
  let is_style = path
    .extension()
    .and_then(|extension| extension.to_str())
    .is_some_and(|extension| STYLE_EXTENSIONS.contains(&extension));
  let is_module = path
    .file_stem()
    .and_then(|stem| stem.to_str())
    .is_some_and(|stem| stem.ends_with(".module"));

  is_style && !is_module
}

/// `./index.scss` becomes `./index.module.scss`
pub fn module_style_specifier(specifier: &str) -> String {
  match specifier.rsplit_once('.') {
    Some((stem, extension)) => format!("{stem}.module.{extension}"),
    None => specifier.to_string(),
  }
}

pub fn module_style_path(path: &Path) -> PathBuf {
  match path.file_name().and_then(|file_name| file_name.to_str()) {
    Some(file_name) => path.with_file_name(module_style_specifier(file_name)),
    None => path.to_path_buf(),
  }
}

/// Resolve `.` and `..` without touching the file system
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push(component);
        }
      }
      component => normalized.push(component),
    }
  }
  normalized
}

/// Collect the relative global style imports of a script, in source order.
///
/// Imports with specifiers are left alone, the script already uses the
/// style sheet as a module of some kind.
pub fn find_global_style_imports(module: &Module, script_path: &Path) -> Vec<GlobalStyleImport> {
  let script_dir = script_path.parent().unwrap_or(Path::new(""));

  module
    .body
    .iter()
    .filter_map(|item| match item {
      ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Some(decl),
      _ => None,
    })
    .filter(|decl| decl.specifiers.is_empty() && !decl.type_only)
    .filter_map(|decl| {
      let specifier = decl.src.value.to_string();
      if !is_global_style(&specifier) {
        return None;
      }
      if !specifier.starts_with('.') {
        tracing::debug!(
          "Skipping style import {:?} in {}, only relative imports are migrated",
          specifier,
          script_path.display()
        );
        return None;
      }

      Some(GlobalStyleImport {
        decl: decl.clone(),
        path: normalize_path(&script_dir.join(&specifier)),
        specifier,
      })
    })
    .collect()
}
