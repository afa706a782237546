use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use css_module_migrate_classnames::{ClassNameMap, ClassNameRewriter};
use css_module_migrate_swc_runner::{parse_script, ParsedScript};
use swc_core::atoms::Atom;
use swc_core::common::{Span, DUMMY_SP};
use swc_core::ecma::ast::{
  Expr, Ident, ImportDefaultSpecifier, ImportSpecifier, ModuleDecl, ModuleItem, Str,
};
use swc_core::ecma::visit::VisitMutWith;

use crate::bindings::BindingAllocator;
use crate::class_name_visitor::ClassNameVisitor;
use crate::edits::{apply_edits, detect_newline, TextEdit};
use crate::merge::find_merge_imports;
use crate::quote::quote_string;
use crate::style_imports::{find_global_style_imports, module_style_specifier, GlobalStyleImport};
use crate::MigrateOptions;

const STYLE_OBJECT_NAME: &str = "styles";

/// Class name maps of the analyzed style sheets
#[derive(Debug, Default)]
pub struct StyleTable {
  maps: HashMap<PathBuf, ClassNameMap>,
  failures: HashMap<PathBuf, String>,
}

impl StyleTable {
  pub fn insert(&mut self, path: PathBuf, class_name_map: ClassNameMap) {
    self.maps.insert(path, class_name_map);
  }

  pub fn insert_failure(&mut self, path: PathBuf, message: String) {
    self.failures.insert(path, message);
  }

  pub fn is_analyzed(&self, path: &Path) -> bool {
    self.maps.contains_key(path)
  }

  pub fn class_name_map(&self, path: &Path) -> anyhow::Result<&ClassNameMap> {
    if let Some(class_name_map) = self.maps.get(path) {
      return Ok(class_name_map);
    }

    match self.failures.get(path) {
      Some(message) => Err(anyhow!("{message}")),
      None => Err(anyhow!("{} was never analyzed", path.display())),
    }
  }
}

/// Paths of the global style sheets a script imports
pub fn scan_script(path: &Path, source: &str) -> anyhow::Result<Vec<PathBuf>> {
  let script = parse_script(path, source)?;

  Ok(
    find_global_style_imports(&script.module, path)
      .into_iter()
      .map(|import| import.path)
      .collect(),
  )
}

/// Migrate one script to CSS modules.
///
/// Every global style import becomes a default import of the module version
/// of the sheet and every class name attribute is rewritten against the
/// sheets in import order. Returns `None` when the script imports no global
/// style sheet. Any attribute that cannot be rewritten fails the whole
/// script, nothing of it is returned.
pub fn migrate_script(
  path: &Path,
  source: &str,
  styles: &StyleTable,
  options: &MigrateOptions,
) -> anyhow::Result<Option<String>> {
  let mut script = parse_script(path, source)?;
  let imports = find_global_style_imports(&script.module, path);
  if imports.is_empty() {
    return Ok(None);
  }

  let mut allocator = BindingAllocator::from_module(&script.module);
  let style_names: Vec<Atom> = imports
    .iter()
    .map(|_| allocator.allocate(STYLE_OBJECT_NAME))
    .collect();
  let merge_aliases = find_merge_imports(&script.module, &options.merge_packages);
  let merge_fn_name = match merge_aliases.first() {
    Some(name) => name.clone(),
    None => allocator.allocate(&options.merge_import_name),
  };
  let last_import_end = last_import_end(&script);

  let mut replacements: HashMap<Span, Expr> = HashMap::new();
  let mut errors = vec![];
  let mut uses_merge_fn = false;
  for (import, style_name) in imports.iter().zip(&style_names) {
    let class_name_map = styles.class_name_map(&import.path).with_context(|| {
      format!("{} imports a style sheet that could not be analyzed", path.display())
    })?;
    let rewriter = ClassNameRewriter::new(class_name_map, style_name.clone(), merge_fn_name.clone())
      .with_merge_fn_aliases(merge_aliases.iter().cloned())
      .with_fused_expression_policy(options.fused_expression_policy);

    let mut visitor = ClassNameVisitor::new(&rewriter, &options.attribute_names, options.quote);
    script.module.visit_mut_with(&mut visitor);

    uses_merge_fn |= visitor.uses_merge_fn;
    errors.extend(visitor.errors);
    replacements.extend(visitor.replacements);
  }

  if !errors.is_empty() {
    errors.sort_by_key(|(span, _)| span.lo);
    let messages: Vec<String> = errors
      .iter()
      .map(|(span, err)| format!("{}:{}: {}", path.display(), script.line_of(*span), err))
      .collect();
    return Err(anyhow!("{}", messages.join("\n")));
  }

  let newline = detect_newline(source);
  let mut edits = vec![];
  for (span, expr) in &replacements {
    let printed = script.print(expr, newline)?;
    edits.push(TextEdit {
      range: script.byte_range(*span),
      text: format!("{{{}}}", printed.trim_end()),
    });
  }

  for (import, style_name) in imports.iter().zip(&style_names) {
    edits.push(import_edit(&script, source, import, style_name, newline)?);
  }

  if uses_merge_fn && merge_aliases.is_empty() {
    edits.push(TextEdit {
      range: last_import_end..last_import_end,
      text: format!(
        "{newline}import {merge_fn_name} from {};",
        quote_string(&options.merge_package, options.quote)
      ),
    });
  }

  tracing::debug!(
    attributes = replacements.len(),
    styles = imports.len(),
    "Migrated {}",
    path.display()
  );

  Ok(Some(apply_edits(source, edits)))
}

fn last_import_end(script: &ParsedScript) -> usize {
  script
    .module
    .body
    .iter()
    .filter_map(|item| match item {
      ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Some(script.byte_range(decl.span).end),
      _ => None,
    })
    .max()
    .unwrap_or_default()
}

/// `import './a.scss'` becomes `import styles from './a.module.scss'`, keeping
/// the quotes and import attributes of the original
fn import_edit(
  script: &ParsedScript,
  source: &str,
  import: &GlobalStyleImport,
  style_name: &Atom,
  newline: &str,
) -> anyhow::Result<TextEdit> {
  let specifier = module_style_specifier(&import.specifier);
  let quote = import
    .decl
    .src
    .raw
    .as_deref()
    .and_then(|raw| raw.chars().next())
    .unwrap_or('\'');

  let mut decl = import.decl.clone();
  decl.specifiers = vec![ImportSpecifier::Default(ImportDefaultSpecifier {
    span: DUMMY_SP,
    local: Ident::new_no_ctxt(style_name.clone(), DUMMY_SP),
  })];
  decl.src = Box::new(Str {
    span: decl.src.span,
    raw: Some(format!("{quote}{specifier}{quote}").into()),
    value: specifier.into(),
  });

  let range = script.byte_range(import.decl.span);
  let printed = script.print(&decl, newline)?;
  let mut text = printed.trim_end();
  if !source[range.clone()].trim_end().ends_with(';') {
    text = text.trim_end_matches(';');
  }

  Ok(TextEdit {
    range,
    text: text.to_string(),
  })
}
