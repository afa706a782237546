use swc_core::atoms::Atom;
use swc_core::ecma::ast::{
  ImportSpecifier, Module, ModuleDecl, ModuleExportName, ModuleItem,
};

/// Named exports that are the merge utility itself
const MERGE_EXPORT_NAMES: [&str; 2] = ["default", "clsx"];

/// Local names a module binds to a class name merge utility, in import order.
///
/// Default imports and `{ default as x }` / `{ clsx }` imports of one of
/// `packages` count.
pub fn find_merge_imports(module: &Module, packages: &[String]) -> Vec<Atom> {
  let mut names = vec![];

  for item in &module.body {
    let ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) = item else {
      continue;
    };
    if decl.type_only || !packages.iter().any(|package| *package == *decl.src.value) {
      continue;
    }

    for specifier in &decl.specifiers {
      match specifier {
        ImportSpecifier::Default(default) => names.push(default.local.sym.clone()),
        ImportSpecifier::Named(named) if !named.is_type_only => {
          let imported = match &named.imported {
            Some(ModuleExportName::Ident(ident)) => &ident.sym,
            Some(ModuleExportName::Str(name)) => &name.value,
            None => &named.local.sym,
          };
          if MERGE_EXPORT_NAMES.contains(&&**imported) {
            names.push(named.local.sym.clone());
          }
        }
        _ => {}
      }
    }
  }

  names
}
