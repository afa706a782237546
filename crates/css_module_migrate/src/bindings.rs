use std::collections::HashSet;

use swc_core::atoms::Atom;
use swc_core::ecma::ast::{Ident, Module};
use swc_core::ecma::visit::{Visit, VisitWith};

/// Hands out identifiers that collide with no identifier of a module.
///
/// Every identifier counts, scoping is ignored, so a name is only ever
/// handed out when it is unused anywhere in the file.
pub struct BindingAllocator {
  used: HashSet<Atom>,
}

impl BindingAllocator {
  pub fn from_module(module: &Module) -> Self {
    let mut collector = IdentCollector::default();
    module.visit_with(&mut collector);

    BindingAllocator {
      used: collector.names,
    }
  }

  /// `base`, or `base1`, `base2`, ... when taken
  pub fn allocate(&mut self, base: &str) -> Atom {
    let mut candidate = Atom::from(base);
    let mut suffix = 0;
    while self.used.contains(&candidate) {
      suffix += 1;
      candidate = Atom::from(format!("{base}{suffix}"));
    }

    self.used.insert(candidate.clone());
    candidate
  }
}

#[derive(Default)]
struct IdentCollector {
  names: HashSet<Atom>,
}

impl Visit for IdentCollector {
  fn visit_ident(&mut self, ident: &Ident) {
    self.names.insert(ident.sym.clone());
  }
}
