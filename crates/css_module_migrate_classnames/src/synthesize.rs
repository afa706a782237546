use swc_core::ecma::ast::{Expr, ExprOrSpread};

use crate::nodes::{is_module_reference, merge_call};
use crate::rewriter::ClassNameRewriter;

/// The expression that takes the place of a className value
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
  /// A lone `styles.local`
  ModuleReference(Expr),
  /// A call to the merge utility, the file needs it in scope
  MergeCall(Expr),
}

impl Replacement {
  pub fn uses_merge_fn(&self) -> bool {
    matches!(self, Replacement::MergeCall(..))
  }

  pub fn into_expr(self) -> Expr {
    match self {
      Replacement::ModuleReference(expr) | Replacement::MergeCall(expr) => expr,
    }
  }
}

impl ClassNameRewriter<'_> {
  /// Assemble rewritten arguments into the final value.
  ///
  /// A single module reference is used as is, anything else is passed to the
  /// merge utility in order.
  pub fn synthesize(&self, mut args: Vec<ExprOrSpread>) -> Replacement {
    if let [ExprOrSpread { spread: None, expr }] = args.as_slice() {
      if is_module_reference(expr, self.style_object_name()) {
        let arg = args.remove(0);
        return Replacement::ModuleReference(*arg.expr);
      }
    }

    Replacement::MergeCall(merge_call(self.merge_fn_name(), args))
  }
}
