use std::collections::HashMap;

use css_module_migrate_classnames::{ClassNameRewriter, RewriteError};
use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::{
  Expr, JSXAttr, JSXAttrName, JSXAttrValue, JSXExpr, JSXExprContainer, Lit,
};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::quote::QuoteNormalizer;
use crate::QuoteStyle;

/// Rewrites the class name attributes of a module against one style sheet.
///
/// Rewritten values are replaced in the tree with an expression container
/// that keeps the span of the original value, so later passes for other
/// style sheets of the same file and the final splicing can find them.
pub struct ClassNameVisitor<'a> {
  rewriter: &'a ClassNameRewriter<'a>,
  attribute_names: &'a [String],
  quote: QuoteStyle,
  /// Rewritten attribute values by the span of the original value
  pub replacements: HashMap<Span, Expr>,
  /// Errors with the best source location known for them
  pub errors: Vec<(Span, RewriteError)>,
  pub uses_merge_fn: bool,
}

impl<'a> ClassNameVisitor<'a> {
  pub fn new(
    rewriter: &'a ClassNameRewriter<'a>,
    attribute_names: &'a [String],
    quote: QuoteStyle,
  ) -> Self {
    ClassNameVisitor {
      rewriter,
      attribute_names,
      quote,
      replacements: HashMap::new(),
      errors: vec![],
      uses_merge_fn: false,
    }
  }

  fn is_class_name_attribute(&self, attr: &JSXAttr) -> bool {
    matches!(
      &attr.name,
      JSXAttrName::Ident(ident) if self.attribute_names.iter().any(|name| *name == *ident.sym)
    )
  }
}

impl VisitMut for ClassNameVisitor<'_> {
  fn visit_mut_jsx_attr(&mut self, attr: &mut JSXAttr) {
    attr.visit_mut_children_with(self);

    if !self.is_class_name_attribute(attr) {
      return;
    }
    let Some(value) = &attr.value else {
      return;
    };

    let value_span = value.span();
    let result = match value {
      JSXAttrValue::Lit(lit @ Lit::Str(..)) => self.rewriter.replace(&Expr::Lit(lit.clone())),
      JSXAttrValue::JSXExprContainer(JSXExprContainer {
        expr: JSXExpr::Expr(expr),
        ..
      }) => self.rewriter.replace(expr),
      _ => {
        tracing::debug!("Skipping a class name attribute that holds no expression");
        return;
      }
    };

    match result {
      Ok(Some(replacement)) => {
        self.uses_merge_fn |= replacement.uses_merge_fn();

        let mut expr = replacement.into_expr();
        expr.visit_mut_with(&mut QuoteNormalizer::new(self.quote));

        attr.value = Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
          span: value_span,
          expr: JSXExpr::Expr(Box::new(expr.clone())),
        }));
        self.replacements.insert(value_span, expr);
      }
      Ok(None) => {}
      Err(err) => {
        // nodes synthesized by an earlier pass carry no location
        let span = if err.span().is_dummy() {
          value_span
        } else {
          err.span()
        };
        self.errors.push((span, err));
      }
    }
  }
}
