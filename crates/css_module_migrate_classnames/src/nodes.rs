//! Small builders and predicates for the nodes the rewriter produces

use swc_core::atoms::Atom;
use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
  ArrayLit, BinaryOp, CallExpr, Callee, ComputedPropName, Expr, ExprOrSpread, Ident, IdentName,
  Lit, MemberExpr, MemberProp, Str, Tpl, TplElement,
};

/// `styles.local`, or `styles["local"]` when `local` is not an identifier
pub fn module_reference(style_object_name: &Atom, local: &str) -> Expr {
  let prop = if is_identifier_name(local) {
    MemberProp::Ident(IdentName::new(local.into(), DUMMY_SP))
  } else {
    MemberProp::Computed(ComputedPropName {
      span: DUMMY_SP,
      expr: Box::new(string_literal(local)),
    })
  };

  Expr::Member(MemberExpr {
    span: DUMMY_SP,
    obj: Box::new(Expr::Ident(Ident::new_no_ctxt(
      style_object_name.clone(),
      DUMMY_SP,
    ))),
    prop,
  })
}

pub fn is_module_reference(expr: &Expr, style_object_name: &Atom) -> bool {
  match expr {
    Expr::Member(MemberExpr { obj, .. }) => {
      matches!(&**obj, Expr::Ident(ident) if &ident.sym == style_object_name)
    }
    _ => false,
  }
}

/// A new string literal. The raw text is left empty, the caller decides on
/// the quotes.
pub fn string_literal(value: &str) -> Expr {
  Expr::Lit(Lit::Str(Str {
    span: DUMMY_SP,
    value: value.into(),
    raw: None,
  }))
}

pub fn merge_call(merge_fn_name: &Atom, args: Vec<ExprOrSpread>) -> Expr {
  Expr::Call(CallExpr {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    callee: Callee::Expr(Box::new(Expr::Ident(Ident::new_no_ctxt(
      merge_fn_name.clone(),
      DUMMY_SP,
    )))),
    args,
    type_args: None,
  })
}

pub fn array(args: Vec<ExprOrSpread>) -> Expr {
  Expr::Array(ArrayLit {
    span: DUMMY_SP,
    elems: args.into_iter().map(Some).collect(),
  })
}

/// Build a template literal from `quasis.len() == exprs.len() + 1` texts
pub fn template(quasis: Vec<String>, exprs: Vec<Box<Expr>>) -> Expr {
  let last = quasis.len().saturating_sub(1);
  let quasis = quasis
    .into_iter()
    .enumerate()
    .map(|(index, text)| TplElement {
      span: DUMMY_SP,
      tail: index == last,
      raw: escape_template_text(&text).into(),
      cooked: Some(text.into()),
    })
    .collect();

  Expr::Tpl(Tpl {
    span: DUMMY_SP,
    exprs,
    quasis,
  })
}

pub fn arg(expr: Expr) -> ExprOrSpread {
  ExprOrSpread {
    spread: None,
    expr: Box::new(expr),
  }
}

pub fn unparen(mut expr: &Expr) -> &Expr {
  while let Expr::Paren(paren) = expr {
    expr = &paren.expr;
  }
  expr
}

pub fn is_blank_string(expr: &Expr) -> bool {
  matches!(unparen(expr), Expr::Lit(Lit::Str(value)) if value.value.trim().is_empty())
}

/// Values a merge utility ignores
pub fn is_constant_empty(expr: &Expr) -> bool {
  match unparen(expr) {
    Expr::Lit(Lit::Null(..)) => true,
    Expr::Lit(Lit::Bool(value)) => !value.value,
    Expr::Ident(ident) => &*ident.sym == "undefined",
    expr => is_blank_string(expr),
  }
}

pub fn is_logical(op: BinaryOp) -> bool {
  matches!(
    op,
    BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
  )
}

fn is_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
      chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    }
    _ => false,
  }
}

fn escape_template_text(text: &str) -> String {
  text
    .replace('\\', "\\\\")
    .replace('`', "\\`")
    .replace("${", "\\${")
}
