use std::collections::HashSet;

use swc_core::atoms::Atom;
use swc_core::common::Spanned;
use swc_core::ecma::ast::{
  ArrayLit, BinExpr, BinaryOp, CallExpr, Callee, ComputedPropName, CondExpr, Expr, ExprOrSpread,
  KeyValueProp, Lit, MemberProp, ObjectLit, ParenExpr, Prop, PropName, PropOrSpread, Str,
  TplElement,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::boundary::{Piece, Segments};
use crate::error::RewriteError;
use crate::nodes::{
  arg, array, is_blank_string, is_constant_empty, is_logical, is_module_reference, merge_call,
  module_reference, string_literal, template, unparen,
};
use crate::tokens::{class_list, local_name, split_keeping_whitespace, split_tokens};
use crate::ClassNameMap;

/// Arguments that are space-joined by the merge utility at runtime
pub type ClassArgs = Vec<ExprOrSpread>;

/// What to do when a class token is fused to an expression that rewrites to
/// module references, as in `` `icon-${active ? 'card' : ''}` ``
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FusedExpressionPolicy {
  /// Put the rewritten expression back into the smaller template
  #[default]
  Wrap,
  /// Fail with [RewriteError::AmbiguousTemplateFusion]
  Reject,
}

/// Rewrites className values of one file against one CSS module.
///
/// Every rewrite returns `None` when nothing in the expression maps to the
/// module, in which case the original expression must be kept untouched.
pub struct ClassNameRewriter<'a> {
  class_name_map: &'a ClassNameMap,
  style_object_name: Atom,
  merge_fn_name: Atom,
  merge_fn_names: HashSet<Atom>,
  fused_expression_policy: FusedExpressionPolicy,
}

impl<'a> ClassNameRewriter<'a> {
  pub fn new(class_name_map: &'a ClassNameMap, style_object_name: Atom, merge_fn_name: Atom) -> Self {
    ClassNameRewriter {
      class_name_map,
      style_object_name,
      merge_fn_names: HashSet::from([merge_fn_name.clone()]),
      merge_fn_name,
      fused_expression_policy: FusedExpressionPolicy::default(),
    }
  }

  /// Other local names calls to which are decomposed like merge utility calls
  pub fn with_merge_fn_aliases(mut self, aliases: impl IntoIterator<Item = Atom>) -> Self {
    self.merge_fn_names.extend(aliases);
    self
  }

  pub fn with_fused_expression_policy(mut self, policy: FusedExpressionPolicy) -> Self {
    self.fused_expression_policy = policy;
    self
  }

  pub fn style_object_name(&self) -> &Atom {
    &self.style_object_name
  }

  pub fn merge_fn_name(&self) -> &Atom {
    &self.merge_fn_name
  }

  pub fn rewrite(&self, expr: &Expr) -> Result<Option<ClassArgs>, RewriteError> {
    match expr {
      Expr::Lit(Lit::Str(value)) => Ok(self.rewrite_str(value)),
      Expr::Tpl(tpl) => match Segments::from_tpl(tpl) {
        Some(segments) => self.rewrite_segments(&segments),
        None => Ok(None),
      },
      Expr::Bin(bin) if is_logical(bin.op) => self.rewrite_logical(bin),
      Expr::Bin(bin) if bin.op == BinaryOp::Add => match Segments::from_concat(bin) {
        Some(segments) => self.rewrite_segments(&segments),
        None => Ok(None),
      },
      Expr::Bin(bin) => Err(RewriteError::UnsupportedOperator {
        operator: bin.op,
        span: bin.span,
      }),
      Expr::Call(call) => self.rewrite_call(call),
      Expr::Cond(cond) => self.rewrite_cond(cond),
      Expr::Array(array) => self.rewrite_array(array),
      Expr::Object(object) => self.rewrite_object(object),
      Expr::Paren(paren) => self.rewrite(&paren.expr),
      _ => Ok(None),
    }
  }

  /// Rewrite a className value all the way to its replacement
  pub fn replace(&self, expr: &Expr) -> Result<Option<crate::Replacement>, RewriteError> {
    Ok(self.rewrite(expr)?.map(|args| self.synthesize(args)))
  }

  fn module_reference_for(&self, token: &str) -> Option<Expr> {
    if token.is_empty() {
      return None;
    }

    let local = local_name(token);
    if self.class_name_map.contains_key(&local) {
      Some(module_reference(&self.style_object_name, &local))
    } else {
      None
    }
  }

  fn is_mapped(&self, token: &str) -> bool {
    !token.is_empty() && self.class_name_map.contains_key(&local_name(token))
  }

  fn rewrite_str(&self, value: &Str) -> Option<ClassArgs> {
    let tokens = split_tokens(&value.value);
    if !tokens.iter().any(|token| self.is_mapped(token)) {
      return None;
    }

    Some(
      tokens
        .into_iter()
        .map(|token| arg(self.module_reference_for(token).unwrap_or_else(|| string_literal(token))))
        .collect(),
    )
  }

  fn rewrite_segments(&self, segments: &Segments<'_>) -> Result<Option<ClassArgs>, RewriteError> {
    let mut args = vec![];
    let mut changed = false;

    for group in segments.fuse() {
      match group.as_slice() {
        [Piece::Token(token)] => match self.module_reference_for(token) {
          Some(reference) => {
            changed = true;
            args.push(arg(reference));
          }
          None => args.push(arg(string_literal(token))),
        },
        [Piece::Expr(expr)] => match self.rewrite(expr)? {
          Some(rewritten) => {
            changed = true;
            args.extend(rewritten.into_iter().map(tidy_arg));
          }
          None => args.push(arg(tidy_merge_argument(expr))),
        },
        pieces => {
          let (fused, fused_changed) = self.rewrite_fused(pieces)?;
          changed |= fused_changed;
          args.push(arg(fused));
        }
      }
    }

    Ok(changed.then_some(args))
  }

  /// Re-emit tokens and expressions that touch each other as one template
  fn rewrite_fused(&self, pieces: &[Piece<'_>]) -> Result<(Expr, bool), RewriteError> {
    let mut quasis = vec![String::new()];
    let mut exprs = vec![];
    let mut changed = false;

    for piece in pieces {
      match piece {
        Piece::Token(token) => {
          if let Some(text) = quasis.last_mut() {
            text.push_str(token);
          }
        }
        Piece::Expr(expr) => {
          let embedded = match self.rewrite_embedded(expr)? {
            Some(_) if self.fused_expression_policy == FusedExpressionPolicy::Reject => {
              return Err(RewriteError::AmbiguousTemplateFusion { span: expr.span() });
            }
            Some(rewritten) => {
              changed = true;
              rewritten
            }
            None => (*expr).clone(),
          };
          exprs.push(Box::new(embedded));
          quasis.push(String::new());
        }
      }
    }

    Ok((template(quasis, exprs), changed))
  }

  /// Rewrite an expression embedded in a fused template.
  ///
  /// Strings are rewritten in place so the value renders the same whitespace
  /// as before and only whole class tokens change.
  fn rewrite_embedded(&self, expr: &Expr) -> Result<Option<Expr>, RewriteError> {
    match expr {
      Expr::Lit(Lit::Str(value)) => Ok(self.rewrite_str_in_place(value)),
      Expr::Cond(cond) => {
        let consequent = self.rewrite_embedded(&cond.cons)?;
        let alternate = self.rewrite_embedded(&cond.alt)?;
        if consequent.is_none() && alternate.is_none() {
          return Ok(None);
        }

        Ok(Some(Expr::Cond(CondExpr {
          span: cond.span,
          test: cond.test.clone(),
          cons: Box::new(consequent.unwrap_or_else(|| (*cond.cons).clone())),
          alt: Box::new(alternate.unwrap_or_else(|| (*cond.alt).clone())),
        })))
      }
      Expr::Bin(bin) if is_logical(bin.op) => Ok(self.rewrite_embedded(&bin.right)?.map(|right| {
        Expr::Bin(BinExpr {
          span: bin.span,
          op: bin.op,
          left: bin.left.clone(),
          right: Box::new(right),
        })
      })),
      Expr::Paren(paren) => Ok(self.rewrite_embedded(&paren.expr)?.map(|inner| {
        Expr::Paren(ParenExpr {
          span: paren.span,
          expr: Box::new(inner),
        })
      })),
      _ => Ok(
        self
          .rewrite(expr)?
          .map(|args| keep_edge_whitespace(expr, self.embedded_value(args))),
      ),
    }
  }

  /// `'card big '` becomes `` `${styles.card} big ` ``
  fn rewrite_str_in_place(&self, value: &Str) -> Option<Expr> {
    let pieces = split_keeping_whitespace(&value.value);
    if !pieces.iter().any(|piece| self.is_mapped(piece)) {
      return None;
    }

    if let [token] = pieces.as_slice() {
      return self.module_reference_for(token);
    }

    let mut quasis = vec![String::new()];
    let mut exprs = vec![];
    for piece in pieces {
      match self.module_reference_for(piece) {
        Some(reference) => {
          exprs.push(Box::new(reference));
          quasis.push(String::new());
        }
        None => {
          if let Some(text) = quasis.last_mut() {
            text.push_str(piece);
          }
        }
      }
    }

    Some(template(quasis, exprs))
  }

  /// One value rendering what the merge utility renders for `args`
  fn embedded_value(&self, mut args: ClassArgs) -> Expr {
    match args.as_slice() {
      [ExprOrSpread { spread: None, expr }] if self.renders_as_is(expr) => *args.remove(0).expr,
      _ => merge_call(&self.merge_fn_name, args),
    }
  }

  /// Whether a template renders `expr` the way the merge utility would.
  ///
  /// Arrays are comma-joined and `false` renders as text, so those stay in a
  /// merge call.
  fn renders_as_is(&self, expr: &Expr) -> bool {
    match expr {
      Expr::Lit(Lit::Str(..)) | Expr::Tpl(..) => true,
      Expr::Cond(cond) => self.renders_as_is(&cond.cons) && self.renders_as_is(&cond.alt),
      _ => is_module_reference(expr, &self.style_object_name),
    }
  }

  fn rewrite_logical(&self, bin: &BinExpr) -> Result<Option<ClassArgs>, RewriteError> {
    if !matches!(unparen(&bin.right), Expr::Lit(Lit::Str(..))) {
      return Ok(None);
    }

    Ok(self.rewrite(&bin.right)?.map(|args| {
      vec![arg(Expr::Bin(BinExpr {
        span: bin.span,
        op: bin.op,
        left: bin.left.clone(),
        right: Box::new(branch_value(args)),
      }))]
    }))
  }

  fn rewrite_call(&self, call: &CallExpr) -> Result<Option<ClassArgs>, RewriteError> {
    let is_merge_fn = match &call.callee {
      Callee::Expr(callee) => {
        matches!(&**callee, Expr::Ident(ident) if self.merge_fn_names.contains(&ident.sym))
      }
      _ => false,
    };

    if !is_merge_fn {
      if call.args.iter().any(|arg| self.contains_mapped_token(&arg.expr)) {
        return Err(RewriteError::UnsafeCallTarget {
          callee: callee_name(&call.callee),
          span: call.span,
        });
      }
      return Ok(None);
    }

    let mut args = vec![];
    let mut changed = false;
    for call_arg in &call.args {
      if call_arg.spread.is_some() {
        args.push(call_arg.clone());
        continue;
      }

      match self.rewrite(&call_arg.expr)? {
        Some(rewritten) => {
          changed = true;
          args.extend(rewritten);
        }
        None => args.push(call_arg.clone()),
      }
    }

    Ok(changed.then_some(args))
  }

  fn rewrite_cond(&self, cond: &CondExpr) -> Result<Option<ClassArgs>, RewriteError> {
    let consequent = self.rewrite(&cond.cons)?;
    let alternate = self.rewrite(&cond.alt)?;
    if consequent.is_none() && alternate.is_none() {
      return Ok(None);
    }

    let cons = consequent.map_or_else(|| (*cond.cons).clone(), branch_value);
    let alt = alternate.map_or_else(|| (*cond.alt).clone(), branch_value);

    Ok(Some(vec![arg(Expr::Cond(CondExpr {
      span: cond.span,
      test: cond.test.clone(),
      cons: Box::new(cons),
      alt: Box::new(alt),
    }))]))
  }

  fn rewrite_array(&self, array: &ArrayLit) -> Result<Option<ClassArgs>, RewriteError> {
    let mut elems = vec![];
    let mut changed = false;

    for elem in array.elems.iter().flatten() {
      if elem.spread.is_some() {
        elems.push(Some(elem.clone()));
        continue;
      }

      match self.rewrite(&elem.expr)? {
        Some(rewritten) => {
          changed = true;
          elems.extend(
            rewritten
              .into_iter()
              .filter(|arg| !is_blank_string(&arg.expr))
              .map(Some),
          );
        }
        None if is_constant_empty(&elem.expr) => {}
        None => elems.push(Some(elem.clone())),
      }
    }

    Ok(changed.then(|| {
      vec![arg(Expr::Array(ArrayLit {
        span: array.span,
        elems,
      }))]
    }))
  }

  fn rewrite_object(&self, object: &ObjectLit) -> Result<Option<ClassArgs>, RewriteError> {
    let mut props = vec![];
    let mut changed = false;

    for prop in &object.props {
      let PropOrSpread::Prop(inner) = prop else {
        props.push(prop.clone());
        continue;
      };

      match &**inner {
        Prop::Shorthand(ident) => match self.module_reference_for(&ident.sym) {
          Some(reference) => {
            changed = true;
            props.push(computed_prop(reference, Box::new(Expr::Ident(ident.clone()))));
          }
          None => props.push(prop.clone()),
        },
        Prop::KeyValue(KeyValueProp {
          key: PropName::Ident(name),
          value,
        }) => match self.module_reference_for(&name.sym) {
          Some(reference) => {
            changed = true;
            props.push(computed_prop(reference, value.clone()));
          }
          None => props.push(prop.clone()),
        },
        Prop::KeyValue(KeyValueProp {
          key: PropName::Str(key),
          value,
        }) => match self.rewrite_str(key) {
          Some(rewritten) => {
            changed = true;
            for key_arg in rewritten {
              match *key_arg.expr {
                Expr::Lit(Lit::Str(key)) if key.value.trim().is_empty() => {}
                Expr::Lit(Lit::Str(key)) => props.push(PropOrSpread::Prop(Box::new(
                  Prop::KeyValue(KeyValueProp {
                    key: PropName::Str(key),
                    value: value.clone(),
                  }),
                ))),
                reference => props.push(computed_prop(reference, value.clone())),
              }
            }
          }
          None => props.push(prop.clone()),
        },
        _ => props.push(prop.clone()),
      }
    }

    Ok(changed.then(|| {
      vec![arg(Expr::Object(ObjectLit {
        span: object.span,
        props,
      }))]
    }))
  }

  fn contains_mapped_token(&self, expr: &Expr) -> bool {
    let mut finder = MappedTokenFinder {
      rewriter: self,
      found: false,
    };
    expr.visit_with(&mut finder);
    finder.found
  }

  #[cfg(test)]
  pub(crate) fn is_recognized_merge_fn(&self, name: &str) -> bool {
    self.merge_fn_names.contains(&Atom::from(name))
  }
}

struct MappedTokenFinder<'r, 'a> {
  rewriter: &'r ClassNameRewriter<'a>,
  found: bool,
}

impl Visit for MappedTokenFinder<'_, '_> {
  fn visit_str(&mut self, node: &Str) {
    self.found |= class_list(&node.value)
      .into_iter()
      .any(|token| self.rewriter.is_mapped(token));
  }

  fn visit_tpl_element(&mut self, node: &TplElement) {
    if let Some(cooked) = &node.cooked {
      self.found |= class_list(cooked)
        .into_iter()
        .any(|token| self.rewriter.is_mapped(token));
    }
  }
}

fn computed_prop(key: Expr, value: Box<Expr>) -> PropOrSpread {
  PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
    key: PropName::Computed(ComputedPropName {
      span: key.span(),
      expr: Box::new(key),
    }),
    value,
  })))
}

/// Collapse the arguments of a conditional branch into one value
fn branch_value(args: ClassArgs) -> Expr {
  let mut args: ClassArgs = args
    .into_iter()
    .filter(|arg| arg.spread.is_some() || !is_blank_string(&arg.expr))
    .collect();

  match args.as_slice() {
    [] => string_literal(""),
    [ExprOrSpread { spread: None, .. }] => *args.remove(0).expr,
    _ => array(args),
  }
}

/// Put back the whitespace the merge utility drops from the edges of a
/// template or concatenation
fn keep_edge_whitespace(original: &Expr, value: Expr) -> Expr {
  let segments = match unparen(original) {
    Expr::Tpl(tpl) => Segments::from_tpl(tpl),
    Expr::Bin(bin) if bin.op == BinaryOp::Add => Segments::from_concat(bin),
    _ => None,
  };

  match segments.as_ref().map(Segments::edge_whitespace) {
    Some((leading, trailing)) if !leading.is_empty() || !trailing.is_empty() => template(
      vec![leading.to_string(), trailing.to_string()],
      vec![Box::new(value)],
    ),
    _ => value,
  }
}

fn tidy_arg(value: ExprOrSpread) -> ExprOrSpread {
  match value.spread {
    Some(_) => value,
    None => arg(tidy_merge_argument(&value.expr)),
  }
}

/// Prepare an expression lifted out of string concatenation to be a merge
/// argument on its own.
///
/// The merge utility joins its arguments with spaces, the whitespace the
/// expression's strings carried for the concatenation is trimmed.
fn tidy_merge_argument(expr: &Expr) -> Expr {
  let inner = unparen(expr);
  match inner {
    Expr::Seq(..) => expr.clone(),
    Expr::Cond(cond) => Expr::Cond(CondExpr {
      span: cond.span,
      test: cond.test.clone(),
      cons: Box::new(trim_branch(&cond.cons)),
      alt: Box::new(trim_branch(&cond.alt)),
    }),
    Expr::Bin(bin) if is_logical(bin.op) => match unparen(&bin.right) {
      Expr::Lit(Lit::Str(value)) => Expr::Bin(BinExpr {
        span: bin.span,
        op: bin.op,
        left: bin.left.clone(),
        right: Box::new(trim_str(value)),
      }),
      _ => inner.clone(),
    },
    _ => inner.clone(),
  }
}

fn trim_branch(expr: &Expr) -> Expr {
  match unparen(expr) {
    Expr::Lit(Lit::Str(value)) => trim_str(value),
    Expr::Cond(..) => tidy_merge_argument(expr),
    _ => expr.clone(),
  }
}

fn trim_str(value: &Str) -> Expr {
  let trimmed = value.value.trim();
  if trimmed.len() == value.value.len() {
    Expr::Lit(Lit::Str(value.clone()))
  } else {
    string_literal(trimmed)
  }
}

fn callee_name(callee: &Callee) -> String {
  fn expr_name(expr: &Expr) -> Option<String> {
    match unparen(expr) {
      Expr::Ident(ident) => Some(ident.sym.to_string()),
      Expr::This(..) => Some("this".to_string()),
      Expr::Member(member) => {
        let object = expr_name(&member.obj)?;
        match &member.prop {
          MemberProp::Ident(prop) => Some(format!("{object}.{}", prop.sym)),
          _ => Some(format!("{object}[...]")),
        }
      }
      _ => None,
    }
  }

  match callee {
    Callee::Expr(expr) => expr_name(expr).unwrap_or_else(|| "<expression>".to_string()),
    Callee::Super(..) => "super".to_string(),
    Callee::Import(..) => "import".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use css_module_migrate_swc_runner::test_utils::{normalize_code, parse_test_expr};
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  use super::*;

  fn class_name_map(locals: &[&str]) -> ClassNameMap {
    locals
      .iter()
      .map(|local| (local.to_string(), format!("{local}_a1")))
      .collect()
  }

  fn run_rewrite(code: &str, locals: &[&str]) -> Option<String> {
    run_rewrite_with(code, locals, FusedExpressionPolicy::Wrap).unwrap()
  }

  fn run_rewrite_with(
    code: &str,
    locals: &[&str],
    policy: FusedExpressionPolicy,
  ) -> Result<Option<String>, RewriteError> {
    let class_name_map = class_name_map(locals);
    let rewriter = ClassNameRewriter::new(&class_name_map, "styles".into(), "classNames".into())
      .with_merge_fn_aliases(["clsx".into()])
      .with_fused_expression_policy(policy);
    let test = parse_test_expr(code);

    Ok(
      rewriter
        .replace(&test.expr)?
        .map(|replacement| test.print(&replacement.into_expr())),
    )
  }

  #[test]
  fn test_single_mapped_class_is_a_module_reference() {
    assert_eq!(run_rewrite("'card'", &["card"]), Some("styles.card".to_string()));
  }

  #[test]
  fn test_unmapped_classes_stay_strings() {
    assert_eq!(
      run_rewrite("'card  bg-white'", &["card"]),
      Some(r#"classNames(styles.card, "bg-white")"#.to_string())
    );
  }

  #[test]
  fn test_nested_merge_call_is_flattened() {
    assert_eq!(
      run_rewrite("classNames('card','bg-white',{active: level})", &["card"]).map(|code| normalize_code(&code)),
      Some("classNames(styles.card,'bg-white',{active:level})".to_string())
    );
  }

  #[test]
  fn test_fused_template_without_mapped_classes_is_untouched() {
    assert_eq!(
      run_rewrite("`${level}-tag tag left-${level}-right`", &["card"]),
      None
    );
  }

  #[test]
  fn test_concatenation_with_conditional() {
    assert_eq!(
      run_rewrite(
        "'card ' + (level ? ' bg-white' : ' ') + ' color--red'",
        &["card", "colorRed"]
      ),
      Some(r#"classNames(styles.card, level ? "bg-white" : "", styles.colorRed)"#.to_string())
    );
  }

  #[test]
  fn test_unmapped_input_is_left_alone() {
    let inputs = [
      "'card bg-white'",
      "`card ${active ? 'on' : ''}`",
      "'card ' + kind",
      "classNames('card', { active })",
      "active ? 'card' : 'other'",
      "active && 'card'",
      "['card', null, 'other']",
      "{ card: active }",
      "styles.card",
      "translate('card')",
      "1 + 2",
    ];

    for input in inputs {
      assert_eq!(run_rewrite(input, &["unused"]), None, "{input}");
    }
  }

  #[test]
  fn test_empty_map_leaves_everything_alone() {
    assert_eq!(run_rewrite("'card bg-white'", &[]), None);
    assert_eq!(run_rewrite("`card ${x}`", &[]), None);
  }

  #[test]
  fn test_edge_whitespace_is_kept_as_empty_strings() {
    assert_eq!(
      run_rewrite("' card '", &["card"]),
      Some(r#"classNames("", styles.card, "")"#.to_string())
    );
  }

  #[test]
  fn test_hyphenated_classes_use_their_local_name() {
    assert_eq!(
      run_rewrite("'color--red at-icon'", &["colorRed"]),
      Some(r#"classNames(styles.colorRed, "at-icon")"#.to_string())
    );
  }

  #[test]
  fn test_template_free_tokens_are_split() {
    assert_eq!(
      run_rewrite("`card ${active} bg-white`", &["card", "bgWhite"]),
      Some("classNames(styles.card, active, styles.bgWhite)".to_string())
    );
  }

  #[test]
  fn test_template_fused_tokens_stay_with_their_expression() {
    assert_eq!(
      run_rewrite("`card icon-${kind} left-${a}-right`", &["card", "icon", "left", "right"]),
      Some("classNames(styles.card, `icon-${kind}`, `left-${a}-right`)".to_string())
    );
  }

  #[test]
  fn test_template_adjacent_expressions_stay_together() {
    assert_eq!(
      run_rewrite("`card ${a}${b}`", &["card"]),
      Some("classNames(styles.card, `${a}${b}`)".to_string())
    );
  }

  #[test]
  fn test_fused_expression_is_rewritten_inside_the_template() {
    assert_eq!(
      run_rewrite("`icon-${kind === 'a' ? 'card' : 'other'}`", &["card"]),
      Some("classNames(`icon-${kind === 'a' ? styles.card : 'other'}`)".to_string())
    );
    assert_eq!(
      run_rewrite("`icon-${active ? 'card big' : ''}`", &["card"]),
      Some("classNames(`icon-${active ? `${styles.card} big` : ''}`)".to_string())
    );
    assert_eq!(
      run_rewrite("`icon-${active && 'card'} x`", &["card"]),
      Some(r#"classNames(`icon-${active && styles.card}`, "x")"#.to_string())
    );
  }

  #[test]
  fn test_single_fused_value_is_not_wrapped() {
    assert_eq!(
      run_rewrite("`icon-${classNames('card')}`", &["card"]),
      Some("classNames(`icon-${styles.card}`)".to_string())
    );
    assert_eq!(
      run_rewrite("`icon-${classNames('card', x)}`", &["card"]),
      Some("classNames(`icon-${classNames(styles.card, x)}`)".to_string())
    );
  }

  #[test]
  fn test_whitespace_inside_expression_is_not_fused() {
    assert_eq!(
      run_rewrite("`${active ? 'card ' : ''}item`", &["card"]),
      Some(r#"classNames(active ? styles.card : '', "item")"#.to_string())
    );
    assert_eq!(
      run_rewrite("(active ? 'card ' : '') + 'item'", &["card"]),
      Some(r#"classNames(active ? styles.card : '', "item")"#.to_string())
    );
    assert_eq!(
      run_rewrite("'card' + (active ? ' x' : '')", &["card"]),
      Some(r#"classNames(styles.card, active ? "x" : '')"#.to_string())
    );
  }

  #[test]
  fn test_fused_expression_keeps_its_whitespace() {
    assert_eq!(
      run_rewrite("`${active && 'card '}item`", &["card"]),
      Some("classNames(`${active && `${styles.card} `}item`)".to_string())
    );
    assert_eq!(
      run_rewrite("`x${active ? 'card ' : ''}item`", &["card"]),
      Some("classNames(`x${active ? `${styles.card} ` : ''}item`)".to_string())
    );
    assert_eq!(
      run_rewrite("`icon-${`x ${a} card `}`", &["card"]),
      Some(r#"classNames(`icon-${`${classNames("x", a, styles.card)} `}`)"#.to_string())
    );
  }

  #[derive(Debug, Clone)]
  enum Value {
    Text(String),
    Bool(bool),
    List(Vec<Value>),
  }

  impl Value {
    fn truthy(&self) -> bool {
      match self {
        Value::Text(text) => !text.is_empty(),
        Value::Bool(value) => *value,
        Value::List(..) => true,
      }
    }

    fn render(&self) -> String {
      match self {
        Value::Text(text) => text.clone(),
        Value::Bool(value) => value.to_string(),
        Value::List(items) => items.iter().map(Value::render).collect::<Vec<_>>().join(","),
      }
    }
  }

  /// Evaluate a className value with `active` bound, merge calls behave like
  /// the classnames package
  fn evaluate(expr: &Expr, active: bool, class_name_map: &ClassNameMap) -> Value {
    let eval = |expr: &Expr| evaluate(expr, active, class_name_map);
    match expr {
      Expr::Lit(Lit::Str(value)) => Value::Text(value.value.to_string()),
      Expr::Ident(ident) if &*ident.sym == "active" => Value::Bool(active),
      Expr::Paren(paren) => eval(&paren.expr),
      Expr::Tpl(tpl) => {
        let mut text = String::new();
        for (index, quasi) in tpl.quasis.iter().enumerate() {
          text.push_str(quasi.cooked.as_deref().unwrap());
          if let Some(expr) = tpl.exprs.get(index) {
            text.push_str(&eval(expr).render());
          }
        }
        Value::Text(text)
      }
      Expr::Bin(bin) => {
        let left = eval(&bin.left);
        match bin.op {
          BinaryOp::Add => Value::Text(left.render() + eval(&bin.right).render().as_str()),
          BinaryOp::LogicalAnd if !left.truthy() => left,
          BinaryOp::LogicalOr if left.truthy() => left,
          BinaryOp::LogicalAnd | BinaryOp::LogicalOr => eval(&bin.right),
          op => panic!("unexpected operator {op:?}"),
        }
      }
      Expr::Cond(cond) => {
        if eval(&cond.test).truthy() {
          eval(&cond.cons)
        } else {
          eval(&cond.alt)
        }
      }
      Expr::Array(array) => Value::List(
        array
          .elems
          .iter()
          .flatten()
          .map(|elem| eval(&elem.expr))
          .collect(),
      ),
      Expr::Member(member) => {
        let local = match &member.prop {
          MemberProp::Ident(prop) => prop.sym.to_string(),
          MemberProp::Computed(prop) => eval(&prop.expr).render(),
          prop => panic!("unexpected member {prop:?}"),
        };
        Value::Text(class_name_map[&local].clone())
      }
      Expr::Call(call) => {
        let mut classes = vec![];
        for call_arg in &call.args {
          collect_classes(eval(&call_arg.expr), &mut classes);
        }
        Value::Text(classes.join(" "))
      }
      other => panic!("cannot evaluate {other:?}"),
    }
  }

  fn collect_classes(value: Value, classes: &mut Vec<String>) {
    match value {
      Value::List(items) => {
        for item in items {
          collect_classes(item, classes);
        }
      }
      Value::Text(text) if !text.is_empty() => classes.push(text),
      _ => {}
    }
  }

  #[test]
  fn test_rewrites_keep_the_rendered_classes() {
    let class_name_map = class_name_map(&["card", "big"]);
    let rewriter = ClassNameRewriter::new(&class_name_map, "styles".into(), "classNames".into());

    let inputs = [
      "`${active ? 'card ' : ''}item`",
      "(active ? 'card ' : '') + 'item'",
      "'card' + (active ? ' big' : '')",
      "`${active && 'card '}item`",
      "`card ${active ? 'big card' : 'item'}`",
      "`${active ? 'card' : 'item'} big`",
      "`${active ? 'card ' : 'item '}${active ? 'big' : ''}`",
      "(active ? 'card' : '') + ' ' + 'big'",
      "'item ' + (active ? 'card' : 'big') + ' x'",
      "`${active ? ' card' : ''} big`",
    ];

    // Classes of the original value, with the module's classes renamed
    let expected = |rendered: &str| {
      let mut classes: Vec<String> = class_list(rendered)
        .into_iter()
        .map(|token| {
          class_name_map
            .get(&local_name(token))
            .cloned()
            .unwrap_or_else(|| token.to_string())
        })
        .collect();
      classes.sort();
      classes
    };
    let actual = |rendered: &str| {
      let mut classes: Vec<String> = class_list(rendered).into_iter().map(String::from).collect();
      classes.sort();
      classes
    };

    for input in inputs {
      let test = parse_test_expr(input);
      let replacement = rewriter
        .replace(&test.expr)
        .unwrap()
        .unwrap_or_else(|| panic!("{input} was not rewritten"))
        .into_expr();

      for active in [true, false] {
        let before = evaluate(&test.expr, active, &class_name_map).render();
        let after = evaluate(&replacement, active, &class_name_map).render();
        assert_eq!(actual(&after), expected(&before), "{input} with active = {active}");
      }
    }
  }

  #[test]
  fn test_fused_expression_can_be_rejected() {
    let result = run_rewrite_with(
      "`icon-${active ? 'card' : ''}`",
      &["card"],
      FusedExpressionPolicy::Reject,
    );
    assert!(matches!(
      result,
      Err(RewriteError::AmbiguousTemplateFusion { .. })
    ));

    assert_eq!(
      run_rewrite_with("`card icon-${kind}`", &["card"], FusedExpressionPolicy::Reject).unwrap(),
      Some("classNames(styles.card, `icon-${kind}`)".to_string())
    );
  }

  #[test]
  fn test_concatenation_keeps_fused_tokens() {
    assert_eq!(
      run_rewrite("'card btn-' + kind", &["card"]),
      Some("classNames(styles.card, `btn-${kind}`)".to_string())
    );
    assert_eq!(
      run_rewrite("'card ' + kind", &["card"]),
      Some("classNames(styles.card, kind)".to_string())
    );
  }

  #[test]
  fn test_empty_string_concatenation_collapses() {
    assert_eq!(run_rewrite("'' + 'card'", &["card"]), Some("styles.card".to_string()));
    assert_eq!(run_rewrite("'card' + ''", &["card"]), Some("styles.card".to_string()));
  }

  #[test]
  fn test_concatenation_with_arithmetic_prefix() {
    assert_eq!(
      run_rewrite("a + b + ' card'", &["card"]),
      Some("classNames(a + b, styles.card)".to_string())
    );
  }

  #[test]
  fn test_unsupported_operator() {
    let result = run_rewrite_with("'card' - 1", &["card"], FusedExpressionPolicy::Wrap);
    assert!(matches!(
      result,
      Err(RewriteError::UnsupportedOperator {
        operator: BinaryOp::Sub,
        ..
      })
    ));
  }

  #[test]
  fn test_unsafe_call_target() {
    let result = run_rewrite_with("cx('card', 'other')", &["card"], FusedExpressionPolicy::Wrap);
    let Err(RewriteError::UnsafeCallTarget { callee, .. }) = result else {
      panic!("expected an unsafe call target error");
    };
    assert_eq!(callee, "cx");

    let result = run_rewrite_with("utils.join(`x ${a} card`)", &["card"], FusedExpressionPolicy::Wrap);
    let Err(RewriteError::UnsafeCallTarget { callee, .. }) = result else {
      panic!("expected an unsafe call target error");
    };
    assert_eq!(callee, "utils.join");
  }

  #[test]
  fn test_merge_call_aliases() {
    assert_eq!(
      run_rewrite("clsx('card', ...extra)", &["card"]),
      Some("classNames(styles.card, ...extra)".to_string())
    );
    assert_eq!(
      run_rewrite("classNames('card')", &["card"]),
      Some("styles.card".to_string())
    );
  }

  #[test]
  fn test_conditional_branches() {
    assert_eq!(
      run_rewrite("active ? 'card' : 'other'", &["card"]),
      Some("classNames(active ? styles.card : 'other')".to_string())
    );
    assert_eq!(
      run_rewrite("active ? ' card ' : ''", &["card"]),
      Some("classNames(active ? styles.card : '')".to_string())
    );
    assert_eq!(
      run_rewrite("active ? 'card big' : 'card'", &["card"]).map(|code| normalize_code(&code)),
      Some(r#"classNames(active?[styles.card,"big"]:styles.card)"#.to_string())
    );
  }

  #[test]
  fn test_logical_expressions() {
    assert_eq!(
      run_rewrite("active && 'card'", &["card"]),
      Some("classNames(active && styles.card)".to_string())
    );
    assert_eq!(
      run_rewrite("name || 'card'", &["card"]),
      Some("classNames(name || styles.card)".to_string())
    );
    assert_eq!(run_rewrite("active && name", &["card"]), None);
  }

  #[test]
  fn test_logical_expressions_in_concatenation_are_trimmed() {
    assert_eq!(
      run_rewrite("'card ' + (active && ' active')", &["card"]),
      Some(r#"classNames(styles.card, active && "active")"#.to_string())
    );
  }

  #[test]
  fn test_arrays() {
    assert_eq!(
      run_rewrite("['card big', '', null, , other]", &["card"]).map(|code| normalize_code(&code)),
      Some(r#"classNames([styles.card,"big",other])"#.to_string())
    );
  }

  #[test]
  fn test_objects() {
    let output = run_rewrite(
      indoc! {r#"
        ({
          card: active,
          'big  box': large,
          other: true,
          disabled
        })
      "#},
      &["card", "box", "disabled"],
    );

    assert_eq!(
      output.map(|code| normalize_code(&code)),
      Some(
        r#"classNames({[styles.card]:active,"big":large,[styles.box]:large,other:true,[styles.disabled]:disabled})"#
          .to_string()
      )
    );
  }

  #[test]
  fn test_non_identifier_locals_use_computed_access() {
    assert_eq!(
      run_rewrite("'card icon-'", &["card", "icon-"]),
      Some(r#"classNames(styles.card, styles["icon-"])"#.to_string())
    );
  }

  #[test]
  fn test_other_expressions_are_opaque() {
    assert_eq!(run_rewrite("styles.card", &["card"]), None);
    assert_eq!(run_rewrite("name", &["card"]), None);
    assert_eq!(run_rewrite("42", &["card"]), None);
  }

  #[test]
  fn test_emitted_merge_fn_is_recognized() {
    let class_name_map = class_name_map(&["card"]);
    let rewriter = ClassNameRewriter::new(&class_name_map, "styles".into(), "cx".into())
      .with_merge_fn_aliases(["clsx".into()]);

    assert!(rewriter.is_recognized_merge_fn("cx"));
    assert!(rewriter.is_recognized_merge_fn("clsx"));
    assert!(!rewriter.is_recognized_merge_fn("classNames"));
  }

  #[test]
  fn test_tidy_merge_argument() {
    let test = parse_test_expr("(a ? ' x ' : (b ? 'y ' : z))");
    assert_eq!(
      test.print(&tidy_merge_argument(&test.expr)),
      r#"a ? "x" : b ? "y" : z"#
    );

    let test = parse_test_expr("(a, b)");
    assert_eq!(test.print(&tidy_merge_argument(&test.expr)), "(a, b)");
  }
}
