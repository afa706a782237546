//! Static text next to dynamic values.
//!
//! Template literals and `+` concatenations are both lowered to [Segments],
//! alternating static text and embedded expressions. A class token whose edge
//! touches an expression without whitespace in between is fused to it and has
//! to be emitted together with it.

use swc_core::ecma::ast::{BinExpr, BinaryOp, Expr, Lit, Tpl};

use crate::nodes::{is_logical, unparen};
use crate::tokens::class_list;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  /// The text precedes an expression, its last character is the edge
  BeforeExpression,
  /// The text follows an expression, its first character is the edge
  AfterExpression,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Boundary<'a> {
  pub fused_token: Option<&'a str>,
  pub free_tokens: Vec<&'a str>,
}

/// Split the tokens of `text` into the one fused to the expression on `side`
/// and the free ones.
pub fn resolve_boundary(text: &str, side: Side) -> Boundary<'_> {
  let mut free_tokens = class_list(text);
  let edge = match side {
    Side::BeforeExpression => text.chars().next_back(),
    Side::AfterExpression => text.chars().next(),
  };

  let fused_token = match edge {
    Some(edge) if !edge.is_whitespace() => match side {
      Side::BeforeExpression => free_tokens.pop(),
      Side::AfterExpression => Some(free_tokens.remove(0)),
    },
    _ => None,
  };

  Boundary {
    fused_token,
    free_tokens,
  }
}

#[derive(Debug, Clone, Copy)]
pub enum Piece<'a> {
  Token(&'a str),
  Expr(&'a Expr),
}

/// Static texts interleaved with expressions, `texts.len() == exprs.len() + 1`
#[derive(Debug)]
pub struct Segments<'a> {
  texts: Vec<String>,
  exprs: Vec<&'a Expr>,
}

impl<'a> Segments<'a> {
  fn new() -> Self {
    Segments {
      texts: vec![String::new()],
      exprs: vec![],
    }
  }

  fn push_text(&mut self, text: &str) {
    if let Some(last) = self.texts.last_mut() {
      last.push_str(text);
    }
  }

  fn push_expr(&mut self, expr: &'a Expr) {
    self.exprs.push(expr);
    self.texts.push(String::new());
  }

  /// Returns `None` for templates with invalid escapes, their text is unknown
  fn push_tpl(&mut self, tpl: &'a Tpl) -> Option<()> {
    for (index, quasi) in tpl.quasis.iter().enumerate() {
      self.push_text(quasi.cooked.as_ref()?);
      if let Some(expr) = tpl.exprs.get(index) {
        self.push_expr(expr);
      }
    }
    Some(())
  }

  pub fn from_tpl(tpl: &'a Tpl) -> Option<Self> {
    let mut segments = Segments::new();
    segments.push_tpl(tpl)?;
    Some(segments)
  }

  /// Lower a `+` chain.
  ///
  /// JavaScript only concatenates strings from the first string operand on,
  /// everything before it is added first and stays one opaque value. Chains
  /// without a string operand are arithmetic and return `None`.
  pub fn from_concat(bin: &'a BinExpr) -> Option<Self> {
    let mut operands = vec![];
    let mut prefixes = vec![];
    collect_concat_operands(&bin.left, &mut operands, &mut prefixes);
    operands.push(&*bin.right);

    let first_string = operands.iter().position(|operand| is_string_typed(operand))?;
    let mut segments = Segments::new();
    if first_string > 0 {
      segments.push_expr(prefixes[first_string - 1]);
    }

    for &operand in &operands[first_string..] {
      match unparen(operand) {
        Expr::Lit(Lit::Str(value)) => segments.push_text(&value.value),
        Expr::Tpl(tpl) => segments.push_tpl(tpl)?,
        _ => segments.push_expr(operand),
      }
    }

    Some(segments)
  }

  /// Whitespace the rendered value always starts and ends with
  pub fn edge_whitespace(&self) -> (&str, &str) {
    let first = self.texts.first().map_or("", String::as_str);
    let last = self.texts.last().map_or("", String::as_str);
    (
      &first[..first.len() - first.trim_start().len()],
      &last[last.trim_end().len()..],
    )
  }

  /// Group the tokens and expressions that must be emitted together.
  ///
  /// Tokens separated by whitespace end up alone in their group. A token
  /// touching an expression joins its group, and so does an expression
  /// directly following another one, unless the expression itself always
  /// renders whitespace on that edge.
  pub fn fuse(&self) -> Vec<Vec<Piece<'_>>> {
    let mut pieces: Vec<Piece<'_>> = vec![];
    // Whether a piece touches the next one without whitespace in between
    let mut touches_next: Vec<bool> = vec![];

    for (index, text) in self.texts.iter().enumerate() {
      let tokens = class_list(text);
      let has_tokens = !tokens.is_empty();
      if !text.is_empty() {
        let touches = has_tokens
          && resolve_boundary(text, Side::AfterExpression)
            .fused_token
            .is_some();
        set_last(&mut touches_next, touches);
      }

      for token in tokens {
        pieces.push(Piece::Token(token));
        touches_next.push(false);
      }

      if has_tokens {
        let touches = resolve_boundary(text, Side::BeforeExpression)
          .fused_token
          .is_some();
        set_last(&mut touches_next, touches);
      }

      if let Some(expr) = self.exprs.get(index) {
        pieces.push(Piece::Expr(expr));
        touches_next.push(true);
      }
    }

    let mut groups: Vec<Vec<Piece<'_>>> = vec![];
    let mut glued = false;
    for (index, piece) in pieces.iter().enumerate() {
      match groups.last_mut() {
        Some(group) if glued => group.push(*piece),
        _ => groups.push(vec![*piece]),
      }
      glued = index + 1 < pieces.len()
        && touches_next[index]
        && !kept_apart(&pieces, &touches_next, index);
    }

    groups
  }
}

/// Whether the edges of two touching pieces separate them anyway.
///
/// An edge that renders whitespace or nothing only separates when the other
/// side of its expression is free, otherwise an empty value would leave the
/// neighbours of the expression touching.
fn kept_apart(pieces: &[Piece<'_>], touches_next: &[bool], index: usize) -> bool {
  let free_before = |at: usize| at == 0 || !touches_next[at - 1];
  let free_after = |at: usize| at + 1 == pieces.len() || !touches_next[at];

  let left_apart = match pieces[index].edge(Side::AfterExpression) {
    Edge::Spaced => true,
    Edge::SpacedOrEmpty => free_before(index),
    Edge::Glued => false,
  };
  let right_apart = match pieces[index + 1].edge(Side::BeforeExpression) {
    Edge::Spaced => true,
    Edge::SpacedOrEmpty => free_after(index + 1),
    Edge::Glued => false,
  };

  left_apart || right_apart
}

fn set_last(touches_next: &mut [bool], touches: bool) {
  if let Some(last) = touches_next.last_mut() {
    *last = touches;
  }
}

impl Piece<'_> {
  /// The edge facing text on `side`, tokens never start or end with whitespace
  fn edge(&self, side: Side) -> Edge {
    match self {
      Piece::Token(_) => Edge::Glued,
      Piece::Expr(expr) => expression_edge(expr, side),
    }
  }
}

/// What a dynamic value renders at one of its ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
  /// Possibly a class character
  Glued,
  /// Always whitespace
  Spaced,
  /// Whitespace, or nothing at all
  SpacedOrEmpty,
}

impl Edge {
  fn either(self, other: Edge) -> Edge {
    match (self, other) {
      (Edge::Glued, _) | (_, Edge::Glued) => Edge::Glued,
      (Edge::Spaced, Edge::Spaced) => Edge::Spaced,
      _ => Edge::SpacedOrEmpty,
    }
  }
}

/// The edge of `expr` facing text on `side`.
///
/// Only string literals, templates and conditionals between them are known.
/// A logical expression is glued, `false && 'card '` renders `false`.
pub fn expression_edge(expr: &Expr, side: Side) -> Edge {
  match unparen(expr) {
    Expr::Lit(Lit::Str(value)) => value_edge(&value.value, side),
    Expr::Tpl(tpl) => {
      let quasi = match side {
        Side::BeforeExpression => tpl.quasis.first(),
        Side::AfterExpression => tpl.quasis.last(),
      };
      match quasi.and_then(|quasi| quasi.cooked.as_deref()) {
        Some(text) if !text.is_empty() || tpl.exprs.is_empty() => value_edge(text, side),
        _ => Edge::Glued,
      }
    }
    Expr::Cond(cond) => {
      expression_edge(&cond.cons, side).either(expression_edge(&cond.alt, side))
    }
    _ => Edge::Glued,
  }
}

fn value_edge(value: &str, side: Side) -> Edge {
  let edge = match side {
    Side::BeforeExpression => value.chars().next(),
    Side::AfterExpression => value.chars().next_back(),
  };

  match edge {
    None => Edge::SpacedOrEmpty,
    Some(edge) if edge.is_whitespace() => Edge::Spaced,
    Some(_) => Edge::Glued,
  }
}

/// `prefixes[n]` is the expression adding up `operands[..=n]`
fn collect_concat_operands<'a>(
  expr: &'a Expr,
  operands: &mut Vec<&'a Expr>,
  prefixes: &mut Vec<&'a Expr>,
) {
  match expr {
    Expr::Bin(BinExpr {
      op: BinaryOp::Add,
      left,
      right,
      ..
    }) => {
      collect_concat_operands(left, operands, prefixes);
      operands.push(right);
    }
    _ => operands.push(expr),
  }
  prefixes.push(expr);
}

/// Whether `expr` evaluates to a string whatever its dynamic parts are
pub fn is_string_typed(expr: &Expr) -> bool {
  match unparen(expr) {
    Expr::Lit(Lit::Str(..)) | Expr::Tpl(..) => true,
    Expr::Cond(cond) => is_string_typed(&cond.cons) || is_string_typed(&cond.alt),
    Expr::Bin(bin) if bin.op == BinaryOp::Add => {
      is_string_typed(&bin.left) || is_string_typed(&bin.right)
    }
    Expr::Bin(bin) if is_logical(bin.op) => is_string_typed(&bin.right),
    _ => false,
  }
}
