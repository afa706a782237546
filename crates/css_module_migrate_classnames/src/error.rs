use swc_core::common::Span;
use swc_core::ecma::ast::BinaryOp;

/// A className expression the rewriter refuses to change.
///
/// These abort the rewrite of the current file, the caller reports them with
/// the location of `span`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewriteError {
  #[error("Unsupported operator `{operator}` in a className expression, only `+` concatenation can be rewritten")]
  UnsupportedOperator { operator: BinaryOp, span: Span },
  #[error("Class names are passed to `{callee}`, only calls to a class name merge utility can be rewritten")]
  UnsafeCallTarget { callee: String, span: Span },
  #[error("A class name is fused to an expression that itself contains CSS module classes")]
  AmbiguousTemplateFusion { span: Span },
}

impl RewriteError {
  pub fn span(&self) -> Span {
    match self {
      RewriteError::UnsupportedOperator { span, .. }
      | RewriteError::UnsafeCallTarget { span, .. }
      | RewriteError::AmbiguousTemplateFusion { span } => *span,
    }
  }
}
