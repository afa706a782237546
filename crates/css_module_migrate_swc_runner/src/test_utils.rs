use swc_core::common::sync::Lrc;
use swc_core::common::SourceMap;
use swc_core::ecma::ast::Expr;

use crate::runner::{parse_expr, print_node};

/// An expression parsed for a test, printed back with the source map it was
/// parsed into so kept nodes keep their original formatting
pub struct TestExpr {
  pub source_map: Lrc<SourceMap>,
  pub expr: Box<Expr>,
}

impl TestExpr {
  pub fn print(&self, expr: &Expr) -> String {
    print_node(&self.source_map, expr, "\n").unwrap()
  }
}

pub fn parse_test_expr(code: &str) -> TestExpr {
  let source_map: Lrc<SourceMap> = Default::default();
  let expr = parse_expr(&source_map, code).unwrap();
  TestExpr { source_map, expr }
}

/// Remove all whitespace, for outputs whose line breaking is up to the code
/// generator
#[allow(unused)]
pub fn normalize_code(code: &str) -> String {
  code.chars().filter(|c| !c.is_whitespace()).collect()
}
