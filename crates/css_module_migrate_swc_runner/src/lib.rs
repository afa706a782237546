pub mod runner;
pub mod test_utils;

pub use runner::{
  parse_expr, parse_script, print_node, syntax_for_path, ParsedScript, RunnerError,
};
