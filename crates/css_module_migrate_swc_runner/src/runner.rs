use std::ops::Range;
use std::path::Path;
use std::string::FromUtf8Error;

use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceFile, SourceMap, Span, Spanned};
use swc_core::ecma::ast::{Expr, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config, Emitter, Node};
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, Syntax, TsSyntax};

/// A script parsed with SWC together with the source map needed to print
/// nodes back and to translate spans into byte ranges and line numbers.
pub struct ParsedScript {
  pub source_map: Lrc<SourceMap>,
  pub source_file: Lrc<SourceFile>,
  pub module: Module,
}

impl ParsedScript {
  /// 1-based line of the start of `span`
  pub fn line_of(&self, span: Span) -> usize {
    self.source_map.lookup_char_pos(span.lo).line
  }

  /// Byte range of `span` inside the original source text
  pub fn byte_range(&self, span: Span) -> Range<usize> {
    let start = self.source_file.start_pos.0;
    (span.lo.0 - start) as usize..(span.hi.0 - start) as usize
  }

  pub fn print<N: Node>(&self, node: &N, new_line: &str) -> Result<String, RunnerError> {
    print_node(&self.source_map, node, new_line)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  #[error("Failed to parse {file}:{line}: {message}")]
  Parse {
    file: String,
    line: usize,
    message: String,
  },
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid utf-8 output: {0}")]
  InvalidUtf8Output(#[from] FromUtf8Error),
}

/// Pick the parser syntax for a script from its extension.
///
/// Plain `.js` files are parsed with JSX enabled, React projects routinely keep
/// components in `.js` files.
pub fn syntax_for_path(path: &Path) -> Syntax {
  let extension = path
    .extension()
    .and_then(|extension| extension.to_str())
    .unwrap_or_default();

  match extension {
    "tsx" => Syntax::Typescript(TsSyntax {
      tsx: true,
      decorators: true,
      ..Default::default()
    }),
    "ts" | "mts" | "cts" => Syntax::Typescript(TsSyntax {
      decorators: true,
      ..Default::default()
    }),
    _ => Syntax::Es(EsSyntax {
      jsx: true,
      decorators: true,
      ..Default::default()
    }),
  }
}

/// Parse a script module.
///
/// Recoverable parser errors are treated as failures as well, the migration
/// should never rewrite a file SWC only partially understood.
pub fn parse_script(path: &Path, code: &str) -> Result<ParsedScript, RunnerError> {
  let source_map: Lrc<SourceMap> = Default::default();
  let source_file = source_map.new_source_file(
    Lrc::new(FileName::Real(path.to_path_buf())),
    code.to_string(),
  );

  let lexer = Lexer::new(
    syntax_for_path(path),
    Default::default(),
    StringInput::from(&*source_file),
    None,
  );

  let mut parser = Parser::new_from(lexer);
  let module = parser.parse_module();
  let recovered_errors = parser.take_errors();
  let file = path.display().to_string();

  let module = module.map_err(|err| parse_error(&source_map, &file, err))?;
  if let Some(err) = recovered_errors.into_iter().next() {
    return Err(parse_error(&source_map, &file, err));
  }

  Ok(ParsedScript {
    source_map,
    source_file,
    module,
  })
}

/// Parse a standalone expression as TSX into `source_map`.
pub fn parse_expr(source_map: &Lrc<SourceMap>, code: &str) -> Result<Box<Expr>, RunnerError> {
  let source_file = source_map.new_source_file(Lrc::new(FileName::Anon), code.to_string());

  let lexer = Lexer::new(
    Syntax::Typescript(TsSyntax {
      tsx: true,
      ..Default::default()
    }),
    Default::default(),
    StringInput::from(&*source_file),
    None,
  );

  let mut parser = Parser::new_from(lexer);
  parser
    .parse_expr()
    .map_err(|err| parse_error(source_map, "<expression>", err))
}

/// Print a single node with the SWC code generator.
pub fn print_node<N: Node>(
  source_map: &Lrc<SourceMap>,
  node: &N,
  new_line: &str,
) -> Result<String, RunnerError> {
  let mut output_buffer = vec![];
  {
    let writer = JsWriter::new(source_map.clone(), new_line, &mut output_buffer, None);
    let mut emitter = Emitter {
      cfg: Config::default(),
      cm: source_map.clone(),
      comments: None,
      wr: writer,
    };
    node.emit_with(&mut emitter)?;
  }

  Ok(String::from_utf8(output_buffer)?)
}

fn parse_error(
  source_map: &SourceMap,
  file: &str,
  err: swc_core::ecma::parser::error::Error,
) -> RunnerError {
  RunnerError::Parse {
    file: file.to_string(),
    line: source_map.lookup_char_pos(err.span().lo).line,
    message: err.kind().msg().to_string(),
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use pretty_assertions::assert_eq;
  use swc_core::ecma::ast::{Lit, ModuleItem, Stmt};

  use super::*;

  #[test]
  fn test_syntax_for_path() {
    assert!(matches!(
      syntax_for_path(&PathBuf::from("src/App.tsx")),
      Syntax::Typescript(TsSyntax { tsx: true, .. })
    ));
    assert!(matches!(
      syntax_for_path(&PathBuf::from("src/api.ts")),
      Syntax::Typescript(TsSyntax { tsx: false, .. })
    ));
    assert!(matches!(
      syntax_for_path(&PathBuf::from("src/App.js")),
      Syntax::Es(EsSyntax { jsx: true, .. })
    ));
  }

  #[test]
  fn test_parse_script_with_jsx() {
    let code = "const a = <div className='card' />;\n";
    let script = parse_script(&PathBuf::from("src/App.jsx"), code).unwrap();

    assert_eq!(script.module.body.len(), 1);
    let ModuleItem::Stmt(Stmt::Decl(decl)) = &script.module.body[0] else {
      panic!("expected a declaration");
    };
    assert_eq!(
      &code[script.byte_range(decl.span())],
      "const a = <div className='card' />;"
    );
    assert_eq!(script.line_of(decl.span()), 1);
  }

  #[test]
  fn test_parse_script_reports_line() {
    let code = "const a = 1;\nconst = ;\n";
    let Err(RunnerError::Parse { line, .. }) = parse_script(&PathBuf::from("src/a.js"), code) else {
      panic!("expected a parse error");
    };
    assert_eq!(line, 2);
  }

  #[test]
  fn test_print_node() {
    let source_map: Lrc<SourceMap> = Default::default();
    let expr = parse_expr(&source_map, "classNames('card', level ? 'a' : \"b\")").unwrap();
    assert_eq!(
      print_node(&source_map, &expr, "\n").unwrap(),
      "classNames('card', level ? 'a' : \"b\")"
    );

    let Expr::Lit(lit @ Lit::Str(..)) = *parse_expr(&source_map, "'x'").unwrap() else {
      panic!("expected a string literal");
    };
    assert_eq!(print_node(&source_map, &lit, "\n").unwrap(), "'x'");
  }
}
