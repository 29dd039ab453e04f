#![allow(clippy::module_inception)]

use std::rc::Rc;

use inkwell::context::Context;
use log::{debug, info};

use crate::{
    ast::display::display_tree,
    compiler::compiler::compile_module,
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod runtime;
pub mod type_checker;

extern crate regex;

#[derive(Debug, Clone)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Settings for one invocation of [`compile`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported in diagnostics and stored in positions.
    pub file_name: String,
    /// Name of the emitted LLVM module.
    pub module_name: String,
    /// Run the LLVM verifier over the finished module.
    pub verify: bool,
    /// Stamp the host target triple and data layout onto the module.
    pub host_target: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_name: String::from("shell"),
            module_name: String::from("tiger"),
            verify: true,
            host_target: true,
        }
    }
}

/// Result of running the whole pipeline over one source text.
#[derive(Debug)]
pub struct Compilation {
    pub diagnostics: Vec<Error>,
    pub display_tree: Option<String>,
    pub ir: Option<String>,
}

impl Compilation {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs tokenize, parse, check and (only when checking is clean) codegen.
pub fn compile(source: String, config: &Config) -> Compilation {
    let tokens = match tokenize(source, Some(config.file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => {
            return Compilation {
                diagnostics: vec![error],
                display_tree: None,
                ir: None,
            }
        }
    };
    debug!("tokenized {} tokens", tokens.len());

    let (_, ast) = parse(tokens, Rc::new(config.file_name.clone()));
    let ast = match ast {
        Ok(ast) => ast,
        Err(error) => {
            return Compilation {
                diagnostics: vec![error],
                display_tree: None,
                ir: None,
            }
        }
    };
    let tree = display_tree(&ast);

    let (checker, diagnostics) = type_check(&ast);
    if !diagnostics.is_empty() {
        info!("checking reported {} error(s), skipping codegen", diagnostics.len());
        return Compilation {
            diagnostics,
            display_tree: Some(tree),
            ir: None,
        };
    }

    let context = Context::create();
    let compilation = match compile_module(&ast, &checker, &context, config) {
        Ok(compiler) => Compilation {
            diagnostics: vec![],
            display_tree: Some(tree),
            ir: Some(compiler.module.print_to_string().to_string()),
        },
        Err(error) => Compilation {
            diagnostics: vec![error],
            display_tree: Some(tree),
            ir: None,
        },
    };
    compilation
}

/// Finds the 1-based line containing `position`, the line text and the column.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    if pos > content.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    // Position at end of input points just past the last line.
    content
        .lines()
        .last()
        .map(|line| (line_number.saturating_sub(1).max(1), line.to_string(), line.len()))
}

pub fn render_error(error: &Error, source: &str) -> String {
    /*
        Error: TypeMismatch (Expected type `int`, received `string`)
        -> queens.tig
           |
        20 | var a : int := "x"
           | ---------------^
    */

    let position = error.get_position();
    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        out.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }
    out.push_str(&format!("-> {}\n", position.1));

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.0) else {
        return out;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use crate::{
        errors::errors::{Error, ErrorImpl},
        Position,
    };

    const SOURCE: &str = "let\n  var a := 1\nin\n  a + \"x\"\nend\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 2).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "let\n");
        assert_eq!(line_pos, 2);

        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 24).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "  a + \"x\"\n");
        assert_eq!(line_pos, 4);
    }

    #[test]
    fn test_get_line_past_end() {
        assert!(super::get_line_at_position(SOURCE, 500).is_none());
    }

    #[test]
    fn test_render_error() {
        let error = Error::new(
            ErrorImpl::TypeMismatch {
                expected: "int".to_string(),
                received: "string".to_string(),
            },
            Position(26, Rc::new("add.tig".to_string())),
        );

        let rendered = super::render_error(&error, SOURCE);
        assert_eq!(
            rendered,
            "Error: TypeMismatch (Expected type `int`, received `string`)\n\
             -> add.tig\n\
             \x20 |\n\
             4 | a + \"x\"\n\
             \x20 | ----^\n"
        );
    }

    #[test]
    fn test_compile_returns_ir_for_checked_program() {
        let config = super::Config {
            host_target: false,
            ..super::Config::default()
        };
        let compilation = super::compile("let var a := 5 in a + 1 end".to_string(), &config);

        assert!(compilation.is_ok(), "{:?}", compilation.diagnostics);
        assert!(compilation.display_tree.is_some());
        assert!(compilation.ir.unwrap().contains("define i32 @main()"));
    }

    #[test]
    fn test_compile_reports_parse_errors_without_tree() {
        let compilation = super::compile("let in".to_string(), &super::Config::default());
        assert!(!compilation.is_ok());
        assert!(compilation.display_tree.is_none());
        assert!(compilation.ir.is_none());
    }
}
