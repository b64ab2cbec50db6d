//! A tiny Lisp-flavored expression language that dispatches every call
//! into a host-supplied function table.

use std::io::Write;

pub mod ast;
pub mod error;
pub mod globals;
pub mod host;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::Error;
pub use host::{Functions, HostFn, HostResult, ParamType, Ret, Signature, Value};
pub use interpreter::exec;
pub use parser::parse;

/// Parses `source` and evaluates its top-level forms against `funcs`,
/// printing each result to `output`.
///
/// ```
/// use lisplet::globals;
///
/// let mut output = Vec::new();
/// lisplet::run("(plus 1 2 3)", &globals::table(), &mut output)?;
/// assert_eq!(output, b"6\n");
/// # Ok::<(), lisplet::Error>(())
/// ```
pub fn run<W: Write>(source: &str, funcs: &Functions, output: W) -> Result<(), Error> {
    let tree = parse(source)?;
    exec(output, &tree, funcs)
}
