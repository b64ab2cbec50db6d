use std::{error, fmt, io};

/// Anything that can abort a run. The first error wins; no recovery.
#[derive(Debug)]
pub enum Error {
    /// Unrecognized input while scanning.
    Lex(String),
    /// A token that does not fit the grammar position.
    Syntax(String),
    /// Call name missing from the function table.
    UnknownFunction(String),
    /// Wrong argument count for a resolved function.
    Arity {
        name: String,
        want: usize,
        got: usize,
        at_least: bool,
    },
    /// A registered signature the evaluator cannot call.
    Signature(String),
    /// An argument that cannot be coerced to its parameter type.
    Type(String),
    /// The host function itself reported a failure.
    Call { name: String, reason: String },
    /// Writing a result to the output sink failed.
    Output(io::Error),
    /// A broken invariant inside the interpreter. Never caused by input.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(message) => write!(f, "{message}"),
            Error::Syntax(message) => write!(f, "{message}"),
            Error::UnknownFunction(name) => write!(f, "function not defined: {name}"),
            Error::Arity {
                name,
                want,
                got,
                at_least,
            } => {
                if *at_least {
                    write!(f, "wrong number of args for {name}: want at least {want}, got {got}")
                } else {
                    write!(f, "wrong number of args for {name}: want {want}, got {got}")
                }
            }
            Error::Signature(message) => write!(f, "{message}"),
            Error::Type(message) => write!(f, "{message}"),
            Error::Call { name, reason } => write!(f, "error calling {name}: {reason}"),
            Error::Output(err) => write!(f, "cannot write output: {err}"),
            Error::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Output(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Output(err)
    }
}
