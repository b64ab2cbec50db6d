use std::collections::HashMap;
use std::fmt;

use dyn_clone::DynClone;

/// A value passed to or returned from a host function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Uint(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Parameter categories a host function may declare. The evaluator knows how
/// to fill `Int`, `Uint`, `Text` and `Any` from literals; a `Bool` parameter
/// only accepts the result of a nested call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Uint,
    Text,
    Bool,
    Any,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Int => "int",
            ParamType::Uint => "uint",
            ParamType::Text => "string",
            ParamType::Bool => "bool",
            ParamType::Any => "any",
        };
        write!(f, "{name}")
    }
}

/// One component of a declared return shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ret {
    Value,
    Error,
}

/// What a host function looks like from the outside: its parameter types in
/// order, whether the last one repeats, and its return shape. Registration
/// does not validate any of this; the evaluator checks it per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamType>,
    pub variadic: bool,
    pub ret: Vec<Ret>,
}

impl Signature {
    pub fn fixed(params: Vec<ParamType>) -> Self {
        Signature {
            params,
            variadic: false,
            ret: vec![Ret::Value],
        }
    }

    /// The last parameter type repeats for any trailing arguments.
    pub fn variadic(params: Vec<ParamType>) -> Self {
        Signature {
            params,
            variadic: true,
            ret: vec![Ret::Value],
        }
    }

    /// Declares the (value, error) return pair.
    pub fn fallible(mut self) -> Self {
        self.ret = vec![Ret::Value, Ret::Error];
        self
    }
}

pub type HostResult = Result<Value, String>;

pub trait Callable: DynClone + Send + Sync {
    fn invoke(&self, args: Vec<Value>) -> HostResult;
}

dyn_clone::clone_trait_object!(Callable);

impl<F> Callable for F
where
    F: Fn(Vec<Value>) -> HostResult + Clone + Send + Sync,
{
    fn invoke(&self, args: Vec<Value>) -> HostResult {
        self(args)
    }
}

/// A registered host function: its signature plus the thing to call.
#[derive(Clone)]
pub struct HostFn {
    pub sig: Signature,
    call: Box<dyn Callable>,
}

impl HostFn {
    pub fn new(sig: Signature, call: impl Callable + 'static) -> Self {
        HostFn {
            sig,
            call: Box::new(call),
        }
    }

    pub fn invoke(&self, args: Vec<Value>) -> HostResult {
        self.call.invoke(args)
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFn")
            .field("sig", &self.sig)
            .field("call", &"<callable>")
            .finish()
    }
}

/// The table the evaluator dispatches into. Read-only during a run.
pub type Functions = HashMap<String, HostFn>;
