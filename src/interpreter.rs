use std::io::Write;

use crate::{
    ast::{CallNode, ListNode, Node, NumberNode},
    error::Error,
    host::{Functions, ParamType, Ret, Value},
};

struct Interpreter<'a, W: Write> {
    funcs: &'a Functions,
    output: W,
}

impl<'a, W: Write> Interpreter<'a, W> {
    fn run(&mut self, tree: &ListNode) -> Result<(), Error> {
        for node in &tree.nodes {
            let value = self.eval_node(node)?;
            self.print(&value)?;
        }
        Ok(())
    }

    fn eval_node(&mut self, node: &Node) -> Result<Value, Error> {
        match node {
            Node::Call(call) => self.make_call(call),
            other => Err(Error::Type(format!(
                "can't evaluate this kind of node: {other}"
            ))),
        }
    }

    fn make_call(&mut self, call: &CallNode) -> Result<Value, Error> {
        let funcs = self.funcs;
        let func = match funcs.get(&call.name) {
            Some(func) => func,
            None => return Err(Error::UnknownFunction(call.name.clone())),
        };
        let sig = &func.sig;

        if sig.variadic && sig.params.is_empty() {
            return Err(Error::Signature(format!(
                "variadic function {} declares no argument types",
                call.name
            )));
        }

        if sig.variadic {
            // the trailing parameter type may repeat zero or more times
            let fixed = sig.params.len() - 1;
            if call.args.len() < fixed {
                return Err(Error::Arity {
                    name: call.name.clone(),
                    want: fixed,
                    got: call.args.len(),
                    at_least: true,
                });
            }
        } else if call.args.len() != sig.params.len() {
            return Err(Error::Arity {
                name: call.name.clone(),
                want: sig.params.len(),
                got: call.args.len(),
                at_least: false,
            });
        }

        match sig.ret.as_slice() {
            [Ret::Value] | [Ret::Value, Ret::Error] => {}
            _ => {
                return Err(Error::Signature(format!(
                    "can't handle multiple returns from function {}",
                    call.name
                )))
            }
        }

        let mut args = Vec::with_capacity(call.args.len());
        for (position, node) in call.args.iter().enumerate() {
            let param = if position < sig.params.len() {
                sig.params[position]
            } else {
                sig.params[sig.params.len() - 1]
            };
            args.push(self.eval_arg(node, param)?);
        }

        func.invoke(args).map_err(|reason| Error::Call {
            name: call.name.clone(),
            reason,
        })
    }

    fn eval_arg(&mut self, node: &Node, param: ParamType) -> Result<Value, Error> {
        if let Node::Call(call) = node {
            let value = self.make_call(call)?;
            return coerce_result(value, param);
        }

        match param {
            ParamType::Int => match node {
                Node::Number(NumberNode { int: Some(int), .. }) => Ok(Value::Int(*int)),
                other => Err(Error::Type(format!("expected integer; found {other}"))),
            },
            ParamType::Uint => match node {
                Node::Number(NumberNode {
                    uint: Some(uint), ..
                }) => Ok(Value::Uint(*uint)),
                other => Err(Error::Type(format!(
                    "expected unsigned integer; found {other}"
                ))),
            },
            ParamType::Text => match node {
                Node::String(string) => Ok(Value::Str(string.text.clone())),
                other => Err(Error::Type(format!("expected string; found {other}"))),
            },
            ParamType::Any => eval_any(node),
            ParamType::Bool => Err(Error::Type(format!(
                "can't handle {node} for arg of type {param}"
            ))),
        }
    }

    fn print(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Str(text) => write!(self.output, "{text}")?,
            other => writeln!(self.output, "{other}")?,
        }
        Ok(())
    }
}

// an untyped literal adopts a concrete type from its use
fn eval_any(node: &Node) -> Result<Value, Error> {
    match node {
        Node::Number(number) => ideal_constant(number),
        Node::String(string) => Ok(Value::Str(string.text.clone())),
        other => Err(Error::Type(format!(
            "can't handle assignment of {other} to an argument of type any"
        ))),
    }
}

fn ideal_constant(number: &NumberNode) -> Result<Value, Error> {
    if let Some(int) = number.int {
        if isize::try_from(int).is_err() {
            return Err(Error::Type(format!("{} overflows int", number.text)));
        }
        return Ok(Value::Int(int));
    }
    if number.uint.is_some() {
        return Err(Error::Type(format!(
            "unsigned integers are not supported: {}",
            number.text
        )));
    }
    Err(Error::Internal(format!(
        "number {} has no parsed value",
        number.text
    )))
}

fn coerce_result(value: Value, param: ParamType) -> Result<Value, Error> {
    let fits = matches!(
        (param, &value),
        (ParamType::Any, _)
            | (ParamType::Int, Value::Int(_))
            | (ParamType::Uint, Value::Uint(_))
            | (ParamType::Text, Value::Str(_))
            | (ParamType::Bool, Value::Bool(_))
    );
    if fits {
        Ok(value)
    } else {
        Err(Error::Type(format!(
            "can't use {value} as an argument of type {param}"
        )))
    }
}

/// Walks the top-level forms in order, printing each result to `output`.
/// String results print bare; every other value gets a trailing newline.
pub fn exec<W: Write>(output: W, tree: &ListNode, funcs: &Functions) -> Result<(), Error> {
    let mut interpreter = Interpreter { funcs, output };
    interpreter.run(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostFn, HostResult, Signature};
    use crate::parser::parse;

    fn sum(args: Vec<Value>) -> HostResult {
        let mut total = 0i64;
        for arg in args {
            match arg {
                Value::Int(int) => total += int,
                other => return Err(format!("not an int: {other}")),
            }
        }
        Ok(Value::Int(total))
    }

    fn echo(mut args: Vec<Value>) -> HostResult {
        args.pop().ok_or_else(|| "missing argument".to_string())
    }

    fn table() -> Functions {
        let mut funcs = Functions::new();
        funcs.insert(
            "sum".to_string(),
            HostFn::new(Signature::variadic(vec![ParamType::Any]).fallible(), sum),
        );
        funcs.insert(
            "echo".to_string(),
            HostFn::new(Signature::fixed(vec![ParamType::Text]), echo),
        );
        funcs.insert(
            "double".to_string(),
            HostFn::new(Signature::fixed(vec![ParamType::Int]), |args: Vec<Value>| {
                match args.as_slice() {
                    [Value::Int(int)] => Ok(Value::Int(int * 2)),
                    _ => Err("expected one integer".to_string()),
                }
            }),
        );
        funcs.insert(
            "keep".to_string(),
            HostFn::new(
                Signature::fixed(vec![ParamType::Uint]),
                |mut args: Vec<Value>| args.pop().ok_or_else(|| "missing argument".to_string()),
            ),
        );
        funcs.insert(
            "yes".to_string(),
            HostFn::new(Signature::fixed(vec![]), |_args: Vec<Value>| -> HostResult {
                Ok(Value::Bool(true))
            }),
        );
        funcs.insert(
            "flag".to_string(),
            HostFn::new(Signature::fixed(vec![ParamType::Bool]), echo),
        );
        funcs.insert(
            "fail".to_string(),
            HostFn::new(
                Signature::fixed(vec![]).fallible(),
                |_args: Vec<Value>| -> HostResult { Err("it broke".to_string()) },
            ),
        );
        funcs
    }

    fn run_source(source: &str, funcs: &Functions) -> Result<String, Error> {
        let tree = parse(source).unwrap();
        let mut sink = Vec::new();
        exec(&mut sink, &tree, funcs)?;
        Ok(String::from_utf8(sink).unwrap())
    }

    fn run_error(source: &str, funcs: &Functions) -> Error {
        run_source(source, funcs).unwrap_err()
    }

    #[test]
    fn dispatches_and_prints_with_newline() {
        assert_eq!(run_source("(sum 1 2 3)", &table()).unwrap(), "6\n");
    }

    #[test]
    fn string_results_print_without_newline() {
        assert_eq!(run_source(r#"(echo "hi")"#, &table()).unwrap(), "hi");
    }

    #[test]
    fn forms_print_in_source_order() {
        let output = run_source("(sum 1 2) (double 3)", &table()).unwrap();
        assert_eq!(output, "3\n6\n");
    }

    #[test]
    fn booleans_print_lowercase() {
        assert_eq!(run_source("(yes)", &table()).unwrap(), "true\n");
    }

    #[test]
    fn unknown_function_is_reported() {
        let err = run_error("(missing 1)", &table());
        assert_eq!(err.to_string(), "function not defined: missing");
    }

    #[test]
    fn fixed_arity_is_exact() {
        let err = run_error("(double 1 2)", &table());
        assert_eq!(err.to_string(), "wrong number of args for double: want 1, got 2");
        let err = run_error("(double)", &table());
        assert_eq!(err.to_string(), "wrong number of args for double: want 1, got 0");
    }

    #[test]
    fn variadic_arity_is_a_lower_bound() {
        let mut funcs = table();
        funcs.insert(
            "join".to_string(),
            HostFn::new(
                Signature::variadic(vec![ParamType::Text, ParamType::Text]),
                echo,
            ),
        );
        let err = run_error("(join)", &funcs);
        assert_eq!(err.to_string(), "wrong number of args for join: want at least 1, got 0");
        assert_eq!(run_source(r#"(join "a")"#, &funcs).unwrap(), "a");
    }

    #[test]
    fn variadic_without_params_is_rejected() {
        let mut funcs = table();
        funcs.insert(
            "broken".to_string(),
            HostFn::new(
                Signature {
                    params: vec![],
                    variadic: true,
                    ret: vec![Ret::Value],
                },
                echo,
            ),
        );
        let err = run_error("(broken)", &funcs);
        assert_eq!(
            err.to_string(),
            "variadic function broken declares no argument types"
        );
    }

    #[test]
    fn unsupported_return_shapes_are_rejected() {
        let mut funcs = table();
        funcs.insert(
            "pair".to_string(),
            HostFn::new(
                Signature {
                    params: vec![],
                    variadic: false,
                    ret: vec![Ret::Value, Ret::Value],
                },
                echo,
            ),
        );
        let err = run_error("(pair)", &funcs);
        assert_eq!(
            err.to_string(),
            "can't handle multiple returns from function pair"
        );
    }

    #[test]
    fn integer_params_take_signed_readings() {
        assert_eq!(run_source("(double -4)", &table()).unwrap(), "-8\n");
        let err = run_error(r#"(double "a")"#, &table());
        assert_eq!(err.to_string(), r#"expected integer; found "a""#);
    }

    #[test]
    fn unsigned_params_reject_negative_literals() {
        assert_eq!(run_source("(keep 7)", &table()).unwrap(), "7\n");
        let err = run_error("(keep -7)", &table());
        assert_eq!(err.to_string(), "expected unsigned integer; found -7");
    }

    #[test]
    fn string_params_take_only_string_literals() {
        let err = run_error("(echo 5)", &table());
        assert_eq!(err.to_string(), "expected string; found 5");
    }

    #[test]
    fn any_params_default_numbers_to_signed() {
        let err = run_error("(sum 18446744073709551615)", &table());
        assert_eq!(
            err.to_string(),
            "unsigned integers are not supported: 18446744073709551615"
        );
    }

    #[test]
    fn any_params_reject_variables() {
        let err = run_error("(sum x)", &table());
        assert_eq!(
            err.to_string(),
            "can't handle assignment of x to an argument of type any"
        );
    }

    #[test]
    fn nested_results_must_match_the_declared_param() {
        assert_eq!(run_source("(double (double 3))", &table()).unwrap(), "12\n");
        let err = run_error(r#"(double (echo "hi"))"#, &table());
        assert_eq!(err.to_string(), "can't use hi as an argument of type int");
    }

    #[test]
    fn bool_params_take_only_nested_results() {
        assert_eq!(run_source("(flag (yes))", &table()).unwrap(), "true\n");
        let err = run_error("(flag x)", &table());
        assert_eq!(err.to_string(), "can't handle x for arg of type bool");
    }

    #[test]
    fn invocation_failures_name_the_function() {
        let err = run_error("(fail)", &table());
        assert_eq!(err.to_string(), "error calling fail: it broke");
    }

    #[test]
    fn top_level_special_forms_do_not_evaluate() {
        let err = run_error("(define x 5)", &table());
        assert_eq!(
            err.to_string(),
            "can't evaluate this kind of node: (define x 5)"
        );
    }

    #[test]
    fn argument_errors_come_before_invocation() {
        let err = run_error(r#"(sum 1 (fail) 2)"#, &table());
        assert_eq!(err.to_string(), "error calling fail: it broke");
    }
}
