use rand::Rng;
use unicode_segmentation::UnicodeSegmentation;

use crate::host::{Functions, HostFn, HostResult, ParamType, Signature, Value};

type IntFn = fn(i64, i64) -> i64;

fn op(name: &str, mut args: Vec<Value>, f: IntFn) -> HostResult {
    // plus and minus double as sign changers when given a single argument
    if args.len() == 1 && (name == "plus" || name == "minus") {
        args.insert(0, Value::Int(0));
    }

    if args.len() < 2 {
        return Err(format!(
            "at least two params are needed for the {name} operator"
        ));
    }

    let mut total = match args[0] {
        Value::Int(int) => int,
        _ => return Err(format!("{name} operator can't handle this kind of numbers")),
    };
    for arg in &args[1..] {
        let int = match arg {
            Value::Int(int) => *int,
            _ => return Err(format!("{name} operator can't handle this kind of numbers")),
        };
        if (name == "divide" || name == "modulo") && int == 0 {
            return Err("division by zero".to_string());
        }
        total = f(total, int);
    }
    Ok(Value::Int(total))
}

fn plus(args: Vec<Value>) -> HostResult {
    op("plus", args, i64::wrapping_add)
}

fn minus(args: Vec<Value>) -> HostResult {
    op("minus", args, i64::wrapping_sub)
}

fn times(args: Vec<Value>) -> HostResult {
    op("times", args, i64::wrapping_mul)
}

fn divide(args: Vec<Value>) -> HostResult {
    op("divide", args, i64::wrapping_div)
}

fn modulo(args: Vec<Value>) -> HostResult {
    op("modulo", args, i64::wrapping_rem)
}

fn int_pair(args: &[Value]) -> Result<(i64, i64), String> {
    match args {
        [Value::Int(a), Value::Int(b)] => Ok((*a, *b)),
        _ => Err("expected two integer arguments".to_string()),
    }
}

fn greater_than(args: Vec<Value>) -> HostResult {
    let (a, b) = int_pair(&args)?;
    Ok(Value::Bool(a > b))
}

fn greater_equal(args: Vec<Value>) -> HostResult {
    let (a, b) = int_pair(&args)?;
    Ok(Value::Bool(a >= b))
}

fn less_than(args: Vec<Value>) -> HostResult {
    let (a, b) = int_pair(&args)?;
    Ok(Value::Bool(a < b))
}

fn less_equal(args: Vec<Value>) -> HostResult {
    let (a, b) = int_pair(&args)?;
    Ok(Value::Bool(a <= b))
}

// values of different kinds are never equal, even for matching digits
fn equal(args: Vec<Value>) -> HostResult {
    match args.as_slice() {
        [a, b] => Ok(Value::Bool(a == b)),
        _ => Err("expected two arguments".to_string()),
    }
}

fn not(args: Vec<Value>) -> HostResult {
    match args.as_slice() {
        [Value::Bool(value)] => Ok(Value::Bool(!*value)),
        _ => Err("expected a boolean argument".to_string()),
    }
}

fn length(args: Vec<Value>) -> HostResult {
    match args.as_slice() {
        [Value::Str(text)] => Ok(Value::Int(text.graphemes(true).count() as i64)),
        _ => Err("expected a string argument".to_string()),
    }
}

fn concat(args: Vec<Value>) -> HostResult {
    let mut joined = String::new();
    for arg in &args {
        match arg {
            Value::Str(text) => joined.push_str(text),
            _ => return Err("expected string arguments".to_string()),
        }
    }
    Ok(Value::Str(joined))
}

fn random(_args: Vec<Value>) -> HostResult {
    let mut rng = rand::thread_rng();
    Ok(Value::Int(rng.gen::<i64>()))
}

/// The stock function table: arithmetic and comparison operators plus a
/// few string and utility helpers.
pub fn table() -> Functions {
    let mut funcs = Functions::new();

    let arithmetic: [(&str, fn(Vec<Value>) -> HostResult); 5] = [
        ("plus", plus),
        ("minus", minus),
        ("times", times),
        ("divide", divide),
        ("modulo", modulo),
    ];
    for (name, func) in arithmetic {
        funcs.insert(
            name.to_string(),
            HostFn::new(Signature::variadic(vec![ParamType::Any]).fallible(), func),
        );
    }

    let comparisons: [(&str, fn(Vec<Value>) -> HostResult); 4] = [
        ("greater_than", greater_than),
        ("greater_equal", greater_equal),
        ("less_than", less_than),
        ("less_equal", less_equal),
    ];
    for (name, func) in comparisons {
        funcs.insert(
            name.to_string(),
            HostFn::new(
                Signature::fixed(vec![ParamType::Int, ParamType::Int]),
                func,
            ),
        );
    }

    funcs.insert(
        "equal".to_string(),
        HostFn::new(
            Signature::fixed(vec![ParamType::Any, ParamType::Any]),
            equal,
        ),
    );
    funcs.insert(
        "not".to_string(),
        HostFn::new(Signature::fixed(vec![ParamType::Bool]), not),
    );
    funcs.insert(
        "length".to_string(),
        HostFn::new(Signature::fixed(vec![ParamType::Text]), length),
    );
    funcs.insert(
        "concat".to_string(),
        HostFn::new(Signature::variadic(vec![ParamType::Text]), concat),
    );
    funcs.insert(
        "random".to_string(),
        HostFn::new(Signature::fixed(vec![]), random),
    );

    funcs
}
