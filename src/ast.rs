use std::fmt;

use derive_more::{From, TryInto};

/// Root of a parsed program: the ordered top-level forms.
#[derive(Debug, Clone)]
pub struct ListNode {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct CallNode {
    pub name: String,
    pub args: Vec<Node>,
}

/// A numeric literal, interpreted both ways. `int` holds the signed reading
/// and `uint` the unsigned one; either may be absent, never both.
#[derive(Debug, Clone)]
pub struct NumberNode {
    pub text: String,
    pub int: Option<i64>,
    pub uint: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StringNode {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct VarNode {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DefineNode {
    pub variable: VarNode,
    pub value: Box<Node>,
}

#[derive(Debug, Clone)]
pub struct SetNode {
    pub variable: VarNode,
    pub value: Box<Node>,
}

#[derive(Debug, Clone)]
pub struct IfNode {
    pub test: Box<Node>,
    pub conseq: Box<Node>,
    pub alt: Box<Node>,
}

#[derive(Debug, Clone)]
pub struct BeginNode {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct BoolNode {
    pub value: bool,
}

#[derive(Debug, Clone, From, TryInto)]
pub enum Node {
    List(ListNode),
    Call(CallNode),
    Number(NumberNode),
    String(StringNode),
    Var(VarNode),
    Define(DefineNode),
    Set(SetNode),
    If(IfNode),
    Begin(BeginNode),
    Bool(BoolNode),
}

impl NumberNode {
    /// Reads a literal as signed and as unsigned 64-bit. `None` when neither
    /// reading succeeds.
    pub fn from_text(text: &str) -> Option<NumberNode> {
        let int = parse_digits::<i64>(text);
        let uint = parse_digits::<u64>(text);
        if int.is_none() && uint.is_none() {
            return None;
        }
        Some(NumberNode {
            text: text.to_string(),
            int,
            uint,
        })
    }
}

trait FromRadix: Sized {
    fn from_radix(digits: &str, radix: u32) -> Option<Self>;
}

impl FromRadix for i64 {
    fn from_radix(digits: &str, radix: u32) -> Option<Self> {
        i64::from_str_radix(digits, radix).ok()
    }
}

impl FromRadix for u64 {
    fn from_radix(digits: &str, radix: u32) -> Option<Self> {
        u64::from_str_radix(digits, radix).ok()
    }
}

// Splits off an optional sign and a base prefix: 0x/0X hex, 0o/0O octal,
// 0b/0B binary, a bare leading zero octal, otherwise decimal.
fn parse_digits<T: FromRadix>(text: &str) -> Option<T> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };

    let (radix, digits) = if let Some(hex) = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(oct) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8, oct)
    } else if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, bin)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    if digits.is_empty() {
        return None;
    }
    T::from_radix(&format!("{sign}{digits}"), radix)
}

impl StringNode {
    /// Strips the surrounding quotes and resolves backslash escapes.
    pub fn from_quoted(text: &str) -> Result<StringNode, String> {
        let inner = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .ok_or_else(|| "not a quoted string".to_string())?;

        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('\'') => out.push('\''),
                Some('"') => out.push('"'),
                Some(other) => return Err(format!("unrecognized escape sequence \\{other}")),
                None => return Err("trailing backslash".to_string()),
            }
        }

        Ok(StringNode { text: out })
    }
}

// Nodes print in surface syntax, so diagnostics can quote them back and a
// re-parsed literal keeps its value.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::List(list) => {
                for (i, node) in list.nodes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{node}")?;
                }
                Ok(())
            }
            Node::Call(call) => {
                write!(f, "({}", call.name)?;
                for arg in &call.args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Node::Number(number) => write!(f, "{}", number.text),
            Node::String(string) => write!(f, "{:?}", string.text),
            Node::Var(var) => write!(f, "{}", var.name),
            Node::Define(define) => {
                write!(f, "(define {} {})", define.variable.name, define.value)
            }
            Node::Set(set) => write!(f, "(set {} {})", set.variable.name, set.value),
            Node::If(node) => write!(f, "(if {} {} {})", node.test, node.conseq, node.alt),
            Node::Begin(begin) => {
                write!(f, "(begin")?;
                for node in &begin.nodes {
                    write!(f, " {node}")?;
                }
                write!(f, ")")
            }
            Node::Bool(boolean) => write!(f, "{}", if boolean.value { "#t" } else { "#f" }),
        }
    }
}
