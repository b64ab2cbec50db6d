use std::sync::mpsc::Receiver;

use crate::{
    ast::{
        BeginNode, BoolNode, CallNode, DefineNode, IfNode, ListNode, Node, NumberNode, SetNode,
        StringNode, VarNode,
    },
    error::Error,
    lexer::Lexer,
    token::{Token, TokenKind},
};

struct Parser {
    tokens: Receiver<Token>,
    held: Option<Token>,
}

impl Parser {
    fn next(&mut self) -> Result<Token, Error> {
        let token = match self.held.take() {
            Some(token) => token,
            None => self
                .tokens
                .recv()
                .map_err(|_| Error::Internal("token stream ended without EOF".to_string()))?,
        };
        if token.kind == TokenKind::Error {
            return Err(Error::Lex(token.text));
        }
        Ok(token)
    }

    // one token deep; a second backup before next would lose the first
    fn backup(&mut self, token: Token) {
        self.held = Some(token);
    }

    fn peek(&mut self) -> Result<Token, Error> {
        let token = self.next()?;
        self.backup(token.clone());
        Ok(token)
    }

    fn expect(&mut self, expected: TokenKind, context: &str) -> Result<Token, Error> {
        let token = self.next()?;
        if token.kind != expected {
            return Err(Error::Syntax(format!(
                "expected {expected} in {context}; got {token}"
            )));
        }
        Ok(token)
    }

    fn parse_action(&mut self) -> Result<Node, Error> {
        self.expect(TokenKind::LeftParen, "action")?;
        let token = self.peek()?;
        match token.kind {
            TokenKind::Call => self.parse_call(),
            _ => Err(Error::Syntax(format!("token not expected: {token}"))),
        }
    }

    fn parse_call(&mut self) -> Result<Node, Error> {
        // special forms go by name, before the generic call shape
        match self.peek()?.text.as_str() {
            "define" => return self.parse_define(),
            "set" => return self.parse_set(),
            "if" => return self.parse_if(),
            "begin" => return self.parse_begin(),
            _ => {}
        }

        let name = self.next()?.text;
        let mut args = Vec::new();
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::RightParen => {
                    self.next()?;
                    return Ok(CallNode { name, args }.into());
                }
                TokenKind::Number => args.push(self.parse_number()?),
                TokenKind::String => args.push(self.parse_string()?),
                TokenKind::Var => args.push(self.parse_var()?.into()),
                TokenKind::LeftParen => args.push(self.parse_action()?),
                _ => {
                    return Err(Error::Syntax(format!(
                        "unexpected token in call to {name}: {token}"
                    )))
                }
            }
        }
    }

    fn parse_define(&mut self) -> Result<Node, Error> {
        self.expect(TokenKind::Call, "define")?;
        let variable = self.parse_var()?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "define")?;
        Ok(DefineNode {
            variable,
            value: Box::new(value),
        }
        .into())
    }

    fn parse_set(&mut self) -> Result<Node, Error> {
        self.expect(TokenKind::Call, "set")?;
        let variable = self.parse_var()?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "set")?;
        Ok(SetNode {
            variable,
            value: Box::new(value),
        }
        .into())
    }

    fn parse_if(&mut self) -> Result<Node, Error> {
        self.expect(TokenKind::Call, "if")?;
        let test = self.parse_expression()?;
        let conseq = self.parse_expression()?;
        let alt = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "if")?;
        Ok(IfNode {
            test: Box::new(test),
            conseq: Box::new(conseq),
            alt: Box::new(alt),
        }
        .into())
    }

    fn parse_begin(&mut self) -> Result<Node, Error> {
        self.expect(TokenKind::Call, "begin")?;
        let mut nodes = Vec::new();
        while self.peek()?.kind != TokenKind::RightParen {
            nodes.push(self.parse_expression()?);
        }
        self.expect(TokenKind::RightParen, "begin")?;
        if nodes.is_empty() {
            return Err(Error::Syntax(
                "begin sentence without expressions".to_string(),
            ));
        }
        Ok(BeginNode { nodes }.into())
    }

    fn parse_var(&mut self) -> Result<VarNode, Error> {
        let token = self.expect(TokenKind::Var, "var")?;
        Ok(VarNode { name: token.text })
    }

    fn parse_number(&mut self) -> Result<Node, Error> {
        let token = self.expect(TokenKind::Number, "number")?;
        match NumberNode::from_text(&token.text) {
            Some(number) => Ok(number.into()),
            None => Err(Error::Syntax(format!(
                "illegal number syntax: {}",
                token.text
            ))),
        }
    }

    fn parse_string(&mut self) -> Result<Node, Error> {
        let token = self.expect(TokenKind::String, "string")?;
        match StringNode::from_quoted(&token.text) {
            Ok(string) => Ok(string.into()),
            Err(reason) => Err(Error::Syntax(format!(
                "cannot unquote the string literal: {reason}"
            ))),
        }
    }

    fn parse_bool(&mut self) -> Result<Node, Error> {
        let token = self.expect(TokenKind::Bool, "bool")?;
        match token.text.as_str() {
            "#t" => Ok(BoolNode { value: true }.into()),
            "#f" => Ok(BoolNode { value: false }.into()),
            _ => Err(Error::Syntax(format!(
                "incorrect boolean value, should be #t or #f: {token}"
            ))),
        }
    }

    fn parse_expression(&mut self) -> Result<Node, Error> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Number => self.parse_number(),
            TokenKind::String => self.parse_string(),
            TokenKind::LeftParen => self.parse_action(),
            TokenKind::Bool => self.parse_bool(),
            TokenKind::Var => Ok(self.parse_var()?.into()),
            _ => Err(Error::Syntax(format!(
                "cannot use this kind of value as an expression: {token}"
            ))),
        }
    }
}

/// Parses a whole program into its ordered top-level forms. The first
/// violated expectation aborts the parse; no partial tree comes back.
pub fn parse(source: &str) -> Result<ListNode, Error> {
    let mut parser = Parser {
        tokens: Lexer::from_str(source).spawn(),
        held: None,
    };

    let mut root = ListNode { nodes: Vec::new() };
    while parser.peek()?.kind != TokenKind::Eof {
        root.nodes.push(parser.parse_action()?);
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(source: &str) -> Vec<Node> {
        parse(source).unwrap().nodes
    }

    fn syntax_error(source: &str) -> String {
        match parse(source).unwrap_err() {
            Error::Syntax(message) => message,
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_generic_call() {
        let nodes = forms(r#"(plus 1 "two" x)"#);
        assert_eq!(nodes.len(), 1);
        let call: CallNode = nodes[0].clone().try_into().unwrap();
        assert_eq!(call.name, "plus");
        assert_eq!(call.args.len(), 3);
        assert!(matches!(call.args[0], Node::Number(_)));
        assert!(matches!(call.args[1], Node::String(_)));
        assert!(matches!(call.args[2], Node::Var(_)));
    }

    #[test]
    fn parses_nested_calls() {
        let nodes = forms("(times (plus 1 2) 7)");
        let call: CallNode = nodes[0].clone().try_into().unwrap();
        let inner: CallNode = call.args[0].clone().try_into().unwrap();
        assert_eq!(inner.name, "plus");
        assert_eq!(inner.args.len(), 2);
    }

    #[test]
    fn parses_each_special_form() {
        let nodes = forms("(define x 5) (set x 6) (if #t 1 2) (begin 1 2)");
        assert!(matches!(nodes[0], Node::Define(_)));
        assert!(matches!(nodes[1], Node::Set(_)));
        assert!(matches!(nodes[2], Node::If(_)));
        assert!(matches!(nodes[3], Node::Begin(_)));

        let define: DefineNode = nodes[0].clone().try_into().unwrap();
        assert_eq!(define.variable.name, "x");
        assert!(matches!(*define.value, Node::Number(_)));
    }

    #[test]
    fn special_forms_nest_as_arguments() {
        let nodes = forms("(plus (begin 1) 2)");
        let call: CallNode = nodes[0].clone().try_into().unwrap();
        assert!(matches!(call.args[0], Node::Begin(_)));
    }

    #[test]
    fn empty_program_parses_to_no_forms() {
        assert!(forms(" ; just a comment\n").is_empty());
    }

    #[test]
    fn number_literals_keep_both_interpretations() {
        let nodes = forms("(f 10)");
        let call: CallNode = nodes[0].clone().try_into().unwrap();
        let number: NumberNode = call.args[0].clone().try_into().unwrap();
        assert_eq!(number.int, Some(10));
        assert_eq!(number.uint, Some(10));
    }

    #[test]
    fn string_arguments_are_unquoted() {
        let nodes = forms(r#"(f "a\tb")"#);
        let call: CallNode = nodes[0].clone().try_into().unwrap();
        let string: StringNode = call.args[0].clone().try_into().unwrap();
        assert_eq!(string.text, "a\tb");
    }

    #[test]
    fn top_level_must_open_with_a_paren() {
        assert!(syntax_error("5").contains("expected left paren in action"));
    }

    #[test]
    fn empty_parens_are_not_a_call() {
        assert!(syntax_error("()").contains("token not expected"));
    }

    #[test]
    fn booleans_are_expressions_but_not_call_arguments() {
        assert!(parse("(if #t 1 2)").is_ok());
        assert!(syntax_error("(plus #t)").contains("unexpected token in call to plus"));
    }

    #[test]
    fn begin_needs_at_least_one_expression() {
        assert_eq!(syntax_error("(begin)"), "begin sentence without expressions");
    }

    #[test]
    fn define_requires_a_variable() {
        assert!(syntax_error("(define 5 6)").contains("expected var"));
    }

    #[test]
    fn missing_if_arm_is_reported() {
        let message = syntax_error("(if #t 1)");
        assert!(message.contains("cannot use this kind of value as an expression"));
    }

    #[test]
    fn bad_number_is_a_syntax_error() {
        assert_eq!(syntax_error("(f 12ab)"), "illegal number syntax: 12ab");
    }

    #[test]
    fn bad_escape_is_a_syntax_error() {
        assert!(syntax_error(r#"(f "\q")"#).contains("cannot unquote the string literal"));
    }

    #[test]
    fn unclosed_call_reports_eof() {
        assert_eq!(syntax_error("(plus 1"), "unexpected token in call to plus: EOF");
    }

    #[test]
    fn lexical_errors_surface_from_parse() {
        let err = parse("(plus @)").unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
    }

    #[test]
    fn malformed_boolean_is_rejected() {
        assert!(syntax_error("(if #true 1 2)").contains("should be #t or #f"));
    }

    #[test]
    fn computed_call_names_are_rejected() {
        assert!(syntax_error("(if (5) 1 2)").contains("token not expected"));
    }
}
