//! Recursive-descent parser producing a [`Script`].

use super::lexer::{LineIndex, Spanned, Token, tokenize};
use crate::error::ScriptError;
use crate::graph::{FieldValue, Fields, NodeId, Position, Size};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Module(String),
    Namespace(String),
    Description(String),
    Flag { name: String, value: bool },
    Node(NodeDecl),
    Group(GroupDecl),
    Connect { from: PortAddress, to: PortAddress },
}

/// `<node>:<port index>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAddress {
    pub node: NodeId,
    pub port: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecl {
    pub id: NodeId,
    pub node_type: String,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDecl {
    pub id: NodeId,
    pub name: String,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub fields: Fields,
    pub body: Vec<Statement>,
}

/// Parses a whole graph script. Nothing is executed.
pub fn parse(source: &str) -> Result<Script, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        index: LineIndex::new(source),
        end: source.len(),
    };
    let mut statements = Vec::new();
    while !parser.at_end() {
        statements.push(parser.statement()?);
    }
    Ok(Script { statements })
}

struct Parser<'a> {
    tokens: Vec<Spanned<'a>>,
    pos: usize,
    index: LineIndex,
    end: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, span)| span.start)
    }

    fn line(&self) -> usize {
        self.index.position(self.offset()).0
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        let (line, column) = self.index.position(self.offset());
        ScriptError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        match self.peek() {
            Some(token) => self.error(format!("expected {}, found {}", expected, token.describe())),
            None => self.error(format!("expected {}, found end of input", expected)),
        }
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token<'_>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token<'_>, what: &str) -> Result<(), ScriptError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn string(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek() {
            Some(Token::Str(_)) => match self.advance() {
                Some(Token::Str(s)) => Ok(s),
                _ => Err(self.unexpected(what)),
            },
            _ => Err(self.unexpected(what)),
        }
    }

    fn number(&mut self, what: &str) -> Result<f64, ScriptError> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// A non-negative integer that fits the target type.
    fn index<T: TryFrom<u64>>(&mut self, what: &str) -> Result<T, ScriptError> {
        let start = self.pos;
        let n = self.number(what)?;
        if n.fract() != 0.0 || n < 0.0 || n > u64::MAX as f64 {
            self.pos = start;
            return Err(self.error(format!("{} must be a non-negative integer", what)));
        }
        T::try_from(n as u64).map_err(|_| {
            self.pos = start;
            self.error(format!("{} is out of range", what))
        })
    }

    fn ident(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// A field or flag name: an identifier, or a string for anything else.
    fn name(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek() {
            Some(Token::Str(_)) => self.string(what),
            _ => self.ident(what),
        }
    }

    fn statement(&mut self) -> Result<Statement, ScriptError> {
        let line = self.line();
        let kind = match self.peek() {
            Some(Token::Module) => {
                self.pos += 1;
                let name = self.string("module name")?;
                self.expect(Token::Semicolon, "';'")?;
                StatementKind::Module(name)
            }
            Some(Token::Namespace) => {
                self.pos += 1;
                let namespace = self.string("namespace")?;
                self.expect(Token::Semicolon, "';'")?;
                StatementKind::Namespace(namespace)
            }
            Some(Token::Description) => {
                self.pos += 1;
                let text = self.string("description")?;
                self.expect(Token::Semicolon, "';'")?;
                StatementKind::Description(text)
            }
            Some(Token::Flag) => {
                self.pos += 1;
                let name = self.name("flag name")?;
                self.expect(Token::Equals, "'='")?;
                let value = match self.advance() {
                    Some(Token::Bool(b)) => b,
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected("true or false"));
                    }
                };
                self.expect(Token::Semicolon, "';'")?;
                StatementKind::Flag { name, value }
            }
            Some(Token::Node) => StatementKind::Node(self.node_decl()?),
            Some(Token::Group) => StatementKind::Group(self.group_decl()?),
            Some(Token::Connect) => {
                self.pos += 1;
                let from = self.port_address()?;
                self.expect(Token::Arrow, "'->'")?;
                let to = self.port_address()?;
                self.expect(Token::Semicolon, "';'")?;
                StatementKind::Connect { from, to }
            }
            _ => return Err(self.unexpected("a statement")),
        };
        Ok(Statement { line, kind })
    }

    fn port_address(&mut self) -> Result<PortAddress, ScriptError> {
        let node = self.index("node id")?;
        self.expect(Token::Colon, "':'")?;
        let port = self.index("port index")?;
        Ok(PortAddress { node, port })
    }

    fn pair(&mut self) -> Result<(f64, f64), ScriptError> {
        self.expect(Token::LParen, "'('")?;
        let a = self.number("number")?;
        self.expect(Token::Comma, "','")?;
        let b = self.number("number")?;
        self.expect(Token::RParen, "')'")?;
        Ok((a, b))
    }

    fn placement(&mut self) -> Result<(Option<Position>, Option<Size>), ScriptError> {
        let mut position = None;
        let mut size = None;
        if self.eat(&Token::At) {
            let (x, y) = self.pair()?;
            position = Some(Position::new(x, y));
        }
        if self.eat(&Token::Size) {
            let (w, h) = self.pair()?;
            size = Some(Size::new(w, h));
        }
        Ok((position, size))
    }

    fn node_decl(&mut self) -> Result<NodeDecl, ScriptError> {
        self.expect(Token::Node, "'node'")?;
        let id = self.index("node id")?;
        let node_type = self.string("node type")?;
        let (position, size) = self.placement()?;

        let mut fields = Fields::new();
        if !self.eat(&Token::Semicolon) {
            self.expect(Token::LBrace, "';' or '{'")?;
            while !self.eat(&Token::RBrace) {
                let (name, value) = self.field()?;
                fields.insert(name, value);
            }
        }
        Ok(NodeDecl {
            id,
            node_type,
            position,
            size,
            fields,
        })
    }

    fn group_decl(&mut self) -> Result<GroupDecl, ScriptError> {
        self.expect(Token::Group, "'group'")?;
        let id = self.index("group id")?;
        let name = self.string("group name")?;
        let (position, size) = self.placement()?;
        self.expect(Token::Inputs, "'inputs'")?;
        let inputs = self.labels()?;
        self.expect(Token::Outputs, "'outputs'")?;
        let outputs = self.labels()?;

        self.expect(Token::LBrace, "'{'")?;
        let mut fields = Fields::new();
        let mut body = Vec::new();
        while !self.eat(&Token::RBrace) {
            if matches!(self.peek(), Some(Token::Ident(_) | Token::Str(_))) {
                let (name, value) = self.field()?;
                fields.insert(name, value);
            } else if self.at_end() {
                return Err(self.unexpected("'}'"));
            } else {
                body.push(self.statement()?);
            }
        }
        Ok(GroupDecl {
            id,
            name,
            position,
            size,
            inputs,
            outputs,
            fields,
            body,
        })
    }

    fn labels(&mut self) -> Result<Vec<String>, ScriptError> {
        self.expect(Token::LBracket, "'['")?;
        let mut labels = Vec::new();
        while !self.eat(&Token::RBracket) {
            if !labels.is_empty() {
                self.expect(Token::Comma, "',' or ']'")?;
            }
            labels.push(self.string("port label")?);
        }
        Ok(labels)
    }

    fn field(&mut self) -> Result<(String, FieldValue), ScriptError> {
        let name = self.name("field name")?;
        self.expect(Token::Equals, "'='")?;
        let value = match self.peek() {
            Some(Token::Number(_)) => FieldValue::Number(self.number("number")?),
            Some(Token::Str(_)) => FieldValue::Text(self.string("string")?),
            Some(Token::Bool(b)) => {
                let b = *b;
                self.pos += 1;
                FieldValue::Bool(b)
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                let mut values = Vec::new();
                while !self.eat(&Token::RBracket) {
                    if !values.is_empty() {
                        self.expect(Token::Comma, "',' or ']'")?;
                    }
                    values.push(self.number("number")?);
                }
                FieldValue::Vector(values)
            }
            _ => return Err(self.unexpected("a field value")),
        };
        self.expect(Token::Semicolon, "';'")?;
        Ok((name, value))
    }
}
