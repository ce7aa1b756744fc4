//! Tokens of the graph script, lexed with logos.

use crate::error::ScriptError;
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"([ \t\r\n\f]+|#[^\n]*)")]
pub enum Token<'a> {
    // Keywords
    #[token("module")]
    Module,
    #[token("namespace")]
    Namespace,
    #[token("description")]
    Description,
    #[token("flag")]
    Flag,
    #[token("node")]
    Node,
    #[token("group")]
    Group,
    #[token("connect")]
    Connect,
    #[token("at")]
    At,
    #[token("size")]
    Size,
    #[token("inputs")]
    Inputs,
    #[token("outputs")]
    Outputs,

    // Literals
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[token("inf", |_| f64::INFINITY)]
    #[token("-inf", |_| f64::NEG_INFINITY)]
    #[token("nan", |_| f64::NAN)]
    Number(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1])
    })]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Ident(&'a str),

    // Punctuation
    #[token(";")]
    Semicolon,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
}

impl Token<'_> {
    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self {
            Token::Bool(b) => format!("'{}'", b),
            Token::Number(n) => format!("number {}", n),
            Token::Str(s) => format!("string \"{}\"", s),
            Token::Ident(s) => format!("'{}'", s),
            other => format!("{:?}", other).to_lowercase(),
        }
    }
}

/// Resolves the escapes written by the script writer. Unknown escapes are kept verbatim.
fn unescape(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }
    Some(result)
}

/// Maps byte offsets to 1-based line and column.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line.saturating_sub(1)];
        (line.max(1), offset - start + 1)
    }
}

/// A token with its byte span.
pub type Spanned<'a> = (Token<'a>, Range<usize>);

/// Lexes the whole source, failing at the first unrecognized character.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<'_>>, ScriptError> {
    let index = LineIndex::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let (line, column) = index.position(span.start);
                return Err(ScriptError::Syntax {
                    line,
                    column,
                    message: format!("unexpected input '{}'", lexer.slice()),
                });
            }
        }
    }
    Ok(tokens)
}
