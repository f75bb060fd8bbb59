//! Tokenizer built on `logos`.

use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+|#[^\n]*")]
pub enum Token {
    // Statement terminators
    #[token("\n")]
    #[token(";")]
    Newline,

    // Keywords
    #[token("def")]
    Def,
    #[token("end")]
    End,
    #[token("return")]
    Return,
    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Symbols
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
    Assign,
    #[token("+")]
    Plus,
    #[token("<<")]
    Shovel,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    // Names
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    #[token("$:", |lex| lex.slice().to_owned())]
    #[token("$\"", |lex| lex.slice().to_owned())]
    GlobalVar(String),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*[?!]?", |lex| lex.slice().to_owned())]
    Ident(String),
}

impl Token {
    /// Whether this token can begin an argument of a parenthesis-less call.
    pub fn starts_argument(&self) -> bool {
        matches!(
            self,
            Token::Int(_)
                | Token::Str(_)
                | Token::GlobalVar(_)
                | Token::Ident(_)
                | Token::LBracket
                | Token::Nil
                | Token::True
                | Token::False
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Newline => write!(f, "end of line"),
            Token::Def => write!(f, "'def'"),
            Token::End => write!(f, "'end'"),
            Token::Return => write!(f, "'return'"),
            Token::Nil => write!(f, "'nil'"),
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::Assign => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Shovel => write!(f, "'<<'"),
            Token::Int(n) => write!(f, "integer {n}"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::GlobalVar(name) => write!(f, "global {name}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
        }
    }
}

/// Strip the quotes from a string literal and resolve escapes.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A token that could not be recognised, by byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub span: Range<usize>,
}

/// Tokenize `source` into tokens with their byte spans.
pub fn lex(source: &str) -> Result<Vec<(Token, Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(LexError { span: lexer.span() }),
        }
    }
    Ok(tokens)
}
