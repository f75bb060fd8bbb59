//! Single-pass compiler: tokens straight to bytecode, no intermediate AST.
//!
//! # Grammar
//!
//! ```text
//! program   := (stmt terminator)*
//! stmt      := "def" IDENT ["(" params ")"] terminator body "end"
//!            | "return" [expr]
//!            | GVAR "=" expr
//!            | IDENT "=" expr
//!            | expr
//! expr      := primary (("+" | "<<") primary)*
//! primary   := INT | STRING | "nil" | "true" | "false" | GVAR
//!            | "[" [expr ("," expr)*] "]" | "(" expr ")"
//!            | IDENT                       local read or zero-arg call
//!            | IDENT "(" [args] ")"        call
//!            | IDENT args                  call without parentheses
//! ```
//!
//! The top-level unit is a `Script` ending in `Stop`; method bodies are
//! `Callable` units ending in `LoadNil; Return`.
//!
//! Expressions and method bodies may nest at most [`MAX_NESTING`] levels.

use rustc_hash::FxHashMap;
use std::ops::Range;
use std::sync::Arc;

use ember_ir::{CodeUnit, EntryKind, Instr};
use ember_stack::ensure_sufficient_stack;

use crate::lexer::{lex, Token};
use crate::{CompileContext, CompileError};

/// Deepest nesting of expressions and `def` bodies accepted in one file.
pub const MAX_NESTING: usize = 1024;

/// Compile a whole program.
pub fn compile(source: &str, ctx: &CompileContext) -> Result<CodeUnit, CompileError> {
    let tokens = lex(source).map_err(|e| {
        let text = source.get(e.span.clone()).unwrap_or("");
        error_at(source, ctx, e.span.start, format!("invalid token '{text}'"))
    })?;

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        source,
        ctx,
    };
    let mut builder = UnitBuilder::new(EntryKind::Script);
    parser.block(&mut builder, false)?;
    builder.emit(Instr::Stop);

    let mut unit = builder.finish();
    if let Some(filename) = &ctx.filename {
        unit.set_filename_recursive(filename);
    }
    tracing::trace!(
        file = ctx.filename.as_deref().unwrap_or("(string)"),
        units = unit.unit_count(),
        ilen = unit.code.len(),
        "compiled"
    );
    Ok(unit)
}

fn error_at(source: &str, ctx: &CompileContext, offset: usize, message: String) -> CompileError {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    CompileError {
        filename: ctx.filename.clone(),
        line: u32::try_from(line).unwrap_or(u32::MAX),
        column: u32::try_from(column).unwrap_or(u32::MAX),
        message,
    }
}

/// Deduplicating index over one of a unit's pools.
#[derive(Default)]
struct PoolMap {
    index: FxHashMap<String, u32>,
}

impl PoolMap {
    fn intern(&mut self, pool: &mut Vec<String>, s: String) -> Option<u32> {
        if let Some(&idx) = self.index.get(&s) {
            return Some(idx);
        }
        let idx = u32::try_from(pool.len()).ok()?;
        pool.push(s.clone());
        self.index.insert(s, idx);
        Some(idx)
    }
}

/// Accumulates one unit's code, pools and locals.
struct UnitBuilder {
    unit: CodeUnit,
    locals: Vec<String>,
    strings: PoolMap,
    symbols: PoolMap,
}

impl UnitBuilder {
    fn new(entry: EntryKind) -> Self {
        UnitBuilder {
            unit: CodeUnit::new(entry),
            locals: Vec::new(),
            strings: PoolMap::default(),
            symbols: PoolMap::default(),
        }
    }

    fn emit(&mut self, instr: Instr) {
        self.unit.code.push(instr);
    }

    fn string(&mut self, s: String) -> Option<u32> {
        self.strings.intern(&mut self.unit.strings, s)
    }

    fn symbol(&mut self, s: &str) -> Option<u32> {
        self.symbols.intern(&mut self.unit.symbols, s.to_owned())
    }

    fn local(&self, name: &str) -> Option<u16> {
        self.locals
            .iter()
            .position(|l| l == name)
            .and_then(|i| u16::try_from(i).ok())
    }

    fn declare_local(&mut self, name: &str) -> Option<u16> {
        if let Some(slot) = self.local(name) {
            return Some(slot);
        }
        let slot = u16::try_from(self.locals.len()).ok()?;
        if slot == u16::MAX {
            return None;
        }
        self.locals.push(name.to_owned());
        Some(slot)
    }

    fn finish(mut self) -> CodeUnit {
        self.unit.nlocals = u16::try_from(self.locals.len()).unwrap_or(u16::MAX);
        self.unit
    }
}

struct Parser<'a> {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    depth: usize,
    source: &'a str,
    ctx: &'a CompileContext,
}

type PResult<T> = Result<T, CompileError>;

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        error_at(self.source, self.ctx, self.offset(), message.into())
    }

    fn unexpected(&self) -> CompileError {
        match self.peek() {
            Some(tok) => self.error(format!("unexpected {tok}")),
            None => self.error("unexpected end of input"),
        }
    }

    fn expect(&mut self, expected: &Token) -> PResult<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(match self.peek() {
                Some(tok) => self.error(format!("expected {expected}, found {tok}")),
                None => self.error(format!("expected {expected}, found end of input")),
            })
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }

    /// Statements until end of input, or until `end` when `in_method`.
    fn block(&mut self, b: &mut UnitBuilder, in_method: bool) -> PResult<()> {
        loop {
            self.skip_newlines();
            match self.peek() {
                None if in_method => return Err(self.error("missing 'end' for 'def'")),
                None => return Ok(()),
                Some(Token::End) if in_method => return Ok(()),
                Some(_) => {}
            }
            self.statement(b)?;
            match self.peek() {
                None | Some(Token::Newline) => {}
                Some(Token::End) if in_method => {}
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn statement(&mut self, b: &mut UnitBuilder) -> PResult<()> {
        match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Def), _) => self.method_def(b),
            (Some(Token::Return), _) => {
                self.pos += 1;
                match self.peek() {
                    None | Some(Token::Newline | Token::End) => b.emit(Instr::LoadNil),
                    Some(_) => self.expr(b)?,
                }
                b.emit(Instr::Return);
                Ok(())
            }
            (Some(Token::GlobalVar(name)), Some(Token::Assign)) => {
                let sym = self.symbol(b, name)?;
                self.pos += 2;
                self.expr(b)?;
                b.emit(Instr::SetGlobal(sym));
                Ok(())
            }
            (Some(Token::Ident(name)), Some(Token::Assign)) => {
                let name = name.clone();
                self.pos += 2;
                self.expr(b)?;
                let slot = b
                    .declare_local(&name)
                    .ok_or_else(|| self.error("too many local variables"))?;
                b.emit(Instr::SetLocal(slot));
                Ok(())
            }
            _ => {
                self.expr(b)?;
                b.emit(Instr::Pop);
                Ok(())
            }
        }
    }

    fn method_def(&mut self, b: &mut UnitBuilder) -> PResult<()> {
        self.expect(&Token::Def)?;
        let name = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            _ => return Err(self.error("expected method name after 'def'")),
        };
        self.pos += 1;

        let mut body = UnitBuilder::new(EntryKind::Callable);
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            while self.peek() != Some(&Token::RParen) {
                let param = match self.peek() {
                    Some(Token::Ident(param)) => param.clone(),
                    _ => return Err(self.error("expected parameter name")),
                };
                if body.local(&param).is_some() {
                    return Err(self.error(format!("duplicated argument name '{param}'")));
                }
                body.declare_local(&param)
                    .ok_or_else(|| self.error("too many parameters"))?;
                self.pos += 1;
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else if self.peek() != Some(&Token::RParen) {
                    return Err(self.unexpected());
                }
            }
            self.expect(&Token::RParen)?;
        }
        body.unit.argc = u16::try_from(body.locals.len()).unwrap_or(u16::MAX);

        self.nested(|p| p.block(&mut body, true))?;
        self.expect(&Token::End)?;
        body.emit(Instr::LoadNil);
        body.emit(Instr::Return);

        let child = u16::try_from(b.unit.children.len())
            .map_err(|_| self.error("too many methods in one unit"))?;
        b.unit.children.push(Arc::new(body.finish()));
        let sym = self.symbol(b, &name)?;
        b.emit(Instr::Def { sym, child });
        Ok(())
    }

    fn symbol(&self, b: &mut UnitBuilder, name: &str) -> PResult<u32> {
        b.symbol(name)
            .ok_or_else(|| self.error("too many symbols in one unit"))
    }

    fn expr(&mut self, b: &mut UnitBuilder) -> PResult<()> {
        self.nested(|p| p.binary(b))
    }

    fn binary(&mut self, b: &mut UnitBuilder) -> PResult<()> {
        self.primary(b)?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Instr::Add,
                Some(Token::Shovel) => Instr::Shovel,
                _ => return Ok(()),
            };
            self.pos += 1;
            self.skip_newlines();
            self.primary(b)?;
            b.emit(op);
        }
    }

    fn primary(&mut self, b: &mut UnitBuilder) -> PResult<()> {
        let Some(tok) = self.bump() else {
            return Err(self.unexpected());
        };
        match tok {
            Token::Int(n) => b.emit(Instr::LoadInt(n)),
            Token::Str(s) => {
                let idx = b
                    .string(s)
                    .ok_or_else(|| self.error("too many string literals in one unit"))?;
                b.emit(Instr::LoadStr(idx));
            }
            Token::Nil => b.emit(Instr::LoadNil),
            Token::True => b.emit(Instr::LoadBool(true)),
            Token::False => b.emit(Instr::LoadBool(false)),
            Token::GlobalVar(name) => {
                let sym = self.symbol(b, &name)?;
                b.emit(Instr::GetGlobal(sym));
            }
            Token::LBracket => {
                let count = self.list(b, &Token::RBracket)?;
                b.emit(Instr::MakeArray(count));
            }
            Token::LParen => {
                self.skip_newlines();
                self.expr(b)?;
                self.skip_newlines();
                self.expect(&Token::RParen)?;
            }
            Token::Ident(name) => self.ident(b, &name)?,
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        }
        Ok(())
    }

    fn ident(&mut self, b: &mut UnitBuilder, name: &str) -> PResult<()> {
        if self.peek() != Some(&Token::LParen) {
            if let Some(slot) = b.local(name) {
                b.emit(Instr::GetLocal(slot));
                return Ok(());
            }
        }
        let argc = match self.peek() {
            Some(Token::LParen) => {
                self.pos += 1;
                self.list(b, &Token::RParen)?
            }
            Some(tok) if tok.starts_argument() => self.bare_args(b)?,
            _ => 0,
        };
        let sym = self.symbol(b, name)?;
        b.emit(Instr::Send { sym, argc });
        Ok(())
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn list(&mut self, b: &mut UnitBuilder, close: &Token) -> PResult<u16> {
        let mut count: u16 = 0;
        self.skip_newlines();
        while self.peek() != Some(close) {
            self.expr(b)?;
            count = count
                .checked_add(1)
                .ok_or_else(|| self.error("too many elements"))?;
            self.skip_newlines();
            if self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                self.skip_newlines();
            } else if self.peek() != Some(close) {
                return Err(match self.peek() {
                    Some(tok) => self.error(format!("expected {close}, found {tok}")),
                    None => self.error(format!("expected {close}, found end of input")),
                });
            }
        }
        self.expect(close)?;
        Ok(count)
    }

    /// Arguments of a call written without parentheses, ending at the line end.
    fn bare_args(&mut self, b: &mut UnitBuilder) -> PResult<u16> {
        let mut count: u16 = 0;
        loop {
            self.expr(b)?;
            count = count
                .checked_add(1)
                .ok_or_else(|| self.error("too many arguments"))?;
            if self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                self.skip_newlines();
            } else {
                return Ok(count);
            }
        }
    }
}
