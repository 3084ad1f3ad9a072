//! Single-pass Pratt compiler: tokens in, bytecode out.
//!
//! The table driving prefix/infix dispatch lives in [`crate::rules`];
//! this module is the parser state machine and the codegen that each
//! rule triggers.

use cinder_core::chunk::{Chunk, OpCode};
use cinder_core::error::{CompileError, ErrorLocation};
use cinder_core::object::Heap;
use cinder_core::precedence::Precedence;
use cinder_core::token::{Token, TokenKind};
use cinder_core::value::Value;

use crate::rules::{rule_for, ParseFn};
use crate::scanner::Scanner;

const LOCALS_MAX: usize = 256;

struct Local {
    name: String,
    depth: i32,
}

struct Compiler<'c, 'h> {
    scanner: Scanner,
    previous: Token,
    current: Token,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<CompileError>,
    chunk: &'c mut Chunk,
    heap: &'h mut Heap,
    locals: Vec<Local>,
    scope_depth: i32,
    /// Name of the local a `var` declaration is in the middle of
    /// compiling, set by `parse_variable` and consumed by
    /// `define_variable` once the initializer has been compiled. Kept
    /// out of `locals` until then, so the initializer resolves the
    /// same name against an enclosing binding rather than itself.
    pending_local: Option<String>,
}

impl<'c, 'h> Compiler<'c, 'h> {
    fn new(source: &str, chunk: &'c mut Chunk, heap: &'h mut Heap) -> Self {
        Compiler {
            scanner: Scanner::new(source.to_string()),
            previous: Token::new(TokenKind::Eof, None, 0, 0),
            current: Token::new(TokenKind::Eof, None, 0, 0),
            had_error: false,
            panic_mode: false,
            errors: Vec::new(),
            chunk,
            heap,
            locals: Vec::new(),
            scope_depth: 0,
            pending_local: None,
        }
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(
            &mut self.current,
            Token::new(TokenKind::Eof, None, 0, 0),
        );
        loop {
            self.current = self.scanner.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_scan();
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // --- error reporting -------------------------------------------------

    fn error_at_current(&mut self, message: &str) {
        let token = self.current.clone();
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous.clone();
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let where_ = if token.kind == TokenKind::Eof {
            ErrorLocation::Eof
        } else {
            ErrorLocation::Token
        };
        self.errors.push(CompileError {
            line: token.line,
            column: token.column,
            where_,
            lexeme: token.text().to_string(),
            message: message.to_string(),
        });
    }

    /// The scanner itself produced an `ERROR` token (e.g. unterminated
    /// string); its lexeme slot carries the message directly.
    fn error_at_scan(&mut self) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        self.errors.push(CompileError {
            line: self.current.line,
            column: self.current.column,
            where_: ErrorLocation::ScanError,
            lexeme: String::new(),
            message: self.current.text().to_string(),
        });
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        tracing::debug!("synchronizing after compile error");
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Def
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // --- bytecode emission -------------------------------------------------

    fn emit_byte_at(&mut self, byte: u8, line: i32) {
        self.chunk.write(byte, line);
    }

    fn emit_op_at(&mut self, op: OpCode, line: i32) {
        self.emit_byte_at(op as u8, line);
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.emit_byte_at(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn emit_op_with_operand(&mut self, op: OpCode, operand: u8) {
        self.emit_op(op);
        self.emit_byte(operand);
    }

    fn emit_constant(&mut self, value: Value) {
        match self.chunk.add_constant(value) {
            Ok(idx) => self.emit_op_with_operand(OpCode::Constant, idx),
            Err(_) => self.error("Too many constants in one chunk."),
        }
    }

    fn patch_jump(&mut self, offset: usize) {
        if self.chunk.patch_jump(offset).is_err() {
            self.error("Too much code to jump over.");
        }
    }

    // --- scopes and variables -----------------------------------------

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
        tracing::debug!(depth = self.scope_depth, "enter scope");
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        tracing::debug!(depth = self.scope_depth, "exit scope");
        while let Some(local) = self.locals.last() {
            if local.depth > self.scope_depth {
                self.emit_op(OpCode::Pop);
                self.locals.pop();
            } else {
                break;
            }
        }
    }

    fn identifier_constant(&mut self, name: String) -> u8 {
        let id = self.heap.intern(&name);
        match self.chunk.add_constant(Value::Obj(id)) {
            Ok(idx) => idx,
            Err(_) => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn add_local(&mut self, name: String) {
        if self.locals.len() >= LOCALS_MAX {
            self.error("Too many local variables in one scope.");
            return;
        }
        self.locals.push(Local { name, depth: self.scope_depth });
    }

    /// Reports a same-scope redeclaration; does not yet add `name` to
    /// `locals` (see `pending_local`).
    fn declare_variable(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        let name = self.previous.text().to_string();
        for local in self.locals.iter().rev() {
            if local.depth < self.scope_depth {
                break;
            }
            if local.name == name {
                self.error("Variable with this name already declared in this scope.");
                return;
            }
        }
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        let name = self.previous.text().to_string();
        self.declare_variable();
        if self.scope_depth > 0 {
            self.pending_local = Some(name);
            return 0;
        }
        self.identifier_constant(name)
    }

    fn define_variable(&mut self, global: u8) {
        if self.scope_depth > 0 {
            let name = self
                .pending_local
                .take()
                .expect("define_variable at local scope always follows parse_variable");
            self.add_local(name);
            return;
        }
        self.emit_op_with_operand(OpCode::DefineGlobal, global);
    }

    fn resolve_local(&self, name: &str) -> Option<u8> {
        for (i, local) in self.locals.iter().enumerate().rev() {
            if local.name == name {
                return Some(i as u8);
            }
        }
        None
    }

    // --- declarations and statements ------------------------------------

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );
        self.define_variable(global);
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block(TokenKind::RightBrace, "Expect '}' after block.");
            self.end_scope();
        } else if self.match_token(TokenKind::Do) {
            self.begin_scope();
            self.block(TokenKind::End, "Expect 'end' after block.");
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn block(&mut self, end_kind: TokenKind, message: &str) {
        while !self.check(end_kind) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(end_kind, message);
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let line = self.previous.line;
        let then_jump = self.chunk.emit_jump(OpCode::JumpIfFalse, line);
        self.emit_op(OpCode::Pop);
        self.statement();

        let line = self.previous.line;
        let else_jump = self.chunk.emit_jump(OpCode::Jump, line);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let line = self.previous.line;
        let exit_jump = self.chunk.emit_jump(OpCode::JumpIfFalse, line);
        self.emit_op(OpCode::Pop);
        self.statement();
        let line = self.previous.line;
        if self.chunk.emit_loop(loop_start, line).is_err() {
            self.error("Loop body too large.");
        }

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    // --- expressions -----------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix_rule) = rule_for(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        self.apply(prefix_rule, can_assign);

        while precedence <= rule_for(self.current.kind).precedence {
            self.advance();
            let infix_rule = rule_for(self.previous.kind)
                .infix
                .expect("token reached via the precedence loop always has an infix rule");
            self.apply(infix_rule, can_assign);
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn apply(&mut self, f: ParseFn, can_assign: bool) {
        match f {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
            ParseFn::StringLit => self.string_lit(),
            ParseFn::Literal => self.literal(),
            ParseFn::Variable => self.named_variable(can_assign),
            ParseFn::And => self.and_(),
            ParseFn::Or => self.or_(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;
        let line = self.previous.line;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Minus => self.emit_op_at(OpCode::Negate, line),
            TokenKind::Bang => self.emit_op_at(OpCode::Not, line),
            _ => unreachable!("unary rule only registered for '-' and '!'"),
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        let line = self.previous.line;
        let rule = rule_for(operator);
        // `^` is right-associative: parse its right operand at its own
        // precedence rather than one tighter.
        let next_prec = if operator == TokenKind::Caret {
            rule.precedence
        } else {
            rule.precedence.next()
        };
        self.parse_precedence(next_prec);

        match operator {
            TokenKind::Plus => self.emit_op_at(OpCode::Add, line),
            TokenKind::Minus => self.emit_op_at(OpCode::Subtract, line),
            TokenKind::Star => self.emit_op_at(OpCode::Multiply, line),
            TokenKind::Slash => self.emit_op_at(OpCode::Divide, line),
            TokenKind::Percent => self.emit_op_at(OpCode::Modulo, line),
            TokenKind::Caret => self.emit_op_at(OpCode::Power, line),
            TokenKind::EqualEqual => self.emit_op_at(OpCode::Equal, line),
            TokenKind::BangEqual => {
                self.emit_op_at(OpCode::Equal, line);
                self.emit_op_at(OpCode::Not, line);
            }
            TokenKind::Greater => self.emit_op_at(OpCode::Greater, line),
            TokenKind::GreaterEqual => {
                self.emit_op_at(OpCode::Less, line);
                self.emit_op_at(OpCode::Not, line);
            }
            TokenKind::Less => self.emit_op_at(OpCode::Less, line),
            TokenKind::LessEqual => {
                self.emit_op_at(OpCode::Greater, line);
                self.emit_op_at(OpCode::Not, line);
            }
            _ => unreachable!("binary rule only registered for arithmetic/comparison operators"),
        }
    }

    fn number(&mut self) {
        let text = self.previous.text();
        let value = match self.previous.kind {
            TokenKind::Real => Value::Real(text.parse().unwrap_or(f64::NAN)),
            _ => match text.parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => {
                    self.error("Integer literal out of range.");
                    Value::Int(0)
                }
            },
        };
        self.emit_constant(value);
    }

    fn string_lit(&mut self) {
        let text = self.previous.text().to_string();
        let id = self.heap.intern(&text);
        self.emit_constant(Value::Obj(id));
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_constant(Value::Bool(false)),
            TokenKind::True => self.emit_constant(Value::Bool(true)),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            _ => unreachable!("literal rule only registered for false/true/nil"),
        }
    }

    fn named_variable(&mut self, can_assign: bool) {
        let name = self.previous.text().to_string();
        let line = self.previous.line;
        let (get_op, set_op, slot) = if let Some(idx) = self.resolve_local(&name) {
            (OpCode::GetLocal, OpCode::SetLocal, idx)
        } else {
            let idx = self.identifier_constant(name);
            (OpCode::GetGlobal, OpCode::SetGlobal, idx)
        };

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_at(set_op, line);
            self.emit_byte_at(slot, line);
        } else {
            self.emit_op_at(get_op, line);
            self.emit_byte_at(slot, line);
        }
    }

    fn and_(&mut self) {
        let line = self.previous.line;
        let short_circuit = self.chunk.emit_jump(OpCode::JumpIfFalse, line);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(short_circuit);
    }

    fn or_(&mut self) {
        let line = self.previous.line;
        let to_else = self.chunk.emit_jump(OpCode::JumpIfFalse, line);
        let to_end = self.chunk.emit_jump(OpCode::Jump, line);
        self.patch_jump(to_else);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(to_end);
    }
}

/// Compile `source` into `chunk`, interning string literals and
/// identifiers into `heap`. On success every declaration has been
/// translated to bytecode terminated by `OP_RETURN`; on failure the
/// partially-built chunk should be discarded and every collected error
/// reported.
pub fn compile(source: &str, chunk: &mut Chunk, heap: &mut Heap) -> Result<(), Vec<CompileError>> {
    let mut compiler = Compiler::new(source, chunk, heap);
    compiler.advance();
    while !compiler.check(TokenKind::Eof) {
        compiler.declaration();
    }
    let line = compiler.current.line;
    compiler.emit_op_at(OpCode::Return, line);

    if compiler.had_error {
        Err(compiler.errors)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(source: &str) -> (Chunk, Heap) {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        compile(source, &mut chunk, &mut heap).expect("expected successful compile");
        (chunk, heap)
    }

    #[test]
    fn arithmetic_precedence_emits_expected_opcodes() {
        let (chunk, _heap) = compile_ok("print 1 + 2 * 3;");
        assert!(chunk.code.contains(&(OpCode::Multiply as u8)));
        assert!(chunk.code.contains(&(OpCode::Add as u8)));
        assert!(chunk.code.contains(&(OpCode::Print as u8)));
        assert_eq!(*chunk.code.last().unwrap(), OpCode::Return as u8);
    }

    #[test]
    fn duplicate_local_in_same_scope_is_a_compile_error() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let err = compile("{ var a = 1; var a = 2; }", &mut chunk, &mut heap).unwrap_err();
        assert!(err
            .iter()
            .any(|e| e.message.contains("already declared in this scope")));
    }

    #[test]
    fn duplicate_global_is_allowed_and_shadows() {
        compile_ok("var a = 1; var a = 2; print a;");
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let err = compile("1 = 2;", &mut chunk, &mut heap).unwrap_err();
        assert!(err.iter().any(|e| e.message == "Invalid assignment target."));
    }

    #[test]
    fn initializer_sees_enclosing_binding_not_itself() {
        // The local isn't added to scope until its initializer has been
        // compiled, so `a` on the right-hand side resolves to whatever
        // `a` means in the enclosing scope (here, the global) rather
        // than the local being declared.
        let (chunk, _heap) = compile_ok("var a = 1; { var a = a + 1; print a; }");
        assert!(chunk.code.contains(&(OpCode::GetGlobal as u8)));
    }

    #[test]
    fn unterminated_string_surfaces_as_scan_error() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let err = compile("print \"abc;", &mut chunk, &mut heap).unwrap_err();
        assert!(err.iter().any(|e| e.message == "Unterminated string."));
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ^ 3 ^ 2 should parse as 2 ^ (3 ^ 2), both operands pushed
        // before a single POW, then a second POW combining with the
        // outer base -- i.e. two POW opcodes total.
        let (chunk, _heap) = compile_ok("print 2 ^ 3 ^ 2;");
        let pow_count = chunk.code.iter().filter(|&&b| b == OpCode::Power as u8).count();
        assert_eq!(pow_count, 2);
    }

    #[test]
    fn more_than_256_locals_is_a_compile_error() {
        let mut source = String::from("{ ");
        for i in 0..260 {
            source.push_str(&format!("var a{i} = {i};\n"));
        }
        source.push_str(" }");
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let err = compile(&source, &mut chunk, &mut heap).unwrap_err();
        assert!(err
            .iter()
            .any(|e| e.message.contains("Too many local variables")));
    }
}
