use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ast::*;
use crate::error::CompileError;
use crate::scanner::token::{Literal, Span, Token, TokenKind};

/// Parameter and argument lists are capped at this many entries.
const ARITY_LIMIT: usize = 255;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

fn next_id() -> ExprId {
    NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<CompileError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the whole token stream. Errors synchronize to the next statement
    /// boundary and parsing continues, so a single pass reports every
    /// independent error.
    pub fn parse(mut self) -> Result<Program, Vec<CompileError>> {
        let mut declarations = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(decl) => declarations.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }
        if self.errors.is_empty() {
            Ok(Program { declarations })
        } else {
            Err(self.errors)
        }
    }

    fn declaration(&mut self) -> Result<Decl, CompileError> {
        if self.check(TokenKind::Fun) {
            self.fun_declaration()
        } else if self.check(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement().map(Decl::Statement)
        }
    }

    fn fun_declaration(&mut self) -> Result<Decl, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'fun'
        let function = self.function()?;
        let span = self.span_from(start);
        Ok(Decl::Fun(FunDecl { function, span }))
    }

    fn function(&mut self) -> Result<Function, CompileError> {
        let start = self.current_span();
        let name = self.expect_identifier("function name")?;

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        // One diagnostic for the whole over-limit list; parsing continues.
        if params.len() > ARITY_LIMIT {
            let span = self.current_span();
            self.errors.push(CompileError::parse(
                format!("Can't have more than {ARITY_LIMIT} parameters"),
                span.offset,
                span.len,
            ));
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        self.consume(TokenKind::LeftBrace, "Expected '{' before function body")?;
        let body = self.block_declarations()?;
        let span = self.span_from(start);

        Ok(Function {
            name,
            params,
            body,
            span,
        })
    }

    fn var_declaration(&mut self) -> Result<Decl, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'var'
        let name = self.expect_identifier("variable name")?;

        let initializer = if self.match_token(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenKind::Semicolon,
            "Expected ';' after variable declaration",
        )?;
        let span = self.span_from(start);
        Ok(Decl::Var(VarDecl {
            name,
            initializer,
            span,
        }))
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        if self.check(TokenKind::Print) {
            self.print_statement()
        } else if self.check(TokenKind::Return) {
            self.return_statement()
        } else if self.check(TokenKind::LeftBrace) {
            self.block_statement()
        } else if self.check(TokenKind::If) {
            self.if_statement()
        } else if self.check(TokenKind::While) {
            self.while_statement()
        } else if self.check(TokenKind::For) {
            self.for_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'print'
        let expression = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after value")?;
        let span = self.span_from(start);
        Ok(Stmt::Print(PrintStmt { expression, span }))
    }

    fn return_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'return'
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return value")?;
        let span = self.span_from(start);
        Ok(Stmt::Return(ReturnStmt {
            value,
            keyword_span: start,
            span,
        }))
    }

    fn block_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume '{'
        let declarations = self.block_declarations()?;
        let span = self.span_from(start);
        Ok(Stmt::Block(BlockStmt { declarations, span }))
    }

    fn block_declarations(&mut self) -> Result<Vec<Decl>, CompileError> {
        let mut declarations = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            declarations.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(declarations)
    }

    fn if_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'if'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        let span = self.span_from(start);
        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    fn while_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'while'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;
        let body = Box::new(self.statement()?);
        let span = self.span_from(start);
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// Desugar `for` into `while`: the increment becomes the last statement
    /// of a block wrapping the body, an absent condition becomes `true`, and
    /// the initializer wraps the loop in an outer block.
    fn for_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'for'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let initializer = if self.match_token(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            let expr = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;
            let span = expr.span();
            Some(Decl::Statement(Stmt::Expression(ExprStmt {
                expression: expr,
                span,
            })))
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal(LiteralExpr {
                id: next_id(),
                value: LiteralValue::Bool(true),
                span: self.current_span(),
            })
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after loop condition")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;

        let mut body = self.statement()?;

        if let Some(inc) = increment {
            let inc_span = inc.span();
            body = Stmt::Block(BlockStmt {
                declarations: vec![
                    Decl::Statement(body),
                    Decl::Statement(Stmt::Expression(ExprStmt {
                        expression: inc,
                        span: inc_span,
                    })),
                ],
                span: self.span_from(start),
            });
        }

        let while_span = self.span_from(start);
        body = Stmt::While(WhileStmt {
            condition,
            body: Box::new(body),
            span: while_span,
        });

        if let Some(init) = initializer {
            let block_span = self.span_from(start);
            body = Stmt::Block(BlockStmt {
                declarations: vec![init, Decl::Statement(body)],
                span: block_span,
            });
        }

        Ok(body)
    }

    fn expression_statement(&mut self) -> Result<Stmt, CompileError> {
        let expression = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after expression")?;
        let span = expression.span();
        Ok(Stmt::Expression(ExprStmt { expression, span }))
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        self.comma()
    }

    /// The sequence operator sits below assignment: `a = 1, b = 2` is two
    /// assignments, and the whole expression yields the right operand.
    fn comma(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.assignment()?;
        while self.match_token(TokenKind::Comma) {
            let right = self.assignment()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Binary(BinaryExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: BinaryOp::Comma,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr, CompileError> {
        let expr = self.or()?;

        if self.match_token(TokenKind::Equal) {
            let equals_span = self.previous_span();
            let value = self.assignment()?;
            let span = self.join_spans(expr.span(), value.span());

            return match expr {
                Expr::Variable(v) => Ok(Expr::Assign(AssignExpr {
                    id: next_id(),
                    name: v.name,
                    value: Box::new(value),
                    span,
                })),
                _ => Err(CompileError::parse(
                    "Invalid assignment target",
                    equals_span.offset,
                    equals_span.len,
                )),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.and()?;
        while self.match_token(TokenKind::Or) {
            let right = self.and()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Logical(LogicalExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.equality()?;
        while self.match_token(TokenKind::And) {
            let right = self.equality()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Logical(LogicalExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.comparison()?;
        while let Some(op) = self.match_binary_op(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            let right = self.comparison()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Binary(BinaryExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.term()?;
        while let Some(op) = self.match_binary_op(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let right = self.term()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Binary(BinaryExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.factor()?;
        while let Some(op) = self.match_binary_op(&[TokenKind::Plus, TokenKind::Minus]) {
            let right = self.factor()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Binary(BinaryExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.unary()?;
        while let Some(op) = self.match_binary_op(&[TokenKind::Star, TokenKind::Slash]) {
            let right = self.unary()?;
            let span = self.join_spans(expr.span(), right.span());
            expr = Expr::Binary(BinaryExpr {
                id: next_id(),
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        if self.check(TokenKind::Bang) || self.check(TokenKind::Minus) {
            let start = self.current_span();
            let op = if self.match_token(TokenKind::Bang) {
                UnaryOp::Not
            } else {
                self.advance();
                UnaryOp::Negate
            };
            let operand = self.unary()?;
            let span = self.join_spans(start, operand.span());
            return Ok(Expr::Unary(UnaryExpr {
                id: next_id(),
                operator: op,
                operand: Box::new(operand),
                span,
            }));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.primary()?;
        while self.match_token(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    /// Arguments parse at assignment precedence so the comma between them is
    /// the separator, not the sequence operator; a parenthesized argument may
    /// still contain one.
    fn finish_call(&mut self, callee: Expr) -> Result<Expr, CompileError> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                arguments.push(self.assignment()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        // One diagnostic for the whole over-limit list; parsing continues.
        if arguments.len() > ARITY_LIMIT {
            let span = self.current_span();
            self.errors.push(CompileError::parse(
                format!("Can't have more than {ARITY_LIMIT} arguments"),
                span.offset,
                span.len,
            ));
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
        let paren_span = self.previous_span();
        let span = self.join_spans(callee.span(), paren_span);
        Ok(Expr::Call(CallExpr {
            id: next_id(),
            callee: Box::new(callee),
            arguments,
            paren_span,
            span,
        }))
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let Some(Literal::Number(value)) = token.literal else {
                    unreachable!("number tokens always carry a number literal")
                };
                Ok(Expr::Literal(LiteralExpr {
                    id: next_id(),
                    value: LiteralValue::Number(value),
                    span: token.span,
                }))
            }
            TokenKind::String => {
                self.advance();
                let Some(Literal::Str(value)) = token.literal else {
                    unreachable!("string tokens always carry a string literal")
                };
                Ok(Expr::Literal(LiteralExpr {
                    id: next_id(),
                    value: LiteralValue::String(value),
                    span: token.span,
                }))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    id: next_id(),
                    value: LiteralValue::Bool(true),
                    span: token.span,
                }))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    id: next_id(),
                    value: LiteralValue::Bool(false),
                    span: token.span,
                }))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    id: next_id(),
                    value: LiteralValue::Nil,
                    span: token.span,
                }))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Variable(VariableExpr {
                    id: next_id(),
                    name: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                let span = self.join_spans(token.span, self.previous_span());
                Ok(Expr::Grouping(GroupingExpr {
                    id: next_id(),
                    expression: Box::new(expr),
                    span,
                }))
            }
            // `class`, `this` and `super` are reserved words with no grammar
            // behind them; they land here like any other stray token.
            _ => Err(CompileError::parse(
                "Expected expression",
                token.span.offset,
                token.span.len,
            )),
        }
    }

    // --- Helper methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_binary_op(&mut self, kinds: &[TokenKind]) -> Option<BinaryOp> {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return Some(token_to_binary_op(kind));
            }
        }
        None
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(CompileError::parse(
                message,
                token.span.offset,
                token.span.len,
            ))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<String, CompileError> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance().clone();
            Ok(token.lexeme)
        } else {
            let token = self.peek();
            Err(CompileError::parse(
                format!("Expected {context}"),
                token.span.offset,
                token.span.len,
            ))
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.current - 1].span
    }

    fn span_from(&self, start: Span) -> Span {
        self.join_spans(start, self.previous_span())
    }

    fn join_spans(&self, start: Span, end: Span) -> Span {
        Span::new(start.offset, end.offset + end.len - start.offset)
    }

    /// Discard tokens until just past a `;` or just before a token that can
    /// begin a statement, scoping an error to its statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.tokens[self.current - 1].kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn token_to_binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Comma => BinaryOp::Comma,
        _ => unreachable!("only called with matched operator tokens"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner;

    fn parse_ok(source: &str) -> Program {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens).parse().expect("parse should succeed")
    }

    fn parse_err(source: &str) -> Vec<CompileError> {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens).parse().unwrap_err()
    }

    fn parse_sexp(source: &str) -> String {
        let program = parse_ok(source);
        crate::ast::printer::to_sexp(&program).trim().to_string()
    }

    #[test]
    fn precedence_add_mul() {
        assert_eq!(parse_sexp("1 + 2 * 3;"), "(+ 1 (* 2 3))");
    }

    #[test]
    fn precedence_group() {
        assert_eq!(parse_sexp("(1 + 2) * 3;"), "(* (group (+ 1 2)) 3)");
    }

    #[test]
    fn unary_negate() {
        assert_eq!(parse_sexp("-1;"), "(- 1)");
    }

    #[test]
    fn unary_not() {
        assert_eq!(parse_sexp("!true;"), "(! true)");
    }

    #[test]
    fn comma_is_lowest_precedence() {
        assert_eq!(parse_sexp("1, 2 + 3;"), "(, 1 (+ 2 3))");
    }

    #[test]
    fn comma_chains_left_associatively() {
        assert_eq!(parse_sexp("1, 2, 3;"), "(, (, 1 2) 3)");
    }

    #[test]
    fn comma_sequences_assignments() {
        assert_eq!(parse_sexp("a = 1, b = 2;"), "(, (= a 1) (= b 2))");
    }

    #[test]
    fn var_declaration() {
        assert_eq!(parse_sexp("var x = 42;"), "(var x 42)");
    }

    #[test]
    fn var_no_init() {
        assert_eq!(parse_sexp("var x;"), "(var x)");
    }

    #[test]
    fn if_else() {
        assert_eq!(
            parse_sexp("if (true) print 1; else print 2;"),
            "(if true (print 1) (print 2))"
        );
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            parse_sexp("while (true) print 1;"),
            "(while true (print 1))"
        );
    }

    #[test]
    fn for_desugars_to_while() {
        let sexp = parse_sexp("for (var i = 0; i < 10; i = i + 1) print i;");
        assert_eq!(
            sexp,
            "(block (var i 0) (while (< i 10) (block (print i) (= i (+ i 1)))))"
        );
    }

    #[test]
    fn for_with_empty_clauses() {
        assert_eq!(parse_sexp("for (;;) print 1;"), "(while true (print 1))");
    }

    #[test]
    fn function_decl() {
        assert_eq!(
            parse_sexp("fun foo(a, b) { return a + b; }"),
            "(fun foo (a b) (return (+ a b)))"
        );
    }

    #[test]
    fn function_call() {
        assert_eq!(parse_sexp("foo(1, 2);"), "(call foo 1 2)");
    }

    #[test]
    fn call_arguments_are_separated_by_commas() {
        // Two arguments, not one sequence expression.
        let program = parse_ok("foo(1, 2);");
        let Decl::Statement(Stmt::Expression(ref e)) = program.declarations[0] else {
            panic!("expected expression statement");
        };
        let Expr::Call(ref call) = e.expression else {
            panic!("expected call expression");
        };
        assert_eq!(call.arguments.len(), 2);
    }

    #[test]
    fn parenthesized_argument_may_contain_comma() {
        assert_eq!(parse_sexp("foo((1, 2));"), "(call foo (group (, 1 2)))");
    }

    #[test]
    fn assignment() {
        assert_eq!(parse_sexp("x = 42;"), "(= x 42)");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(parse_sexp("a = b = 1;"), "(= a (= b 1))");
    }

    #[test]
    fn invalid_assignment_target() {
        let errors = parse_err("1 + 2 = 3;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn logical_operators() {
        assert_eq!(
            parse_sexp("true and false or true;"),
            "(or (and true false) true)"
        );
    }

    #[test]
    fn error_recovery() {
        let errors = parse_err("var x = ; var y = 1;");
        assert!(!errors.is_empty());
    }

    #[test]
    fn reserved_class_keyword_is_inert() {
        let errors = parse_err("class Foo {}");
        assert!(errors[0].to_string().contains("Expected expression"));
    }

    #[test]
    fn reserved_this_keyword_is_inert() {
        let errors = parse_err("print this;");
        assert!(errors[0].to_string().contains("Expected expression"));
    }

    #[test]
    fn argument_limit_reports_one_diagnostic() {
        let args: Vec<String> = (0..=255).map(|i| i.to_string()).collect(); // 256 arguments
        let source = format!("foo({});", args.join(", "));
        let errors = parse_err(&source);
        assert_eq!(errors.len(), 1, "got: {errors:?}");
        assert!(errors[0].to_string().contains("more than 255 arguments"));
    }

    #[test]
    fn argument_limit_not_hit_at_255() {
        let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
        let source = format!("foo({});", args.join(", "));
        parse_ok(&source);
    }

    #[test]
    fn parameter_limit_reports_one_diagnostic() {
        let params: Vec<String> = (0..=255).map(|i| format!("p{i}")).collect(); // 256 parameters
        let source = format!("fun f({}) {{}}", params.join(", "));
        let errors = parse_err(&source);
        assert_eq!(errors.len(), 1, "got: {errors:?}");
        assert!(errors[0].to_string().contains("more than 255 parameters"));
    }

    #[test]
    fn missing_semicolon_reports_at_next_token() {
        let errors = parse_err("var x = 1\nprint x;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("';'"));
    }
}
