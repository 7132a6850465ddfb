use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
}

/// Static variable resolution. For every variable use that refers to a
/// local, records how many environment hops separate the use site from the
/// defining scope; names found in no static scope fall back to the global
/// environment at runtime.
///
/// A closure therefore sees the bindings visible where it was declared:
/// names introduced later in the same block do not retroactively capture.
pub struct Resolver {
    scopes: Vec<HashSet<String>>,
    locals: HashMap<ExprId, usize>,
    current_function: FunctionKind,
    errors: Vec<CompileError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionKind::None,
            errors: Vec::new(),
        }
    }

    pub fn resolve(
        mut self,
        program: &Program,
    ) -> Result<HashMap<ExprId, usize>, Vec<CompileError>> {
        for decl in &program.declarations {
            self.resolve_decl(decl);
        }
        if self.errors.is_empty() {
            Ok(self.locals)
        } else {
            Err(self.errors)
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains(name) {
                self.locals.insert(id, distance);
                return;
            }
        }
        // Not found in any static scope: resolved against globals at runtime.
    }

    fn resolve_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(v) => {
                // The initializer resolves before the name exists, so
                // `var x = x;` reads the enclosing x. Re-declaring a name in
                // the same scope is permitted and overwrites.
                if let Some(ref init) = v.initializer {
                    self.resolve_expr(init);
                }
                self.declare(&v.name);
            }
            Decl::Fun(f) => {
                // The name is visible inside the body, allowing recursion.
                self.declare(&f.function.name);
                self.resolve_function(&f.function);
            }
            Decl::Statement(s) => self.resolve_stmt(s),
        }
    }

    fn resolve_function(&mut self, function: &Function) {
        let enclosing = self.current_function;
        self.current_function = FunctionKind::Function;
        // Parameters and body share one scope, mirroring the single
        // environment a call creates.
        self.begin_scope();
        for param in &function.params {
            self.declare(param);
        }
        for decl in &function.body {
            self.resolve_decl(decl);
        }
        self.end_scope();
        self.current_function = enclosing;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(e) => self.resolve_expr(&e.expression),
            Stmt::Print(p) => self.resolve_expr(&p.expression),
            Stmt::Return(r) => {
                if self.current_function == FunctionKind::None {
                    self.errors.push(CompileError::resolve(
                        "Can't return from top-level code",
                        r.keyword_span.offset,
                        r.keyword_span.len,
                    ));
                }
                if let Some(ref value) = r.value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Block(b) => {
                self.begin_scope();
                for decl in &b.declarations {
                    self.resolve_decl(decl);
                }
                self.end_scope();
            }
            Stmt::If(i) => {
                self.resolve_expr(&i.condition);
                self.resolve_stmt(&i.then_branch);
                if let Some(ref else_branch) = i.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(w) => {
                self.resolve_expr(&w.condition);
                self.resolve_stmt(&w.body);
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(v) => self.resolve_local(v.id, &v.name),
            Expr::Assign(a) => {
                self.resolve_expr(&a.value);
                self.resolve_local(a.id, &a.name);
            }
            Expr::Binary(b) => {
                self.resolve_expr(&b.left);
                self.resolve_expr(&b.right);
            }
            Expr::Unary(u) => self.resolve_expr(&u.operand),
            Expr::Logical(l) => {
                self.resolve_expr(&l.left);
                self.resolve_expr(&l.right);
            }
            Expr::Call(c) => {
                self.resolve_expr(&c.callee);
                for arg in &c.arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Grouping(g) => self.resolve_expr(&g.expression),
            Expr::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner;

    fn resolve_program(source: &str) -> Result<HashMap<ExprId, usize>, Vec<CompileError>> {
        let tokens = scanner::scan(source).expect("scan should succeed");
        let program = Parser::new(tokens).parse().expect("parse should succeed");
        Resolver::new().resolve(&program)
    }

    #[test]
    fn globals_are_not_recorded() {
        let locals = resolve_program("var x = 1; print x;").expect("resolve should succeed");
        assert!(locals.is_empty());
    }

    #[test]
    fn block_local_resolves_at_distance_zero() {
        let locals = resolve_program("{ var x = 1; print x; }").expect("resolve should succeed");
        assert_eq!(locals.values().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn capture_crosses_function_scope() {
        let locals = resolve_program("{ var x = 1; fun f() { print x; } }")
            .expect("resolve should succeed");
        // x inside f: one hop from the function scope to the block.
        assert_eq!(locals.values().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn initializer_resolves_before_declaration() {
        // The inner `x` initializer reads the outer x, not itself.
        let locals =
            resolve_program("{ var x = 1; { var x = x; } }").expect("resolve should succeed");
        assert_eq!(locals.values().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn redeclaration_in_same_scope_is_permitted() {
        assert!(resolve_program("{ var x = 1; var x = 2; }").is_ok());
    }

    #[test]
    fn later_declaration_does_not_capture() {
        // Inside f, x is not yet in the block scope, so it resolves globally.
        let locals = resolve_program("{ fun f() { print x; } var x = 1; }")
            .expect("resolve should succeed");
        assert!(locals.is_empty());
    }

    #[test]
    fn top_level_return_is_an_error() {
        let errors = resolve_program("return 1;").unwrap_err();
        assert!(
            errors[0]
                .to_string()
                .contains("Can't return from top-level code")
        );
    }

    #[test]
    fn return_inside_function_is_fine() {
        assert!(resolve_program("fun f() { return 1; }").is_ok());
    }
}
