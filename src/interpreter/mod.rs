pub mod callable;
pub mod environment;
pub mod resolver;
pub mod value;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::callable::{Callable, NativeFunction, UserFunction};
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;
use crate::scanner::token::Span;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: Vec<String>,
    /// Writer for print output (allows testing without stdout)
    writer: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn globals_with_builtins() -> Rc<RefCell<Environment>> {
    let globals = Rc::new(RefCell::new(Environment::new()));
    {
        let mut env = globals.borrow_mut();
        env.define(
            "clock".to_string(),
            Value::Function(Callable::Native(NativeFunction::Clock)),
        );
        env.define(
            "toNumber".to_string(),
            Value::Function(Callable::Native(NativeFunction::ToNumber)),
        );
    }
    globals
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = globals_with_builtins();
        Self {
            globals: Rc::clone(&globals),
            environment: globals,
            locals: HashMap::new(),
            output: Vec::new(),
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Create an interpreter that captures output (for testing).
    #[cfg(test)]
    fn new_capturing() -> Self {
        let globals = globals_with_builtins();
        Self {
            globals: Rc::clone(&globals),
            environment: globals,
            locals: HashMap::new(),
            output: Vec::new(),
            writer: Box::new(Vec::<u8>::new()),
        }
    }

    pub fn interpret(
        &mut self,
        program: &Program,
        locals: HashMap<ExprId, usize>,
    ) -> Result<(), RuntimeError> {
        self.locals = locals;
        for decl in &program.declarations {
            self.execute_decl(decl)?;
        }
        Ok(())
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Merge additional resolved locals (for REPL line-by-line resolution).
    pub fn merge_locals(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals.extend(locals);
    }

    /// Execute additional declarations without resetting state (for REPL).
    pub fn interpret_additional(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for decl in &program.declarations {
            self.execute_decl(decl)?;
        }
        Ok(())
    }

    fn execute_decl(&mut self, decl: &Decl) -> Result<(), RuntimeError> {
        match decl {
            Decl::Var(v) => {
                let value = match &v.initializer {
                    Some(init) => self.evaluate_expr(init)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(v.name.clone(), value);
                Ok(())
            }
            Decl::Fun(f) => {
                let function = UserFunction {
                    declaration: f.function.clone(),
                    closure: Rc::clone(&self.environment),
                };
                self.environment.borrow_mut().define(
                    f.function.name.clone(),
                    Value::Function(Callable::User(function)),
                );
                Ok(())
            }
            Decl::Statement(s) => self.execute_stmt(s),
        }
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Expression(e) => {
                self.evaluate_expr(&e.expression)?;
                Ok(())
            }
            Stmt::Print(p) => {
                let value = self.evaluate_expr(&p.expression)?;
                let text = format!("{value}");
                writeln!(self.writer, "{text}").expect("write should succeed");
                self.output.push(text);
                Ok(())
            }
            Stmt::Return(r) => {
                let value = match &r.value {
                    Some(val) => self.evaluate_expr(val)?,
                    None => Value::Nil,
                };
                Err(RuntimeError::Return { value })
            }
            Stmt::Block(b) => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));
                self.execute_block(&b.declarations, env)
            }
            Stmt::If(i) => {
                let condition = self.evaluate_expr(&i.condition)?;
                if condition.is_truthy() {
                    self.execute_stmt(&i.then_branch)
                } else if let Some(ref else_branch) = i.else_branch {
                    self.execute_stmt(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(w) => {
                while self.evaluate_expr(&w.condition)?.is_truthy() {
                    self.execute_stmt(&w.body)?;
                }
                Ok(())
            }
        }
    }

    /// Run declarations in `env`, restoring the previous environment on every
    /// exit path, including errors and the return signal.
    fn execute_block(
        &mut self,
        declarations: &[Decl],
        env: Rc<RefCell<Environment>>,
    ) -> Result<(), RuntimeError> {
        let previous = Rc::clone(&self.environment);
        self.environment = env;
        let result = declarations.iter().try_for_each(|d| self.execute_decl(d));
        self.environment = previous;
        result
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(l) => Ok(match &l.value {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::String(s) => Value::Str(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),
            Expr::Grouping(g) => self.evaluate_expr(&g.expression),
            Expr::Unary(u) => {
                let operand = self.evaluate_expr(&u.operand)?;
                match u.operator {
                    UnaryOp::Negate => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::with_span("Operand must be a number", u.span)),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::Binary(b) => self.evaluate_binary(b),
            Expr::Variable(v) => self.look_up_variable(&v.name, v.id, v.span),
            Expr::Assign(a) => {
                let value = self.evaluate_expr(&a.value)?;
                if let Some(&distance) = self.locals.get(&a.id) {
                    self.environment
                        .borrow_mut()
                        .assign_at(distance, &a.name, value.clone());
                } else {
                    let ok = self.globals.borrow_mut().assign(&a.name, value.clone());
                    if !ok {
                        return Err(RuntimeError::with_span(
                            format!("Undefined variable '{}'", a.name),
                            a.span,
                        ));
                    }
                }
                Ok(value)
            }
            Expr::Logical(l) => {
                let left = self.evaluate_expr(&l.left)?;
                match l.operator {
                    LogicalOp::Or => {
                        if left.is_truthy() {
                            return Ok(left);
                        }
                    }
                    LogicalOp::And => {
                        if !left.is_truthy() {
                            return Ok(left);
                        }
                    }
                }
                self.evaluate_expr(&l.right)
            }
            Expr::Call(c) => self.evaluate_call(c),
        }
    }

    fn evaluate_binary(&mut self, b: &BinaryExpr) -> Result<Value, RuntimeError> {
        let left = self.evaluate_expr(&b.left)?;
        let right = self.evaluate_expr(&b.right)?;

        match b.operator {
            BinaryOp::Add => match (&left, &right) {
                (Value::Number(a), Value::Number(b_val)) => Ok(Value::Number(a + b_val)),
                (Value::Str(a), Value::Str(b_val)) => Ok(Value::Str(format!("{a}{b_val}"))),
                _ => Err(RuntimeError::with_span(
                    "Operands must be two numbers or two strings",
                    b.span,
                )),
            },
            BinaryOp::Subtract => number_binop(&left, &right, |a, c| a - c, b),
            BinaryOp::Multiply => number_binop(&left, &right, |a, c| a * c, b),
            BinaryOp::Divide => number_binop(&left, &right, |a, c| a / c, b),
            BinaryOp::Less => number_cmp(&left, &right, |a, c| a < c, b),
            BinaryOp::LessEqual => number_cmp(&left, &right, |a, c| a <= c, b),
            BinaryOp::Greater => number_cmp(&left, &right, |a, c| a > c, b),
            BinaryOp::GreaterEqual => number_cmp(&left, &right, |a, c| a >= c, b),
            BinaryOp::Equal => Ok(Value::Bool(left.is_equal(&right))),
            BinaryOp::NotEqual => Ok(Value::Bool(!left.is_equal(&right))),
            // The left operand already ran for its effects; the sequence
            // yields the right.
            BinaryOp::Comma => Ok(right),
        }
    }

    fn evaluate_call(&mut self, c: &CallExpr) -> Result<Value, RuntimeError> {
        let callee = self.evaluate_expr(&c.callee)?;

        let mut args = Vec::new();
        for arg in &c.arguments {
            args.push(self.evaluate_expr(arg)?);
        }

        match callee {
            Value::Function(func) => {
                if args.len() != func.arity() {
                    return Err(RuntimeError::with_span(
                        format!("Expected {} arguments but got {}", func.arity(), args.len()),
                        c.paren_span,
                    ));
                }
                self.call_function(&func, args)
            }
            _ => Err(RuntimeError::with_span(
                "Can only call functions",
                c.paren_span,
            )),
        }
    }

    fn call_function(&mut self, func: &Callable, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match func {
            Callable::Native(native) => Ok(native.call(&args)),
            Callable::User(user_fn) => {
                // Parameters bind in a fresh frame whose parent is the
                // function's closure, not the calling environment.
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &user_fn.closure,
                ))));
                for (param, arg) in user_fn.declaration.params.iter().zip(args) {
                    env.borrow_mut().define(param.clone(), arg);
                }

                match self.execute_block(&user_fn.declaration.body, env) {
                    Ok(()) => Ok(Value::Nil),
                    Err(RuntimeError::Return { value }) => Ok(value),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn look_up_variable(&self, name: &str, id: ExprId, span: Span) -> Result<Value, RuntimeError> {
        if let Some(&distance) = self.locals.get(&id) {
            Ok(self
                .environment
                .borrow()
                .get_at(distance, name)
                .expect("resolved locals exist at their recorded distance"))
        } else {
            self.globals
                .borrow()
                .get(name)
                .ok_or_else(|| {
                    RuntimeError::with_span(format!("Undefined variable '{name}'"), span)
                })
        }
    }
}

fn number_binop(
    left: &Value,
    right: &Value,
    op: fn(f64, f64) -> f64,
    b: &BinaryExpr,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(c)) => Ok(Value::Number(op(*a, *c))),
        _ => Err(RuntimeError::with_span("Operands must be numbers", b.span)),
    }
}

fn number_cmp(
    left: &Value,
    right: &Value,
    op: fn(f64, f64) -> bool,
    b: &BinaryExpr,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(c)) => Ok(Value::Bool(op(*a, *c))),
        _ => Err(RuntimeError::with_span("Operands must be numbers", b.span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::resolver::Resolver;
    use crate::parser::Parser;
    use crate::scanner;
    use rstest::rstest;

    fn run(source: &str) -> Vec<String> {
        let tokens = scanner::scan(source).expect("scan should succeed");
        let program = Parser::new(tokens).parse().expect("parse should succeed");
        let locals = Resolver::new()
            .resolve(&program)
            .expect("resolve should succeed");
        let mut interp = Interpreter::new_capturing();
        interp
            .interpret(&program, locals)
            .expect("interpret should succeed");
        interp.output.clone()
    }

    fn run_err(source: &str) -> RuntimeError {
        let tokens = scanner::scan(source).expect("scan should succeed");
        let program = Parser::new(tokens).parse().expect("parse should succeed");
        let locals = Resolver::new()
            .resolve(&program)
            .expect("resolve should succeed");
        let mut interp = Interpreter::new_capturing();
        interp.interpret(&program, locals).unwrap_err()
    }

    #[rstest]
    #[case("print 1 + 2;", "3")]
    #[case("print 1 + 2 * 3;", "7")]
    #[case("print 10 - 3;", "7")]
    #[case("print 2 * 3;", "6")]
    #[case("print 10 / 4;", "2.5")]
    #[case("print -5;", "-5")]
    #[case("print (1 + 2) * 3;", "9")]
    fn arithmetic(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(run(source), vec![expected]);
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run("print \"a\" + \"b\";"), vec!["ab"]);
        assert_eq!(run("print \"hello\" + \" world\";"), vec!["hello world"]);
    }

    #[test]
    fn truthiness() {
        assert_eq!(run("print !nil;"), vec!["true"]);
        assert_eq!(run("print !false;"), vec!["true"]);
        assert_eq!(run("print !!true;"), vec!["true"]);
        assert_eq!(run("print !!false;"), vec!["false"]);
        assert_eq!(run("print !0;"), vec!["false"]);
        assert_eq!(run("print !\"\";"), vec!["false"]);
    }

    #[test]
    fn equality() {
        assert_eq!(run("print 1 == 1;"), vec!["true"]);
        assert_eq!(run("print 1 == 2;"), vec!["false"]);
        assert_eq!(run("print nil == nil;"), vec!["true"]);
        assert_eq!(run("print 1 != 2;"), vec!["true"]);
        assert_eq!(run("print 1 == \"1\";"), vec!["false"]);
        assert_eq!(run("print (0 / 0) == (0 / 0);"), vec!["false"]);
    }

    #[test]
    fn variables() {
        assert_eq!(run("var x = 10; print x;"), vec!["10"]);
        assert_eq!(run("var x; print x;"), vec!["nil"]);
        assert_eq!(run("var x = 1; x = 2; print x;"), vec!["2"]);
    }

    #[test]
    fn redeclaration_overwrites() {
        assert_eq!(run("var x = 1; var x = 2; print x;"), vec!["2"]);
        assert_eq!(run("{ var x = 1; var x = 2; print x; }"), vec!["2"]);
    }

    #[test]
    fn assignment_yields_its_value() {
        assert_eq!(run("var a; print a = 3; print a;"), vec!["3", "3"]);
    }

    #[test]
    fn comma_yields_right_operand() {
        assert_eq!(run("print 1, 2;"), vec!["2"]);
    }

    #[test]
    fn comma_evaluates_left_for_effect() {
        assert_eq!(run("var a = 1; print (a = 2, a);"), vec!["2"]);
    }

    #[test]
    fn blocks_and_scoping() {
        let output = run("var a = 1; { var a = 2; print a; } print a;");
        assert_eq!(output, vec!["2", "1"]);
    }

    #[test]
    fn if_else() {
        assert_eq!(run("if (true) print 1; else print 2;"), vec!["1"]);
        assert_eq!(run("if (false) print 1; else print 2;"), vec!["2"]);
    }

    #[test]
    fn while_loop() {
        let output = run("var i = 0; while (i < 3) { print i; i = i + 1; }");
        assert_eq!(output, vec!["0", "1", "2"]);
    }

    #[test]
    fn for_loop() {
        let output = run("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(output, vec!["0", "1", "2"]);
    }

    #[test]
    fn functions() {
        let output = run("fun add(a, b) { return a + b; } print add(1, 2);");
        assert_eq!(output, vec!["3"]);
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(run("fun noop() {} print noop();"), vec!["nil"]);
    }

    #[test]
    fn bare_return_yields_nil() {
        assert_eq!(run("fun f() { return; } print f();"), vec!["nil"]);
    }

    #[test]
    fn closures() {
        let output = run("fun make() {
                var i = 0;
                fun inc() {
                    i = i + 1;
                    return i;
                }
                return inc;
            }
            var c = make();
            print c();
            print c();
            print c();");
        assert_eq!(output, vec!["1", "2", "3"]);
    }

    #[test]
    fn closures_are_independent_per_call() {
        let output = run("fun make() {
                var i = 0;
                fun inc() { i = i + 1; return i; }
                return inc;
            }
            var a = make();
            var b = make();
            print a();
            print a();
            print b();");
        assert_eq!(output, vec!["1", "2", "1"]);
    }

    #[test]
    fn closure_captures_definition_environment() {
        let output = run("var x = \"outer\";
            {
                var x = \"inner\";
                fun f() { print x; }
                f();
            }");
        assert_eq!(output, vec!["inner"]);
    }

    #[test]
    fn closure_does_not_capture_later_declarations() {
        let output = run("var x = \"outer\";
            {
                fun f() { print x; }
                var x = \"inner\";
                f();
            }");
        assert_eq!(output, vec!["outer"]);
    }

    #[test]
    fn recursion() {
        let output = run("fun fib(n) {
                if (n <= 1) return n;
                return fib(n - 1) + fib(n - 2);
            }
            for (var i = 0; i < 10; i = i + 1) {
                print fib(i);
            }");
        assert_eq!(
            output,
            vec!["0", "1", "1", "2", "3", "5", "8", "13", "21", "34"]
        );
    }

    #[test]
    fn logical_operators() {
        assert_eq!(run("print true or false;"), vec!["true"]);
        assert_eq!(run("print false and true;"), vec!["false"]);
        assert_eq!(run("print nil or 2;"), vec!["2"]);
        assert_eq!(run("print false and 3;"), vec!["false"]);
    }

    #[test]
    fn or_short_circuit_skips_right_operand() {
        // `hidden` is never evaluated, so no output and no undefined error.
        assert_eq!(run("print 1 or hidden;"), vec!["1"]);
        let output = run("fun noisy() { print \"side effect\"; return true; }
            print true or noisy();");
        assert_eq!(output, vec!["true"]);
    }

    #[test]
    fn and_short_circuit_skips_right_operand() {
        let output = run("fun noisy() { print \"side effect\"; return true; }
            print false and noisy();");
        assert_eq!(output, vec!["false"]);
    }

    #[test]
    fn argument_evaluation_is_left_to_right() {
        let output = run("fun tag(v) { print v; return v; }
            fun pair(a, b) { return a + b; }
            print pair(tag(1), tag(2));");
        assert_eq!(output, vec!["1", "2", "3"]);
    }

    #[test]
    fn function_values_print_their_name() {
        assert_eq!(run("fun f() {} print f;"), vec!["<fn f>"]);
        assert_eq!(run("print clock;"), vec!["<fn clock>"]);
    }

    #[test]
    fn clock_is_a_number() {
        assert_eq!(run("print clock() > 0;"), vec!["true"]);
    }

    #[test]
    fn to_number_builtin() {
        assert_eq!(run("print toNumber(\"42\") + 1;"), vec!["43"]);
        assert_eq!(run("print toNumber(\"oops\");"), vec!["nil"]);
    }

    #[test]
    fn undefined_variable_error() {
        let err = run_err("print x;");
        assert!(err.to_string().contains("Undefined variable 'x'"));
    }

    #[test]
    fn assignment_to_undefined_variable_error() {
        let err = run_err("x = 1;");
        assert!(err.to_string().contains("Undefined variable 'x'"));
    }

    #[test]
    fn wrong_arity_error() {
        let err = run_err("fun f(a) { return a; } f(1, 2);");
        assert!(err.to_string().contains("Expected 1 arguments but got 2"));
    }

    #[test]
    fn calling_non_callable_error() {
        let err = run_err("var x = 1; x();");
        assert!(err.to_string().contains("Can only call functions"));
    }

    #[test]
    fn type_error_addition() {
        let err = run_err("print 1 + \"x\";");
        assert!(
            err.to_string()
                .contains("Operands must be two numbers or two strings")
        );
    }

    #[test]
    fn type_error_negation() {
        let err = run_err("print -\"x\";");
        assert!(err.to_string().contains("Operand must be a number"));
    }

    #[test]
    fn type_error_comparison() {
        let err = run_err("print 1 < \"2\";");
        assert!(err.to_string().contains("Operands must be numbers"));
    }

    #[test]
    fn error_unwinds_out_of_blocks_but_environment_recovers() {
        let tokens = scanner::scan("var x = 1; { var x = 2; y; }").expect("scan");
        let program = Parser::new(tokens).parse().expect("parse");
        let locals = Resolver::new().resolve(&program).expect("resolve");
        let mut interp = Interpreter::new_capturing();
        assert!(interp.interpret(&program, locals).is_err());

        // The failed block must not leak its scope into later runs.
        let tokens = scanner::scan("print x;").expect("scan");
        let program = Parser::new(tokens).parse().expect("parse");
        let locals = Resolver::new().resolve(&program).expect("resolve");
        interp.merge_locals(locals);
        interp.interpret_additional(&program).expect("interpret");
        assert_eq!(interp.output().to_vec(), vec!["1"]);
    }

    #[test]
    fn state_persists_across_interpret_additional() {
        let mut interp = Interpreter::new_capturing();
        for (line, expected_len) in [("var x = 7;", 0), ("print x;", 1)] {
            let tokens = scanner::scan(line).expect("scan");
            let program = Parser::new(tokens).parse().expect("parse");
            let locals = Resolver::new().resolve(&program).expect("resolve");
            interp.merge_locals(locals);
            interp.interpret_additional(&program).expect("interpret");
            assert_eq!(interp.output().len(), expected_len);
        }
        assert_eq!(interp.output().to_vec(), vec!["7"]);
    }
}
