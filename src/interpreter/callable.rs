use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Function;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;

/// Anything invocable with `()`.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(NativeFunction),
    User(UserFunction),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Self::Native(n) => n.name(),
            Self::User(u) => &u.declaration.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Native(n) => n.arity(),
            Self::User(u) => u.declaration.params.len(),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// A user-defined function: its declaration plus the environment it was
/// declared in. The closure link is the defining scope, never the caller's.
#[derive(Debug, Clone)]
pub struct UserFunction {
    pub declaration: Function,
    pub closure: Rc<RefCell<Environment>>,
}

/// Builtins bound in the global environment at interpreter construction.
#[derive(Debug, Clone, Copy)]
pub enum NativeFunction {
    Clock,
    ToNumber,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        match self {
            Self::Clock => "clock",
            Self::ToNumber => "toNumber",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Clock => 0,
            Self::ToNumber => 1,
        }
    }

    pub fn call(&self, args: &[Value]) -> Value {
        match self {
            Self::Clock => {
                use std::time::{SystemTime, UNIX_EPOCH};
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("system clock should be after unix epoch")
                    .as_secs_f64();
                Value::Number(secs)
            }
            Self::ToNumber => match &args[0] {
                Value::Number(n) => Value::Number(*n),
                Value::Str(s) => match crate::stdlib::parse_number_literal(s) {
                    Some(n) => Value::Number(n),
                    None => Value::Nil,
                },
                _ => Value::Nil,
            },
        }
    }
}
