use std::fmt;

use crate::interpreter::callable::Callable;

/// How close a number must be to its rounded integer before it prints
/// without a decimal point.
const INTEGER_DISPLAY_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
    Function(Callable),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, including `0`, `""` and
    /// NaN, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            _ => true,
        }
    }

    /// Structural equality. Values of different variants are unequal, numbers
    /// follow IEEE semantics (NaN is not equal to itself), and functions never
    /// compare equal.
    pub fn is_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => {
                let rounded = n.round();
                // Values within epsilon of an integer print as that integer;
                // the magnitude guard keeps the i64 cast exact.
                if n.is_finite()
                    && (n - rounded).abs() <= INTEGER_DISPLAY_EPSILON
                    && rounded.abs() < 1e15
                {
                    write!(f, "{}", rounded as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "nil"),
            Self::Function(func) => write!(f, "{func}"),
        }
    }
}
