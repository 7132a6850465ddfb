use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interpreter::value::Value;

/// One link in the lexical scope chain. The global environment has no
/// enclosing link; every block and call frame extends its parent. Closures
/// keep their defining link alive through the shared `Rc`.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a name in this scope. Re-defining an existing name overwrites it.
    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    /// Look a name up in this scope, then outward through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .enclosing
                .as_ref()
                .and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Read a name exactly `distance` hops up the chain.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        if distance == 0 {
            self.values.get(name).cloned()
        } else {
            self.enclosing
                .as_ref()
                .expect("resolved distance stays within the chain")
                .borrow()
                .get_at(distance - 1, name)
        }
    }

    /// Overwrite a name wherever it is already bound, searching outward.
    /// Returns false if the name is bound nowhere in the chain.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return true;
        }
        match self.enclosing {
            Some(ref outer) => outer.borrow_mut().assign(name, value),
            None => false,
        }
    }

    /// Overwrite a name exactly `distance` hops up the chain.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
        } else {
            self.enclosing
                .as_ref()
                .expect("resolved distance stays within the chain")
                .borrow_mut()
                .assign_at(distance - 1, name, value);
        }
    }
}
