// ABOUTME: Lexically nested name-to-value mapping shared by closures and blocks

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Unconditional insert/overwrite in this frame; re-declaring an
    /// existing name in the same frame is permitted (global re-declaration
    /// and parameter shadowing both rely on this).
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Walks the parent chain until `name` is found, then assigns there.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }

    /// Jumps exactly `depth` frames up (0 = this frame) and assigns unconditionally.
    /// Used for locals the resolver has already bound to a scope distance.
    pub fn assign_at(self: &Rc<Self>, name: &str, value: Value, depth: usize) {
        self.ancestor(depth)
            .bindings
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Walks the parent chain and reads the first binding found.
    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }

    /// Jumps exactly `depth` frames up (0 = this frame) and reads. Panics if
    /// the binding is missing there — the resolver guarantees it exists.
    pub fn lookup_at(self: &Rc<Self>, name: &str, depth: usize) -> Value {
        self.ancestor(depth)
            .bindings
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(|| {
                panic!("resolver recorded depth {} for '{}' but binding is absent", depth, name)
            })
    }

    fn ancestor(self: &Rc<Self>, depth: usize) -> Rc<Environment> {
        let mut env = Rc::clone(self);
        for _ in 0..depth {
            let next = env
                .parent
                .as_ref()
                .expect("resolver depth exceeds the actual scope chain")
                .clone();
            env = next;
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup_in_the_same_frame() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(42.0));
        assert_eq!(env.lookup("x").unwrap().as_number(), Some(42.0));
    }

    #[test]
    fn undefined_lookup_is_an_error() {
        let env = Environment::new();
        assert!(env.lookup("missing").is_err());
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(1.0));
        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(2.0));
        assert_eq!(child.lookup("x").unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn child_sees_parent_binding() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(1.0));
        let child = Environment::with_parent(parent);
        assert_eq!(child.lookup("x").unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn assign_walks_up_to_the_defining_frame() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(1.0));
        let child = Environment::with_parent(parent.clone());
        child.assign("x", Value::Number(9.0)).unwrap();
        assert_eq!(parent.lookup("x").unwrap().as_number(), Some(9.0));
    }

    #[test]
    fn assign_to_undefined_name_fails() {
        let env = Environment::new();
        assert!(env.assign("nope", Value::Nil).is_err());
    }

    #[test]
    fn lookup_at_reads_the_exact_ancestor() {
        let grandparent = Environment::new();
        grandparent.define("x".to_string(), Value::Number(1.0));
        let parent = Environment::with_parent(grandparent);
        parent.define("x".to_string(), Value::Number(2.0));
        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(3.0));

        assert_eq!(child.lookup_at("x", 1).as_number(), Some(2.0));
        assert_eq!(child.lookup_at("x", 2).as_number(), Some(1.0));
    }

    #[test]
    fn assign_at_writes_the_exact_ancestor() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(1.0));
        let child = Environment::with_parent(parent.clone());
        child.assign_at("x", Value::Number(7.0), 1);
        assert_eq!(parent.lookup("x").unwrap().as_number(), Some(7.0));
    }
}
