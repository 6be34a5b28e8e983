use crate::error::{EzFlowError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single lexical scope: name → value bindings plus an optional link to the
/// enclosing scope.  The parent link is set once at creation and never
/// reassigned, so the chain is acyclic by construction.  Scopes are shared
/// (`Rc<RefCell<_>>`) because any number of closures may hold the same scope
/// as a read/write target.
#[derive(Debug, Clone)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind (or rebind) `name` in *this* scope.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Read `name`, walking outward through enclosing scopes.
    pub fn get(&self, name: &str, line: usize) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(EzFlowError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Write to an existing binding, walking outward through enclosing scopes.
    pub fn assign(&mut self, name: &str, value: Value<'a>, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(EzFlowError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read `name` at exactly `distance` enclosing hops.  The resolver
    /// guarantees the binding exists there; a miss is still surfaced as a
    /// runtime error rather than a panic.
    pub fn get_at(&self, distance: usize, name: &str, line: usize) -> Result<Value<'a>> {
        if distance == 0 {
            return match self.values.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(EzFlowError::runtime(
                    line,
                    format!("Undefined variable '{}'.", name),
                )),
            };
        }

        let value = self
            .ancestor(distance, line)?
            .borrow()
            .values
            .get(name)
            .cloned();

        match value {
            Some(value) => Ok(value),
            None => Err(EzFlowError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            )),
        }
    }

    /// Write to the binding of `name` at exactly `distance` enclosing hops.
    pub fn assign_at(
        &mut self,
        distance: usize,
        name: &str,
        value: Value<'a>,
        line: usize,
    ) -> Result<()> {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
            return Ok(());
        }

        self.ancestor(distance, line)?
            .borrow_mut()
            .values
            .insert(name.to_string(), value);

        Ok(())
    }

    /// Walk `distance` parent links (distance ≥ 1) and return that scope.
    fn ancestor(&self, distance: usize, line: usize) -> Result<Rc<RefCell<Environment<'a>>>> {
        let mut env: Rc<RefCell<Environment<'a>>> = match &self.enclosing {
            Some(enclosing) => Rc::clone(enclosing),
            None => {
                return Err(EzFlowError::runtime(line, "Scope chain exhausted."));
            }
        };

        for _ in 1..distance {
            let next = match &env.borrow().enclosing {
                Some(enclosing) => Rc::clone(enclosing),
                None => {
                    return Err(EzFlowError::runtime(line, "Scope chain exhausted."));
                }
            };

            env = next;
        }

        Ok(env)
    }
}

impl<'a> Default for Environment<'a> {
    fn default() -> Self {
        Self::new()
    }
}
