use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::error::Result;
use crate::instance::Instance;
use crate::interpreter::{Flow, Interpreter};
use crate::parser::Stmt;
use crate::token::Token;
use crate::value::Value;

/// A script‑defined function value: the declaration (borrowed from the AST)
/// paired with the environment that was active at its declaration site.  That
/// pairing is what gives closures their capture semantics: the body reads and
/// writes the *shared* declaration‑site scopes on every later call, not a
/// snapshot of them.
#[derive(Clone)]
pub struct Function<'a> {
    name: &'a Token<'a>,
    params: &'a [&'a Token<'a>],
    body: &'a [Stmt<'a>],
    closure: Rc<RefCell<Environment<'a>>>,
    is_initializer: bool,
}

impl<'a> Function<'a> {
    pub fn new(
        name: &'a Token<'a>,
        params: &'a [&'a Token<'a>],
        body: &'a [Stmt<'a>],
        closure: Rc<RefCell<Environment<'a>>>,
        is_initializer: bool,
    ) -> Self {
        Function {
            name,
            params,
            body,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Produce a copy of this function whose closure layers `this` = the
    /// given instance atop the original closure.  Method access and
    /// super‑method lookup both route through here.
    pub fn bind(&self, instance: Instance<'a>) -> Function<'a> {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function {
            name: self.name,
            params: self.params,
            body: self.body,
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke the function.  A fresh environment enclosing the *closure*
    /// (never the caller's environment) receives the parameters in
    /// declaration order; the body runs until completion or a `return`
    /// signal.  Initializers yield the bound instance regardless of how the
    /// body exited.
    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: &[Value<'a>],
        output: &mut dyn Write,
    ) -> Result<Value<'a>> {
        debug!("Calling function '{}'", self.name.lexeme);

        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        for (param, value) in self.params.iter().zip(arguments.iter()) {
            environment.borrow_mut().define(param.lexeme, value.clone());
        }

        let flow = interpreter.execute_block(self.body, environment, output)?;

        if self.is_initializer {
            return self.closure.borrow().get_at(0, "this", self.name.line);
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    /// Identity comparison (two names for the same function value).
    pub fn equals(&self, other: &Function<'a>) -> bool {
        std::ptr::eq(self.body, other.body) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl<'a> fmt::Display for Function<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

// Manual impl: the closure chain can reach back to this very value, so a
// derived Debug would recurse.
impl<'a> fmt::Debug for Function<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}
