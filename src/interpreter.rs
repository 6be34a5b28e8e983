//! Tree‑walking evaluator.
//!
//! Executes the parsed statement tree after resolution.  The interpreter owns
//! the persistent global scope (pre‑seeded with native functions) and a
//! "current environment" handle that moves as blocks, functions and methods
//! are entered, and is restored on every exit, including runtime‑error
//! unwinds.
//!
//! Statement execution returns an explicit [`Flow`] value: `return` is a
//! control signal checked and propagated by each statement form, intercepted
//! at the nearest function‑call boundary.  It is *not* modeled as an error.
//!
//! Variable, `this` and `super` references consult the resolver's recorded
//! distances (`locals`, keyed by node id): a recorded distance walks exactly
//! that many enclosing links; an absent record means the reference is global.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::callable::Function;
use crate::class::Class;
use crate::environment::Environment;
use crate::error::{EzFlowError, Result};
use crate::instance::Instance;
use crate::parser::{Expr, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Outcome of executing one statement: either fall through to the next
/// statement, or unwind to the nearest enclosing call with a return value.
#[derive(Debug)]
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,

    /// Resolver‑recorded binding distances, keyed by expression node id.
    locals: HashMap<usize, usize>,
}

impl<'a> Interpreter<'a> {
    /// Creates a new Interpreter and defines native functions such as `clock`.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(timestamp))
                },
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
        }
    }

    /// Record a resolved local: the reference with node id `id` binds at
    /// exactly `depth` enclosing‑environment hops.  Called by the resolver.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        debug!("Noting local: id={} depth={}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the remainder of the statement list.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>], output: &mut dyn Write) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            // Top-level `return` is rejected at resolve time, so the flow
            // value here is always Normal.
            self.execute(stmt, output)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &'a Stmt<'a>, output: &mut dyn Write) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                let _ = self.evaluate(expr, output)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr, output)?;

                writeln!(output, "{}", value)?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                debug!("Defining variable '{}'", name.lexeme);

                let value = match initializer {
                    Some(expr) => self.evaluate(expr, output)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment, output)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition, output)?) {
                    self.execute(then_branch, output)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt, output)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition, output)?) {
                    match self.execute(body, output)? {
                        Flow::Normal => {}

                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function { name, params, body } => {
                debug!("Defining function '{}'", name.lexeme);

                // The captured environment is the declaration site's, not
                // the caller's.
                let function = Function::new(
                    name,
                    params.as_slice(),
                    body.as_slice(),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, output)?,
                    None => Value::Nil,
                };

                debug!("Return signal carrying: {}", value);

                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods, output),
        }
    }

    /// Executes a statement list in `environment`, restoring the previous
    /// environment afterwards, also when a runtime error unwinds.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
        output: &mut dyn Write,
    ) -> Result<Flow<'a>> {
        let previous = Rc::clone(&self.environment);
        self.environment = environment;

        let mut outcome = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt, output) {
                Ok(Flow::Normal) => {}

                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;

        outcome
    }

    /// Class declaration: validate the superclass, build the method table
    /// with the defining environment (plus a `super` scope when inheriting),
    /// and bind the finished class to its name.
    fn execute_class(
        &mut self,
        name: &'a Token<'a>,
        superclass: Option<&'a Expr<'a>>,
        methods: &'a [Stmt<'a>],
        output: &mut dyn Write,
    ) -> Result<Flow<'a>> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass_value: Option<Class<'a>> = match superclass {
            Some(expr) => match self.evaluate(expr, output)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(EzFlowError::runtime(line, "Superclass must be a class."));
                }
            },

            None => None,
        };

        self.environment.borrow_mut().define(name.lexeme, Value::Nil);

        // Methods close over the class's defining environment; inheriting
        // classes get one extra scope injecting `super`.
        let defining_env = match &superclass_value {
            Some(superclass) => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                env.borrow_mut()
                    .define("super", Value::Class(superclass.clone()));

                env
            }

            None => Rc::clone(&self.environment),
        };

        let mut method_table: HashMap<String, Rc<Function<'a>>> = HashMap::new();

        for method in methods {
            if let Stmt::Function {
                name: method_name,
                params,
                body,
            } = method
            {
                let function = Function::new(
                    method_name,
                    params.as_slice(),
                    body.as_slice(),
                    Rc::clone(&defining_env),
                    method_name.lexeme == "init",
                );

                method_table.insert(method_name.lexeme.to_string(), Rc::new(function));
            }
        }

        let class = Class::new(name.lexeme, superclass_value, method_table);

        self.environment
            .borrow_mut()
            .assign(name.lexeme, Value::Class(class), name.line)?;

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &'a Expr<'a>, output: &mut dyn Write) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner, output),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right, output),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right, output),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left, output)?;

                // Short-circuit: the operand value itself is the result.
                if operator.token_type == TokenType::OR {
                    if is_truthy(&left_val) {
                        return Ok(left_val);
                    }
                } else if !is_truthy(&left_val) {
                    return Ok(left_val);
                }

                self.evaluate(right, output)
            }

            Expr::Variable { name, id } => self.look_up_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value = self.evaluate(value, output)?;

                match self.locals.get(id) {
                    Some(distance) => self.environment.borrow_mut().assign_at(
                        *distance,
                        name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee, output)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg, output)?);
                }

                self.invoke_callable(&callee_val, paren, &arg_values, output)
            }

            Expr::Get { object, name } => match self.evaluate(object, output)? {
                Value::Instance(instance) => instance.get(name.lexeme).ok_or_else(|| {
                    EzFlowError::runtime(
                        name.line,
                        format!("Undefined property '{}'.", name.lexeme),
                    )
                }),

                _ => Err(EzFlowError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object, output)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value, output)?;

                    instance.set(name.lexeme, value.clone());

                    Ok(value)
                }

                _ => Err(EzFlowError::runtime(
                    name.line,
                    "Only instances have fields.",
                )),
            },

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),

            Expr::Super {
                keyword,
                method,
                id,
            } => self.evaluate_super(keyword, method, *id),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(
        &mut self,
        op: &'a Token<'a>,
        expr: &'a Expr<'a>,
        output: &mut dyn Write,
    ) -> Result<Value<'a>> {
        let right_val = self.evaluate(expr, output)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(EzFlowError::runtime(op.line, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_val))),

            _ => Err(EzFlowError::runtime(op.line, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression.  `+` accepts two numbers or two
    /// strings; the other arithmetic and ordering operators require numbers.
    /// Division follows IEEE-754, so dividing by zero yields inf/nan.
    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        op: &'a Token<'a>,
        right: &'a Expr<'a>,
        output: &mut dyn Write,
    ) -> Result<Value<'a>> {
        let left_val = self.evaluate(left, output)?;
        let right_val = self.evaluate(right, output)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(EzFlowError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(EzFlowError::runtime(op.line, "Operands must be numbers.")),
            },

            _ => Err(EzFlowError::runtime(op.line, "Invalid binary operator.")),
        }
    }

    /// Distance-guided lookup: a recorded distance walks exactly that many
    /// enclosing links; an absent record falls back to the global scope.
    fn look_up_variable(&self, name: &'a Token<'a>, id: usize) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(distance) => self
                .environment
                .borrow()
                .get_at(*distance, name.lexeme, name.line),

            None => self.globals.borrow().get(name.lexeme, name.line),
        }
    }

    /// `super.method`: the superclass lives at the recorded distance, the
    /// receiving instance one scope nearer.  Lookup starts at the superclass,
    /// skipping overrides in the current class.
    fn evaluate_super(
        &mut self,
        keyword: &'a Token<'a>,
        method: &'a Token<'a>,
        id: usize,
    ) -> Result<Value<'a>> {
        let distance = match self.locals.get(&id) {
            Some(distance) => *distance,

            None => {
                return Err(EzFlowError::runtime(
                    keyword.line,
                    "Cannot use 'super' outside of a class.",
                ));
            }
        };

        let superclass = match self
            .environment
            .borrow()
            .get_at(distance, "super", keyword.line)?
        {
            Value::Class(class) => class,

            _ => {
                return Err(EzFlowError::runtime(
                    keyword.line,
                    "Superclass must be a class.",
                ));
            }
        };

        let object = match self
            .environment
            .borrow()
            .get_at(distance - 1, "this", keyword.line)?
        {
            Value::Instance(instance) => instance,

            _ => {
                return Err(EzFlowError::runtime(
                    keyword.line,
                    "Cannot use 'super' outside of a method.",
                ));
            }
        };

        match superclass.find_method(method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

            None => Err(EzFlowError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Invokes a callable: native function, script function, or class
    /// constructor.  Arity must match exactly.
    fn invoke_callable(
        &mut self,
        callee_val: &Value<'a>,
        paren: &'a Token<'a>,
        arg_values: &[Value<'a>],
        output: &mut dyn Write,
    ) -> Result<Value<'a>> {
        match callee_val {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                if arg_values.len() != *arity {
                    return Err(EzFlowError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            arity,
                            arg_values.len()
                        ),
                    ));
                }

                func(arg_values).map_err(|msg| EzFlowError::runtime(paren.line, msg))
            }

            Value::Function(function) => {
                if arg_values.len() != function.arity() {
                    return Err(EzFlowError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            arg_values.len()
                        ),
                    ));
                }

                function.call(self, arg_values, output)
            }

            Value::Class(class) => {
                if arg_values.len() != class.arity() {
                    return Err(EzFlowError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            class.arity(),
                            arg_values.len()
                        ),
                    ));
                }

                debug!("Instantiating class '{}'", class.name());

                let instance = Instance::new(class.clone());

                // The initializer's own return value is discarded; calling a
                // class always yields the new instance.
                if let Some(init) = class.find_method("init") {
                    init.bind(instance.clone())
                        .call(self, arg_values, output)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(EzFlowError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// `nil` and `false` are falsy; every other value (including `0` and the
/// empty string) is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Value equality for primitives; identity for functions, classes and
/// instances.  `nil` equals only `nil`.
fn is_equal<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        (Value::Function(a), Value::Function(b)) => a.equals(b),
        (Value::Class(a), Value::Class(b)) => a.equals(b),
        (Value::Instance(a), Value::Instance(b)) => a.equals(b),
        (
            Value::NativeFunction { name: a, .. },
            Value::NativeFunction { name: b, .. },
        ) => a == b,
        _ => false,
    }
}
