//! Static resolver pass.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, forward‑read in initializer, invalid
//!    `return`/`this`/`super`, self‑inheriting class).
//! 3. Tell the interpreter, for *each* variable occurrence, whether it’s a local
//!    (and at what depth) or a global—so the interpreter never falls back to
//!    dynamic lookup that would see a later shadowing local.
//!
//! Diagnostics never halt the walk: every error is collected independently so
//! one pass surfaces all of them.  The driver suppresses execution when any
//! diagnostic is present.

use crate::error::EzFlowError;
use crate::interpreter::Interpreter;
use crate::parser::{Expr, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body are we inside?  Used to validate `this` / `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'a, 'interp> {
    interpreter: &'interp mut Interpreter<'a>,
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    diagnostics: Vec<EzFlowError>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'interp> Resolver<'a, 'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter<'a>) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            scopes: Vec::new(),
            diagnostics: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.  Never fails; inspect
    /// [`Resolver::diagnostics`] afterwards.
    pub fn resolve(&mut self, statements: &[Stmt<'a>]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    /// The diagnostics collected so far.
    pub fn diagnostics(&self) -> &[EzFlowError] {
        &self.diagnostics
    }

    /// Consume the resolver, yielding its diagnostics.
    pub fn into_diagnostics(self) -> Vec<EzFlowError> {
        self.diagnostics
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define, so the initializer
                // sees the name as not-yet-ready.
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // A function's name is visible *inside* its own body
                // (recursion), so define eagerly.
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.diagnostics.push(EzFlowError::resolve(
                        keyword.line,
                        "'return' used outside of function",
                    ));
                }

                if let Some(expr) = value {
                    // An initializer implicitly returns the instance; a bare
                    // `return` is allowed, a value is not.
                    if self.current_function == FunctionType::Initializer {
                        self.diagnostics.push(EzFlowError::resolve(
                            keyword.line,
                            "Cannot return a value from an initializer",
                        ));
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(sup_expr) = superclass {
                    if let Expr::Variable { name: sup_name, .. } = sup_expr {
                        if sup_name.lexeme == name.lexeme {
                            self.diagnostics.push(EzFlowError::resolve(
                                sup_name.line,
                                "A class can't inherit from itself",
                            ));
                        }
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(sup_expr);

                    // Methods of a subclass resolve `super` one scope outside
                    // the `this` scope.
                    self.begin_scope();
                    self.define_name("super");
                }

                self.begin_scope();
                self.define_name("this");

                for method in methods {
                    if let Stmt::Function {
                        name: method_name,
                        params,
                        body,
                    } = method
                    {
                        let declaration = if method_name.lexeme == "init" {
                            FunctionType::Initializer
                        } else {
                            FunctionType::Method
                        };

                        self.resolve_function(params, body, declaration);
                    }
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { name, id } => {
                self.resolve_local(*id, name);
            }

            Expr::Assign { name, value, id } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { keyword, id } => {
                if self.current_class == ClassType::None {
                    self.diagnostics.push(EzFlowError::resolve(
                        keyword.line,
                        "Cannot use 'this' outside of a class",
                    ));
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { keyword, id, .. } => match self.current_class {
                ClassType::None => {
                    self.diagnostics.push(EzFlowError::resolve(
                        keyword.line,
                        "Cannot use 'super' outside of a class",
                    ));
                }

                ClassType::Class => {
                    self.diagnostics.push(EzFlowError::resolve(
                        keyword.line,
                        "Cannot use 'super' in a class with no superclass",
                    ));
                }

                ClassType::Subclass => {
                    self.resolve_local(*id, keyword);
                }
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(
        &mut self,
        params: &[&'a Token<'a>],
        body: &[Stmt<'a>],
        declaration: FunctionType,
    ) {
        let enclosing = self.current_function;
        self.current_function = declaration;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        for stmt in body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token<'a>) {
        let duplicate = match self.scopes.last() {
            Some(scope) => scope.contains_key(name.lexeme),
            None => return, // global scope: redeclaration is permitted
        };

        if duplicate {
            self.diagnostics.push(EzFlowError::resolve(
                name.line,
                "Variable already declared in this scope",
            ));
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, false);
        }
    }

    fn define(&mut self, name: &Token<'a>) {
        self.define_name(name.lexeme);
    }

    /// Mark `name` as ready in the innermost scope (also used for the
    /// implicit `this` / `super` bindings).
    fn define_name(&mut self, name: &'a str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either:
    ///  - a local at depth `d`, or
    ///  - a global if not found in *any* scope.
    ///
    /// A binding still marked not‑ready is its own in‑flight declaration: its
    /// scope has not begun yet, so the lookup skips it and keeps walking
    /// outward.  That is what lets `var a = a + 1;` in a block read the
    /// enclosing `a`.
    fn resolve_local(&mut self, id: usize, name: &Token<'a>) {
        // 1. check innermost → outermost
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            match scope.get(name.lexeme) {
                Some(true) => {
                    debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                    self.interpreter.note_local(id, depth);
                    return;
                }

                Some(false) => {
                    debug!(
                        "'{}' is mid-declaration at depth {}, looking outward",
                        name.lexeme, depth
                    );
                }

                None => {}
            }
        }

        // 2. not found in any local scope ⇒ global
        debug!("Resolved '{}' as global", name.lexeme);
    }
}
