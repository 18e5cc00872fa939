//! Tree‑walking evaluator.
//!
//! Statements produce a [`Flow`]: `Return` travels up through blocks, loops
//! and conditionals until the enclosing function call consumes it. Runtime
//! failures travel on the separate `Err` channel and are only caught by the
//! caller of [`Interpreter::interpret`].

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{self, Callable, Function};
use crate::class::{Class, Instance};
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::resolver::Locals;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Nested calls allowed before a call fails with `Stack overflow.`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 16_384;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,

    /// A `return` is unwinding towards the nearest call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,

    /// Resolution side table: scope distance per resolved expression.
    locals: Locals,

    output: Box<dyn Write>,

    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to stdout, with the native `clock` defined.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// An interpreter whose `print` statements write to `output`.
    pub fn with_output<W: Write + 'static>(output: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        let clock = callable::clock();
        debug!("Defining native function '{}'", clock.name);
        globals
            .borrow_mut()
            .define(clock.name, Value::Callable(Callable::Native(Rc::new(clock))));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output: Box::new(output),
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Change how deeply Lox calls may nest.
    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth;
    }

    /// Merge a resolution table produced by the resolver.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved expression(s)", locals.len());

        self.locals.extend(locals);
    }

    /// Names currently bound in the global scope.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.borrow().names().map(str::to_string).collect()
    }

    /// Executes a program in order, skipping slots the parser recovered from.
    /// Stops at the first runtime error.
    pub fn interpret(&mut self, statements: &[Option<Stmt>]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let result: IResult<()> = statements
            .iter()
            .flatten()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        // Whatever was printed before a failure still reaches the writer.
        self.output.flush()?;
        result?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Run `statements` inside `environment`, restoring the previous frame on
    /// every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, environment.into_ref());
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                return Ok(Flow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.define_class(name, superclass.as_ref(), methods)?,
        }

        Ok(Flow::Normal)
    }

    fn define_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<()> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => {
                    let line: usize = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };
                    return Err(RuntimeError::SuperclassNotClass { line });
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over an extra frame binding `super`.
        let enclosing: EnvRef = Rc::clone(&self.environment);
        let method_env: EnvRef = match &superclass {
            Some(superclass) => {
                let mut env = Environment::with_enclosing(Rc::clone(&enclosing));
                env.define(
                    "super",
                    Value::Callable(Callable::Class(Rc::clone(superclass))),
                );
                env.into_ref()
            }
            None => Rc::clone(&enclosing),
        };

        let methods: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|method| {
                let is_initializer: bool = method.name.lexeme == "init";
                let function =
                    Function::new(Rc::clone(method), Rc::clone(&method_env), is_initializer);

                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class::new(&name.lexeme, superclass, methods);

        enclosing
            .borrow_mut()
            .assign(name, Value::Callable(Callable::Class(Rc::new(class))))?;

        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::type_error(
                            operator,
                            "Operand must be a number.",
                        )),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => unreachable!("parser only builds '-' and '!' unary nodes"),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&depth) => {
                        Environment::assign_at(&self.environment, depth, name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let Value::Callable(callable) = callee else {
                    return Err(RuntimeError::NotCallable { line: paren.line });
                };

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                if values.len() != callable.arity() {
                    return Err(RuntimeError::Arity {
                        expected: callable.arity(),
                        got: values.len(),
                        line: paren.line,
                    });
                }

                self.call(&callable, values, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(RuntimeError::NotAnObject { line: name.line }),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::NoFields { line: name.line });
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// Invoke `callable` one level deeper. Past the limit the call fails with
    /// `StackOverflow`.
    fn call(&mut self, callable: &Callable, arguments: Vec<Value>, paren: &Token) -> IResult<Value> {
        if self.call_depth >= self.max_call_depth {
            debug!("Call depth limit {} reached", self.max_call_depth);
            return Err(RuntimeError::StackOverflow { line: paren.line });
        }

        self.call_depth += 1;
        let result: IResult<Value> = callable.call(self, arguments, paren);
        self.call_depth -= 1;

        result
    }

    /// Resolved expressions read from an exact frame; the rest are globals.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&depth) => Ok(Environment::get_at(
                &self.environment,
                depth,
                &name.lexeme,
            )),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super.method` looks the method up from the superclass captured when
    /// the class was defined, and binds it to the current `this`, which lives
    /// one frame inside the `super` frame.
    fn evaluate_super(&self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let Some(&depth) = self.locals.get(&id) else {
            return self.globals.borrow().get(keyword);
        };

        let Value::Callable(Callable::Class(superclass)) =
            Environment::get_at(&self.environment, depth, "super")
        else {
            unreachable!("'super' is only ever bound to a class");
        };

        let Value::Instance(instance) = Environment::get_at(&self.environment, depth - 1, "this")
        else {
            unreachable!("'this' is only ever bound to an instance");
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                found.bind(instance),
            )))),
            None => Err(RuntimeError::UndefinedProperty {
                name: method.lexeme.clone(),
                line: method.line,
            }),
        }
    }
}

/// Applies an arithmetic, comparison or equality operator.
fn binary(operator: &Token, left: Value, right: Value) -> IResult<Value> {
    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => {
                let mut joined: String = String::with_capacity(a.len() + b.len());
                joined.push_str(&a);
                joined.push_str(&b);
                Ok(Value::String(Rc::from(joined)))
            }
            _ => Err(RuntimeError::type_error(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },

        TokenType::MINUS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a - b))
        }

        TokenType::STAR => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a * b))
        }

        TokenType::SLASH => {
            let (a, b) = number_operands(operator, &left, &right)?;

            // Also catches -0.0.
            if b == 0.0 {
                debug!("Division by zero on line {}", operator.line);
                return Err(RuntimeError::DivideByZero {
                    line: operator.line,
                });
            }

            Ok(Value::Number(a / b))
        }

        TokenType::GREATER => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a > b))
        }

        TokenType::GREATER_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a >= b))
        }

        TokenType::LESS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a < b))
        }

        TokenType::LESS_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a <= b))
        }

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        _ => unreachable!("parser only builds binary nodes from binary operators"),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => {
            debug!(
                "'{}' applied to {} and {}",
                operator.lexeme,
                left.type_name(),
                right.type_name()
            );

            Err(RuntimeError::type_error(
                operator,
                "Operands must be numbers.",
            ))
        }
    }
}
