use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame. Closures and child frames hold these, so a
/// frame lives exactly as long as something still references it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical frame: its own bindings plus a link to the enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite in this frame only.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Walk outward through the chain.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            })
        }
    }

    /// Mutate the nearest frame that binds `name`. Assignment never creates a
    /// binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.clone(),
                line: name.line,
            })
        }
    }

    /// Names bound directly in this frame.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The frame `depth` links outward from `env`.
    ///
    /// # Panics
    ///
    /// If the chain is shorter than `depth`. The resolver computed `depth`
    /// against the same scope structure, so this is a resolver/interpreter
    /// mismatch rather than a user error.
    pub fn ancestor(env: &EnvRef, depth: usize) -> EnvRef {
        let mut current: EnvRef = Rc::clone(env);

        for hop in 0..depth {
            let next: EnvRef = match &current.borrow().enclosing {
                Some(enclosing) => Rc::clone(enclosing),
                None => panic!(
                    "resolved depth {depth} exceeds environment chain (ran out after {hop} hops)"
                ),
            };
            current = next;
        }

        current
    }

    /// Read `name` from exactly the frame `depth` links out.
    ///
    /// # Panics
    ///
    /// If that frame lacks `name`; see [`Environment::ancestor`].
    pub fn get_at(env: &EnvRef, depth: usize, name: &str) -> Value {
        let frame: EnvRef = Self::ancestor(env, depth);
        let value: Option<Value> = frame.borrow().values.get(name).cloned();

        match value {
            Some(value) => value,
            None => panic!("resolved binding '{name}' missing at depth {depth}"),
        }
    }

    /// Write `name` in exactly the frame `depth` links out.
    pub fn assign_at(env: &EnvRef, depth: usize, name: &Token, value: Value) {
        Self::ancestor(env, depth)
            .borrow_mut()
            .define(&name.lexeme, value);
    }
}
