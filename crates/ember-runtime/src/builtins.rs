//! Environment registration and generic property lookup
//!
//! The environment is the runtime's function table: callables registered
//! here are visible to embedded programs by name. Native library bundles
//! (HTTP client, GUI toolkit, embedded web server glue) register their own
//! tables into the same environment at startup through this seam.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::int64::{s64_new, u64_new};
use crate::value::EmValue;

/// Name-to-value bindings visible to embedded programs.
#[derive(Default)]
pub struct Environment {
    bindings: HashMap<Rc<str>, EmValue>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn define(&mut self, name: impl Into<Rc<str>>, value: EmValue) {
        self.bindings.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&EmValue> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Install the boxed integer constructors.
pub fn register_int_lib(env: &mut Environment) {
    env.define("int/s64", EmValue::Function(s64_new));
    env.define("int/u64", EmValue::Function(u64_new));
    debug!("registered boxed integer constructors");
}

/// Generic per-value property lookup.
///
/// A boxed value asked for a symbol-shaped key answers with its operator
/// method, if any. A non-keyword key, a non-abstract receiver, or an unknown
/// symbol all yield "not found" rather than an error.
pub fn get_property(value: &EmValue, key: &EmValue) -> Option<EmValue> {
    let EmValue::Keyword(name) = key else {
        return None;
    };
    let ty = value.abstract_type()?;
    (ty.get_method)(name).map(EmValue::Function)
}
