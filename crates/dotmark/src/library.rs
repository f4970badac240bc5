use crate::context::Context;
use crate::error::Error;
use crate::function::Function;
use linked_hash_map::LinkedHashMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibraryError {
    #[error("library '{library}' defines '{function}' more than once")]
    DuplicateFunction { library: String, function: String },
}

pub type LoadHook = Rc<dyn Fn(&mut Context) -> Result<(), Error>>;

/// A named set of functions, plus an optional hook run when the library becomes active.
#[derive(Clone)]
pub struct Library {
    pub name: String,
    functions: LinkedHashMap<String, Rc<Function>>,
    on_load: Option<LoadHook>,
}

impl Library {
    pub fn new(name: &str, functions: Vec<Function>) -> Result<Self, LibraryError> {
        let mut map = LinkedHashMap::new();
        for function in functions {
            if map.contains_key(&function.name) {
                return Err(LibraryError::DuplicateFunction {
                    library: name.to_string(),
                    function: function.name,
                });
            }
            map.insert(function.name.clone(), Rc::new(function));
        }
        Ok(Library {
            name: name.to_string(),
            functions: map,
            on_load: None,
        })
    }

    pub fn with_on_load<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context) -> Result<(), Error> + 'static,
    {
        self.on_load = Some(Rc::new(hook));
        self
    }

    /// Adds `function`, replacing any function with the same name.
    pub fn with_function(mut self, function: Function) -> Self {
        self.functions
            .insert(function.name.clone(), Rc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.functions.get(name).cloned()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Rc<Function>> {
        self.functions.values()
    }

    pub fn on_load(&self) -> Option<LoadHook> {
        self.on_load.clone()
    }
}

impl Debug for Library {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
