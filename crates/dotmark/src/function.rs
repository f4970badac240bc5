use crate::context::{Context, DocumentType};
use crate::error::Error;
use crate::lambda::Lambda;
use crate::value::{Value, ValueType};
use dotmark_parser::ast::Node;
use linked_hash_map::LinkedHashMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Supplies a parameter's value from the context. Injected parameters can't be passed by
/// callers.
pub type Injector = fn(&Context) -> Value;

pub type FunctionBody = Rc<dyn Fn(&mut Invocation) -> Result<Value, Error>>;

#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub ty: ValueType,
    pub default: Option<Value>,
    /// Optional parameters without a default are bound to [Value::None].
    pub optional: bool,
    pub injector: Option<Injector>,
    /// Receives the body argument of a block call.
    pub body_likely: bool,
}

impl Parameter {
    pub fn new(name: &str, ty: ValueType) -> Self {
        Parameter {
            name: name.to_string(),
            ty,
            default: None,
            optional: false,
            injector: None,
            body_likely: false,
        }
    }

    pub fn injected(name: &str, injector: Injector) -> Self {
        Parameter {
            injector: Some(injector),
            ..Parameter::new(name, ValueType::Any)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.optional = true;
        self
    }

    pub fn body(mut self) -> Self {
        self.body_likely = true;
        self
    }

    pub fn is_injected(&self) -> bool {
        self.injector.is_some()
    }
}

#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Document types the function is available in. `None` means every type.
    pub document_types: Option<Vec<DocumentType>>,
    body: FunctionBody,
}

impl Function {
    pub fn new<F>(name: &str, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(&mut Invocation) -> Result<Value, Error> + 'static,
    {
        Function {
            name: name.to_string(),
            parameters,
            document_types: None,
            body: Rc::new(body),
        }
    }

    pub fn only_in(mut self, types: &[DocumentType]) -> Self {
        self.document_types = Some(types.to_vec());
        self
    }

    pub fn invoke(&self, invocation: &mut Invocation) -> Result<Value, Error> {
        (self.body)(invocation)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("document_types", &self.document_types)
            .finish()
    }
}

/// Where the result of a call ends up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    /// A call standing on its own line.
    Block,
    /// A call inside a paragraph.
    Inline,
    /// A call nested in another call's argument.
    Value,
}

impl OutputTarget {
    /// The type a lambda run on behalf of this call should produce.
    pub fn expected_type(&self) -> ValueType {
        match self {
            OutputTarget::Block => ValueType::Markdown,
            OutputTarget::Inline => ValueType::InlineMarkdown,
            OutputTarget::Value => ValueType::Any,
        }
    }
}

/// A single execution of a function: the bound arguments, keyed by parameter name, and mutable
/// access to the context.
pub struct Invocation<'a> {
    pub ctx: &'a mut Context,
    pub function: String,
    pub output: OutputTarget,
    pub arguments: LinkedHashMap<String, Value>,
}

impl<'a> Invocation<'a> {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn take(&mut self, name: &str) -> Value {
        self.arguments.remove(name).unwrap_or(Value::None)
    }

    fn mismatch(&self, name: &str, expected: &str, found: &Value) -> Error {
        Error::invalid_call(
            &self.function,
            format!(
                "expected {} for '{}', found {}",
                expected,
                name,
                found.type_name()
            ),
        )
    }

    pub fn string(&mut self, name: &str) -> Result<String, Error> {
        let value = self.take(name);
        value
            .as_text()
            .ok_or_else(|| self.mismatch(name, "string", &value))
    }

    pub fn optional_string(&mut self, name: &str) -> Result<Option<String>, Error> {
        match self.take(name) {
            Value::None => Ok(None),
            value => value
                .as_text()
                .map(Some)
                .ok_or_else(|| self.mismatch(name, "string", &value)),
        }
    }

    pub fn number(&mut self, name: &str) -> Result<f64, Error> {
        match self.take(name) {
            Value::Number(n) => Ok(n),
            value => Err(self.mismatch(name, "number", &value)),
        }
    }

    pub fn optional_number(&mut self, name: &str) -> Result<Option<f64>, Error> {
        match self.take(name) {
            Value::None => Ok(None),
            Value::Number(n) => Ok(Some(n)),
            value => Err(self.mismatch(name, "number", &value)),
        }
    }

    pub fn integer(&mut self, name: &str) -> Result<i64, Error> {
        self.number(name).map(|n| n as i64)
    }

    pub fn boolean(&mut self, name: &str) -> Result<bool, Error> {
        match self.take(name) {
            Value::Boolean(b) => Ok(b),
            value => Err(self.mismatch(name, "boolean", &value)),
        }
    }

    pub fn markdown(&mut self, name: &str) -> Result<Vec<Node>, Error> {
        match self.take(name) {
            Value::Markdown(nodes) | Value::InlineMarkdown(nodes) => Ok(nodes),
            value => Err(self.mismatch(name, "markdown", &value)),
        }
    }

    pub fn optional_markdown(&mut self, name: &str) -> Result<Option<Vec<Node>>, Error> {
        match self.take(name) {
            Value::None => Ok(None),
            Value::Markdown(nodes) | Value::InlineMarkdown(nodes) => Ok(Some(nodes)),
            value => Err(self.mismatch(name, "markdown", &value)),
        }
    }

    pub fn lambda(&mut self, name: &str) -> Result<Lambda, Error> {
        match self.take(name) {
            Value::Lambda(lambda) => Ok(lambda),
            value => Err(self.mismatch(name, "lambda", &value)),
        }
    }

    pub fn iterable(&mut self, name: &str) -> Result<Vec<Value>, Error> {
        match self.take(name) {
            Value::Iterable(items) => Ok(items),
            value => Err(self.mismatch(name, "iterable", &value)),
        }
    }

    pub fn dictionary(&mut self, name: &str) -> Result<LinkedHashMap<String, Value>, Error> {
        match self.take(name) {
            Value::Dictionary(entries) => Ok(entries),
            value => Err(self.mismatch(name, "dictionary", &value)),
        }
    }

    /// Variant name of an enumerated argument, if one was given.
    pub fn enum_value(&mut self, name: &str) -> Result<Option<String>, Error> {
        match self.take(name) {
            Value::None => Ok(None),
            Value::Enum(variant) => Ok(Some(variant)),
            value => Err(self.mismatch(name, "enum", &value)),
        }
    }

    /// Runs `lambda` with the result type this call's output position expects.
    pub fn call_lambda(&self, lambda: &Lambda, arguments: Vec<Value>) -> Result<Value, Error> {
        lambda.invoke(&*self.ctx, arguments, self.output.expected_type())
    }
}
