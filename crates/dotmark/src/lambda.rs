use crate::context::Context;
use crate::error::Error;
use crate::expansion::{evaluate, expand};
use crate::function::{Function, Parameter};
use crate::library::Library;
use crate::value::{Value, ValueType};
use dotmark_parser::parse_expression;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADER: Regex = Regex::new(
        r"\A[ \t]*((?:[A-Za-z_][A-Za-z0-9_]*\??[ \t]+)*[A-Za-z_][A-Za-z0-9_]*\??)[ \t]*:(?:[ \t]+|\r?\n|\z)"
    )
    .expect("invalid regex expression");
}

/// Name of the scope library exposing the arguments of a running lambda.
pub const PARAMETERS_LIBRARY: &str = "__lambda-parameters__";

#[derive(Clone, Debug, PartialEq)]
pub struct LambdaParameter {
    pub name: String,
    pub optional: bool,
}

/// A parametrized block of code. Arguments are exposed to the body as zero-arity functions.
#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<LambdaParameter>,
    pub body: String,
}

impl Lambda {
    /// Reads an optional parameter header (`x y?:`) at the start of `text`. The rest of the
    /// text, on the same line or below, is the body.
    pub fn parse(text: &str) -> Self {
        match HEADER.captures(text) {
            Some(captures) => {
                let parameters = captures[1]
                    .split_whitespace()
                    .map(|name| match name.strip_suffix('?') {
                        Some(name) => LambdaParameter {
                            name: name.to_string(),
                            optional: true,
                        },
                        None => LambdaParameter {
                            name: name.to_string(),
                            optional: false,
                        },
                    })
                    .collect();
                let end = captures.get(0).map(|m| m.end()).unwrap_or_default();
                Lambda {
                    parameters,
                    body: text[end..].to_string(),
                }
            }
            None => Lambda {
                parameters: vec![],
                body: text.to_string(),
            },
        }
    }

    fn mandatory_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.optional).count()
    }

    /// Binds `arguments` to the parameter names, filling missing optional ones with
    /// [Value::None]. Lambdas without explicit parameters name their arguments `1`, `2`, ...
    fn bind(&self, arguments: Vec<Value>) -> Result<Vec<(String, Value)>, Error> {
        if self.parameters.is_empty() {
            return Ok(arguments
                .into_iter()
                .enumerate()
                .map(|(i, value)| ((i + 1).to_string(), value))
                .collect());
        }

        let range = self.mandatory_count()..=self.parameters.len();
        if !range.contains(&arguments.len()) {
            return Err(Error::invalid_call(
                "lambda",
                format!(
                    "expected {} to {} arguments, found {}",
                    range.start(),
                    range.end(),
                    arguments.len()
                ),
            ));
        }

        let mut arguments = arguments.into_iter();
        Ok(self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), arguments.next().unwrap_or(Value::None)))
            .collect())
    }

    /// Runs the body in a fork of `ctx` and converts the result to `expected`. Markdown bodies
    /// are parsed and fully expanded inside the fork.
    pub fn invoke(
        &self,
        ctx: &Context,
        arguments: Vec<Value>,
        expected: ValueType,
    ) -> Result<Value, Error> {
        let bound = self.bind(arguments)?;
        let mut fork = ctx.fork()?;

        let functions = bound
            .into_iter()
            .map(|(name, value)| {
                Function::new(&name, Vec::<Parameter>::new(), move |_| Ok(value.clone()))
            })
            .collect();
        fork.push_scope(Library::new(PARAMETERS_LIBRARY, functions)?);

        match expected {
            ValueType::Markdown | ValueType::InlineMarkdown => {
                let inline = expected == ValueType::InlineMarkdown;
                let source = if inline {
                    self.body.trim()
                } else {
                    self.body.as_str()
                };
                let mut nodes = fork.parse_markdown(source, inline)?;
                expand(&mut nodes, &mut fork)?;
                Ok(if inline {
                    Value::InlineMarkdown(nodes)
                } else {
                    Value::Markdown(nodes)
                })
            }
            _ => {
                let expression = parse_expression(self.body.trim())?;
                let value = evaluate(&expression, &mut fork)?;
                value.convert(expected, &mut fork)
            }
        }
    }
}
