//! Control flow, user-defined functions and variables. Bodies are lambdas run in a fork of the
//! calling context.
use crate::error::Error;
use crate::function::{Function, Parameter};
use crate::value::{Value, ValueType};
use std::cell::RefCell;
use std::rc::Rc;

fn body() -> Parameter {
    Parameter::new("body", ValueType::Lambda).body()
}

/// Checks that `name` can be called as `.name`.
fn function_name(function: &str, name: String) -> Result<String, Error> {
    let name = name.trim().to_string();
    let valid = name.chars().next().map_or(false, |c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(Error::invalid_call(
            function,
            format!("'{}' isn't a valid function name", name),
        ))
    }
}

fn conditional(name: &str, expected: bool) -> Function {
    Function::new(
        name,
        vec![Parameter::new("condition", ValueType::Boolean), body()],
        move |inv| {
            if inv.boolean("condition")? != expected {
                return Ok(Value::Void);
            }
            let body = inv.lambda("body")?;
            inv.call_lambda(&body, vec![])
        },
    )
}

pub(super) fn functions() -> Vec<Function> {
    vec![
        conditional("if", true),
        conditional("ifnot", false),
        Function::new(
            "foreach",
            vec![Parameter::new("iterable", ValueType::Iterable), body()],
            |inv| {
                let items = inv.iterable("iterable")?;
                let body = inv.lambda("body")?;
                items
                    .into_iter()
                    .map(|item| inv.call_lambda(&body, vec![item]))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Iterable)
            },
        ),
        Function::new(
            "repeat",
            vec![Parameter::new("times", ValueType::Integer), body()],
            |inv| {
                let times = inv.integer("times")?;
                let body = inv.lambda("body")?;
                (1..=times)
                    .map(|i| inv.call_lambda(&body, vec![Value::Number(i as f64)]))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Iterable)
            },
        ),
        Function::new(
            "function",
            vec![Parameter::new("name", ValueType::String), body()],
            |inv| {
                let name = function_name("function", inv.string("name")?)?;
                let lambda = inv.lambda("body")?;
                let parameters = lambda
                    .parameters
                    .iter()
                    .map(|p| match p.optional {
                        true => Parameter::new(&p.name, ValueType::Any).optional(),
                        false => Parameter::new(&p.name, ValueType::Any),
                    })
                    .collect();
                let names: Vec<String> = lambda.parameters.iter().map(|p| p.name.clone()).collect();
                inv.ctx.define_function(Function::new(&name, parameters, move |inv| {
                    let arguments = names.iter().map(|name| inv.take(name)).collect();
                    inv.call_lambda(&lambda, arguments)
                }));
                Ok(Value::Void)
            },
        ),
        Function::new(
            "var",
            vec![
                Parameter::new("name", ValueType::String),
                Parameter::new("value", ValueType::Any).optional(),
            ],
            |inv| {
                let name = function_name("var", inv.string("name")?)?;
                let cell = Rc::new(RefCell::new(inv.take("value")));
                let variable = Function::new(
                    &name,
                    vec![Parameter::new("value", ValueType::Any).optional()],
                    move |inv| match inv.take("value") {
                        Value::None => Ok(cell.borrow().clone()),
                        value => {
                            *cell.borrow_mut() = value;
                            Ok(Value::Void)
                        }
                    },
                );
                inv.ctx.define_function(variable);
                Ok(Value::Void)
            },
        ),
        Function::new(
            "let",
            vec![Parameter::new("value", ValueType::Any), body()],
            |inv| {
                let value = inv.take("value");
                let body = inv.lambda("body")?;
                inv.call_lambda(&body, vec![value])
            },
        ),
        Function::new(
            "uselib",
            vec![Parameter::new("name", ValueType::String)],
            |inv| {
                let name = inv.string("name")?.trim().to_string();
                if inv.ctx.load_library(&name)?.is_some()
                    || inv.ctx.active_libraries().contains(&name)
                {
                    Ok(Value::Void)
                } else {
                    Err(Error::NoSuchElement(format!("library '{}'", name)))
                }
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::stdlib::tests::{render, try_compile};

    #[test]
    fn conditionals() {
        assert_eq!(render(".if {.iseven {4}}\n    Even!\n"), "Even!");
        assert_eq!(render(".if {.iseven {3}}\n    Even!\n"), "");
        assert_eq!(render(".ifnot {no}\n    Odd!\n"), "Odd!");
    }

    #[test]
    fn loops() {
        let out = render(".foreach {.range {1} {3}}\n    n:\n    Item .n\n");
        assert_eq!(
            out.split_whitespace().collect::<Vec<_>>(),
            vec!["Item", "1", "Item", "2", "Item", "3"]
        );

        let out = render(".repeat {2}\n    Round .1\n");
        assert_eq!(
            out.split_whitespace().collect::<Vec<_>>(),
            vec!["Round", "1", "Round", "2"]
        );
    }

    #[test]
    fn user_functions() {
        let out = render(
            ".function {double}\n    x:\n    .multiply {.x} by:{2}\n\n.double {21}\n",
        );
        assert_eq!(out, "42");

        let out = render(
            ".function {greet}\n    who greeting?:\n    Dear .who, .greeting\n\n.greet {Ada} greeting:{Hi}\n",
        );
        assert_eq!(out, "Dear Ada, Hi");
    }

    #[test]
    fn invalid_function_names() {
        assert!(matches!(
            try_compile(".function {two words}\n    body\n"),
            Err(Error::InvalidCall { .. })
        ));
    }

    #[test]
    fn variables() {
        let out = render(".var {count} {1}\n\n.count {.sum {.count} {1}}\n\n.count\n");
        assert_eq!(out, "2");
    }

    #[test]
    fn let_binding() {
        assert_eq!(render(".let {.sum {2} {3}}\n    x: Result: .x\n"), "Result: 5");
    }

    #[test]
    fn libraries() {
        assert!(matches!(
            try_compile(".forkdepth\n"),
            Err(Error::UnresolvedReference(_))
        ));
        assert_eq!(render(".uselib {debug}\n\n.forkdepth\n"), "0");
        assert!(matches!(
            try_compile(".uselib {nothing}\n"),
            Err(Error::NoSuchElement(_))
        ));
    }
}
