use crate::function::{Function, Parameter};
use crate::value::{Value, ValueType};

fn boolean(name: &str) -> Parameter {
    Parameter::new(name, ValueType::Boolean)
}

/// Values compare by their text when both have one, structurally otherwise.
fn equal(a: &Value, b: &Value) -> bool {
    match (a.as_text(), b.as_text()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new(
            "equals",
            vec![
                Parameter::new("a", ValueType::Any),
                Parameter::new("b", ValueType::Any),
            ],
            |inv| {
                let (a, b) = (inv.take("a"), inv.take("b"));
                Ok(Value::Boolean(equal(&a, &b)))
            },
        ),
        Function::new("not", vec![boolean("x")], |inv| {
            Ok(Value::Boolean(!inv.boolean("x")?))
        }),
        Function::new("and", vec![boolean("a"), boolean("b")], |inv| {
            Ok(Value::Boolean(inv.boolean("a")? && inv.boolean("b")?))
        }),
        Function::new("or", vec![boolean("a"), boolean("b")], |inv| {
            let a = inv.boolean("a")?;
            let b = inv.boolean("b")?;
            Ok(Value::Boolean(a || b))
        }),
        Function::new(
            "isnone",
            vec![Parameter::new("x", ValueType::Any).optional()],
            |inv| Ok(Value::Boolean(inv.take("x").is_none())),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use crate::stdlib::tests::evaluate;
    use crate::value::Value;

    macro_rules! logical_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<logical_ $name>]() {
                let (source, expected): (&str, bool) = $value;
                assert_eq!(evaluate(source), Value::Boolean(expected));
            }
            }
        )*
        }
    }

    logical_tests! {
        equal_text: (".equals {abc} {abc}", true),
        equal_numbers: (".equals {.sum {1} {1}} {2}", true),
        different: (".equals {a} {b}", false),
        not: (".not {yes}", false),
        and: (".and {true} {.not {false}}", true),
        or: (".or {false} {no}", false),
        none: (".isnone {none}", true),
        some: (".isnone {x}", false),
    }
}
