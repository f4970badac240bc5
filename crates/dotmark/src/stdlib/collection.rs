use crate::function::{Function, Parameter};
use crate::value::{Value, ValueType};

fn iterable() -> Parameter {
    Parameter::new("iterable", ValueType::Iterable)
}

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new(
            "getat",
            vec![iterable(), Parameter::new("index", ValueType::Integer)],
            |inv| {
                let mut items = inv.iterable("iterable")?;
                let index = inv.integer("index")?;
                // Indices start at 1.
                Ok(match usize::try_from(index - 1) {
                    Ok(i) if i < items.len() => items.swap_remove(i),
                    _ => Value::None,
                })
            },
        ),
        Function::new("size", vec![iterable()], |inv| {
            Ok(Value::Number(inv.iterable("iterable")?.len() as f64))
        }),
        Function::new("first", vec![iterable()], |inv| {
            Ok(inv
                .iterable("iterable")?
                .into_iter()
                .next()
                .unwrap_or(Value::None))
        }),
        Function::new("last", vec![iterable()], |inv| {
            Ok(inv.iterable("iterable")?.pop().unwrap_or(Value::None))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use crate::stdlib::tests::evaluate;
    use crate::value::Value;

    #[test]
    fn access() {
        assert_eq!(evaluate(".getat {.range {5} {9}} {2}"), Value::Number(6.0));
        assert_eq!(evaluate(".getat {.range {5} {9}} {0}"), Value::None);
        assert_eq!(evaluate(".getat {.range {5} {9}} {6}"), Value::None);
        assert_eq!(evaluate(".size {.range {1} {4}}"), Value::Number(4.0));
        assert_eq!(evaluate(".first {.range {3} {4}}"), Value::Number(3.0));
        assert_eq!(evaluate(".last {.range {3} {4}}"), Value::Number(4.0));
        assert_eq!(evaluate(".last {.range {4} {3}}"), Value::None);
    }
}
