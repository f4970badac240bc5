use crate::error::Error;
use crate::function::{Function, Invocation, Parameter};
use crate::value::{Value, ValueType};

fn number(name: &str) -> Parameter {
    Parameter::new(name, ValueType::Number)
}

/// A function of two numbers.
fn binary(name: &str, a: &str, b: &str, op: fn(f64, f64) -> Result<f64, Error>) -> Function {
    let (a_name, b_name) = (a.to_string(), b.to_string());
    Function::new(name, vec![number(a), number(b)], move |inv| {
        let a = inv.number(&a_name)?;
        let b = inv.number(&b_name)?;
        op(a, b).map(Value::Number)
    })
}

/// A function of one number.
fn unary(name: &str, op: fn(f64) -> f64) -> Function {
    Function::new(name, vec![number("x")], move |inv| {
        Ok(Value::Number(op(inv.number("x")?)))
    })
}

pub(super) fn functions() -> Vec<Function> {
    vec![
        binary("sum", "a", "b", |a, b| Ok(a + b)),
        binary("subtract", "from", "b", |a, b| Ok(a - b)),
        binary("multiply", "a", "by", |a, b| Ok(a * b)),
        binary("divide", "a", "by", |a, b| match b {
            b if b == 0.0 => Err(Error::runtime("division by zero")),
            b => Ok(a / b),
        }),
        binary("rem", "a", "b", |a, b| match b {
            b if b == 0.0 => Err(Error::runtime("division by zero")),
            b => Ok(a % b),
        }),
        binary("pow", "base", "to", |a, b| Ok(a.powf(b))),
        Function::new("pi", vec![], |_| Ok(Value::Number(std::f64::consts::PI))),
        unary("sin", f64::sin),
        unary("cos", f64::cos),
        unary("tan", f64::tan),
        unary("round", f64::round),
        Function::new(
            "truncate",
            vec![number("x"), Parameter::new("decimals", ValueType::Integer)],
            |inv| {
                let x = inv.number("x")?;
                let decimals = inv.integer("decimals")?;
                if decimals < 0 {
                    return Err(Error::runtime(format!(
                        "can't truncate to {} decimals",
                        decimals
                    )));
                }
                let factor = 10f64.powi(decimals.min(15) as i32);
                Ok(Value::Number((x * factor).trunc() / factor))
            },
        ),
        Function::new(
            "iseven",
            vec![Parameter::new("x", ValueType::Integer)],
            |inv| Ok(Value::Boolean(inv.integer("x")? % 2 == 0)),
        ),
        Function::new(
            "range",
            vec![
                number("from").with_default(Value::Number(1.0)),
                number("to").optional(),
            ],
            range,
        ),
    ]
}

/// Numbers from `from` to `to`, both included, one apart.
fn range(inv: &mut Invocation) -> Result<Value, Error> {
    let from = inv.number("from")?;
    let to = inv
        .optional_number("to")?
        .ok_or_else(|| Error::runtime("a range needs an upper bound"))?;
    let mut values = vec![];
    let mut n = from;
    while n <= to {
        values.push(Value::Number(n));
        n += 1.0;
    }
    Ok(Value::Iterable(values))
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::stdlib::tests::{evaluate, try_compile};
    use crate::value::Value;

    macro_rules! math_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<math_ $name>]() {
                let (source, expected): (&str, f64) = $value;
                assert_eq!(evaluate(source), Value::Number(expected));
            }
            }
        )*
        }
    }

    math_tests! {
        sum: (".sum {2} {3.5}", 5.5),
        subtract: (".subtract from:{10} {4}", 6.0),
        multiply: (".multiply {3} by:{-2}", -6.0),
        divide: (".divide {9} by:{2}", 4.5),
        rem: (".rem {9} {4}", 1.0),
        pow: (".pow {2} to:{10}", 1024.0),
        truncate: (".truncate {3.14159} {2}", 3.14),
        truncate_to_integer: (".truncate {-2.7} {0}", -2.0),
        round: (".round {2.5}", 3.0),
        chained: (".sum {1} {2}::multiply by:{3}::subtract {1}", 8.0),
    }

    #[test]
    fn iseven() {
        assert_eq!(evaluate(".iseven {4}"), Value::Boolean(true));
        assert_eq!(evaluate(".iseven {7}"), Value::Boolean(false));
    }

    #[test]
    fn ranges() {
        assert_eq!(
            evaluate(".range {2} {4}"),
            Value::Iterable(vec![
                Value::Number(2.0),
                Value::Number(3.0),
                Value::Number(4.0)
            ])
        );
        assert_eq!(evaluate(".range {5} {4}"), Value::Iterable(vec![]));
        assert_eq!(evaluate(".range to:{1}"), Value::Iterable(vec![Value::Number(1.0)]));
    }

    #[test]
    fn runtime_failures() {
        for source in [".divide {1} by:{0}", ".truncate {1.5} {-1}", ".range {1}"] {
            assert!(
                matches!(try_compile(source), Err(Error::Runtime(_))),
                "{}",
                source
            );
        }
    }
}
