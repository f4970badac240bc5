use super::ParseError;
use crate::ast::{Argument, Expression, UncheckedCall};
use crate::common::Span;
use crate::lexer::patterns::expression_patterns;
use crate::lexer::{Lexer, Walked};
use crate::walker::WalkedCall;

/// Splits an argument value into text and nested calls. Values without calls stay dynamic.
pub fn parse_expression(raw: &str) -> Result<Expression, ParseError> {
    let tokens = Lexer::new(raw, expression_patterns()).tokenize()?;
    let mut parts: Vec<Expression> = Vec::new();

    for token in tokens {
        match token.walker_result.map(|r| r.value) {
            Some(Walked::FunctionCall(call)) => {
                let (name, arguments) = fold_chain(call, &token.span)?;
                parts.push(Expression::Call(UncheckedCall {
                    name,
                    arguments,
                    span: token.span,
                }));
            }
            _ => match parts.last_mut() {
                Some(Expression::Dynamic(text)) => text.push_str(&token.text),
                _ => parts.push(Expression::Dynamic(token.text)),
            },
        }
    }

    Ok(match <[Expression; 1]>::try_from(parts) {
        Ok([single]) => single,
        Err(parts) if parts.is_empty() => Expression::Dynamic(String::new()),
        Err(parts) => Expression::Composed(parts),
    })
}

/// Flattens a chain `a::b::c` into the outermost call `c`, whose first argument is `b` called
/// with `a`, and so on. Returns the outermost name and arguments.
pub(super) fn fold_chain(
    call: WalkedCall,
    span: &Span,
) -> Result<(String, Vec<Argument>), ParseError> {
    let mut segment = call;
    let mut previous: Option<UncheckedCall> = None;
    loop {
        let mut arguments = Vec::with_capacity(segment.arguments.len() + 2);
        if let Some(previous) = previous.take() {
            arguments.push(Argument::positional(Expression::Call(previous)));
        }
        for argument in segment.arguments {
            arguments.push(Argument {
                name: argument.name,
                value: parse_expression(&argument.value)?,
                is_body: false,
            });
        }
        if let Some(body) = segment.body {
            arguments.push(Argument::body(body));
        }

        match segment.chained {
            Some(next) => {
                previous = Some(UncheckedCall {
                    name: segment.name,
                    arguments,
                    span: span.clone(),
                });
                segment = *next;
            }
            None => return Ok((segment.name, arguments)),
        }
    }
}
