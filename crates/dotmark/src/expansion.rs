//! Expansion of function calls. Each round takes every queued call, runs it and stores its output
//! as the call node's children. Calls registered while a round runs are expanded in the next
//! one, until a round finds the queue empty.
use crate::context::Context;
use crate::error::Error;
use crate::function::{Function, Invocation, OutputTarget};
use crate::handler::ErrorHandler;
use crate::value::Value;
use dotmark_parser::ast::visitor::find_call_mut;
use dotmark_parser::ast::{
    Argument, BoxNode, CallState, Expression, FunctionCallNode, ListItem, ListProperties, Node,
    UncheckedCall,
};
use linked_hash_map::LinkedHashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Expands every call reachable from the queue of `ctx`, in place. Failed calls go to the error
/// handler of `ctx`.
pub fn expand(nodes: &mut [Node], ctx: &mut Context) -> Result<(), Error> {
    let handler = ctx.error_handler();
    let mut rounds = 0;
    loop {
        let snapshot = ctx.dequeue_all_function_calls();
        if snapshot.is_empty() {
            return Ok(());
        }
        rounds += 1;
        if rounds > ctx.options.max_expansion_rounds {
            return Err(Error::RecursionLimit {
                what: "expansion rounds",
                limit: ctx.options.max_expansion_rounds,
            });
        }
        debug!(round = rounds, calls = snapshot.len(), depth = ctx.depth(), "expansion round");

        for id in snapshot {
            if ctx.is_executed(id) {
                continue;
            }
            match find_call_mut(nodes, id) {
                Some(call) => expand_call(call, ctx, handler.as_ref())?,
                None => warn!(id = %id, "queued call is not part of the tree"),
            }
        }
    }
}

fn expand_call(
    call: &mut FunctionCallNode,
    ctx: &mut Context,
    handler: &dyn ErrorHandler,
) -> Result<(), Error> {
    debug!(call = %call.name, id = %call.id, "expanding call");
    call.state = CallState::Resolving;
    let resolved = match ctx.resolve_call(call) {
        Ok(resolved) => resolved,
        Err(error) => return fail(call, error, None, ctx, handler),
    };

    call.state = CallState::Executing;
    let output = if call.is_block {
        OutputTarget::Block
    } else {
        OutputTarget::Inline
    };
    let result = invoke(&resolved.function, &call.arguments, output, ctx)
        .and_then(|value| to_nodes(value, call.is_block, ctx));
    match result {
        Ok(children) => {
            resolved.complete(ctx);
            call.children = children;
            call.state = CallState::Expanded;
            Ok(())
        }
        Err(error) => fail(call, error, Some(resolved.function.as_ref()), ctx, handler),
    }
}

fn fail(
    call: &mut FunctionCallNode,
    error: Error,
    function: Option<&Function>,
    ctx: &mut Context,
    handler: &dyn ErrorHandler,
) -> Result<(), Error> {
    ctx.mark_executed(call.id);
    call.state = CallState::Failed;
    if error.is_fatal() {
        return Err(error);
    }
    let title = format!("Error in '{}'", call.name);
    let children = &mut call.children;
    handler.handle(&error, function, &mut |e| {
        *children = vec![Node::Boxed(BoxNode::error(title.clone(), e.to_string()))]
    })
}

/// Binds `arguments`, then runs `function`.
pub fn invoke(
    function: &Function,
    arguments: &[Argument],
    output: OutputTarget,
    ctx: &mut Context,
) -> Result<Value, Error> {
    if let Some(types) = &function.document_types {
        if !types.contains(&ctx.document.doc_type) {
            return Err(Error::invalid_call(
                &function.name,
                format!(
                    "not available in {} documents",
                    ctx.document.doc_type.name()
                ),
            ));
        }
    }

    let arguments = bind(function, arguments, ctx)?;
    let mut invocation = Invocation {
        ctx,
        function: function.name.clone(),
        output,
        arguments,
    };
    function.invoke(&mut invocation)
}

/// Matches arguments to parameters: named arguments by name, the body argument to the
/// body-likely parameter (or the last one callers can pass), positional arguments to the
/// remaining parameters in order. Injected parameters are never bound by callers.
fn bind(
    function: &Function,
    arguments: &[Argument],
    ctx: &mut Context,
) -> Result<LinkedHashMap<String, Value>, Error> {
    let invalid = |reason: String| Error::invalid_call(&function.name, reason);
    let parameters = &function.parameters;
    let mut slots: Vec<Option<&Argument>> = vec![None; parameters.len()];

    for argument in arguments.iter().filter(|a| !a.is_body) {
        if let Some(name) = &argument.name {
            let index = parameters
                .iter()
                .position(|p| p.name == *name && !p.is_injected())
                .ok_or_else(|| invalid(format!("unknown parameter '{}'", name)))?;
            occupy(&mut slots, index, argument, function)?;
        }
    }

    if let Some(body) = arguments.iter().find(|a| a.is_body) {
        let index = parameters
            .iter()
            .position(|p| p.body_likely)
            .or_else(|| parameters.iter().rposition(|p| !p.is_injected()))
            .ok_or_else(|| invalid("the function takes no body".to_string()))?;
        occupy(&mut slots, index, body, function)?;
    }

    let mut cursor = 0;
    for argument in arguments.iter().filter(|a| a.name.is_none() && !a.is_body) {
        while cursor < parameters.len()
            && (slots[cursor].is_some() || parameters[cursor].is_injected())
        {
            cursor += 1;
        }
        if cursor == parameters.len() {
            let accepted = parameters.iter().filter(|p| !p.is_injected()).count();
            return Err(invalid(format!(
                "too many arguments: it takes at most {}",
                accepted
            )));
        }
        slots[cursor] = Some(argument);
    }

    let mut bound = LinkedHashMap::new();
    for (parameter, slot) in parameters.iter().zip(slots) {
        let value = match (parameter.injector, slot) {
            (Some(inject), _) => inject(ctx),
            (None, Some(argument)) => {
                let raw = evaluate(&argument.value, ctx)?;
                if parameter.optional && raw.is_none() {
                    Value::None
                } else {
                    let stringy = raw.as_text().is_some();
                    raw.convert(parameter.ty, ctx).map_err(|e| match e {
                        Error::Conversion { value, target } if !stringy => invalid(format!(
                            "'{}' expects {}, found {}",
                            parameter.name, target, value
                        )),
                        e => e,
                    })?
                }
            }
            (None, None) => match &parameter.default {
                Some(default) => default.clone(),
                None if parameter.optional => Value::None,
                None => {
                    return Err(invalid(format!(
                        "missing argument for '{}'",
                        parameter.name
                    )))
                }
            },
        };
        bound.insert(parameter.name.clone(), value);
    }
    Ok(bound)
}

fn occupy<'a>(
    slots: &mut [Option<&'a Argument>],
    index: usize,
    argument: &'a Argument,
    function: &Function,
) -> Result<(), Error> {
    match slots[index].replace(argument) {
        Some(_) => Err(Error::invalid_call(
            &function.name,
            format!(
                "parameter '{}' is bound more than once",
                function.parameters[index].name
            ),
        )),
        None => Ok(()),
    }
}

/// Evaluates an argument expression. Nested calls run immediately, outside the queue.
pub fn evaluate(expression: &Expression, ctx: &mut Context) -> Result<Value, Error> {
    match expression {
        Expression::Dynamic(text) => Ok(Value::Dynamic(text.clone())),
        Expression::Call(call) => execute_unchecked(call, ctx),
        Expression::Composed(parts) => {
            let values = parts
                .iter()
                .map(|part| evaluate(part, ctx))
                .collect::<Result<Vec<_>, _>>()?;

            let textual = values
                .iter()
                .all(|v| v.as_text().is_some() || matches!(v, Value::None | Value::Void));
            if textual {
                return Ok(Value::Dynamic(
                    values.iter().filter_map(Value::as_text).collect(),
                ));
            }

            let mut nodes = Vec::new();
            for value in values {
                nodes.extend(to_nodes(value, false, ctx)?);
            }
            Ok(Value::InlineMarkdown(nodes))
        }
    }
}

fn execute_unchecked(call: &UncheckedCall, ctx: &mut Context) -> Result<Value, Error> {
    debug!(call = %call.name, "executing nested call");
    let resolved = ctx.resolve(&call.name)?;
    invoke(&resolved.function, &call.arguments, OutputTarget::Value, ctx)
}

/// Turns a call's output into the nodes stored as its children. Dynamic output is parsed as
/// Markdown in `ctx`, so calls in it are queued for the next round.
pub fn to_nodes(value: Value, is_block: bool, ctx: &mut Context) -> Result<Vec<Node>, Error> {
    let text = |text: String| match is_block {
        true => vec![Node::Paragraph(vec![Node::Text(text)])],
        false => vec![Node::Text(text)],
    };
    Ok(match value {
        Value::None | Value::Void => vec![],
        Value::String(s) => text(s),
        Value::Number(_) | Value::Boolean(_) | Value::Enum(_) => {
            value.as_text().map(text).unwrap_or_default()
        }
        Value::Markdown(nodes) | Value::InlineMarkdown(nodes) => nodes,
        Value::Node(node) => vec![node],
        Value::Iterable(items) => {
            let mut nodes = Vec::new();
            for item in items {
                nodes.extend(to_nodes(item, is_block, ctx)?);
            }
            nodes
        }
        Value::Dictionary(entries) => vec![dictionary_list(entries, ctx)?],
        Value::Lambda(_) => return Err(Error::runtime("a lambda can't be displayed")),
        Value::Dynamic(text) => ctx.parse_markdown(&text, !is_block)?,
    })
}

fn dictionary_list(entries: LinkedHashMap<String, Value>, ctx: &mut Context) -> Result<Node, Error> {
    let properties = Rc::new(ListProperties::default());
    let mut children = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let mut text = vec![Node::Text(format!("{}: ", key))];
        text.extend(to_nodes(value, false, ctx)?);
        children.push(Node::ListItem(ListItem {
            task: None,
            owner: Rc::downgrade(&properties),
            children: vec![Node::Paragraph(text)],
        }));
    }
    Ok(Node::List(dotmark_parser::ast::List {
        start: None,
        properties,
        children,
    }))
}
