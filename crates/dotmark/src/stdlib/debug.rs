//! Introspection functions, available after `.uselib {debug}`.
use crate::function::{Function, Parameter};
use crate::library::{Library, LibraryError};
use crate::value::Value;

pub const DEBUG_LIBRARY: &str = "debug";

pub fn library() -> Result<Library, LibraryError> {
    Library::new(
        DEBUG_LIBRARY,
        vec![
            Function::new(
                "queuesize",
                vec![Parameter::injected("size", |ctx| {
                    Value::Number(ctx.attributes.queue.len() as f64)
                })],
                |inv| Ok(inv.take("size")),
            ),
            Function::new(
                "forkdepth",
                vec![Parameter::injected("depth", |ctx| {
                    Value::Number(ctx.depth() as f64)
                })],
                |inv| Ok(inv.take("depth")),
            ),
            Function::new(
                "libraries",
                vec![Parameter::injected("names", |ctx| {
                    Value::Iterable(
                        ctx.active_libraries()
                            .into_iter()
                            .map(Value::String)
                            .collect(),
                    )
                })],
                |inv| Ok(inv.take("names")),
            ),
        ],
    )
}
