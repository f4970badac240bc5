//! The standard library, active in every document, and the loadable debug library.
mod collection;
mod debug;
mod document;
mod flow;
mod injection;
mod layout;
mod localization;
mod logical;
mod math;
mod text;

pub use debug::{library as debug_library, DEBUG_LIBRARY};

use crate::context::Context;
use crate::error::Error;
use crate::library::{Library, LibraryError};
use dotmark_parser::Flavor;

pub const STDLIB: &str = "std";

/// Localization table holding the strings the standard library displays.
pub const LOCALIZATION_TABLE: &str = "std";

pub fn library() -> Result<Library, LibraryError> {
    let functions = [
        document::functions(),
        text::functions(),
        math::functions(),
        logical::functions(),
        flow::functions(),
        layout::functions(),
        collection::functions(),
        injection::functions(),
        localization::functions(),
    ]
    .into_iter()
    .flatten()
    .collect();
    Ok(Library::new(STDLIB, functions)?.with_on_load(localization::register_std_table))
}

/// Activates the standard library in `ctx` and makes the debug library loadable.
pub fn load(ctx: &mut Context) -> Result<(), Error> {
    ctx.register_library(library()?)?;
    ctx.add_loadable_library(debug_library()?);
    Ok(())
}

/// A fresh context with the standard library loaded.
pub fn context(flavor: Flavor) -> Result<Context, Error> {
    let mut ctx = Context::new(flavor);
    load(&mut ctx)?;
    Ok(ctx)
}
