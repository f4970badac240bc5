//! The mutable state a document is compiled against: collected attributes, options, document
//! info, libraries and the shared services.
mod attributes;

pub use attributes::*;

use crate::error::Error;
use crate::function::Function;
use crate::handler::{ErrorHandler, StrictErrorHandler};
use crate::library::Library;
use crate::locale::{BuiltinLocaleLoader, LocaleLoader, LocalizationError};
use crate::media::{InMemoryMediaStorage, MediaStorage, MediaStorageOptions};
use dotmark_parser::ast::{CallId, FunctionCallNode, LinkDefinition, Node};
use dotmark_parser::{parse_blocks, parse_inline, Flavor, ParseContext};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use tracing::debug;

/// Library holding functions defined by documents.
pub const USER_LIBRARY: &str = "__functions__";

/// A function found by name, along with the call it was resolved for.
#[derive(Debug, Clone)]
pub struct ResolvedFunction {
    pub function: Rc<Function>,
    pub library: String,
    call: Option<CallId>,
}

impl ResolvedFunction {
    /// Removes the call from the queue and marks it as executed, so it never runs again.
    pub fn complete(&self, ctx: &mut Context) {
        if let Some(id) = self.call {
            ctx.attributes.queue.retain(|queued| *queued != id);
            ctx.mark_executed(id);
        }
    }
}

pub struct Context {
    pub flavor: Flavor,
    pub attributes: Attributes,
    pub options: ContextOptions,
    pub document: DocumentInfo,
    libraries: Rc<RefCell<Vec<Rc<Library>>>>,
    loadable: Rc<RefCell<Vec<Library>>>,
    /// Fork-local libraries, innermost last.
    scopes: Vec<Rc<Library>>,
    locale_loader: Rc<dyn LocaleLoader>,
    media: Rc<RefCell<dyn MediaStorage>>,
    error_handler: Rc<dyn ErrorHandler>,
    call_ids: Rc<Cell<u64>>,
    executed: Rc<RefCell<HashSet<CallId>>>,
    enqueuing_locked: bool,
    depth: usize,
}

impl Context {
    pub fn new(flavor: Flavor) -> Self {
        Context {
            flavor,
            attributes: Attributes::default(),
            options: ContextOptions::default(),
            document: DocumentInfo::default(),
            libraries: Rc::new(RefCell::new(Vec::new())),
            loadable: Rc::new(RefCell::new(Vec::new())),
            scopes: Vec::new(),
            locale_loader: Rc::new(BuiltinLocaleLoader),
            media: Rc::new(RefCell::new(InMemoryMediaStorage::default())),
            error_handler: Rc::new(StrictErrorHandler),
            call_ids: Rc::new(Cell::new(0)),
            executed: Rc::new(RefCell::new(HashSet::new())),
            enqueuing_locked: false,
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_document(mut self, document: DocumentInfo) -> Self {
        self.document = document;
        self
    }

    pub fn with_locale_loader(mut self, loader: Rc<dyn LocaleLoader>) -> Self {
        self.locale_loader = loader;
        self
    }

    pub fn with_media_storage(mut self, media: Rc<RefCell<dyn MediaStorage>>) -> Self {
        self.media = media;
        self
    }

    /// Sets what happens when a call fails. Forks share the handler. Strict by default.
    pub fn with_error_handler(mut self, handler: Rc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn error_handler(&self) -> Rc<dyn ErrorHandler> {
        Rc::clone(&self.error_handler)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn locale_loader(&self) -> &dyn LocaleLoader {
        self.locale_loader.as_ref()
    }

    /// Makes `library` active and runs its load hook.
    pub fn register_library(&mut self, library: Library) -> Result<(), Error> {
        let hook = library.on_load();
        debug!(library = %library.name, "registering library");
        self.libraries.borrow_mut().push(Rc::new(library));
        match hook {
            Some(hook) => hook(self),
            None => Ok(()),
        }
    }

    pub fn add_loadable_library(&mut self, library: Library) {
        self.loadable.borrow_mut().push(library);
    }

    /// Moves the loadable library `name` to the active ones. Returns `None` if there's no such
    /// loadable library.
    pub fn load_library(&mut self, name: &str) -> Result<Option<Rc<Library>>, Error> {
        let position = self.loadable.borrow().iter().position(|l| l.name == name);
        let Some(position) = position else {
            return Ok(None);
        };
        let library = self.loadable.borrow_mut().remove(position);
        self.register_library(library)?;
        Ok(self
            .libraries
            .borrow()
            .iter()
            .rev()
            .find(|l| l.name == name)
            .cloned())
    }

    pub fn active_libraries(&self) -> Vec<String> {
        self.libraries
            .borrow()
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    /// Adds a library visible to this context and its forks only.
    pub fn push_scope(&mut self, library: Library) {
        self.scopes.push(Rc::new(library));
    }

    /// Adds `function` to the document's own library, replacing an earlier definition.
    pub fn define_function(&mut self, function: Function) {
        debug!(function = %function.name, "defining function");
        let mut libraries = self.libraries.borrow_mut();
        match libraries.iter().position(|l| l.name == USER_LIBRARY) {
            Some(i) => {
                let updated = (*libraries[i]).clone().with_function(function);
                libraries[i] = Rc::new(updated);
            }
            None => {
                let library = Library::new(USER_LIBRARY, vec![function])
                    .map(Rc::new)
                    .ok();
                libraries.extend(library);
            }
        }
    }

    /// Looks `name` up in the fork scopes, innermost first, then in the document's own
    /// functions, then in the active libraries. `library/name` restricts the lookup to one
    /// library.
    pub fn resolve(&self, name: &str) -> Result<ResolvedFunction, Error> {
        let resolved = |library: &Rc<Library>, function: Rc<Function>| ResolvedFunction {
            function,
            library: library.name.clone(),
            call: None,
        };

        if let Some((library_name, function_name)) = name.split_once('/') {
            let libraries = self.libraries.borrow();
            return self
                .scopes
                .iter()
                .rev()
                .chain(libraries.iter())
                .filter(|l| l.name == library_name)
                .find_map(|l| l.get(function_name).map(|f| resolved(l, f)))
                .ok_or_else(|| Error::UnresolvedReference(name.to_string()));
        }

        if let Some(found) = self
            .scopes
            .iter()
            .rev()
            .find_map(|l| l.get(name).map(|f| resolved(l, f)))
        {
            return Ok(found);
        }

        let libraries = self.libraries.borrow();
        if let Some(found) = libraries
            .iter()
            .filter(|l| l.name == USER_LIBRARY)
            .find_map(|l| l.get(name).map(|f| resolved(l, f)))
        {
            return Ok(found);
        }

        let mut matches: Vec<ResolvedFunction> = libraries
            .iter()
            .filter_map(|l| l.get(name).map(|f| resolved(l, f)))
            .collect();
        match matches.len() {
            0 => Err(Error::UnresolvedReference(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousReference {
                name: name.to_string(),
                libraries: matches.into_iter().map(|m| m.library).collect(),
            }),
        }
    }

    pub fn resolve_call(&self, call: &FunctionCallNode) -> Result<ResolvedFunction, Error> {
        let mut resolved = self.resolve(&call.name)?;
        resolved.call = Some(call.id);
        Ok(resolved)
    }

    /// A child context sharing libraries and services, with its own copy of the attributes.
    pub fn fork(&self) -> Result<Context, Error> {
        if self.depth >= self.options.max_fork_depth {
            return Err(Error::RecursionLimit {
                what: "fork depth",
                limit: self.options.max_fork_depth,
            });
        }
        Ok(Context {
            flavor: self.flavor,
            attributes: self.attributes.fork(),
            options: self.options.clone(),
            document: self.document.clone(),
            libraries: Rc::clone(&self.libraries),
            loadable: Rc::clone(&self.loadable),
            scopes: self.scopes.clone(),
            locale_loader: Rc::clone(&self.locale_loader),
            media: Rc::clone(&self.media),
            error_handler: Rc::clone(&self.error_handler),
            call_ids: Rc::clone(&self.call_ids),
            executed: Rc::clone(&self.executed),
            enqueuing_locked: false,
            depth: self.depth + 1,
        })
    }

    /// Takes every queued call, leaving the queue empty.
    pub fn dequeue_all_function_calls(&mut self) -> Vec<CallId> {
        self.attributes.queue.drain(..).collect()
    }

    /// Runs `action` with call registration disabled.
    pub fn lock_function_call_enqueuing<T>(&mut self, action: impl FnOnce(&mut Context) -> T) -> T {
        let previous = self.enqueuing_locked;
        self.enqueuing_locked = true;
        let result = action(self);
        self.enqueuing_locked = previous;
        result
    }

    pub fn is_executed(&self, id: CallId) -> bool {
        self.executed.borrow().contains(&id)
    }

    pub fn mark_executed(&self, id: CallId) {
        self.executed.borrow_mut().insert(id);
    }

    /// Parses `text` as block or inline Markdown. Calls found in it are registered here.
    pub fn parse_markdown(&mut self, text: &str, inline: bool) -> Result<Vec<Node>, Error> {
        Ok(if inline {
            parse_inline(text, self)?
        } else {
            parse_blocks(text, self)?
        })
    }

    /// Looks `key` up in localization `table` for the document locale. A table without the
    /// exact locale falls back to an entry for the same language.
    pub fn localize(&self, table: &str, key: &str) -> Result<String, LocalizationError> {
        let locale = self
            .document
            .locale
            .as_deref()
            .ok_or(LocalizationError::LocaleUnset)?;
        let entries = self
            .attributes
            .localization_tables
            .get(table)
            .ok_or_else(|| LocalizationError::TableNotFound(table.to_string()))?;

        let language = locale.split('-').next().unwrap_or(locale);
        let strings = entries
            .get(locale)
            .or_else(|| entries.get(language))
            .or_else(|| {
                entries
                    .iter()
                    .find(|(tag, _)| tag.split('-').next() == Some(language))
                    .map(|(_, strings)| strings)
            });

        strings
            .and_then(|s| s.get(key))
            .cloned()
            .ok_or_else(|| LocalizationError::KeyNotFound {
                table: table.to_string(),
                key: key.to_string(),
                locale: locale.to_string(),
            })
    }

    /// Stores a media reference if its kind is enabled, returning its new location.
    pub fn register_media(&mut self, reference: &str) -> Option<String> {
        let options = MediaStorageOptions {
            local: self.options.enable_local_media_storage,
            remote: self.options.enable_remote_media_storage,
        };
        let location = self.media.borrow_mut().register(reference, options)?;
        self.attributes
            .media
            .insert(reference.to_string(), location.clone());
        Some(location)
    }
}

impl ParseContext for Context {
    fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn next_call_id(&mut self) -> CallId {
        let id = self.call_ids.get() + 1;
        self.call_ids.set(id);
        CallId(id)
    }

    fn register_call(&mut self, call: &FunctionCallNode) {
        if !self.enqueuing_locked {
            self.attributes.queue.push_back(call.id);
        }
    }

    fn register_link_definition(&mut self, definition: &LinkDefinition) {
        self.attributes
            .link_definitions
            .entry(definition.label.clone())
            .or_insert_with(|| definition.clone());
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("flavor", &self.flavor)
            .field("depth", &self.depth)
            .field("options", &self.options)
            .field("document", &self.document)
            .field("libraries", &self.active_libraries())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use crate::value::Value;

    fn constant(name: &str, value: &str) -> Function {
        let value = value.to_string();
        Function::new(name, vec![], move |_| Ok(Value::String(value.clone())))
    }

    fn ctx_with(libraries: Vec<Library>) -> Context {
        let mut ctx = Context::new(Flavor::Extended);
        for library in libraries {
            ctx.register_library(library).unwrap();
        }
        ctx
    }

    #[test]
    fn parsing_enqueues_calls() {
        let mut ctx = Context::new(Flavor::Extended);
        ctx.parse_markdown(".a\n\nText .b {x}\n", false).unwrap();
        assert_eq!(ctx.attributes.queue.len(), 2);
        let snapshot = ctx.dequeue_all_function_calls();
        assert_eq!(snapshot, vec![CallId(1), CallId(2)]);
        assert!(ctx.attributes.queue.is_empty());
    }

    #[test]
    fn locked_enqueuing_discards_calls() {
        let mut ctx = Context::new(Flavor::Extended);
        let nodes = ctx
            .lock_function_call_enqueuing(|ctx| ctx.parse_markdown(".a", true))
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(ctx.attributes.queue.is_empty());
        ctx.parse_markdown(".b", true).unwrap();
        assert_eq!(ctx.attributes.queue.len(), 1);
    }

    #[test]
    fn ambiguity_and_qualification() {
        let ctx = ctx_with(vec![
            Library::new("one", vec![constant("f", "1"), constant("g", "g")]).unwrap(),
            Library::new("two", vec![constant("f", "2")]).unwrap(),
        ]);
        assert!(matches!(
            ctx.resolve("f"),
            Err(Error::AmbiguousReference { ref libraries, .. }) if libraries == &["one", "two"]
        ));
        assert_eq!(ctx.resolve("two/f").unwrap().library, "two");
        assert_eq!(ctx.resolve("g").unwrap().library, "one");
        assert!(matches!(
            ctx.resolve("two/g"),
            Err(Error::UnresolvedReference(_))
        ));
    }

    #[test]
    fn scopes_shadow_libraries() {
        let ctx = ctx_with(vec![Library::new("lib", vec![constant("x", "outer")]).unwrap()]);
        let mut fork = ctx.fork().unwrap();
        fork.push_scope(Library::new("scope", vec![constant("x", "inner")]).unwrap());
        assert_eq!(fork.resolve("x").unwrap().library, "scope");
        assert_eq!(ctx.resolve("x").unwrap().library, "lib");
    }

    #[test]
    fn forks_share_libraries_but_not_queues() {
        let mut ctx = Context::new(Flavor::Extended);
        ctx.parse_markdown(".a", true).unwrap();
        let mut fork = ctx.fork().unwrap();
        assert_eq!(fork.depth(), 1);
        assert!(fork.attributes.queue.is_empty());
        fork.parse_markdown(".b", true).unwrap();
        assert_eq!(fork.attributes.queue, vec![CallId(2)]);
        assert_eq!(ctx.attributes.queue, vec![CallId(1)]);

        fork.define_function(constant("defined", "x"));
        assert_eq!(ctx.resolve("defined").unwrap().library, USER_LIBRARY);
    }

    #[test]
    fn fork_depth_is_limited() {
        let mut ctx = Context::new(Flavor::Extended);
        ctx.options.max_fork_depth = 2;
        let fork = ctx.fork().unwrap().fork().unwrap();
        assert!(matches!(
            fork.fork(),
            Err(Error::RecursionLimit { limit: 2, .. })
        ));
    }

    #[test]
    fn loading_libraries_runs_hooks_once() {
        let mut ctx = Context::new(Flavor::Extended);
        ctx.add_loadable_library(
            Library::new("extra", vec![constant("e", "e")])
                .unwrap()
                .with_on_load(|ctx| {
                    ctx.document.name = Some("loaded".into());
                    Ok(())
                }),
        );
        assert!(ctx.resolve("e").is_err());
        assert!(ctx.load_library("extra").unwrap().is_some());
        assert_eq!(ctx.document.name.as_deref(), Some("loaded"));
        assert!(ctx.resolve("e").is_ok());
        assert!(ctx.load_library("extra").unwrap().is_none());
    }

    #[test]
    fn completion_dequeues_and_marks() {
        let mut ctx = ctx_with(vec![Library::new("lib", vec![constant("a", "a")]).unwrap()]);
        let nodes = ctx.parse_markdown(".a", true).unwrap();
        let Node::FunctionCall(call) = &nodes[0] else {
            panic!("expected a call")
        };
        let resolved = ctx.resolve_call(call).unwrap();
        resolved.complete(&mut ctx);
        assert!(ctx.attributes.queue.is_empty());
        assert!(ctx.is_executed(call.id));
    }

    #[test]
    fn localization_falls_back_to_language() {
        let mut ctx = Context::new(Flavor::Extended);
        assert_eq!(
            ctx.localize("std", "tip"),
            Err(LocalizationError::LocaleUnset)
        );
        ctx.document.locale = Some("en-US".into());
        assert_eq!(
            ctx.localize("std", "tip"),
            Err(LocalizationError::TableNotFound("std".into()))
        );

        let mut table = LocalizationTable::new();
        let mut entries = LocalizationEntries::new();
        entries.insert("tip".into(), "Tip".into());
        table.insert("en".into(), entries);
        ctx.attributes
            .localization_tables
            .insert("std".into(), table);

        assert_eq!(ctx.localize("std", "tip").unwrap(), "Tip");
        assert!(matches!(
            ctx.localize("std", "other"),
            Err(LocalizationError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn media_is_recorded_when_enabled() {
        let mut ctx = Context::new(Flavor::Extended);
        assert_eq!(ctx.register_media("logo.png"), None);
        ctx.options.enable_local_media_storage = true;
        let location = ctx.register_media("logo.png").unwrap();
        assert_eq!(ctx.attributes.media.get("logo.png"), Some(&location));
    }
}
