//! The compilation pipeline: parsing, expansion, the tree pass and rendering, with hooks run
//! after each stage.
use std::rc::Rc;

use console::style;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use dotmark::render::{NodeRenderer, PlainTextRenderer, RenderError};
use dotmark::{
    collect, expand, stdlib, Context, DocumentInfo, Error, ErrorHandler, ErrorKind,
    LogErrorHandler, StrictErrorHandler,
};
use dotmark_parser::ast::Node;
use dotmark_parser::lexer::LexError;
use dotmark_parser::ParseError;

use crate::config::{CompilerConfig, ErrorHandling};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Compile(#[from] Error),
    #[error("Could not render document: {0}")]
    Render(#[from] RenderError),
}

impl PipelineError {
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Compile(e) => exit_code(e.kind()),
            PipelineError::Render(_) => exit_code(ErrorKind::Runtime),
        }
    }
}

/// Process exit status for a compilation failing with `kind`.
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidCall => 66,
        ErrorKind::UnresolvedReference => 67,
        ErrorKind::Conversion => 68,
        ErrorKind::NoSuchElement => 69,
        ErrorKind::Io => 70,
        ErrorKind::Runtime => 71,
        ErrorKind::Lexical | ErrorKind::Syntax => 72,
        ErrorKind::Localization => 73,
    }
}

/// Exit status for any error reaching the command line: the status of the first pipeline,
/// parser or i/o error in its chain, 1 otherwise.
pub fn error_exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<PipelineError>() {
                Some(e.exit_code())
            } else if let Some(e) = cause.downcast_ref::<Error>() {
                Some(exit_code(e.kind()))
            } else if let Some(e) = cause.downcast_ref::<ParseError>() {
                Some(exit_code(Error::Parse(e.clone()).kind()))
            } else if let Some(e) = cause.downcast_ref::<LexError>() {
                Some(exit_code(Error::Parse(e.clone().into()).kind()))
            } else {
                cause
                    .downcast_ref::<std::io::Error>()
                    .map(|_| exit_code(ErrorKind::Io))
            }
        })
        .unwrap_or(1)
}

pub fn print_err<T>(res: anyhow::Result<T>) -> Option<T> {
    match res {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            e.chain()
                .skip(1)
                .for_each(|cause| eprintln!(" {} {}", style("caused by:").bold(), cause));
            None
        }
    }
}

/// Hook over the tree, run after parsing, expanding and visiting.
pub type TreeHook = Box<dyn FnMut(&[Node], &Context)>;

/// Hook over the rendered output.
pub type OutputHook = Box<dyn FnMut(&str, &Context)>;

/// A compiled document along with the context it was compiled in.
pub struct Compiled {
    pub nodes: Vec<Node>,
    pub context: Context,
    pub output: String,
    /// Calls that failed and were replaced by an error box.
    pub errors: usize,
}

#[derive(Serialize)]
struct JsonDump<'a> {
    document: &'a DocumentInfo,
    attributes: &'a dotmark::context::Attributes,
    nodes: &'a [Node],
}

impl Compiled {
    /// The document info, collected attributes and tree, as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&JsonDump {
            document: &self.context.document,
            attributes: &self.context.attributes,
            nodes: &self.nodes,
        })
    }
}

pub struct Pipeline {
    config: CompilerConfig,
    after_parsing: Vec<TreeHook>,
    after_expanding: Vec<TreeHook>,
    after_tree_visiting: Vec<TreeHook>,
    after_rendering: Vec<OutputHook>,
}

impl Pipeline {
    pub fn new(config: CompilerConfig) -> Self {
        Pipeline {
            config,
            after_parsing: Vec::new(),
            after_expanding: Vec::new(),
            after_tree_visiting: Vec::new(),
            after_rendering: Vec::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn after_parsing(mut self, hook: impl FnMut(&[Node], &Context) + 'static) -> Self {
        self.after_parsing.push(Box::new(hook));
        self
    }

    pub fn after_expanding(mut self, hook: impl FnMut(&[Node], &Context) + 'static) -> Self {
        self.after_expanding.push(Box::new(hook));
        self
    }

    pub fn after_tree_visiting(mut self, hook: impl FnMut(&[Node], &Context) + 'static) -> Self {
        self.after_tree_visiting.push(Box::new(hook));
        self
    }

    pub fn after_rendering(mut self, hook: impl FnMut(&str, &Context) + 'static) -> Self {
        self.after_rendering.push(Box::new(hook));
        self
    }

    /// A context with the standard library loaded and the configured options and document info.
    pub fn context(&self) -> Result<Context, Error> {
        let mut ctx = Context::new(self.config.flavor)
            .with_options(self.config.options.clone())
            .with_document(self.config.document.clone());
        stdlib::load(&mut ctx)?;
        Ok(ctx)
    }

    pub fn compile(&mut self, source: &str) -> Result<Compiled, PipelineError> {
        let logged = Rc::new(LogErrorHandler::new());
        let handler: Rc<dyn ErrorHandler> = match self.config.error_handling {
            ErrorHandling::Strict => Rc::new(StrictErrorHandler),
            ErrorHandling::Log => logged.clone(),
        };
        let mut ctx = self.context()?.with_error_handler(handler);

        let mut nodes = ctx.parse_markdown(source, false)?;
        debug!(nodes = nodes.len(), calls = ctx.attributes.queue.len(), "parsed document");
        run_tree_hooks(&mut self.after_parsing, &nodes, &ctx);

        expand(&mut nodes, &mut ctx)?;
        let errors = logged.error_count();
        run_tree_hooks(&mut self.after_expanding, &nodes, &ctx);

        collect::visit_tree(&mut nodes, &mut ctx)?;
        run_tree_hooks(&mut self.after_tree_visiting, &nodes, &ctx);

        let output =
            PlainTextRenderer::with_state(&ctx.attributes, &ctx.document).render_inner(&nodes)?;
        for hook in self.after_rendering.iter_mut() {
            hook(&output, &ctx);
        }
        info!(errors, "compiled document");

        Ok(Compiled {
            nodes,
            context: ctx,
            output,
            errors,
        })
    }
}

fn run_tree_hooks(hooks: &mut [TreeHook], nodes: &[Node], ctx: &Context) {
    for hook in hooks.iter_mut() {
        hook(nodes, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn strict() -> CompilerConfig {
        CompilerConfig {
            error_handling: ErrorHandling::Strict,
            ..CompilerConfig::default()
        }
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(ErrorKind::InvalidCall), 66);
        assert_eq!(exit_code(ErrorKind::UnresolvedReference), 67);
        assert_eq!(exit_code(ErrorKind::Conversion), 68);
        assert_eq!(exit_code(ErrorKind::NoSuchElement), 69);
        assert_eq!(exit_code(ErrorKind::Io), 70);
        assert_eq!(exit_code(ErrorKind::Runtime), 71);
        assert_eq!(exit_code(ErrorKind::Lexical), 72);
        assert_eq!(exit_code(ErrorKind::Syntax), 72);
        assert_eq!(exit_code(ErrorKind::Localization), 73);
    }

    #[test]
    fn error_chains() {
        let error = anyhow::Error::from(PipelineError::from(Error::UnresolvedReference(
            "nothing".into(),
        )))
        .context("Could not compile doc.md");
        assert_eq!(error_exit_code(&error), 67);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(error_exit_code(&anyhow::Error::from(io).context("reading")), 70);
        assert_eq!(error_exit_code(&anyhow::anyhow!("other")), 1);

        let lexed = dotmark_parser::lexer::Lexer::new(
            ".call {unclosed\n",
            dotmark_parser::lexer::patterns::block_patterns(dotmark_parser::Flavor::Extended),
        )
        .tokenize()
        .unwrap_err();
        assert_eq!(
            error_exit_code(&anyhow::Error::from(lexed.clone()).context("tokenizing")),
            72
        );
        let parsed = ParseError::from(lexed);
        assert_eq!(error_exit_code(&anyhow::Error::from(parsed)), 72);
    }

    #[test]
    fn hooks_run_in_order() {
        let stages = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c, d) = (stages.clone(), stages.clone(), stages.clone(), stages.clone());
        let mut pipeline = Pipeline::new(strict())
            .after_parsing(move |_, ctx| {
                a.borrow_mut()
                    .push(format!("parsed {}", ctx.attributes.queue.len()))
            })
            .after_expanding(move |_, ctx| {
                b.borrow_mut()
                    .push(format!("expanded {}", ctx.attributes.queue.len()))
            })
            .after_tree_visiting(move |_, ctx| {
                let toc = ctx.attributes.table_of_contents.as_ref().map_or(0, |t| t.items.len());
                c.borrow_mut().push(format!("visited {}", toc))
            })
            .after_rendering(move |output, _| d.borrow_mut().push(output.trim().to_string()));

        let compiled = pipeline.compile("# Title\n\n.sum {1} {2}\n").unwrap();
        assert_eq!(compiled.output, "Title\n\n3\n\n");
        assert_eq!(
            *stages.borrow(),
            vec!["parsed 1", "expanded 0", "visited 1", "Title\n\n3"]
        );
    }

    #[test]
    fn strict_handling_stops() {
        let result = Pipeline::new(strict()).compile(".nothing\n");
        match result {
            Err(e) => assert_eq!(e.exit_code(), 67),
            Ok(_) => panic!("compilation should fail"),
        }
    }

    #[test]
    fn lambda_bodies_follow_the_error_policy() {
        let source = ".foreach {.range {1} {2}}\n    n:\n    Item .n and .nosuch\n";

        let compiled = Pipeline::new(CompilerConfig::default()).compile(source).unwrap();
        assert_eq!(compiled.errors, 2);
        assert!(compiled.output.contains("Item 1"), "{}", compiled.output);
        assert!(compiled.output.contains("Item 2"), "{}", compiled.output);
        assert!(compiled.output.contains("Error in 'nosuch'"));
        assert!(!compiled.output.contains("Error in 'foreach'"));

        match Pipeline::new(strict()).compile(source) {
            Err(e) => assert_eq!(e.exit_code(), 67),
            Ok(_) => panic!("compilation should fail"),
        }
    }

    #[test]
    fn logged_errors_are_counted() {
        let compiled = Pipeline::new(CompilerConfig::default())
            .compile(".nothing\n\n.divide {1} by:{0}\n\nText\n")
            .unwrap();
        assert_eq!(compiled.errors, 2);
        assert!(compiled.output.contains("Text"));
        assert!(compiled.output.contains("Error in 'nothing'"));
    }

    #[test]
    fn json_dump() {
        let compiled = Pipeline::new(strict()).compile("# Intro\n").unwrap();
        let json: serde_json::Value = serde_json::from_str(&compiled.to_json().unwrap()).unwrap();
        assert_eq!(json["document"]["type"], "plain");
        assert_eq!(json["attributes"]["identifiers"]["0"], "intro");
        assert!(json["nodes"].is_array());
    }
}
