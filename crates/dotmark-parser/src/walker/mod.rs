//! Hand-written walker for the function-call grammar:
//!
//! ```text
//! .name {positional} named:{value}::chained {argument}
//!     indented body
//! ```
//!
//! Braces nest and can be escaped as `\{` and `\}`. A chained call receives the previous call as
//! its first positional argument. Only block calls take a body, and a block call must be the
//! only content of its line.
use crate::common::{indentation_width, trim_indent};
use crate::lexer::{Walked, WalkedResult};
use regex::Captures;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkedArgument {
    pub name: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkedCall {
    pub name: String,
    pub arguments: Vec<WalkedArgument>,
    pub body: Option<String>,
    /// The call this one is chained into with `::`.
    pub chained: Option<Box<WalkedCall>>,
}

impl WalkedCall {
    fn last_mut(&mut self) -> &mut WalkedCall {
        match self.chained {
            Some(ref mut next) => next.last_mut(),
            None => self,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// `at` is the opening brace, `end` the end of its line.
    #[error("unbalanced braces in an argument of '{call}' at offset {at}")]
    UnbalancedBraces { call: String, at: usize, end: usize },
    #[error("expected a function name after '::' at offset {at}")]
    MissingChainedName { at: usize },
}

impl WalkError {
    /// Moves the error positions onto an enclosing source.
    pub fn map_positions(self, map: impl Fn(usize) -> usize) -> Self {
        match self {
            WalkError::UnbalancedBraces { call, at, end } => WalkError::UnbalancedBraces {
                call,
                at: map(at),
                end: if end > at { map(end - 1) + 1 } else { map(at) },
            },
            WalkError::MissingChainedName { at } => WalkError::MissingChainedName { at: map(at) },
        }
    }

    pub fn range(&self) -> Range<usize> {
        match self {
            WalkError::UnbalancedBraces { at, end, .. } => *at..(*end).max(*at + 1),
            WalkError::MissingChainedName { at } => *at..*at + 1,
        }
    }
}

struct CallWalker<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> CallWalker<'a> {
    fn new(input: &'a str) -> Self {
        CallWalker { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_inline_whitespace(&mut self) {
        let skipped = self
            .rest()
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count();
        self.pos += skipped;
    }

    fn word(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        let word = &rest[..len];
        // Digits only name lambda placeholders; a name can't mix a leading digit with letters.
        let numeric = word.chars().all(|c| c.is_ascii_digit());
        if word.starts_with(|c: char| c.is_ascii_digit()) && !numeric {
            return None;
        }
        self.pos += len;
        Some(word)
    }

    /// `name` or `library/name`.
    fn function_name(&mut self) -> Option<String> {
        let first = self.word()?;
        let checkpoint = self.pos;
        if self.eat("/") {
            if let Some(second) = self.word() {
                return Some(format!("{}/{}", first, second));
            }
            self.pos = checkpoint;
        }
        Some(first.to_string())
    }

    fn call(&mut self) -> Result<Option<WalkedCall>, WalkError> {
        if !self.eat(".") {
            return Ok(None);
        }
        let Some(name) = self.function_name() else {
            return Ok(None);
        };
        let arguments = self.arguments(&name)?;
        let mut segments = vec![WalkedCall {
            name,
            arguments,
            body: None,
            chained: None,
        }];

        while self.eat("::") {
            let at = self.pos;
            let name = self
                .function_name()
                .ok_or(WalkError::MissingChainedName { at })?;
            let arguments = self.arguments(&name)?;
            segments.push(WalkedCall {
                name,
                arguments,
                body: None,
                chained: None,
            });
        }

        let mut call = segments.pop();
        while let Some(mut previous) = segments.pop() {
            previous.chained = call.map(Box::new);
            call = Some(previous);
        }
        Ok(call)
    }

    fn arguments(&mut self, call: &str) -> Result<Vec<WalkedArgument>, WalkError> {
        let mut arguments = Vec::new();
        while let Some(argument) = self.argument(call)? {
            arguments.push(argument);
        }
        Ok(arguments)
    }

    fn argument(&mut self, call: &str) -> Result<Option<WalkedArgument>, WalkError> {
        let checkpoint = self.pos;
        self.skip_inline_whitespace();

        let mut name = None;
        if self.peek() != Some('{') {
            let named_at = self.pos;
            match self.word() {
                Some(word) if self.eat(":") => {
                    self.skip_inline_whitespace();
                    name = Some(word.to_string());
                }
                _ => self.pos = named_at,
            }
        }

        if self.peek() != Some('{') {
            self.pos = checkpoint;
            return Ok(None);
        }
        let value = self.braced(call)?;
        Ok(Some(WalkedArgument { name, value }))
    }

    /// Reads a `{...}` group, returning its trimmed, unescaped content.
    fn braced(&mut self, call: &str) -> Result<String, WalkError> {
        let start = self.pos;
        self.pos += 1;
        let mut depth = 1;
        let mut value = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((idx, c)) = chars.next() {
            match c {
                '\\' => match chars.clone().next() {
                    Some((_, escaped @ ('{' | '}'))) => {
                        value.push(escaped);
                        chars.next();
                    }
                    _ => value.push(c),
                },
                '{' => {
                    depth += 1;
                    value.push(c);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += idx + 1;
                        return Ok(value.trim().to_string());
                    }
                    value.push(c);
                }
                _ => value.push(c),
            }
        }

        let line = self.input[start..].find('\n').unwrap_or(self.input.len() - start);
        Err(WalkError::UnbalancedBraces {
            call: call.to_string(),
            at: start,
            end: start + line,
        })
    }
}

/// Collects the indented lines following a block call, returning the dedented body and the
/// number of bytes it spans.
fn body(input: &str) -> Option<(String, usize)> {
    let mut end = 0;
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        offset += line.len();
        if content.trim().is_empty() {
            continue;
        }
        if indentation_width(content) < 2 {
            break;
        }
        end = offset;
    }
    if end == 0 {
        return None;
    }
    Some((trim_indent(&input[..end]), end))
}

/// Walks a block-level call (with optional body) at the start of `input`.
pub fn block_call(input: &str) -> Result<Option<WalkedResult>, WalkError> {
    let indent = input.len() - input.trim_start_matches(' ').len();
    if indent > 3 {
        return Ok(None);
    }
    let mut walker = CallWalker::new(input);
    walker.pos = indent;
    let Some(mut call) = walker.call()? else {
        return Ok(None);
    };

    let rest = walker.rest();
    let line_len = rest.find('\n').unwrap_or(rest.len());
    if !rest[..line_len].trim().is_empty() {
        return Ok(None);
    }
    let mut end = walker.pos + line_len;
    if end < input.len() {
        end += 1;
    }

    if let Some((text, len)) = body(&input[end..]) {
        call.last_mut().body = Some(text);
        end += len;
    }

    Ok(Some(WalkedResult {
        value: Walked::FunctionCall(call),
        end,
    }))
}

/// Walks an inline call at the start of `input`. Inline calls never take a body.
pub fn inline_call(input: &str) -> Result<Option<WalkedResult>, WalkError> {
    let mut walker = CallWalker::new(input);
    let Some(call) = walker.call()? else {
        return Ok(None);
    };
    Ok(Some(WalkedResult {
        value: Walked::FunctionCall(call),
        end: walker.pos,
    }))
}

pub(crate) fn walk_block_call(
    input: &str,
    _: &Captures,
) -> Result<Option<WalkedResult>, WalkError> {
    block_call(input)
}

pub(crate) fn walk_inline_call(
    input: &str,
    _: &Captures,
) -> Result<Option<WalkedResult>, WalkError> {
    inline_call(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walked(result: Result<Option<WalkedResult>, WalkError>) -> (WalkedCall, usize) {
        let result = result.unwrap().expect("expected a call");
        match result.value {
            Walked::FunctionCall(call) => (call, result.end),
            Walked::Extent => panic!("expected a call"),
        }
    }

    fn unnamed(values: &[&str]) -> Vec<WalkedArgument> {
        values
            .iter()
            .map(|v| WalkedArgument {
                name: None,
                value: v.to_string(),
            })
            .collect()
    }

    macro_rules! walker_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<walk_ $name>]() {
                let (input, name, arguments, body): (&str, &str, Vec<&str>, Option<&str>) = $value;
                let (call, _) = walked(block_call(input));
                assert_eq!(call.name, name);
                assert_eq!(call.arguments, unnamed(&arguments));
                assert_eq!(call.body.as_deref(), body);
            }
            }
        )*
        }
    }

    walker_tests! {
        no_arguments: (".function", "function", vec![], None),
        two_arguments: (".function {arg1} {arg2}", "function", vec!["arg1", "arg2"], None),
        nested_braces: (".function {{arg1}} {arg{2}}", "function", vec!["{arg1}", "arg{2}"], None),
        escaped_braces: (".function {arg1\\}}", "function", vec!["arg1}"], None),
        untrimmed_value: (".function {  a b  }", "function", vec!["a b"], None),
        qualified: (".lib/function {x}", "lib/function", vec!["x"], None),
        placeholder: (".1", "1", vec![], None),
        body: (
            ".function {arg}\n  body content\n\n  body content\n",
            "function",
            vec!["arg"],
            Some("body content\n\nbody content"),
        ),
        uneven_body: (
            ".function\n    body content\n  body content",
            "function",
            vec![],
            Some("  body content\nbody content"),
        ),
    }

    #[test]
    fn named_arguments() {
        let (call, _) = walked(block_call(".function {a} name:{b} other: {c}"));
        assert_eq!(
            call.arguments,
            vec![
                WalkedArgument {
                    name: None,
                    value: "a".into()
                },
                WalkedArgument {
                    name: Some("name".into()),
                    value: "b".into()
                },
                WalkedArgument {
                    name: Some("other".into()),
                    value: "c".into()
                },
            ]
        );
    }

    #[test]
    fn chained_calls() {
        let (call, _) = walked(block_call(".foo {x}::bar {y}::baz {z}\n  body\n"));
        assert_eq!(call.name, "foo");
        let bar = call.chained.as_ref().unwrap();
        assert_eq!(bar.name, "bar");
        assert_eq!(bar.arguments, unnamed(&["y"]));
        let baz = bar.chained.as_ref().unwrap();
        assert_eq!(baz.name, "baz");
        assert_eq!(baz.body.as_deref(), Some("body"));
        assert!(call.body.is_none());
    }

    #[test]
    fn block_call_consumes_only_its_body() {
        let input = ".function {x}\n  body\n\nparagraph\n";
        let (_, end) = walked(block_call(input));
        assert_eq!(&input[end..], "\nparagraph\n");
    }

    #[test]
    fn block_call_must_be_alone_on_its_line() {
        assert_eq!(block_call(".function {x} trailing text"), Ok(None));
    }

    #[test]
    fn inline_call_stops_after_arguments() {
        let input = ".name {x} and text";
        let (call, end) = walked(inline_call(input));
        assert_eq!(call.arguments, unnamed(&["x"]));
        assert_eq!(&input[end..], " and text");
    }

    #[test]
    fn inline_call_ignores_trailing_word_with_colon() {
        let input = ".name note: text";
        let (call, end) = walked(inline_call(input));
        assert!(call.arguments.is_empty());
        assert_eq!(&input[end..], " note: text");
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert_eq!(
            inline_call(".function {arg").unwrap_err(),
            WalkError::UnbalancedBraces {
                call: "function".into(),
                at: 10,
                end: 14
            }
        );
        let err = block_call(".function {arg\n    body\n").unwrap_err();
        assert_eq!(err.range(), 10..14);
    }

    #[test]
    fn chain_without_name_is_an_error() {
        assert_eq!(
            inline_call(".foo {x}::{y}").unwrap_err(),
            WalkError::MissingChainedName { at: 10 }
        );
    }

    #[test]
    fn dot_without_name_is_not_a_call() {
        assert_eq!(inline_call(". text"), Ok(None));
        assert_eq!(inline_call(".2abc"), Ok(None));
    }
}
