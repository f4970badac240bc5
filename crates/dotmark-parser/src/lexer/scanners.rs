//! Walkers measuring constructs whose end a regular expression can't find on its own.
use super::{Walked, WalkedResult};
use crate::common::indentation_width;
use crate::walker::{block_call, WalkError};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref INTERRUPTION: Regex = Regex::new(
        r"^ {0,3}(?:#{1,6}(?:[ \t]|$)|`{3,}|~{3,}|>|[*+-](?:[ \t]|$)|1[.)](?:[ \t]|$)|(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$)"
    )
    .expect("invalid regex expression");
    static ref EXTENDED_INTERRUPTION: Regex =
        Regex::new(r"^ {0,3}(?:\$\$\$|<<<[ \t]*$|\$[ \t])").expect("invalid regex expression");
    static ref BULLET_MARKER: Regex =
        Regex::new(r"^[*+-](?:[ \t]|$)").expect("invalid regex expression");
    static ref ORDERED_MARKER: Regex =
        Regex::new(r"^\d{1,9}[.)](?:[ \t]|$)").expect("invalid regex expression");
}

/// Lines of `input` as `(start, content, end)`, where `end` includes the line terminator.
fn lines(input: &str) -> impl Iterator<Item = (usize, &str, usize)> {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= input.len() {
            return None;
        }
        let line_start = start;
        let (content, end) = match input[start..].find('\n') {
            Some(idx) => (&input[start..start + idx], start + idx + 1),
            None => (&input[start..], input.len()),
        };
        start = end;
        Some((line_start, content, end))
    })
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn interrupts_paragraph(line: &str) -> bool {
    INTERRUPTION.is_match(line)
}

fn interrupts_extended_paragraph(line: &str) -> bool {
    if interrupts_paragraph(line) || EXTENDED_INTERRUPTION.is_match(line) {
        return true;
    }
    let trimmed = line.trim_start();
    trimmed.starts_with('.')
        && indentation_width(line) < 4
        && matches!(block_call(trimmed), Ok(Some(_)))
}

fn measured(end: usize) -> Result<Option<WalkedResult>, WalkError> {
    Ok(Some(WalkedResult {
        value: Walked::Extent,
        end,
    }))
}

fn paragraph_with(
    input: &str,
    interrupts: fn(&str) -> bool,
) -> Result<Option<WalkedResult>, WalkError> {
    let mut end = 0;
    for (start, line, line_end) in lines(input) {
        if start > 0 && (is_blank(line) || interrupts(line)) {
            break;
        }
        end = line_end;
    }
    measured(end)
}

pub(crate) fn paragraph(input: &str, _: &Captures) -> Result<Option<WalkedResult>, WalkError> {
    paragraph_with(input, interrupts_paragraph)
}

pub(crate) fn extended_paragraph(
    input: &str,
    _: &Captures,
) -> Result<Option<WalkedResult>, WalkError> {
    paragraph_with(input, interrupts_extended_paragraph)
}

fn marker(line: &str) -> Option<bool> {
    let trimmed = line.trim_start();
    if BULLET_MARKER.is_match(trimmed) {
        Some(false)
    } else if ORDERED_MARKER.is_match(trimmed) {
        Some(true)
    } else {
        None
    }
}

/// A list continues while lines are items of the same kind, lines indented past the first
/// marker, or lazy paragraph continuations. Blank lines are kept only when the list goes on
/// after them.
fn list(input: &str, ordered: bool) -> Result<Option<WalkedResult>, WalkError> {
    let mut iter = lines(input);
    let Some((_, first, mut end)) = iter.next() else {
        return Ok(None);
    };
    let base = indentation_width(first);
    let mut pending_blank = false;

    for (_, line, line_end) in iter {
        if is_blank(line) {
            pending_blank = true;
            continue;
        }
        let indent = indentation_width(line);
        let item = marker(line);
        let continues = if indent >= base + 2 {
            true
        } else if let Some(kind) = item {
            kind == ordered && indent < 4
        } else {
            !pending_blank && !interrupts_paragraph(line)
        };
        if !continues {
            break;
        }
        end = line_end;
        pending_blank = false;
    }
    measured(end)
}

pub(crate) fn unordered_list(
    input: &str,
    _: &Captures,
) -> Result<Option<WalkedResult>, WalkError> {
    list(input, false)
}

pub(crate) fn ordered_list(input: &str, _: &Captures) -> Result<Option<WalkedResult>, WalkError> {
    list(input, true)
}

pub(crate) fn list_item(input: &str, _: &Captures) -> Result<Option<WalkedResult>, WalkError> {
    item(input)
}

/// A list item runs until the next sibling marker; trailing blank lines are left to the list
/// lexer so that they show up as blank-line tokens between items.
fn item(input: &str) -> Result<Option<WalkedResult>, WalkError> {
    let mut iter = lines(input);
    let Some((_, first, mut end)) = iter.next() else {
        return Ok(None);
    };
    let base = indentation_width(first);
    let mut pending_blank = false;

    for (_, line, line_end) in iter {
        if is_blank(line) {
            pending_blank = true;
            continue;
        }
        let indent = indentation_width(line);
        let continues = if indent >= base + 2 {
            true
        } else {
            marker(line).is_none() && !pending_blank && !interrupts_paragraph(line)
        };
        if !continues {
            break;
        }
        end = line_end;
        pending_blank = false;
    }
    measured(end)
}

pub(crate) fn code_span(input: &str, _: &Captures) -> Result<Option<WalkedResult>, WalkError> {
    backtick_run(input)
}

/// Matches a backtick run with the closing run of the same length.
fn backtick_run(input: &str) -> Result<Option<WalkedResult>, WalkError> {
    let bytes = input.as_bytes();
    let run = |from: usize| bytes[from..].iter().take_while(|b| **b == b'`').count();
    let opening = run(0);

    let mut idx = opening;
    while idx < bytes.len() {
        if bytes[idx] == b'`' {
            let closing = run(idx);
            if closing == opening {
                return measured(idx + closing);
            }
            idx += closing;
        } else {
            idx += 1;
        }
    }
    Ok(None)
}
