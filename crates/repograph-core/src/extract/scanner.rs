//! Line-level declaration scanning shared by the language scanners.

use crate::entity::EntityKind;

/// A declaration found on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: EntityKind,
    pub name: String,
    /// 1-based line number.
    pub line_number: usize,
    /// The trimmed declaration line.
    pub line: String,
}

/// Produces child declarations from the text of one file.
///
/// Scanners are heuristic: a line they cannot make sense of is skipped,
/// never reported as an error.
pub trait Scanner: Send + Sync {
    fn scan(&self, text: &str) -> Vec<Declaration>;
}

/// Scanner for languages without heuristics: modules only.
pub struct UnknownScanner;

impl Scanner for UnknownScanner {
    fn scan(&self, _text: &str) -> Vec<Declaration> {
        Vec::new()
    }
}

/// Tracks the indentation of every class still open, innermost last.
///
/// A non-blank line at or left of a class's indentation closes that class
/// and every class nested in it.
#[derive(Debug, Default)]
pub(crate) struct ClassScope {
    indents: Vec<usize>,
}

impl ClassScope {
    pub(crate) fn observe(&mut self, indent: usize) {
        while self.indents.last().is_some_and(|&class_indent| indent <= class_indent) {
            self.indents.pop();
        }
    }

    pub(crate) fn open(&mut self, indent: usize) {
        self.indents.push(indent);
    }

    pub(crate) fn encloses(&self, indent: usize) -> bool {
        self.indents.last().is_some_and(|&class_indent| indent > class_indent)
    }

    pub(crate) fn routine_kind(&self, indent: usize) -> EntityKind {
        if self.encloses(indent) {
            EntityKind::Method
        } else {
            EntityKind::Subroutine
        }
    }
}

/// Width of the leading whitespace of a raw line.
pub(crate) fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(is_identifier_char)
        }
        _ => false,
    }
}

/// Leading identifier of `s`, if any.
pub(crate) fn leading_identifier(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|(_, c)| !is_identifier_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let ident = &s[..end];
    is_identifier(ident).then_some(ident)
}
