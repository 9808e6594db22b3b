//! Tab-indented text writer for generated sources.

use std::cell::Cell;
use std::rc::Rc;

/// Accumulates generated text, indenting every line it is given.
///
/// Indentation is tracked through an [`IndentGuard`] so a nested scope can
/// indent while still writing through the same `&mut CodeWriter`.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    level: Rc<Cell<usize>>,
}

/// Keeps the writer indented one level deeper until dropped.
#[must_use = "indentation ends when the guard is dropped"]
pub struct IndentGuard {
    level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.level.set(self.level.get().saturating_sub(1));
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` as one or more lines. Embedded newlines start new
    /// indented lines; a single trailing newline is ignored.
    pub fn line(&mut self, text: &str) {
        let text = text.strip_suffix('\n').unwrap_or(text);
        for l in text.split('\n') {
            if !l.is_empty() {
                for _ in 0..self.level.get() {
                    self.out.push('\t');
                }
                self.out.push_str(l);
            }
            self.out.push('\n');
        }
    }

    /// Write each line of a pre-rendered fragment; empty fragments write nothing.
    pub fn fragment(&mut self, text: &str) {
        if !text.is_empty() {
            self.line(text);
        }
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Append text rendered by another writer, unchanged.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn indent(&mut self) -> IndentGuard {
        self.level.set(self.level.get() + 1);
        IndentGuard {
            level: Rc::clone(&self.level),
        }
    }

    /// `header {`, the body one level deeper, then `}`.
    pub fn block(&mut self, header: &str, body: impl FnOnce(&mut Self)) {
        self.line(&format!("{header} {{"));
        {
            let _indent = self.indent();
            body(self);
        }
        self.line("}");
    }

    pub fn indent_level(&self) -> usize {
        self.level.get()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}
