//! Comment text normalization.
//!
//! Text runs are split on any newline convention, each line is trimmed and
//! empty lines are dropped. `<code>` blocks become fenced blocks whose
//! content is kept verbatim (minus common indentation). Fences already
//! present in the input are honoured, so the output normalizes to itself.

use crate::model::{CommentFragment, CommentNode};

/// Info string for emitted code fences.
pub const CODE_LANGUAGE: &str = "c#";

/// Normalize an optional fragment. Absent comments yield empty text.
pub fn normalize(fragment: Option<&CommentFragment>) -> String {
    let Some(fragment) = fragment else {
        return String::new();
    };

    let mut lines = LineBuffer::default();
    for node in &fragment.nodes {
        match node {
            CommentNode::Text(text) => lines.push_text(text),
            CommentNode::Inline(text) => lines.push_inline(text),
            CommentNode::Code(code) => lines.push_code(code),
            CommentNode::Break => lines.end_line(),
        }
    }
    lines.finish()
}

#[derive(Default)]
struct LineBuffer {
    out: Vec<String>,
    current: String,
    in_fence: bool,
}

impl LineBuffer {
    fn push_text(&mut self, text: &str) {
        for (i, segment) in split_lines(text).into_iter().enumerate() {
            if i > 0 {
                self.end_line();
            }
            self.current.push_str(segment);
        }
    }

    fn push_inline(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.in_fence {
            self.current.push_str(text);
        } else {
            self.current.push('`');
            self.current.push_str(text);
            self.current.push('`');
        }
    }

    fn push_code(&mut self, code: &str) {
        self.end_line();
        let body = unindent(code);
        if body.is_empty() {
            return;
        }
        self.out.push(format!("```{}", CODE_LANGUAGE));
        self.out.extend(body);
        self.out.push("```".to_string());
    }

    fn end_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        let trimmed = line.trim();

        if self.in_fence {
            if trimmed.starts_with("```") {
                self.in_fence = false;
                self.out.push(trimmed.to_string());
            } else {
                self.out.push(line.trim_end().to_string());
            }
            return;
        }

        if trimmed.is_empty() {
            return;
        }
        if trimmed.starts_with("```") {
            self.in_fence = true;
        }
        self.out.push(trimmed.to_string());
    }

    fn finish(mut self) -> String {
        self.end_line();
        self.out.join("\n")
    }
}

/// Split on `\r\n`, `\r` or `\n`.
fn split_lines(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(['\r', '\n']) {
        segments.push(&rest[..pos]);
        let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[pos + skip..];
    }
    segments.push(rest);
    segments
}

const INDENT: [char; 2] = [' ', '\t'];

/// Drop surrounding blank lines and the space/tab indentation shared by all
/// lines. Other leading whitespace is part of the code.
fn unindent(code: &str) -> Vec<String> {
    let lines: Vec<&str> = split_lines(code).into_iter().map(str::trim_end).collect();

    let Some(start) = lines.iter().position(|l| !l.is_empty()) else {
        return Vec::new();
    };
    let end = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(start);

    let body = &lines[start..=end];
    let indent = body
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start_matches(INDENT).len())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|l| l.get(indent..).unwrap_or("").to_string())
        .collect()
}
