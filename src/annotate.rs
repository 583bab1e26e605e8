//! Line-numbered source listings.

use lazy_static::lazy_static;
use regex::Regex;

use crate::language::Language;

lazy_static! {
    /// Interpreter lines, the Guile `!#` terminator, editor mode lines and `#pragma once`.
    static ref MARKERS: Regex =
        Regex::new(r"(^#!.*$)|(!#)|(^.+ -\*- [a-z+-]+ -\*-.*$)|(^#pragma +once.*$)")
            .expect("Failed to compile regex");
}

/// Produce a listing of `source` with a right-aligned line number comment on each line.
///
/// Blank lines and lines that are already full-line comments are left untouched but still
/// counted, so the numbers always match the listing's own line positions.
pub fn annotate(source: &str, language: Language) -> String {
    let lines = trim_blank_lines(
        source
            .lines()
            .map(|line| MARKERS.replace_all(line, "").trim_end().to_string())
            .collect(),
    );
    if lines.is_empty() {
        return String::new();
    }

    let token = language.comment_token();
    let width = lines
        .iter()
        .filter(|line| is_annotated(line, language))
        .map(|line| line.chars().count())
        .max()
        .unwrap_or_default();
    let digits = lines.len().to_string().len();

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if is_annotated(line, language) {
                format!("{line:<width$}  {token} {n:>digits$}", n = i + 1)
            } else {
                line.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop leading and trailing blank lines.
pub fn trim_blank_lines(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let first = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    lines.drain(..first);
    lines
}

/// Trim surrounding blank lines from a block of text.
pub fn trim_blank_text(text: &str) -> String {
    trim_blank_lines(text.lines().map(str::to_string).collect()).join("\n")
}

fn is_annotated(line: &str, language: Language) -> bool {
    !line.trim().is_empty() && !is_comment(line, language)
}

/// Whether `line` holds nothing but a comment.
fn is_comment(line: &str, language: Language) -> bool {
    let line = line.trim_start();
    if line.starts_with(language.comment_token()) {
        return true;
    }

    match language {
        Language::Lisp | Language::Scheme => line.starts_with(';'),
        _ if language.has_block_comments() => {
            line.starts_with("/*") || line.starts_with("*/") || line.starts_with("* ") || line == "*"
        }
        _ => false,
    }
}
