// src/dag/document.rs

//! Text rendering of the DAG document handed to the execution engine.
//!
//! ```text
//! KEY=value
//! # comment
//! target1 target2: dep1 dep2
//! 	[LOCAL ]command
//! ```

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::job::model::Rule;

static HEADER_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Header keys are referenced as `$KEY` in commands, so they must be plain
/// identifiers.
pub fn is_valid_header_key(key: &str) -> bool {
    HEADER_KEY.is_match(key)
}

/// Render headers followed by one block per rule.
///
/// Callers are responsible for refusing empty documents; this function just
/// formats what it is given.
pub fn render_document(headers: &[(String, String)], rules: &[Rule]) -> String {
    let mut out = String::new();

    for (key, value) in headers {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{key}={value}");
    }

    for rule in rules {
        render_rule(&mut out, rule);
    }

    out
}

fn render_rule(out: &mut String, rule: &Rule) {
    match rule.comment.as_deref() {
        Some(comment) if !comment.is_empty() => {
            let _ = writeln!(out, "# {}", single_line(comment));
        }
        _ => out.push_str("#\n"),
    }

    let targets = rule.targets.join(" ");
    if rule.dependencies.is_empty() {
        let _ = writeln!(out, "{targets}:");
    } else {
        let _ = writeln!(out, "{targets}: {}", rule.dependencies.join(" "));
    }

    let _ = writeln!(out, "\t{}", rule.command_line());
}

/// A newline inside a comment would end the comment early.
fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

/// Count the rule blocks in a rendered document.
pub fn count_rule_blocks(document: &str) -> usize {
    document.lines().filter(|line| line.starts_with('#')).count()
}
