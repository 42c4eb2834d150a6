//! Renders restricted imports into the report text attached to diagnostics.
//!
//! The output is a stability contract: downstream tooling pattern-matches on
//! it, so the exact indentation and blank-line placement matter. Rendering is
//! pure text transformation over what the scanner already captured.

use crate::types::RestrictedImport;

/// Renders `imports` under an intro line.
///
/// Each import becomes a bullet block. With `detailed` the block carries the
/// captured statement text and, when present, the decider's parenthesized
/// info; without it only the quoted path and line remain. The report always
/// ends with exactly one blank line.
pub fn render_report(imports: &[RestrictedImport], intro: &str, detailed: bool) -> String {
    let body: String = imports.iter().map(|import| bullet(import, detailed)).collect();
    format!("{intro}\n\n{}\n\n", indent_by(2, &body).trim_end())
}

fn bullet(import: &RestrictedImport, detailed: bool) -> String {
    let head = format!("• {}, imported on line {}", quote(&import.path), import.line);
    match &import.statement {
        Some(statement) if detailed => {
            let info = match &import.info {
                Some(info) => format!("{}\n\n", indent_by(2, &format!("({info})"))),
                None => String::new(),
            };
            // 6 = bullet, space and 4 more for the statement block.
            format!("{head}:\n\n{}\n\n{info}\n", indent_by(6, statement))
        }
        _ => format!("{head}\n"),
    }
}

fn quote(s: &str) -> String {
    format!("\"{s}\"")
}

/// Indents every non-empty line of `s` by `n` spaces. Empty lines stay empty
/// so reports never carry trailing whitespace.
fn indent_by(n: usize, s: &str) -> String {
    let pad = " ".repeat(n);
    s.split('\n')
        .map(|line| if line.is_empty() { String::new() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}
