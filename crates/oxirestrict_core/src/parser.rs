use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::{SourceType, Span};
use std::path::Path;

use crate::types::FoundImport;

/// Scans `source` for module-path literals in import/export statements.
///
/// Only statements directly beneath the file root are inspected: plain
/// imports, re-exports with a source clause, `export *`, and the legacy
/// `import x = require("m")` form. Statements nested inside namespace or
/// module blocks cannot reference modules, so the walk never descends into
/// them. Results come back in document order.
///
/// With `record_statements` the trimmed source text of each matching
/// statement is captured alongside the path, for use in detailed reports.
pub fn imports_in(source: &str, file_name: &str, record_statements: bool) -> Vec<FoundImport> {
    let st = source_type_for(Path::new(file_name));
    let allocator = Allocator::default();
    let ParserReturn { program, errors, .. } = OxcParser::new(&allocator, source, st).parse();
    if !errors.is_empty() {
        debug!("Parser reported {} diagnostics in {}", errors.len(), file_name);
    }

    let line_starts = line_starts(source);
    let mut found: Vec<FoundImport> = Vec::new();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                trace!("Found import declaration: '{}' in {}", decl.source.value, file_name);
                push_found(&mut found, source, &line_starts, decl.span, &decl.source, record_statements);
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(src) = &decl.source {
                    trace!("Found re-export: '{}' in {}", src.value, file_name);
                    push_found(&mut found, source, &line_starts, decl.span, src, record_statements);
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                trace!("Found export-all: '{}' in {}", decl.source.value, file_name);
                push_found(&mut found, source, &line_starts, decl.span, &decl.source, record_statements);
            }
            Statement::TSImportEqualsDeclaration(decl) => {
                // Only `import x = require("m")` carries a module path; the
                // entity-name form aliases a namespace and is skipped.
                if let TSModuleReference::ExternalModuleReference(ext) = &decl.module_reference {
                    trace!("Found import-equals: '{}' in {}", ext.expression.value, file_name);
                    push_found(
                        &mut found,
                        source,
                        &line_starts,
                        decl.span,
                        &ext.expression,
                        record_statements,
                    );
                }
            }
            _ => {}
        }
    }

    debug!("Found {} import paths in {}", found.len(), file_name);
    found
}

fn push_found(
    out: &mut Vec<FoundImport>,
    source: &str,
    line_starts: &[u32],
    statement_span: Span,
    literal: &StringLiteral,
    record_statements: bool,
) {
    let statement = record_statements
        .then(|| source[statement_span.start as usize..statement_span.end as usize].trim().to_string());
    out.push(FoundImport {
        path: literal.value.to_string(),
        line: line_of(line_starts, literal.span.start),
        statement,
    });
}

/// Byte offsets at which each line begins, starting with line 1 at offset 0.
fn line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i as u32 + 1);
        }
    }
    starts
}

/// 1-indexed line containing `offset`.
fn line_of(line_starts: &[u32], offset: u32) -> usize {
    line_starts.partition_point(|start| *start <= offset)
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    // ESM heuristic - .mjs, .mts are ES modules
    if matches!(ext, Some("mjs") | Some("mts")) {
        st = st.with_module(true);
    }

    st
}
