use log::debug;
use std::path::Path;
use thiserror::Error;

use oxirestrict_core::{Resolve, ResolveContext, check_async, render_report};

use crate::options::{DEFAULT_INFO, LoaderOptions, OptionsError, Severity};

/// Diagnostic sinks supplied by the build host. Errors block the build,
/// warnings do not; both leave the current scan running.
pub trait LoaderHost {
    fn emit_error(&mut self, message: String);
    fn emit_warning(&mut self, message: String);
}

/// How a scan can fail. Hosts need to tell "stop the build now" apart from
/// "diagnostic recorded, keep going", so the variants stay distinct.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The rule set was malformed; no scan ran.
    #[error(transparent)]
    Options(#[from] OptionsError),
    /// A rule with fatal severity matched. The message is the same rendered
    /// report an error diagnostic would have carried.
    #[error("{message}")]
    Restricted { message: String },
    /// The scan itself failed, e.g. the resolver rejected a request.
    #[error(transparent)]
    Check(#[from] anyhow::Error),
}

/// Scans `source` against `options` and dispatches each matching rule at its
/// severity.
///
/// Every rule is evaluated to completion before any severity is applied, so
/// a fatal match only cuts off dispatch of the rules after it, never their
/// evaluation. Rules are dispatched in declaration order.
pub async fn run<H: LoaderHost>(
    host: &mut H,
    resolver: &dyn Resolve,
    file: &Path,
    source: &str,
    options: &LoaderOptions,
) -> Result<(), LoaderError> {
    let detailed = options.detailed_error_messages;
    let from_dir = file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let ctx = ResolveContext { from_dir, resolver };
    let file_name = file.to_string_lossy();

    let matrix = check_async(
        source,
        options.rules.iter().map(|rule| &rule.restricted),
        &file_name,
        detailed,
        &ctx,
    )
    .await?;

    for (rule, restricted) in options.rules.iter().zip(matrix) {
        if restricted.is_empty() {
            continue;
        }
        let severity = rule.severity.unwrap_or(options.severity);
        let info = rule.info.as_deref().unwrap_or(DEFAULT_INFO);
        let message = render_report(&restricted, info, detailed);
        debug!(
            "Rule matched {} imports in {} at {:?} severity",
            restricted.len(),
            file.display(),
            severity
        );
        match severity {
            Severity::Fatal => return Err(LoaderError::Restricted { message }),
            Severity::Error => host.emit_error(message),
            Severity::Warning => host.emit_warning(message),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Rule;
    use anyhow::Result;
    use async_trait::async_trait;
    use oxirestrict_core::matching_package;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Diagnostics {
        errors: Vec<String>,
        warnings: Vec<String>,
    }

    impl LoaderHost for Diagnostics {
        fn emit_error(&mut self, message: String) {
            self.errors.push(message);
        }

        fn emit_warning(&mut self, message: String) {
            self.warnings.push(message);
        }
    }

    /// Fails every request; fine for rule sets that never resolve.
    struct NoResolve;

    #[async_trait]
    impl Resolve for NoResolve {
        async fn resolve(&self, _from_dir: &Path, request: &str) -> Result<PathBuf> {
            Err(anyhow::anyhow!("cannot resolve \"{request}\""))
        }
    }

    const SOURCE: &str = "import * as _ from \"typescript\";\nimport \"./local\";\n";

    async fn run_with(
        options: &LoaderOptions,
        source: &str,
    ) -> (Result<(), LoaderError>, Diagnostics) {
        let mut host = Diagnostics::default();
        let outcome =
            run(&mut host, &NoResolve, Path::new("src/main.ts"), source, options).await;
        (outcome, host)
    }

    #[tokio::test]
    async fn test_error_severity_registers_and_continues() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![
                Rule::new(matching_package("typescript")),
                Rule::new(matching_package("lodash")),
            ],
        )
        .unwrap();
        let (outcome, host) = run_with(&options, SOURCE).await;
        assert!(outcome.is_ok());
        assert_eq!(host.errors.len(), 1);
        assert!(host.warnings.is_empty());
        assert!(host.errors[0].contains("\"typescript\""));
        assert!(host.errors[0].contains("import * as _ from \"typescript\";"));
    }

    #[tokio::test]
    async fn test_warning_severity_is_advisory() {
        let options = LoaderOptions::new(
            Severity::Warning,
            vec![Rule::new(matching_package("typescript"))],
        )
        .unwrap();
        let (outcome, host) = run_with(&options, SOURCE).await;
        assert!(outcome.is_ok());
        assert!(host.errors.is_empty());
        assert_eq!(host.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_fatal_halts_dispatch_of_later_rules() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![
                Rule::new(matching_package("typescript")).with_severity(Severity::Warning),
                Rule::new(matching_package("typescript")).with_severity(Severity::Fatal),
                Rule::new(matching_package("./local")).with_severity(Severity::Error),
            ],
        )
        .unwrap();
        let (outcome, host) = run_with(&options, SOURCE).await;

        // The warning rule before the fatal one already dispatched; the
        // error rule after it never did.
        assert!(matches!(outcome, Err(LoaderError::Restricted { .. })));
        assert_eq!(host.warnings.len(), 1);
        assert!(host.errors.is_empty());
    }

    #[tokio::test]
    async fn test_fatal_message_is_the_rendered_report() {
        let options = LoaderOptions::new(
            Severity::Fatal,
            vec![Rule::new(matching_package("typescript"))],
        )
        .unwrap();
        let (outcome, _) = run_with(&options, SOURCE).await;
        match outcome {
            Err(LoaderError::Restricted { message }) => {
                assert!(message.starts_with("Found restricted imports:\n"));
                assert!(message.contains("• \"typescript\", imported on line 1:"));
            }
            other => panic!("expected a fatal match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_per_rule_info_overrides_the_default() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![Rule::new(matching_package("typescript")).with_info("Compile without the compiler:")],
        )
        .unwrap();
        let (_, host) = run_with(&options, SOURCE).await;
        assert!(host.errors[0].starts_with("Compile without the compiler:\n"));
    }

    #[tokio::test]
    async fn test_plain_reports_without_details() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![Rule::new(matching_package("typescript"))],
        )
        .unwrap()
        .with_details(false);
        let (_, host) = run_with(&options, SOURCE).await;
        assert!(host.errors[0].contains("• \"typescript\", imported on line 1\n"));
        assert!(!host.errors[0].contains("import * as _"));
    }

    #[tokio::test]
    async fn test_clean_file_emits_nothing() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![Rule::new(matching_package("left-pad"))],
        )
        .unwrap();
        let (outcome, host) = run_with(&options, "const x = 1;\n").await;
        assert!(outcome.is_ok());
        assert!(host.errors.is_empty());
        assert!(host.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_failure_is_a_check_error() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![Rule::new(oxirestrict_core::outside_directories(vec![PathBuf::from("/src")]))],
        )
        .unwrap();
        let (outcome, host) = run_with(&options, SOURCE).await;
        assert!(matches!(outcome, Err(LoaderError::Check(_))));
        assert!(host.errors.is_empty());
        assert!(host.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_all_rules_evaluate_independently() {
        let options = LoaderOptions::new(
            Severity::Error,
            vec![
                Rule::new(matching_package("typescript")),
                Rule::new(matching_package("./local")),
            ],
        )
        .unwrap();
        let (outcome, host) = run_with(&options, SOURCE).await;
        assert!(outcome.is_ok());
        assert_eq!(host.errors.len(), 2);
    }
}
