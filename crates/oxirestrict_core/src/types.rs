/// One module-path literal found in an import or export statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundImport {
    /// The decoded path text, without the surrounding quotes.
    pub path: String,
    /// 1-indexed line of the path literal.
    pub line: usize,
    /// Trimmed source text of the enclosing statement. Only captured when
    /// statement recording is enabled; scanning without it is cheaper but
    /// reports cannot show the offending statement.
    pub statement: Option<String>,
}

/// A found import that a decider marked as restricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedImport {
    pub path: String,
    pub line: usize,
    pub statement: Option<String>,
    /// Explanation attached by the decider that restricted this import.
    pub info: Option<String>,
}

impl RestrictedImport {
    pub(crate) fn new(import: &FoundImport, info: Option<String>) -> Self {
        Self {
            path: import.path.clone(),
            line: import.line,
            statement: import.statement.clone(),
            info,
        }
    }
}

/// Verdict of a decider for a single import path. `info` is only honored on
/// restricted decisions; allowed paths carry no explanation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    pub restricted: bool,
    pub info: Option<String>,
}

impl Decision {
    pub fn restrict_with(info: impl Into<String>) -> Self {
        Self { restricted: true, info: Some(info.into()) }
    }
}

impl From<bool> for Decision {
    fn from(restricted: bool) -> Self {
        Self { restricted, info: None }
    }
}
