use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

// Derived from the source path, so every element of one document maps to the
// same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentIdentity(String);

impl DocumentIdentity {
    pub fn from_source_path(source_path: &str) -> Self {
        let digest = blake3::hash(source_path.as_bytes());
        let hex = digest.to_hex();
        Self(format!("doc_{}", &hex.as_str()[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn callable_name(&self, ordinal: usize) -> String {
        format!("{}Func{}", self.0, ordinal)
    }

    pub fn scope_name(&self) -> String {
        format!("RunCode_{}", self.0)
    }

    // Unique per compilation.
    pub fn artifact_name(&self) -> String {
        format!("{}_{}", self.scope_name(), uuid::Uuid::new_v4().simple())
    }
}

impl fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ElementPath(pub Vec<usize>);

impl ElementPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indexes = self.0.clone();
        indexes.push(index);
        Self(indexes)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        let parts = self
            .0
            .iter()
            .map(|index| index.to_string())
            .collect::<Vec<_>>();
        f.write_str(&parts.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptKind {
    Statement,
    Definition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptElement {
    pub path: ElementPath,
    pub code: String,
    pub kind: ScriptKind,
    pub document_order: usize,
    pub location: SourceSpan,
}

impl ScriptElement {
    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }

    // Only statements with code get a generated callable, and so an ordinal.
    pub fn consumes_ordinal(&self) -> bool {
        self.kind == ScriptKind::Statement && !self.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub line: Option<usize>,
    pub origin: Option<SourceSpan>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            origin: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.origin, self.line) {
            (Some(origin), _) => write!(
                f,
                "{} (document line {}, column {})",
                self.message, origin.start.line, origin.start.column
            ),
            (None, Some(line)) => write!(f, "{} (unit line {})", self.message, line),
            (None, None) => f.write_str(&self.message),
        }
    }
}

pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
