use crate::types::SourceSpan;
use thiserror::Error;

pub const EXTRACTION_ERROR: &str = "RUNCODE_EXTRACTION";
pub const COMPILE_ERROR: &str = "RUNCODE_COMPILE_ERROR";
pub const HANDLE_NOT_FOUND: &str = "RUNCODE_HANDLE_NOT_FOUND";
pub const ELEMENT_NOT_FOUND: &str = "RUNCODE_ELEMENT_NOT_FOUND";
pub const RUNTIME_ERROR: &str = "RUNCODE_RUNTIME_ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Extraction,
    Compile,
    Lookup,
    Runtime,
    Document,
    Config,
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct RunCodeError {
    pub code: String,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl RunCodeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(
        code: impl Into<String>,
        message: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code.as_str() {
            EXTRACTION_ERROR => ErrorKind::Extraction,
            COMPILE_ERROR => ErrorKind::Compile,
            HANDLE_NOT_FOUND | ELEMENT_NOT_FOUND => ErrorKind::Lookup,
            RUNTIME_ERROR => ErrorKind::Runtime,
            code if code.starts_with("CONFIG_") => ErrorKind::Config,
            _ => ErrorKind::Document,
        }
    }

    // Compile and lookup failures hold for the rest of the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Compile | ErrorKind::Lookup)
    }
}
