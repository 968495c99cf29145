//! Excel-style error representation.
//!
//! `ExcelErrorKind` is the closed set of error codes the evaluation core can
//! produce or observe (see the spec's error taxonomy). `ExcelError` pairs a
//! kind with an optional human-readable message for diagnostics; the message
//! never affects equality or display beyond the canonical code.

use std::{error::Error, fmt};

/// The closed set of Excel error codes this engine understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExcelErrorKind {
    Null,
    Ref,
    Name,
    Value,
    Div,
    Na,
    Num,
}

impl fmt::Display for ExcelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
        })
    }
}

impl ExcelErrorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "#null!" => Some(Self::Null),
            "#ref!" => Some(Self::Ref),
            "#name?" => Some(Self::Name),
            "#value!" => Some(Self::Value),
            "#div/0!" => Some(Self::Div),
            "#n/a" => Some(Self::Na),
            "#num!" => Some(Self::Num),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExcelError {
    pub kind: ExcelErrorKind,
    pub message: Option<String>,
}

impl From<ExcelErrorKind> for ExcelError {
    fn from(kind: ExcelErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl ExcelError {
    pub fn new(kind: ExcelErrorKind) -> Self {
        kind.into()
    }

    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Parse a canonical error token (`"#VALUE!"`, …) into an `ExcelError`.
    /// Unrecognised tokens fall back to `#VALUE!` carrying the original text,
    /// since the tokenizer/parser may hand us dialect-specific spellings.
    pub fn from_error_string(s: &str) -> Self {
        match ExcelErrorKind::parse(s) {
            Some(kind) => Self::new(kind),
            None => Self::new(ExcelErrorKind::Value).with_message(s.to_string()),
        }
    }
}

impl fmt::Display for ExcelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Error for ExcelError {}

impl From<ExcelError> for String {
    fn from(error: ExcelError) -> Self {
        format!("{error}")
    }
}

impl PartialEq<str> for ExcelErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for ExcelError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.to_string() == *other
    }
}

impl PartialEq<str> for ExcelError {
    fn eq(&self, other: &str) -> bool {
        self.kind.to_string() == other
    }
}
