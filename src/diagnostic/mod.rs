pub mod ansi;
pub mod json;
pub mod registry;
pub mod source_map;

pub use source_map::SourceMap;

use crate::vm::VmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
}

/// Byte range within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The one-byte span of an opcode at `offset`.
    pub fn at(offset: usize) -> Span {
        Span { start: offset, end: offset + 1 }
    }
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub label: Option<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<Vec<u8>>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            label: None,
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.label = Some(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<Vec<u8>>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for error types ----

impl From<&crate::Error> for Diagnostic {
    fn from(e: &crate::Error) -> Self {
        match e {
            crate::Error::Io(err) => Diagnostic::from(err),
            crate::Error::Exec { op, offset, source } => {
                let d = Diagnostic::error(source.to_string())
                    .with_span(Span::at(*offset), format!("{op} ('{}')", op.to_byte() as char));
                match source {
                    VmError::StackEmpty { needed, depth } => d
                        .with_code("WAT-E001")
                        .with_note(format!("{op} takes {needed} operand(s); the stack held {depth}"))
                        .with_suggestion("push the missing operands before this opcode"),
                    VmError::TypeMismatch { position, expected, found } => d
                        .with_code("WAT-E002")
                        .with_note(format!("arg{position} counts from the top of the stack"))
                        .with_suggestion(format!("{op} needs {expected} here, not {found}")),
                }
            }
            crate::Error::EmptyProgram => Diagnostic::error(e.to_string())
                .with_code("WAT-E003")
                .with_suggestion("a program must leave its result on the stack"),
        }
    }
}

impl From<&std::io::Error> for Diagnostic {
    fn from(e: &std::io::Error) -> Self {
        Diagnostic::error(format!("read error: {e}")).with_code("WAT-I001")
    }
}

impl From<&serde_json::Error> for Diagnostic {
    fn from(e: &serde_json::Error) -> Self {
        Diagnostic::error(format!("invalid JSON: {e}"))
            .with_code("WAT-I002")
            .with_note(format!("at line {}, column {}", e.line(), e.column()))
    }
}
