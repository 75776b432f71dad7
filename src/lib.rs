//! watson: a stack-based object notation.
//!
//! A watson document is a program. Each byte of the source maps to at most
//! one opcode ([`Op`]); bytes outside the table are ignored. Running the
//! program on a fresh [`Vm`] leaves the document's value on top of the stack.
//!
//! ```
//! let value = watson::run_bytes(b"Yuuu").unwrap();
//! assert_eq!(value, watson::Value::Int(3));
//! ```

use std::io::{self, Read};

use tracing::debug;

pub mod codegen;
pub mod diagnostic;
pub mod lexer;
pub mod marshal;
pub mod value;
pub mod vm;

pub use lexer::{LexError, Lexer};
pub use value::{Kind, Object, Value};
pub use vm::{Op, Vm, VmError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    #[error("{source} at byte {offset} ({op})")]
    Exec {
        op: Op,
        offset: usize,
        source: VmError,
    },
    #[error("program produced no value")]
    EmptyProgram,
}

impl Error {
    /// Byte offset of the failing opcode, when the error has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Exec { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Run the program read from `reader` and return the value left on top.
pub fn run<R: Read>(reader: R) -> Result<Value, Error> {
    let mut lexer = Lexer::new(reader);
    let mut vm = Vm::new();
    let mut executed = 0usize;
    loop {
        let op = match lexer.next_op() {
            Ok(op) => op,
            Err(LexError::EndOfStream) => break,
            Err(LexError::Io(e)) => return Err(Error::Io(e)),
        };
        let offset = lexer.offset().unwrap_or_default();
        vm.feed(op).map_err(|source| Error::Exec { op, offset, source })?;
        executed += 1;
    }
    debug!(
        executed,
        bytes = lexer.consumed(),
        depth = vm.depth(),
        "program finished"
    );
    vm.into_top().ok_or(Error::EmptyProgram)
}

/// [`run`] over an in-memory program.
pub fn run_bytes(program: &[u8]) -> Result<Value, Error> {
    run(program)
}
