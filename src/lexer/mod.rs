use std::io::{self, Bytes, Read};

use crate::vm::Op;

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    /// The source ran out before another opcode was found.
    #[error("end of stream")]
    EndOfStream,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Pulls opcodes out of a byte source, one read at a time.
///
/// Bytes outside the opcode table are skipped. The lexer never looks back,
/// so once a byte is consumed it is gone; wrap unbuffered sources in a
/// `BufReader`.
pub struct Lexer<R> {
    bytes: Bytes<R>,
    consumed: usize,
    offset: Option<usize>,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Lexer { bytes: reader.bytes(), consumed: 0, offset: None }
    }

    /// Returns the next opcode, [`LexError::EndOfStream`] once the source is
    /// exhausted, or the source's own error unchanged.
    pub fn next_op(&mut self) -> Result<Op, LexError> {
        loop {
            let byte = match self.bytes.next() {
                Some(byte) => byte?,
                None => return Err(LexError::EndOfStream),
            };
            let at = self.consumed;
            self.consumed += 1;
            if let Some(op) = Op::from_byte(byte) {
                self.offset = Some(at);
                return Ok(op);
            }
        }
    }

    /// Byte offset of the most recently returned opcode.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Total number of bytes read so far, skipped ones included.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = io::Result<Op>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_op() {
            Ok(op) => Some(Ok(op)),
            Err(LexError::EndOfStream) => None,
            Err(LexError::Io(e)) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(s: &str) -> Result<Op, LexError> {
        Lexer::new(s.as_bytes()).next_op()
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn returns_the_first_op() {
        assert_eq!(read_one("Y").unwrap(), Op::Inew);
    }

    #[test]
    fn returns_ops_sequentially() {
        let mut lexer = Lexer::new("Yummy".as_bytes());
        for expected in [Op::Inew, Op::Iinc, Op::Ishl, Op::Ishl, Op::Iadd] {
            assert_eq!(lexer.next_op().unwrap(), expected);
        }
        assert!(matches!(lexer.next_op(), Err(LexError::EndOfStream)));
    }

    #[test]
    fn skips_meaningless_bytes() {
        assert_eq!(read_one("ZZZZZY").unwrap(), Op::Inew);
    }

    #[test]
    fn empty_stream_is_end_of_stream() {
        assert!(matches!(read_one(""), Err(LexError::EndOfStream)));
    }

    #[test]
    fn only_noise_is_end_of_stream() {
        assert!(matches!(read_one("ZZZZZZZZ"), Err(LexError::EndOfStream)));
    }

    #[test]
    fn stays_at_end_of_stream() {
        let mut lexer = Lexer::new("Y".as_bytes());
        lexer.next_op().unwrap();
        assert!(matches!(lexer.next_op(), Err(LexError::EndOfStream)));
        assert!(matches!(lexer.next_op(), Err(LexError::EndOfStream)));
    }

    #[test]
    fn transport_errors_propagate() {
        match Lexer::new(Broken).next_op() {
            Err(LexError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn tracks_offsets() {
        let mut lexer = Lexer::new(&b"ZZ Y\xffu"[..]);
        assert_eq!(lexer.offset(), None);
        lexer.next_op().unwrap();
        assert_eq!(lexer.offset(), Some(3));
        lexer.next_op().unwrap();
        assert_eq!(lexer.offset(), Some(5));
        assert_eq!(lexer.consumed(), 6);
    }

    #[test]
    fn iterator_stops_at_end() {
        let ops: Vec<Op> = Lexer::new("Y u\nm".as_bytes()).collect::<io::Result<_>>().unwrap();
        assert_eq!(ops, vec![Op::Inew, Op::Iinc, Op::Ishl]);
    }
}
