use std::fmt;

use logos::Logos;

/// The watson instruction set.
///
/// Every opcode is spelled by exactly one ASCII byte; the `#[token]`
/// attributes below are the byte→opcode table. Any other byte in a program
/// is ignored by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // Integers
    #[token("Y")]
    Inew,
    #[token("u")]
    Iinc,
    #[token("m")]
    Ishl,
    #[token("y")]
    Iadd,
    #[token("A")]
    Ineg,
    #[token("e")]
    Isht,
    #[token("i")]
    Itof,
    #[token("'")]
    Itou,

    // Floats
    #[token("q")]
    Finf,
    #[token("t")]
    Fnan,
    #[token("p")]
    Fneg,

    // Strings
    #[token("?")]
    Snew,
    #[token("$")]
    Sadd,

    // Objects
    #[token("!")]
    Onew,
    #[token("+")]
    Oadd,

    // Arrays
    #[token("*")]
    Anew,
    #[token("#")]
    Aadd,

    // Booleans
    #[token("%")]
    Bnew,
    #[token("\"")]
    Bneg,

    // Nil
    #[token(".")]
    Nnew,

    // Stack manipulation
    #[token("E")]
    Gdup,
    #[token("@")]
    Gpop,
    #[token(">")]
    Gswp,
}

impl Op {
    pub const ALL: [Op; 23] = [
        Op::Inew,
        Op::Iinc,
        Op::Ishl,
        Op::Iadd,
        Op::Ineg,
        Op::Isht,
        Op::Itof,
        Op::Itou,
        Op::Finf,
        Op::Fnan,
        Op::Fneg,
        Op::Snew,
        Op::Sadd,
        Op::Onew,
        Op::Oadd,
        Op::Anew,
        Op::Aadd,
        Op::Bnew,
        Op::Bneg,
        Op::Nnew,
        Op::Gdup,
        Op::Gpop,
        Op::Gswp,
    ];

    /// Classify a single program byte. `None` for bytes outside the table.
    pub fn from_byte(byte: u8) -> Option<Op> {
        if !byte.is_ascii() {
            return None;
        }
        let buf = [byte];
        let text = std::str::from_utf8(&buf).ok()?;
        match Op::lexer(text).next() {
            Some(Ok(op)) => Some(op),
            _ => None,
        }
    }

    /// The byte that spells this opcode.
    pub fn to_byte(self) -> u8 {
        match self {
            Op::Inew => b'Y',
            Op::Iinc => b'u',
            Op::Ishl => b'm',
            Op::Iadd => b'y',
            Op::Ineg => b'A',
            Op::Isht => b'e',
            Op::Itof => b'i',
            Op::Itou => b'\'',
            Op::Finf => b'q',
            Op::Fnan => b't',
            Op::Fneg => b'p',
            Op::Snew => b'?',
            Op::Sadd => b'$',
            Op::Onew => b'!',
            Op::Oadd => b'+',
            Op::Anew => b'*',
            Op::Aadd => b'#',
            Op::Bnew => b'%',
            Op::Bneg => b'"',
            Op::Nnew => b'.',
            Op::Gdup => b'E',
            Op::Gpop => b'@',
            Op::Gswp => b'>',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Inew => "Inew",
            Op::Iinc => "Iinc",
            Op::Ishl => "Ishl",
            Op::Iadd => "Iadd",
            Op::Ineg => "Ineg",
            Op::Isht => "Isht",
            Op::Itof => "Itof",
            Op::Itou => "Itou",
            Op::Finf => "Finf",
            Op::Fnan => "Fnan",
            Op::Fneg => "Fneg",
            Op::Snew => "Snew",
            Op::Sadd => "Sadd",
            Op::Onew => "Onew",
            Op::Oadd => "Oadd",
            Op::Anew => "Anew",
            Op::Aadd => "Aadd",
            Op::Bnew => "Bnew",
            Op::Bneg => "Bneg",
            Op::Nnew => "Nnew",
            Op::Gdup => "Gdup",
            Op::Gpop => "Gpop",
            Op::Gswp => "Gswp",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_round_trips() {
        for op in Op::ALL {
            assert_eq!(Op::from_byte(op.to_byte()), Some(op), "{op}");
        }
    }

    #[test]
    fn bytes_are_distinct() {
        let bytes: HashSet<u8> = Op::ALL.iter().map(|op| op.to_byte()).collect();
        assert_eq!(bytes.len(), Op::ALL.len());
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        for byte in [b'Z', b' ', b'\n', 0x00, 0x80, 0xff] {
            assert_eq!(Op::from_byte(byte), None, "byte {byte:#04x}");
        }
    }

    #[test]
    fn table_is_case_sensitive() {
        assert_eq!(Op::from_byte(b'Y'), Some(Op::Inew));
        assert_eq!(Op::from_byte(b'y'), Some(Op::Iadd));
        assert_eq!(Op::from_byte(b'U'), None);
    }

    #[test]
    fn display_uses_mnemonic() {
        assert_eq!(Op::Gswp.to_string(), "Gswp");
    }
}
