use std::borrow::Cow;

/// Maps byte offsets to line/column positions within a program.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        SourceMap { line_starts }
    }

    /// Returns (line, col), both 1-based. Columns count bytes.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line + 1, col + 1)
    }

    /// Returns the text of the given 1-based line, decoded lossily.
    pub fn line_text<'a>(&self, source: &'a [u8], line: usize) -> Cow<'a, str> {
        if line == 0 || line > self.line_starts.len() {
            return Cow::Borrowed("");
        }
        let start = self.line_starts[line - 1];
        let end = if line < self.line_starts.len() {
            self.line_starts[line]
        } else {
            source.len()
        };
        let mut text = &source[start..end];
        while let Some((last, rest)) = text.split_last() {
            if *last == b'\n' || *last == b'\r' {
                text = rest;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let src = b"Yummy";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(2), (1, 3));
        assert_eq!(sm.lookup(5), (1, 6));
    }

    #[test]
    fn multi_line() {
        let src = b"YYy\n?u\n!";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(3), (1, 4)); // the '\n'
        assert_eq!(sm.lookup(4), (2, 1));
        assert_eq!(sm.lookup(7), (3, 1));
    }

    #[test]
    fn line_text_multi() {
        let src = b"first\r\nsecond\nthird";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "first");
        assert_eq!(sm.line_text(src, 2), "second");
        assert_eq!(sm.line_text(src, 3), "third");
    }

    #[test]
    fn line_text_out_of_bounds() {
        let src = b"hello";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 0), "");
        assert_eq!(sm.line_text(src, 99), "");
    }

    #[test]
    fn line_text_with_binary_bytes() {
        let src = b"Y\xffu";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "Y\u{fffd}u");
    }

    #[test]
    fn empty_source() {
        let sm = SourceMap::new(b"");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.line_text(b"", 1), "");
    }
}
