use super::{Diagnostic, Severity, SourceMap};

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn bold(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold_red(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1;31m{s}\x1b[0m") } else { s.to_string() }
    }

    fn cyan(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[36m{s}\x1b[0m") } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[2m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[WAT-E002]: message"
        let severity_label = match d.severity {
            Severity::Error => self.bold_red("error"),
        };
        let code = d.code.map(|c| format!("[{c}]")).unwrap_or_default();
        out.push_str(&format!("{}{}: {}\n", severity_label, code, self.bold(&d.message)));

        if let Some(label) = &d.label {
            match &d.source {
                Some(source) => {
                    let map = SourceMap::new(source);
                    let (line, col) = map.lookup(label.span.start);
                    let line_text = map.line_text(source, line);

                    // "  --> line:col"
                    out.push_str(&format!("  {} {}:{}\n", self.cyan("-->"), line, col));

                    let gutter = line.to_string().len();
                    let pipe = self.cyan("|");
                    let pad = " ".repeat(gutter);

                    out.push_str(&format!("{pad} {pipe}\n"));
                    let line_num = self.cyan(&format!("{line:>gutter$}"));
                    out.push_str(&format!("{line_num} {pipe} {line_text}\n"));

                    let span_len = label.span.end.saturating_sub(label.span.start).max(1);
                    let carets = self.bold_red(&"^".repeat(span_len));
                    let indent = " ".repeat(col.saturating_sub(1));
                    if label.message.is_empty() {
                        out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
                    } else {
                        out.push_str(&format!(
                            "{pad} {pipe} {indent}{carets} {}\n",
                            self.bold_red(&label.message)
                        ));
                    }
                    out.push_str(&format!("{pad} {pipe}\n"));
                }
                // Programs read from a pipe are gone by now; the offset is all we have.
                None => {
                    out.push_str(&format!(
                        "  {} byte {}: {}\n",
                        self.cyan("-->"),
                        label.span.start,
                        label.message
                    ));
                }
            }
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }

        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} suggestion: {}\n", self.dim("="), suggestion));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Span;

    fn make_diag(source: &[u8], offset: usize) -> Diagnostic {
        Diagnostic::error("type mismatch: arg1 must be Int, found String")
            .with_code("WAT-E002")
            .with_span(Span::at(offset), "Iinc ('u')")
            .with_source(source)
            .with_note("arg1 counts from the top of the stack")
            .with_suggestion("Iinc needs Int here, not String")
    }

    #[test]
    fn render_contains_error_label() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag(b"?u", 1));
        assert!(out.contains("error[WAT-E002]:"), "missing header in:\n{out}");
        assert!(out.contains("type mismatch"), "missing message in:\n{out}");
    }

    #[test]
    fn render_contains_location() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag(b"?u", 1));
        assert!(out.contains("--> 1:2"), "missing location in:\n{out}");
    }

    #[test]
    fn render_contains_source_line_and_caret() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag(b"?u", 1));
        assert!(out.contains("1 | ?u"), "missing source line in:\n{out}");
        assert!(out.contains("  |  ^ Iinc ('u')"), "missing caret in:\n{out}");
    }

    #[test]
    fn render_multiline_source_correct_line() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag(b"YYy\n?u", 5));
        assert!(out.contains("--> 2:2"), "expected line 2 in:\n{out}");
        assert!(out.contains("?u"), "expected second line in:\n{out}");
    }

    #[test]
    fn render_without_source_uses_offset() {
        let r = AnsiRenderer { use_color: false };
        let d = Diagnostic::error("stack empty").with_span(Span::at(7), "Iadd ('y')");
        let out = r.render(&d);
        assert!(out.contains("--> byte 7: Iadd ('y')"), "missing offset in:\n{out}");
    }

    #[test]
    fn render_contains_note_and_suggestion() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag(b"?u", 1));
        assert!(out.contains("note: arg1 counts"), "missing note in:\n{out}");
        assert!(out.contains("suggestion: Iinc needs Int"), "missing suggestion in:\n{out}");
    }

    #[test]
    fn render_no_label_is_one_line() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&Diagnostic::error("something bad"));
        assert_eq!(out, "error: something bad\n");
    }

    #[test]
    fn render_with_color_contains_ansi_codes() {
        let r = AnsiRenderer { use_color: true };
        let out = r.render(&make_diag(b"?u", 1));
        assert!(out.contains("\x1b["), "expected ANSI codes when use_color=true");
    }

    #[test]
    fn render_without_color_no_ansi_codes() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag(b"?u", 1));
        assert!(!out.contains("\x1b["), "unexpected ANSI codes when use_color=false");
    }
}
