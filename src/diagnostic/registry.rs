/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one line, for `watson explain --list`
    pub long: &'static str,  // full explanation, for `watson explain`
}

/// All stable error codes reported by the watson tools.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Execution ────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "WAT-E001",
        short: "stack empty: not enough operands",
        long: r#"## WAT-E001: stack empty

An opcode needed more values than the stack held. The stack is left as
it was before the opcode.

**Example that triggers this:**

    Yy

`y` (Iadd) pops two integers, but `Y` (Inew) pushed only one.

**Fix:** push every operand before the opcode that consumes it:

    YYy
"#,
    },
    ErrorEntry {
        code: "WAT-E002",
        short: "type mismatch: operand has the wrong variant",
        long: r#"## WAT-E002: type mismatch

An operand was present but of the wrong kind, for example a string where
an integer was expected. Operands are checked from the top of the stack
down (arg1, arg2, arg3) and the first offender is reported. The stack is
left as it was before the opcode.

**Example that triggers this:**

    ?u

`u` (Iinc) needs an Int on top, but `?` (Snew) pushed a String.
"#,
    },
    ErrorEntry {
        code: "WAT-E003",
        short: "program produced no value",
        long: r#"## WAT-E003: program produced no value

The program ran to completion but left the stack empty, so there is no
result to print. An empty file, a file with no opcode bytes, or a
program ending in `@` (Gpop) on its last value all do this.
"#,
    },
    // ── Input ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "WAT-I001",
        short: "input could not be read",
        long: r#"## WAT-I001: input could not be read

The file or standard input failed while it was being read. The message
carries the operating system's reason.
"#,
    },
    ErrorEntry {
        code: "WAT-I002",
        short: "invalid JSON input",
        long: r#"## WAT-I002: invalid JSON input

`watson encode` reads a single JSON document. The input was not valid
JSON; the reported line and column point at the problem.
"#,
    },
];

/// Look up an error entry by code (e.g. `"WAT-E002"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}
