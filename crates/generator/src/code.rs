//! Line-oriented builder for emitted Rust source

/// Accumulates lines of generated code at a tracked indentation level
#[derive(Debug, Default)]
pub(crate) struct Code {
    lines: Vec<String>,
    indent: usize,
}

impl Code {
    /// Start a builder whose first line is indented `indent` levels
    pub(crate) fn new(indent: usize) -> Self {
        Self {
            lines: Vec::new(),
            indent,
        }
    }

    /// Append one line at the current indentation
    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines
                .push(format!("{}{}", "    ".repeat(self.indent), text));
        }
    }

    /// Append a line and indent everything after it (`if … {`)
    pub(crate) fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedent and append a closing line (`}`)
    pub(crate) fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Append the lines of another builder as they are
    pub(crate) fn extend(&mut self, other: Code) {
        self.lines.extend(other.lines);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn finish(self) -> String {
        self.lines.join("\n")
    }
}

/// Rust string literal for `value`
pub(crate) fn literal(value: &str) -> String {
    format!("{:?}", value)
}
