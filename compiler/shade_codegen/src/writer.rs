//! Indented text buffer shared by every emission stage.

/// An output buffer that tracks the current indentation level.
pub struct CodeWriter {
    output: String,
    indent: usize,
    width: usize,
}

impl CodeWriter {
    pub fn new(width: usize) -> Self {
        CodeWriter {
            output: String::with_capacity(1024),
            indent: 0,
            width,
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "dedent called with zero indent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Write a line at the current indentation.
    pub fn writeln(&mut self, line: &str) {
        for _ in 0..self.indent * self.width {
            self.output.push(' ');
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// Append text verbatim.
    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn newline(&mut self) {
        self.output.push('\n');
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_follows_width() {
        let mut w = CodeWriter::new(2);
        w.writeln("a {");
        w.indent();
        w.writeln("b;");
        w.dedent();
        w.writeln("}");
        assert_eq!(w.as_str(), "a {\n  b;\n}\n");
    }

    #[test]
    fn take_output_resets() {
        let mut w = CodeWriter::new(4);
        w.write("x");
        assert_eq!(w.take_output(), "x");
        assert!(w.is_empty());
    }
}
