//! The story's output stream.
//!
//! Content instructions append text here; [`crate::runtime::Story`] drains it
//! one line at a time between execution bursts. The buffer is append-only
//! with a read cursor, so glue can trim newlines that have been written but
//! not yet handed to the caller.
//!
//! Only terminated lines are handed out by [`OutputStream::read_line`]; an
//! unterminated tail stays buffered so later glue can extend it. The tail is
//! drained with [`OutputStream::read_rest`] once no more output can arrive.

#[derive(Debug, Default)]
pub struct OutputStream {
    bytes: String,
    cursor: usize,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every written byte has been read back.
    pub fn is_empty(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub fn write(&mut self, text: &str) {
        self.bytes.push_str(text);
    }

    /// Terminate the current line. Does nothing when the line is empty, so
    /// content that evaluates to nothing produces no blank output line.
    pub fn write_newline(&mut self) {
        let line_start = self.bytes.rfind('\n').map_or(0, |at| at + 1);
        if self.bytes.len() > line_start {
            self.bytes.push('\n');
        }
    }

    /// Remove trailing newlines that the cursor has not passed yet.
    pub fn trim_newlines(&mut self) {
        while self.bytes.len() > self.cursor && self.bytes.ends_with('\n') {
            self.bytes.pop();
        }
    }

    /// Read the next terminated line, without its terminator.
    pub fn read_line(&mut self) -> Option<String> {
        let rest = &self.bytes[self.cursor.min(self.bytes.len())..];
        let at = rest.find('\n')?;
        self.cursor += at + 1;
        Some(rest[..at].to_string())
    }

    /// Read everything left, terminated or not. `None` when already drained.
    pub fn read_rest(&mut self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let rest = self.bytes[self.cursor..].to_string();
        self.cursor = self.bytes.len();
        Some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_terminated_lines_are_read() {
        let mut st = OutputStream::new();
        st.write("one");
        st.write_newline();
        st.write("two");
        assert_eq!(st.read_line().as_deref(), Some("one"));
        assert_eq!(st.read_line(), None);
        assert_eq!(st.read_rest().as_deref(), Some("two"));
        assert!(st.is_empty());
    }

    #[test]
    fn newline_on_an_empty_line_is_suppressed() {
        let mut st = OutputStream::new();
        st.write_newline();
        assert!(st.is_empty());
        st.write("a");
        st.write_newline();
        st.write_newline();
        assert_eq!(st.read_line().as_deref(), Some("a"));
        assert!(st.is_empty());
    }

    #[test]
    fn glue_joins_pending_lines() {
        let mut st = OutputStream::new();
        st.write("left");
        st.write_newline();
        st.trim_newlines();
        st.write(" right");
        st.write_newline();
        assert_eq!(st.read_line().as_deref(), Some("left right"));
    }

    #[test]
    fn trim_stops_at_the_cursor() {
        let mut st = OutputStream::new();
        st.write("a");
        st.write_newline();
        assert_eq!(st.read_line().as_deref(), Some("a"));
        // The newline behind the cursor was already handed out.
        st.trim_newlines();
        assert!(st.is_empty());
    }
}
