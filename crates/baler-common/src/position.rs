//! Offset to line/column conversion.
//!
//! Diagnostics and source maps need line/column positions, while the AST
//! carries byte offsets. This module provides the conversion.

/// A position in a source file (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column in bytes from the line start
    pub column: u32,
}

impl Location {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Line map for efficient offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Starting offset of each line (`line_starts[0]` is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];

        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                // Next line starts after the newline
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            } else if ch == '\r' {
                // Handle \r\n (Windows) and \r (old Mac)
                let next_idx = i + 1;
                if source.as_bytes().get(next_idx) != Some(&b'\n') {
                    // \r not followed by \n - treat as line ending
                    line_starts.push(u32::try_from(next_idx).unwrap_or(u32::MAX));
                }
                // \r followed by \n - the \n will create the line start
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a `Location`.
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        Location {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: offset.saturating_sub(line_start),
        }
    }

    /// Number of lines in the source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
