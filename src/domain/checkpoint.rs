//! Line-window arithmetic for the resumable batch downloader.

/// Half-open range `[start, end)` of tag-list lines handled in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWindow {
    pub start: usize,
    pub end: usize,
}

impl LineWindow {
    /// Window of `num_lines` lines beginning at `start`.
    pub const fn new(start: usize, num_lines: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(num_lines),
        }
    }

    /// Lines of `lines` inside this window, clamped to the input length.
    pub fn slice<'a, T>(&self, lines: &'a [T]) -> &'a [T] {
        let start = self.start.min(lines.len());
        let end = self.end.min(lines.len());
        &lines[start..end]
    }

    /// Whether the window starts at or past the end of a list of `len` lines.
    pub const fn is_exhausted(&self, len: usize) -> bool {
        self.start >= len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_inside() {
        let lines = ["a", "b", "c", "d", "e"];
        let w = LineWindow::new(1, 2);
        assert_eq!(w.end, 3);
        assert_eq!(w.slice(&lines), &["b", "c"]);
    }

    #[test]
    fn test_window_clamped_at_eof() {
        let lines = ["a", "b", "c"];
        let w = LineWindow::new(2, 10);
        assert_eq!(w.slice(&lines), &["c"]);
        assert_eq!(w.end, 12);
    }

    #[test]
    fn test_window_past_eof_is_empty() {
        let lines = ["a"];
        let w = LineWindow::new(5, 10);
        assert!(w.slice(&lines).is_empty());
        assert!(w.is_exhausted(lines.len()));
    }

    #[test]
    fn test_zero_lines() {
        let lines = ["a", "b"];
        assert!(LineWindow::new(0, 0).slice(&lines).is_empty());
    }
}
