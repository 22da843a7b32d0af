// Single-line progress bar, redrawn in place with a carriage return

use std::io::{self, Write};

pub struct ProgressBar<W: Write> {
    out: W,
    total: usize,
    current: usize,
    width: usize,
}

impl ProgressBar<io::Stdout> {
    pub fn stdout(total: usize) -> Self {
        Self::new(io::stdout(), total)
    }
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W, total: usize) -> Self {
        Self {
            out,
            total,
            current: 0,
            width: 40,
        }
    }

    pub fn update(&mut self, value: usize) {
        self.current = value.min(self.total);
        // Best effort; a closed terminal must not abort the run
        let _ = self.render();
    }

    /// Draw the completed bar and move to the next line
    pub fn finish(&mut self) {
        self.current = self.total;
        let _ = self.render().and_then(|_| writeln!(self.out));
    }

    fn line(&self) -> String {
        let ratio = if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        };
        let filled = (self.width as f64 * ratio).round() as usize;
        let empty = self.width - filled;
        let percent = (ratio * 100.0).round() as usize;

        format!(
            "{}{} {}% | {}/{}",
            "█".repeat(filled),
            "░".repeat(empty),
            percent,
            self.current,
            self.total
        )
    }

    fn render(&mut self) -> io::Result<()> {
        let line = self.line();
        write!(self.out, "\r{line}")?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
