//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Results go to stdout; messages go to stderr.
pub(crate) struct Output {
    out: Term,
    term: Term,
    green: Style,
    red: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            term: Term::stderr(),
            green: Style::new().green(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Write a result line to stdout.
    pub(crate) fn result(&self, msg: &str) -> std::io::Result<()> {
        self.out.write_line(msg)
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a de-emphasized message (dim).
    pub(crate) fn note(&self, msg: &str) {
        let _ = self.term.write_line(&self.dim.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
