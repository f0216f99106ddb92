use std::{fmt::Display, io::Write};

/// Severity tag shown in front of each console status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Error,
    Warning,
}

impl Status {
    pub fn icon(self) -> &'static str {
        match self {
            Status::Info => "ℹ️",
            Status::Success => "✅",
            Status::Error => "❌",
            Status::Warning => "⚠️",
        }
    }
}

pub const RULE_WIDTH: usize = 60;

/// Writes human-readable progress lines to a console-like sink.
///
/// Write failures are ignored.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn status(&mut self, status: Status, message: impl Display) {
        let _ = writeln!(self.out, "{} {}", status.icon(), message);
    }

    pub fn info(&mut self, message: impl Display) {
        self.status(Status::Info, message)
    }

    pub fn success(&mut self, message: impl Display) {
        self.status(Status::Success, message)
    }

    pub fn error(&mut self, message: impl Display) {
        self.status(Status::Error, message)
    }

    pub fn warning(&mut self, message: impl Display) {
        self.status(Status::Warning, message)
    }

    pub fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn blank(&mut self) {
        let _ = writeln!(self.out);
    }

    pub fn rule(&mut self) {
        let _ = writeln!(self.out, "{}", "=".repeat(RULE_WIDTH));
    }

    /// Title framed by two rules with blank lines around it.
    pub fn banner(&mut self, title: &str) {
        self.blank();
        self.rule();
        self.line(title);
        self.rule();
        self.blank();
    }

    /// Heading followed by an indented, numbered list.
    pub fn steps(&mut self, heading: &str, steps: &[String]) {
        let _ = writeln!(self.out, "\n📋 {heading}");
        for (i, step) in steps.iter().enumerate() {
            let _ = writeln!(self.out, "   {}. {}", i + 1, step);
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
