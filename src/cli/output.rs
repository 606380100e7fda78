//! Colored terminal output.

use cyrup_termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, Write};

/// User-facing status lines, separate from the `log` stream.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    color_choice: ColorChoice,
}

impl OutputManager {
    /// Creates an output manager.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Print messages sent through [`OutputManager::verbose`]
    pub fn new(verbose: bool) -> Self {
        let color_choice = if std::env::var_os("NO_COLOR").is_some() {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };

        Self {
            verbose,
            color_choice,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn write_line(
        &self,
        stream: &mut StandardStream,
        color: Option<Color>,
        bold: bool,
        prefix: &str,
        message: &str,
    ) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        stream.set_color(&spec)?;
        write!(stream, "{prefix}")?;
        stream.reset()?;
        writeln!(stream, "{message}")
    }

    fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.color_choice)
    }

    fn stderr(&self) -> StandardStream {
        StandardStream::stderr(self.color_choice)
    }

    /// Printed only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        self.write_line(&mut self.stdout(), Some(Color::Cyan), false, "  ", message)
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        self.write_line(&mut self.stdout(), Some(Color::Blue), true, "→ ", message)
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        self.write_line(&mut self.stdout(), Some(Color::Green), true, "✓ ", message)
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        self.write_line(&mut self.stderr(), Some(Color::Yellow), true, "⚠ ", message)
    }

    /// Always printed, to stderr.
    pub fn error(&self, message: &str) -> io::Result<()> {
        self.write_line(&mut self.stderr(), Some(Color::Red), true, "✗ ", message)
    }

    /// Bold section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        let mut stream = self.stdout();
        writeln!(stream)?;
        self.write_line(&mut stream, Some(Color::White), true, "", title)
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.write_line(&mut self.stdout(), None, false, "    ", message)
    }
}
