//! Operator-facing output.
//!
//! Everything the operator reads (status badges, usage lines, tables) goes
//! through a [`Reporter`]. Diagnostics for developers go through `tracing`
//! instead. [`TerminalReporter`] renders to any writer; [`RecordingReporter`]
//! keeps the rendered lines in memory.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use unicode_width::UnicodeWidthStr;

const CONSOLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::console");

/// Prefix class of a reported line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// No prefix.
    Empty,
    /// Work in progress, `[*]`.
    Process,
    /// Completed work, `[+]`.
    Success,
    /// Failure, `[-]`.
    Error,
    /// Caution, `[!]`.
    Warning,
    /// Neutral note, `[i]`.
    Information,
    /// Usage line, `Usage: `.
    Usage,
}

impl Badge {
    /// Text printed before the message.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Process => "[*] ",
            Self::Success => "[+] ",
            Self::Error => "[-] ",
            Self::Warning => "[!] ",
            Self::Information => "[i] ",
            Self::Usage => "Usage: ",
        }
    }
}

/// Sink for operator-facing output.
pub trait Reporter: Send + Sync {
    /// Emits one message with its badge.
    fn emit(&self, badge: Badge, message: &str);

    /// Emits a titled table.
    fn table(&self, title: &str, headers: &[&str], rows: &[Vec<String>]);

    /// Unprefixed text.
    fn empty(&self, message: &str) {
        self.emit(Badge::Empty, message);
    }

    /// `[*]` progress line.
    fn process(&self, message: &str) {
        self.emit(Badge::Process, message);
    }

    /// `[+]` success line.
    fn success(&self, message: &str) {
        self.emit(Badge::Success, message);
    }

    /// `[-]` error line.
    fn error(&self, message: &str) {
        self.emit(Badge::Error, message);
    }

    /// `[!]` warning line.
    fn warning(&self, message: &str) {
        self.emit(Badge::Warning, message);
    }

    /// `[i]` information line.
    fn information(&self, message: &str) {
        self.emit(Badge::Information, message);
    }

    /// `Usage:` line.
    fn usage(&self, usage: &str) {
        self.emit(Badge::Usage, usage);
    }
}

/// Renders a table as indented, width-aligned columns.
#[must_use]
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.width()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            match widths.get_mut(index) {
                Some(width) => *width = (*width).max(cell.width()),
                None => widths.push(cell.width()),
            }
        }
    }

    let mut out = format!("\n{title}:\n\n");
    let underline: Vec<String> = headers.iter().map(|header| "-".repeat(header.width())).collect();
    push_row(&mut out, headers.iter().copied(), &widths);
    push_row(&mut out, underline.iter().map(String::as_str), &widths);
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::from("    ");
    for (cell, width) in cells.zip(widths) {
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width()) + 4));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Cloneable handle to a writer shared by the reporter and the line source.
#[derive(Debug, Default)]
pub struct SharedWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W> SharedWriter<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Runs `f` with exclusive access to the writer.
    pub fn with<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl SharedWriter<Vec<u8>> {
    /// Everything written so far, decoded lossily.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// Reporter that writes plain text to a writer.
#[derive(Debug, Clone)]
pub struct TerminalReporter<W> {
    out: SharedWriter<W>,
}

impl<W: Write> TerminalReporter<W> {
    /// Creates a reporter writing through `out`.
    pub const fn new(out: SharedWriter<W>) -> Self {
        Self { out }
    }

    fn write_text(&self, text: &str) {
        let result = self.out.with(|writer| {
            writer.write_all(text.as_bytes())?;
            writer.flush()
        });
        if let Err(error) = result {
            tracing::warn!(target: CONSOLE_TARGET, %error, "failed to write console output");
        }
    }
}

impl<W: Write + Send> Reporter for TerminalReporter<W> {
    fn emit(&self, badge: Badge, message: &str) {
        self.write_text(&format!("{}{message}\n", badge.prefix()));
    }

    fn table(&self, title: &str, headers: &[&str], rows: &[Vec<String>]) {
        self.write_text(&render_table(title, headers, rows));
    }
}

/// Reporter that keeps every rendered line, for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every rendered line so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns `true` when any line equals `line`.
    #[must_use]
    pub fn has_line(&self, line: &str) -> bool {
        self.lines.lock().iter().any(|recorded| recorded == line)
    }

    /// Returns `true` when any line contains `fragment`.
    #[must_use]
    pub fn mentions(&self, fragment: &str) -> bool {
        self.lines.lock().iter().any(|recorded| recorded.contains(fragment))
    }

    /// Forgets everything recorded.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Reporter for RecordingReporter {
    fn emit(&self, badge: Badge, message: &str) {
        self.lines
            .lock()
            .push(format!("{}{message}", badge.prefix()));
    }

    fn table(&self, title: &str, headers: &[&str], rows: &[Vec<String>]) {
        let rendered = render_table(title, headers, rows);
        self.lines
            .lock()
            .extend(rendered.lines().map(str::to_owned));
    }
}
