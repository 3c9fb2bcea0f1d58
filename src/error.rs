//! Error types for the logic simulator.
//!
//! Two different failure channels flow through the crate. Problems found in
//! a definition file are *diagnostics*: the parser collects them in bulk,
//! each one carrying enough source context to be rendered with an excerpt
//! and a caret pointer, so a single run surfaces as many problems as
//! possible. Failures at simulation time or in the runtime API are
//! [`SimError`] values returned through [`Result`].

use std::fmt;

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Runtime and API errors.
#[derive(Error, Debug)]
pub enum SimError {
    /// The network failed to settle within the propagation bound.
    #[error(
        "network did not settle after {passes} passes: the circuit contains \
         a combinational feedback loop"
    )]
    Oscillation { passes: usize },

    /// A runtime operation named a device that does not exist.
    #[error("no device named '{name}'")]
    UnknownDevice { name: String },

    /// `set_switch` was called on a device that is not a switch.
    #[error("device '{name}' is not a switch")]
    NotASwitch { name: String },

    /// A monitor operation referred to a missing device or output pin.
    #[error("no output pin matching '{point}'")]
    UnknownPoint { point: String },

    /// The point is already being monitored.
    #[error("'{point}' is already monitored")]
    DuplicateMonitor { point: String },

    /// The point is not currently monitored.
    #[error("'{point}' is not monitored")]
    NotMonitored { point: String },

    /// Error reading the definition file.
    #[error("failed to read circuit file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    /// Create an unknown-device error.
    pub fn unknown_device(name: impl Into<String>) -> Self {
        Self::UnknownDevice { name: name.into() }
    }

    /// Create an unknown-point error.
    pub fn unknown_point(point: impl Into<String>) -> Self {
        Self::UnknownPoint {
            point: point.into(),
        }
    }
}

/// Classification of a definition-file diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Lexical or grammatical problem.
    Syntax,
    /// The file is grammatical but describes an invalid network.
    Semantic,
}

/// A single error found in a definition file.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Source text of the offending line.
    pub excerpt: String,
}

/// Widest excerpt printed before eliding around the caret.
const MAX_EXCERPT_WIDTH: usize = 79;

impl Diagnostic {
    /// The excerpt and 0-indexed caret column as actually rendered.
    ///
    /// Long lines are shortened around the caret with `[...]` markers so the
    /// pointer always lands within [`MAX_EXCERPT_WIDTH`] columns.
    pub fn excerpt_window(&self) -> (String, usize) {
        let mut text: Vec<char> = self.excerpt.chars().collect();
        let mut caret = self.column.saturating_sub(1).min(text.len());
        if text.len() > MAX_EXCERPT_WIDTH {
            if caret > (MAX_EXCERPT_WIDTH + 1) / 2 - 5 {
                let cut = caret - (MAX_EXCERPT_WIDTH + 1) / 2 + 6;
                let mut shortened: Vec<char> = "[...]".chars().collect();
                shortened.extend_from_slice(&text[cut..]);
                text = shortened;
                caret = (MAX_EXCERPT_WIDTH - 1) / 2;
            }
            if text.len() - caret > (MAX_EXCERPT_WIDTH + 1) / 2 {
                text.truncate(caret + MAX_EXCERPT_WIDTH / 2 - 4);
                text.extend("[...]".chars());
            }
        }
        (text.into_iter().collect(), caret)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (excerpt, caret) = self.excerpt_window();
        writeln!(f, "Error on line {}:", self.line)?;
        writeln!(f)?;
        writeln!(f, "{excerpt}")?;
        writeln!(f, "{}^", " ".repeat(caret))?;
        writeln!(f)?;
        write!(f, "{}", self.message)
    }
}

/// All diagnostics collected over one parse, in source order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Order by source position; reports pushed out of order (for example
    /// lexical errors merged in after the parse) end up where they belong.
    pub fn sort_by_position(&mut self) {
        self.items.sort_by_key(|d| (d.line, d.column));
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.items {
            writeln!(f, "{diagnostic}")?;
            writeln!(f)?;
        }
        write!(f, "Error count: {}", self.items.len())
    }
}
