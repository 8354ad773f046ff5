//! Severity-tagged diagnostics emitted while preparing and running a fit.
//!
//! Every event pushed into [`Diagnostics`] is kept for the caller and also
//! forwarded to the `log` facade at the matching level, so a caller can route
//! messages to a status bar, a log file or an exit code without the fitting
//! code knowing about any of them.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, e.g. the range a fit was restricted to.
    Info,

    /// Something was assumed or substituted on the caller's behalf.
    Warning,

    /// The fit was aborted.
    Error,
}

/// The phase of a fit in which a diagnostic was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStage {
    Preparing,
    Solving,
    Summarizing,
}

impl fmt::Display for FitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitStage::Preparing => "preparing",
            FitStage::Solving => "solving",
            FitStage::Summarizing => "summarizing",
        };
        f.write_str(name)
    }
}

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: FitStage,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.stage, self.message)
    }
}

/// An ordered list of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and forward it to the logger.
    pub fn push(&mut self, severity: Severity, stage: FitStage, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => log::info!("{}: {}", stage, message),
            Severity::Warning => log::warn!("{}: {}", stage, message),
            Severity::Error => log::error!("{}: {}", stage, message),
        }
        self.events.push(Diagnostic {
            severity,
            stage,
            message,
        });
    }

    pub fn info(&mut self, stage: FitStage, message: impl Into<String>) {
        self.push(Severity::Info, stage, message);
    }

    pub fn warn(&mut self, stage: FitStage, message: impl Into<String>) {
        self.push(Severity::Warning, stage, message);
    }

    pub fn error(&mut self, stage: FitStage, message: impl Into<String>) {
        self.push(Severity::Error, stage, message);
    }

    /// All events in the order they were raised.
    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    /// Events with exactly the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter().filter(move |d| d.severity == severity)
    }

    pub fn infos(&self) -> Vec<&Diagnostic> {
        self.with_severity(Severity::Info).collect()
    }

    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.with_severity(Severity::Warning).collect()
    }

    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.with_severity(Severity::Error).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.events.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
