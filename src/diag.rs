//! Span-labelled diagnostics for annotation and DDL text, rendered through miette.

use crate::span::Span;
use miette::{Diagnostic, LabeledSpan, NamedSource, Report, Severity};
use std::fmt;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagSeverity {
    /// The text cannot be used.
    Error,
    /// The text is usable but something about it is suspicious.
    Warning,
}

impl fmt::Display for DiagSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagSeverity::Error => write!(f, "error"),
            DiagSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// A labelled span within a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagLabel {
    pub span: Span,
    pub message: String,
    pub primary: bool,
}

/// A structured diagnostic produced while reading annotation or DDL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub severity: DiagSeverity,
    pub message: String,
    pub labels: Vec<DiagLabel>,
    pub help: Option<String>,
    /// Stable code such as `udf::annotation::unexpected_token`.
    pub code: Option<String>,
}

impl Diag {
    /// Creates an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: DiagSeverity::Error,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            code: None,
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagSeverity::Warning,
            ..Self::error(message)
        }
    }

    pub fn with_primary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagLabel {
            span,
            message: message.into(),
            primary: true,
        });
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagLabel {
            span,
            message: message.into(),
            primary: false,
        });
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.primary)
            .map(|label| label.span.clone())
    }

    /// Renders this diagnostic as a miette report over `source`.
    ///
    /// Label spans are clamped to the source bounds, so a diagnostic built
    /// against a longer text never panics when rendered.
    pub fn to_report(&self, source: &str, name: Option<&str>) -> Report {
        let len = source.len();
        let labels = self
            .labels
            .iter()
            .map(|label| {
                let start = label.span.start.min(len);
                let end = label.span.end.min(len).max(start);
                let span = (start, end - start);
                if label.primary {
                    LabeledSpan::new_primary_with_span(Some(label.message.clone()), span)
                } else {
                    LabeledSpan::new_with_span(Some(label.message.clone()), span)
                }
            })
            .collect();

        let report = Report::new(RenderedDiag {
            message: self.message.clone(),
            severity: match self.severity {
                DiagSeverity::Error => Severity::Error,
                DiagSeverity::Warning => Severity::Warning,
            },
            code: self.code.clone(),
            help: self.help.clone(),
            labels,
        });

        match name {
            Some(name) => report.with_source_code(NamedSource::new(name, source.to_string())),
            None => report.with_source_code(source.to_string()),
        }
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(span) = self.primary_span() {
            write!(f, " (at {}..{})", span.start, span.end)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct RenderedDiag {
    message: String,
    severity: Severity,
    code: Option<String>,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for RenderedDiag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RenderedDiag {}

impl Diagnostic for RenderedDiag {
    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.clone().into_iter()))
        }
    }
}
