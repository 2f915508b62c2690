//! `miette` integration.
//!
//! This module is feature-gated behind the `miette` feature.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

use crate::Error;
use crate::Location;

/// Convert an unmarshalling [`Error`] into a `miette::Report`.
///
/// This function takes the XML `source` and a display `file` name/path.
///
/// # Example
///
/// ```rust,no_run
/// let xml = "<list>\n  <thing/>\n</list>";
///
/// let mapper = graph_unmarshal::Mapper::new();
/// let err = mapper.from_str(xml).expect_err("`thing` has no type");
/// let report = graph_unmarshal::miette::to_miette_report(&err, xml, "graph.xml");
///
/// // `Debug` formatting uses miette's graphical reporter.
/// eprintln!("{report:?}");
/// ```
///
/// If the error has no known location, the report carries no label.
pub fn to_miette_report(err: &Error, source: &str, file: &str) -> miette::Report {
    let src = Arc::new(NamedSource::new(file, source.to_owned()));
    miette::Report::new(build_diagnostic(err, src))
}

#[derive(Clone, Debug)]
struct ErrorDiagnostic {
    message: String,
    src: Arc<NamedSource<String>>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for ErrorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorDiagnostic {}

impl Diagnostic for ErrorDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.clone().into_iter()))
        }
    }
}

fn build_diagnostic(err: &Error, src: Arc<NamedSource<String>>) -> ErrorDiagnostic {
    // the span already shows where; `Display` would repeat it
    let message = err.message();
    let mut labels = Vec::new();
    if let Some(location) = err.location()
        && let Some(span) = to_source_span(&src, &location)
    {
        labels.push(LabeledSpan::new_with_span(Some(label_for(err)), span));
    }
    ErrorDiagnostic {
        message,
        src,
        labels,
    }
}

fn label_for(err: &Error) -> String {
    match err {
        Error::DuplicateReference { .. } => "staked a second time here".to_owned(),
        Error::UnresolvedReference { .. } => "referenced here".to_owned(),
        Error::MissingTypeInfo { .. } | Error::TypeResolution { .. } => {
            "type of this element".to_owned()
        }
        Error::UnknownField { field, .. } => format!("`{field}` is not a field"),
        Error::Budget { .. } => "limit reached here".to_owned(),
        _ => "here".to_owned(),
    }
}

/// Span of the element start tag name, `<name`.
fn to_source_span(src: &NamedSource<String>, location: &Location) -> Option<SourceSpan> {
    let text = src.inner();
    let start = location.offset();
    let rest = text.get(start..)?;
    let len = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .filter(|&end| end > 0)
        .unwrap_or_else(|| rest.chars().next().map_or(0, char::len_utf8));
    if len == 0 {
        return None;
    }
    Some(SourceSpan::new(start.into(), len))
}
