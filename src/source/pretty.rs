//! Pretty-printing diagnostic messages that reference source code.
//!
//! This module defines a small, dependency-free model ([`Report`],
//! [`Annotation`]) for a diagnostic and its associated source spans. The
//! canonical text form ([`Report::render`]) is a fixed Clang-style snippet.
//! When the crate is built with the `pretty-snippets`
//! feature, a [`Report`] can also be converted into an
//! `annotate_snippets::Message` for callers who want terminal-width-aware,
//! multi-span rendering instead.

use super::Location;
use std::borrow::Cow;

/// Severity of an [`Annotation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Severity {
    Error,
    Info,
    Help,
}

/// A single labeled source span within a [`Report`].
#[derive(Clone, Debug)]
pub struct Annotation<'a> {
    pub severity: Severity,
    pub label: Cow<'a, str>,
    pub location: &'a Location,
}

impl<'a> Annotation<'a> {
    #[must_use]
    pub fn new(severity: Severity, label: impl Into<Cow<'a, str>>, location: &'a Location) -> Self {
        Annotation {
            severity,
            label: label.into(),
            location,
        }
    }
}

/// A complete diagnostic: a title plus one primary annotation and any number
/// of related (secondary) annotations.
#[derive(Clone, Debug)]
pub struct Report<'a> {
    pub title: Cow<'a, str>,
    pub primary: Annotation<'a>,
    pub related: Vec<Annotation<'a>>,
}

impl<'a> Report<'a> {
    #[must_use]
    pub fn new(title: impl Into<Cow<'a, str>>, primary: Annotation<'a>) -> Self {
        Report {
            title: title.into(),
            primary,
            related: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_related(mut self, related: Annotation<'a>) -> Self {
        self.related.push(related);
        self
    }

    /// Renders the exact Clang-style snippet fixed by the error model:
    ///
    /// ```text
    ///   --> <line>:<col>
    ///    |
    /// <line> | <sourceLineContent>
    ///    |          ^
    /// ```
    ///
    /// followed by one such block per related annotation.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        render_annotation(&mut out, &self.primary, '^');
        for annotation in &self.related {
            render_annotation(&mut out, annotation, '-');
        }
        out
    }
}

fn render_annotation(out: &mut String, annotation: &Annotation<'_>, caret: char) {
    let location = annotation.location;
    let line = location.line();
    let column = location.column();
    let line_text = location.code.line_text(location.offset());
    let gutter = line.to_string();
    let pad = " ".repeat(gutter.len());

    out.push_str(&format!("  --> {line}:{column}\n"));
    out.push_str(&format!("{pad} |\n"));
    out.push_str(&format!("{gutter} | {line_text}\n"));
    out.push_str(&format!(
        "{pad} | {}{} {}\n",
        " ".repeat(column.saturating_sub(1) as usize),
        caret,
        annotation.label
    ));
}

#[cfg(feature = "pretty-snippets")]
mod annotate_snippets_support {
    use super::*;

    impl From<Severity> for annotate_snippets::Level {
        fn from(severity: Severity) -> Self {
            match severity {
                Severity::Error => annotate_snippets::Level::Error,
                Severity::Info => annotate_snippets::Level::Info,
                Severity::Help => annotate_snippets::Level::Help,
            }
        }
    }

    impl<'a> Report<'a> {
        /// Converts this report into an `annotate_snippets::Message`,
        /// grouping annotations that share the same source text into one
        /// `Snippet`.
        #[must_use]
        pub fn to_annotate_snippets_message(&'a self) -> annotate_snippets::Message<'a> {
            let source = &self.primary.location.code.value;
            let origin = self.primary.location.code.source.label();
            let mut snippet = annotate_snippets::Snippet::source(source)
                .origin(origin)
                .fold(true);
            snippet = snippet.annotation(
                annotate_snippets::Level::from(self.primary.severity)
                    .span(self.primary.location.range.clone())
                    .label(&self.primary.label),
            );
            for related in &self.related {
                snippet = snippet.annotation(
                    annotate_snippets::Level::from(related.severity)
                        .span(related.location.range.clone())
                        .label(&related.label),
                );
            }
            annotate_snippets::Level::Error
                .title(&self.title)
                .snippet(snippet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Code, Source};
    use std::sync::Arc;

    #[test]
    fn render_matches_clang_style_layout() {
        let code = Arc::new(Code::new("build: echo hi", Source::Unknown));
        let location = Location {
            code: Arc::clone(&code),
            range: 7..11,
        };
        let report = Report::new(
            "unknown decorator",
            Annotation::new(Severity::Error, "not registered", &location),
        );
        let rendered = report.render();
        assert!(rendered.contains("--> 1:8"));
        assert!(rendered.contains("build: echo hi"));
        assert!(rendered.contains("^ not registered"));
    }
}
