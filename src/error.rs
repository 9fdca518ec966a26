//! Structured parse, validation, and binding errors.

use crate::source::pretty::{Annotation, Report, Severity};
use crate::source::Location;
use thiserror::Error;

/// The broad category a [`ParseError`] falls into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Syntax,
    TypeMismatch,
    Unexpected,
    Missing,
    Invalid,
    Validation,
    Binding,
}

/// Every distinct parse/validation/binding failure the parser or binder can
/// report, each carrying exactly the context needed to render a diagnostic.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unmatched parenthesis in decorator argument list")]
    UnmatchedParen,
    #[error("unterminated multiline comment")]
    UnterminatedComment,
    #[error("unexpected character '{found}'")]
    UnexpectedCharacter { found: char },

    #[error("expected '{expected}'")]
    ExpectedToken { expected: &'static str },
    #[error("duplicate command '{name}'")]
    DuplicateCommand { name: String },
    #[error("'{name}' is declared as both a watch command and a stop command")]
    ConflictingCommandKind { name: String },
    #[error("nested function decorator is not allowed here")]
    NestedFunctionDecorator,
    #[error("unclosed variable reference")]
    UnclosedVariableReference,

    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("unknown decorator '@{name}'")]
    UnknownDecorator { name: String },
    #[error("'@{name}' requires a block body")]
    MissingBlockBody { name: String },
    #[error("more than one wildcard pattern branch")]
    DuplicateWildcardBranch,
    #[error("duplicate variable '{name}'")]
    DuplicateVariable { name: String },

    #[error("too many arguments")]
    TooManyArguments,
    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },
    #[error("duplicate value for parameter '{name}'")]
    DuplicateParameter { name: String },
    #[error("positional argument follows a named argument")]
    PositionalAfterNamed,
    #[error("missing required parameter '{name}'")]
    MissingRequiredParameter { name: String },
    #[error("parameter '{name}' expects {expected}, got {found}")]
    ParameterTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl ParseErrorKind {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        use ParseErrorKind::*;
        match self {
            UnterminatedString | UnmatchedParen | UnterminatedComment | UnexpectedCharacter { .. } => {
                ErrorKind::Syntax
            }
            ExpectedToken { .. } => ErrorKind::Unexpected,
            DuplicateCommand { .. } | ConflictingCommandKind { .. } | DuplicateVariable { .. } => {
                ErrorKind::Validation
            }
            NestedFunctionDecorator | UnclosedVariableReference => ErrorKind::Invalid,
            UndefinedVariable { .. } | UnknownDecorator { .. } | MissingBlockBody { .. }
            | DuplicateWildcardBranch => ErrorKind::Validation,
            TooManyArguments
            | UnknownParameter { .. }
            | DuplicateParameter { .. }
            | PositionalAfterNamed
            | MissingRequiredParameter { .. } => ErrorKind::Binding,
            ParameterTypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }

    /// A short label pointing at the offending span, used as the primary
    /// annotation in the rendered snippet.
    #[must_use]
    pub fn label(&self) -> String {
        use ParseErrorKind::*;
        match self {
            UnterminatedString => "string is never closed".into(),
            UnmatchedParen => "expected ')'".into(),
            UnterminatedComment => "comment is never closed".into(),
            UnexpectedCharacter { .. } => "not valid here".into(),
            ExpectedToken { expected } => format!("expected {expected}"),
            DuplicateCommand { name } => format!("'{name}' is already defined"),
            ConflictingCommandKind { name } => format!("conflicts with another '{name}'"),
            NestedFunctionDecorator => "decorator arguments cannot contain decorators".into(),
            UnclosedVariableReference => "reference never closes".into(),
            UndefinedVariable { name } => format!("'{name}' is never declared"),
            UnknownDecorator { name } => format!("'@{name}' is not registered"),
            MissingBlockBody { name } => format!("'@{name}' must be followed by '{{ ... }}'"),
            DuplicateWildcardBranch => "only one 'default' branch is allowed".into(),
            DuplicateVariable { name } => format!("'{name}' is already declared"),
            TooManyArguments => "unexpected extra argument".into(),
            UnknownParameter { name } => format!("no parameter named '{name}'"),
            DuplicateParameter { name } => format!("'{name}' is already bound"),
            PositionalAfterNamed => "positional arguments must come first".into(),
            MissingRequiredParameter { name } => format!("'{name}' must be supplied"),
            ParameterTypeMismatch { .. } => "wrong argument type".into(),
        }
    }
}

/// One parse/validation/binding failure, located in the source.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: Location,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, location: Location) -> Self {
        ParseError { kind, location }
    }

    /// Renders the exact Clang-style snippet fixed by the diagnostic format.
    #[must_use]
    pub fn render(&self) -> String {
        let report = Report::new(
            self.kind.to_string(),
            Annotation::new(Severity::Error, self.kind.label(), &self.location),
        );
        report.render()
    }
}

/// A collection of parse errors, accumulated across one parse run and
/// synchronized at top-level boundaries.
#[derive(Clone, Debug, Error)]
#[error("{} error(s) while parsing", self.0.len())]
pub struct ValidationError(pub Vec<ParseError>);

impl ValidationError {
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders every contained error's snippet, separated by a blank line.
    #[must_use]
    pub fn render(&self) -> String {
        use itertools::Itertools;
        self.0.iter().map(ParseError::render).join("\n")
    }
}

impl From<ParseError> for ValidationError {
    fn from(error: ParseError) -> Self {
        ValidationError(vec![error])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Code, Source};
    use std::sync::Arc;

    #[test]
    fn render_includes_line_and_caret() {
        let code = Arc::new(Code::new("foo: @nope(x)\n", Source::Unknown));
        let location = Location {
            code: Arc::clone(&code),
            range: 6..10,
        };
        let error = ParseError::new(
            ParseErrorKind::UnknownDecorator {
                name: "nope".into(),
            },
            location,
        );
        let rendered = error.render();
        assert!(rendered.contains("unknown decorator '@nope'"));
        assert!(rendered.contains("--> 1:7"));
        assert!(rendered.contains("^ 'nope' is not registered"));
    }
}
