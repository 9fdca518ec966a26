//! `opal_core`: lexer, parser, plan model, and plan tooling for Opal, a
//! decorator-augmented command-orchestration DSL.
//!
//! A source file is lexed ([`lex`]), parsed into an AST ([`syntax`], via
//! [`parser`]), and its decorator calls bound against a
//! [`registry::DecoratorRegistry`] ([`binder`]) to produce a [`plan::Plan`].
//! [`format`], [`diff`], and [`tree`] render or compare plans; [`error`]
//! carries every diagnostic produced along the way.
//!
//! This crate only builds and inspects plans — it never executes a shell
//! command, schedules a watcher, or spawns a process. Running the plan is a
//! separate concern left to a caller.

pub mod binder;
pub mod diff;
pub mod error;
pub mod format;
pub mod invariant;
pub mod lex;
pub mod parser;
pub mod plan;
pub mod registry;
pub mod source;
pub mod syntax;
pub mod tree;

pub use error::{ErrorKind, ParseError, ParseErrorKind, ValidationError};
pub use plan::Plan;
pub use registry::DecoratorRegistry;
pub use syntax::Program;

/// Parses `source` into a [`Program`] using a registry pre-populated with
/// the builtin decorators from [`DecoratorRegistry::with_builtins`].
///
/// `name` is used only in diagnostics (e.g. a file path, or `"<input>"`).
pub fn parse_program(source: &str, name: &str) -> Result<Program, ValidationError> {
    let registry = DecoratorRegistry::with_builtins();
    parser::parse(source, name, &registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_program_uses_builtin_registry() {
        let program = parse_program("build: echo hello", "<test>").unwrap();
        assert_eq!(program.commands.len(), 1);
        assert_eq!(program.commands[0].name, "build");
    }
}
