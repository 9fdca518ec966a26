//! Abstract syntax tree produced by the parser.
//!
//! Every node that can be the target of a diagnostic carries a
//! [`Location`]. Polymorphic constructs (expressions, shell parts, command
//! content, patterns) are modeled as tagged enums, matched exhaustively by
//! every downstream consumer (the formatter, the diff, and the tree
//! renderer) rather than by any shared trait object — the same shape the
//! teacher crate uses for its own AST.

use crate::source::Location;

/// A parsed source file: top-level variable declarations, grouped variable
/// declarations, and command declarations.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub variables: Vec<VarDecl>,
    pub var_groups: Vec<VarGroup>,
    pub commands: Vec<CommandDecl>,
}

/// `var NAME = VALUE`.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: String,
    pub value: Expression,
    pub location: Location,
}

/// `var ( VarDecl* )`.
#[derive(Clone, Debug)]
pub struct VarGroup {
    pub variables: Vec<VarDecl>,
    pub location: Location,
}

/// Whether a command declaration is a plain target, a `watch` target, or a
/// `stop` target. A `watch` and a `stop` target may share a name; two
/// declarations of the *same* kind with the same name are a duplicate-name
/// error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    Command,
    WatchCommand,
    StopCommand,
}

#[derive(Clone, Debug)]
pub struct CommandDecl {
    pub name: String,
    pub kind: CommandKind,
    pub body: CommandBody,
    pub location: Location,
}

/// The body of a command: an ordered sequence of content items.
pub type CommandBody = Vec<CommandContent>;

/// One item within a command body.
#[derive(Clone, Debug)]
pub enum CommandContent {
    Shell(ShellContent),
    Block(BlockDecorator),
    Pattern(PatternDecorator),
}

/// A run of shell text interleaved with inline function decorators.
#[derive(Clone, Debug)]
pub struct ShellContent {
    pub parts: Vec<ShellPart>,
    pub location: Location,
}

#[derive(Clone, Debug)]
pub enum ShellPart {
    Text(TextPart),
    Decorator(FunctionDecorator),
}

#[derive(Clone, Debug)]
pub struct TextPart {
    pub text: String,
    pub location: Location,
}

/// `@name(args)` appearing inline in shell text, or as the value of a
/// decorator argument.
#[derive(Clone, Debug)]
pub struct FunctionDecorator {
    pub name: String,
    pub args: Vec<NamedParameter>,
    pub location: Location,
}

/// `@name(args) { content* }` — modifies execution of a brace-delimited
/// body.
#[derive(Clone, Debug)]
pub struct BlockDecorator {
    pub name: String,
    pub args: Vec<NamedParameter>,
    pub content: Vec<CommandContent>,
    pub location: Location,
}

/// `@name(args) { pattern: content ... }` — a list of branches selected at
/// execution time.
#[derive(Clone, Debug)]
pub struct PatternDecorator {
    pub name: String,
    pub args: Vec<NamedParameter>,
    pub patterns: Vec<PatternBranch>,
    pub location: Location,
}

#[derive(Clone, Debug)]
pub enum Pattern {
    Identifier(String),
    Wildcard,
}

#[derive(Clone, Debug)]
pub struct PatternBranch {
    pub pattern: Pattern,
    pub commands: Vec<CommandContent>,
    pub location: Location,
}

/// A decorator call argument: `[name =] value`.
#[derive(Clone, Debug)]
pub struct NamedParameter {
    pub name: Option<String>,
    pub value: Expression,
}

/// A literal or identifier value used as a decorator argument or a
/// variable's value. A `FunctionDecorator` never
/// appears as the value of another decorator's argument — nesting is
/// rejected at parse time.
#[derive(Clone, Debug)]
pub enum Expression {
    String { raw: String, value: String, location: Location },
    Number { raw: String, location: Location },
    Duration { raw: String, nanos: u128, location: Location },
    Boolean { value: bool, location: Location },
    Identifier { name: String, location: Location },
}

impl Expression {
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Expression::String { location, .. }
            | Expression::Number { location, .. }
            | Expression::Duration { location, .. }
            | Expression::Boolean { location, .. }
            | Expression::Identifier { location, .. } => location,
        }
    }

    /// The tag name used in diagnostics ("Recognized decorator argument
    /// type tags").
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Expression::String { .. } => "STRING",
            Expression::Number { .. } => "NUMBER",
            Expression::Duration { .. } => "DURATION",
            Expression::Boolean { .. } => "BOOLEAN",
            Expression::Identifier { .. } => "IDENTIFIER",
        }
    }
}
