//! Decorator registry: classifies decorator names into
//! `{function, block, pattern}` and exposes parameter schemas for the
//! binder.

use indexmap::IndexMap;

/// The type a decorator parameter's value must have.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamType {
    String,
    Number,
    Duration,
    Boolean,
    /// Accepts any bare identifier.
    Identifier,
    /// Accepts any non-literal expression form (used for `@when`'s subject,
    /// which names a variable rather than holding a literal value).
    Expression,
}

impl ParamType {
    /// The diagnostic tag used in "parameter 'X' expects <T>" messages.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            ParamType::String => "STRING",
            ParamType::Number => "NUMBER",
            ParamType::Duration => "DURATION",
            ParamType::Boolean => "BOOLEAN",
            ParamType::Identifier => "IDENTIFIER",
            ParamType::Expression => "EXPRESSION",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl ParamSpec {
    #[must_use]
    pub const fn required(name: &'static str, ty: ParamType) -> Self {
        ParamSpec {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, ty: ParamType, default: DefaultValue) -> Self {
        ParamSpec {
            name,
            ty,
            required: false,
            default: Some(default),
        }
    }
}

/// A default value for an unfilled optional parameter slot.
#[derive(Clone, Debug)]
pub enum DefaultValue {
    String(&'static str),
    Number(i64),
    Boolean(bool),
    /// Duration default expressed in nanoseconds.
    DurationNanos(u128),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecoratorKind {
    Function,
    Block,
    Pattern,
}

#[derive(Clone, Debug)]
pub struct DecoratorSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: DecoratorKind,
    /// Only meaningful for `Block` decorators.
    pub requires_block: bool,
    pub params: Vec<ParamSpec>,
}

/// A read-only-after-construction, process-wide registry of decorators.
/// Reads from multiple threads are safe because nothing is mutated once
/// built.
#[derive(Clone, Debug, Default)]
pub struct DecoratorRegistry {
    function: IndexMap<&'static str, DecoratorSpec>,
    block: IndexMap<&'static str, DecoratorSpec>,
    pattern: IndexMap<&'static str, DecoratorSpec>,
}

impl DecoratorRegistry {
    #[must_use]
    pub fn new() -> Self {
        DecoratorRegistry::default()
    }

    /// A registry pre-populated with the builtin decorators.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = DecoratorRegistry::new();
        registry.register_function(DecoratorSpec {
            name: "var",
            description: "interpolates the value of a declared variable",
            kind: DecoratorKind::Function,
            requires_block: false,
            params: vec![ParamSpec::required("name", ParamType::Identifier)],
        });
        registry.register_function(DecoratorSpec {
            name: "env",
            description: "interpolates an environment variable",
            kind: DecoratorKind::Function,
            requires_block: false,
            params: vec![ParamSpec::required("name", ParamType::String)],
        });

        registry.register_block(DecoratorSpec {
            name: "parallel",
            description: "runs the block's commands concurrently",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![
                ParamSpec::optional("concurrency", ParamType::Number, DefaultValue::Number(0)),
                ParamSpec::optional(
                    "failOnFirstError",
                    ParamType::Boolean,
                    DefaultValue::Boolean(false),
                ),
            ],
        });
        registry.register_block(DecoratorSpec {
            name: "timeout",
            description: "fails the block if it runs longer than the given duration",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![ParamSpec::required("duration", ParamType::Duration)],
        });
        registry.register_block(DecoratorSpec {
            name: "retry",
            description: "re-runs the block on failure",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![
                ParamSpec::required("attempts", ParamType::Number),
                ParamSpec::optional(
                    "delay",
                    ParamType::Duration,
                    DefaultValue::DurationNanos(0),
                ),
            ],
        });
        registry.register_block(DecoratorSpec {
            name: "cwd",
            description: "runs the block with a different working directory",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![ParamSpec::required("directory", ParamType::String)],
        });
        registry.register_block(DecoratorSpec {
            name: "debounce",
            description: "collapses rapid repeated triggers of the block",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![
                ParamSpec::required("delay", ParamType::Duration),
                ParamSpec::optional("pattern", ParamType::String, DefaultValue::String("")),
            ],
        });
        registry.register_block(DecoratorSpec {
            name: "confirm",
            description: "prompts for confirmation before running the block",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![
                ParamSpec::optional(
                    "message",
                    ParamType::String,
                    DefaultValue::String("Are you sure?"),
                ),
                ParamSpec::optional(
                    "defaultYes",
                    ParamType::Boolean,
                    DefaultValue::Boolean(false),
                ),
            ],
        });
        registry.register_block(DecoratorSpec {
            name: "watch-files",
            description: "re-runs the block when matching files change",
            kind: DecoratorKind::Block,
            requires_block: true,
            params: vec![
                ParamSpec::optional("pattern", ParamType::String, DefaultValue::String("**/*")),
                ParamSpec::optional(
                    "interval",
                    ParamType::Duration,
                    DefaultValue::DurationNanos(0),
                ),
                ParamSpec::optional(
                    "recursive",
                    ParamType::Boolean,
                    DefaultValue::Boolean(true),
                ),
            ],
        });

        registry.register_pattern(DecoratorSpec {
            name: "when",
            description: "branches on the value of a variable",
            kind: DecoratorKind::Pattern,
            requires_block: false,
            params: vec![ParamSpec::required("variable", ParamType::Expression)],
        });
        registry.register_pattern(DecoratorSpec {
            name: "try",
            description: "runs try/catch/finally branches",
            kind: DecoratorKind::Pattern,
            requires_block: false,
            params: vec![],
        });

        registry
    }

    pub fn register_function(&mut self, spec: DecoratorSpec) {
        self.function.insert(spec.name, spec);
    }

    pub fn register_block(&mut self, spec: DecoratorSpec) {
        self.block.insert(spec.name, spec);
    }

    pub fn register_pattern(&mut self, spec: DecoratorSpec) {
        self.pattern.insert(spec.name, spec);
    }

    /// Classifies `name`, returning `None` if it is not registered.
    #[must_use]
    pub fn classify(&self, name: &str) -> Option<DecoratorKind> {
        self.lookup(name).map(|spec| spec.kind)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DecoratorSpec> {
        self.function
            .get(name)
            .or_else(|| self.block.get(name))
            .or_else(|| self.pattern.get(name))
    }

    #[must_use]
    pub fn is_function(&self, name: &str) -> bool {
        self.function.contains_key(name)
    }

    #[must_use]
    pub fn is_block(&self, name: &str) -> bool {
        self.block.contains_key(name)
    }

    #[must_use]
    pub fn is_pattern(&self, name: &str) -> bool {
        self.pattern.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_classified_correctly() {
        let registry = DecoratorRegistry::with_builtins();
        assert_eq!(registry.classify("var"), Some(DecoratorKind::Function));
        assert_eq!(registry.classify("env"), Some(DecoratorKind::Function));
        assert_eq!(registry.classify("timeout"), Some(DecoratorKind::Block));
        assert_eq!(registry.classify("parallel"), Some(DecoratorKind::Block));
        assert_eq!(registry.classify("when"), Some(DecoratorKind::Pattern));
        assert_eq!(registry.classify("try"), Some(DecoratorKind::Pattern));
        assert_eq!(registry.classify("nope"), None);
    }

    #[test]
    fn registration_is_additive() {
        let mut registry = DecoratorRegistry::with_builtins();
        registry.register_function(DecoratorSpec {
            name: "secret",
            description: "test-only decorator",
            kind: DecoratorKind::Function,
            requires_block: false,
            params: vec![],
        });
        assert_eq!(registry.classify("secret"), Some(DecoratorKind::Function));
        // Builtins are untouched.
        assert_eq!(registry.classify("var"), Some(DecoratorKind::Function));
    }
}
