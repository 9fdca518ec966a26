//! Recursive-descent parser: turns a token stream from [`crate::lex`]
//! into a [`crate::syntax::Program`], normalizing the three command-body
//! sugar forms into one uniform `Vec<CommandContent>` shape and
//! accumulating, rather than aborting on, the first error.

pub mod decorator;

use crate::error::{ParseError, ParseErrorKind, ValidationError};
use crate::lex::{Keyword, Lexer, TokenKind};
use crate::registry::{DecoratorKind, DecoratorRegistry};
use crate::source::Location;
use crate::syntax::{
    BlockDecorator, CommandBody, CommandContent, CommandDecl, CommandKind, Expression,
    NamedParameter, Pattern, PatternBranch, PatternDecorator, Program, ShellContent, VarDecl,
    VarGroup,
};
use std::collections::HashMap;

/// Parses `source` against `registry`, returning every top-level and
/// nested declaration reachable from a single pass. Errors are
/// accumulated: a malformed declaration is skipped (after resynchronizing
/// at the next `var`/`watch`/`stop`/command-name boundary) rather than
/// stopping the whole parse.
pub fn parse(source: &str, name: &str, registry: &DecoratorRegistry) -> Result<Program, ValidationError> {
    let mut parser = Parser {
        lexer: Lexer::new(source, name),
        registry,
        errors: Vec::new(),
    };
    let program = parser.parse_program();
    parser.validate(&program);
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(ValidationError(parser.errors))
    }
}

struct Parser<'r> {
    lexer: Lexer,
    registry: &'r DecoratorRegistry,
    errors: Vec<ParseError>,
}

impl<'r> Parser<'r> {
    fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        loop {
            if let Err(e) = self.lexer.skip_insignificant() {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnterminatedComment,
                    e.location,
                ));
                self.synchronize();
                continue;
            }
            let save = self.lexer.mark();
            let token = match self.lexer.next_structural() {
                Ok(t) => t,
                Err(e) => {
                    self.errors.push(ParseError::new(
                        lex_error_kind(&e.message),
                        e.location,
                    ));
                    self.synchronize();
                    continue;
                }
            };
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Keyword(Keyword::Var) => match self.parse_var_item() {
                    Ok(VarItem::Decl(decl)) => program.variables.push(decl),
                    Ok(VarItem::Group(group)) => program.var_groups.push(group),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize();
                    }
                },
                TokenKind::Keyword(Keyword::Watch) => {
                    self.parse_command_decl(CommandKind::WatchCommand, &mut program);
                }
                TokenKind::Keyword(Keyword::Stop) => {
                    self.parse_command_decl(CommandKind::StopCommand, &mut program);
                }
                TokenKind::Identifier(_) => {
                    self.lexer.reset(save);
                    self.parse_command_decl(CommandKind::Command, &mut program);
                }
                _ => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::ExpectedToken {
                            expected: "a variable or command declaration",
                        },
                        token.location,
                    ));
                    self.synchronize();
                }
            }
        }
        program
    }

    /// Advances past tokens until the next one that could start a
    /// top-level declaration, or EOF. Lex errors encountered while
    /// resynchronizing are swallowed: we are no longer trying to produce a
    /// faithful token stream, only to find solid ground.
    fn synchronize(&mut self) {
        loop {
            let save = self.lexer.mark();
            match self.lexer.next_structural() {
                Ok(token) => match token.kind {
                    TokenKind::Eof
                    | TokenKind::Keyword(Keyword::Var)
                    | TokenKind::Keyword(Keyword::Watch)
                    | TokenKind::Keyword(Keyword::Stop)
                    | TokenKind::Identifier(_) => {
                        self.lexer.reset(save);
                        return;
                    }
                    _ => {}
                },
                Err(_) => {
                    // Step past one byte so a persistently-unlexable
                    // character can't loop forever.
                    self.lexer.reset(save);
                    self.lexer.bump_one_for_recovery();
                }
            }
        }
    }

    fn parse_var_item(&mut self) -> Result<VarItem, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let save = self.lexer.mark();
        let token = self.lexer.next_structural().map_err(lex_err)?;
        if token.kind == TokenKind::LParen {
            let mut variables = Vec::new();
            loop {
                self.lexer.skip_insignificant().map_err(lex_err)?;
                let save2 = self.lexer.mark();
                let peeked = self.lexer.next_structural().map_err(lex_err)?;
                if peeked.kind == TokenKind::RParen {
                    break;
                }
                self.lexer.reset(save2);
                variables.push(self.parse_var_binding()?);
            }
            Ok(VarItem::Group(VarGroup {
                variables,
                location: token.location,
            }))
        } else {
            self.lexer.reset(save);
            Ok(VarItem::Decl(self.parse_var_binding()?))
        }
    }

    /// `IDENT "=" Literal`, shared by a bare `var` declaration and each
    /// entry inside a `var ( ... )` group.
    fn parse_var_binding(&mut self) -> Result<VarDecl, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let name_token = self.lexer.next_structural().map_err(lex_err)?;
        let TokenKind::Identifier(name) = name_token.kind else {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedToken {
                    expected: "a variable name",
                },
                name_token.location,
            ));
        };
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let eq_token = self.lexer.next_structural().map_err(lex_err)?;
        if eq_token.kind != TokenKind::Equals {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedToken { expected: "'='" },
                eq_token.location,
            ));
        }
        let value = self.parse_literal_expression()?;
        let start = name_token.location.offset();
        let end = value.location().offset() + value.location().text().len();
        Ok(VarDecl {
            name,
            value,
            location: Location {
                code: std::sync::Arc::clone(&name_token.location.code),
                range: start..end,
            },
        })
    }

    /// A variable's value is restricted to one of the four literal kinds
    /// unquoted identifiers are never accepted here.
    fn parse_literal_expression(&mut self) -> Result<Expression, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let token = self.lexer.next_structural().map_err(lex_err)?;
        match token.kind {
            TokenKind::String { raw, value } => Ok(Expression::String {
                raw,
                value,
                location: token.location,
            }),
            TokenKind::Number(raw) => Ok(Expression::Number {
                raw,
                location: token.location,
            }),
            TokenKind::Duration { raw, nanos } => Ok(Expression::Duration {
                raw,
                nanos,
                location: token.location,
            }),
            TokenKind::Boolean(value) => Ok(Expression::Boolean {
                value,
                location: token.location,
            }),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedToken {
                    expected: "a string, number, duration, or boolean literal",
                },
                token.location,
            )),
        }
    }

    /// Used for decorator arguments, where a bare identifier (naming a
    /// variable) is also accepted.
    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let token = self.lexer.next_structural().map_err(lex_err)?;
        match token.kind {
            TokenKind::String { raw, value } => Ok(Expression::String {
                raw,
                value,
                location: token.location,
            }),
            TokenKind::Number(raw) => Ok(Expression::Number {
                raw,
                location: token.location,
            }),
            TokenKind::Duration { raw, nanos } => Ok(Expression::Duration {
                raw,
                nanos,
                location: token.location,
            }),
            TokenKind::Boolean(value) => Ok(Expression::Boolean {
                value,
                location: token.location,
            }),
            TokenKind::Identifier(name) => Ok(Expression::Identifier {
                name,
                location: token.location,
            }),
            TokenKind::At => Err(ParseError::new(
                ParseErrorKind::NestedFunctionDecorator,
                token.location,
            )),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedToken {
                    expected: "a literal or identifier",
                },
                token.location,
            )),
        }
    }

    fn parse_command_decl(&mut self, kind: CommandKind, program: &mut Program) {
        let result = (|| -> Result<CommandDecl, ParseError> {
            self.lexer.skip_insignificant().map_err(lex_err)?;
            let name_token = self.lexer.next_structural().map_err(lex_err)?;
            let TokenKind::Identifier(name) = name_token.kind else {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedToken {
                        expected: "a command name",
                    },
                    name_token.location,
                ));
            };
            self.lexer.skip_insignificant().map_err(lex_err)?;
            let colon_token = self.lexer.next_structural().map_err(lex_err)?;
            if colon_token.kind != TokenKind::Colon {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedToken { expected: "':'" },
                    colon_token.location,
                ));
            }
            let body = self.parse_command_body()?;
            Ok(CommandDecl {
                name,
                kind,
                body,
                location: name_token.location,
            })
        })();
        match result {
            Ok(decl) => program.commands.push(decl),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
            }
        }
    }

    /// `CommandBody := Block | DecoratorSugar | ShellContent`. The
    /// three forms collapse to the same `Vec<CommandContent>` shape: an
    /// explicit `{ ... }` block may hold many items, while the decorator
    /// and plain-shell sugar forms always produce exactly one.
    fn parse_command_body(&mut self) -> Result<CommandBody, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let save = self.lexer.mark();
        let token = self.lexer.next_structural().map_err(lex_err)?;
        match token.kind {
            TokenKind::LBrace => self.parse_block_items(),
            TokenKind::Eof => Ok(Vec::new()),
            TokenKind::At => {
                let name_token = self.lexer.next_structural().map_err(lex_err)?;
                if let TokenKind::Identifier(name) = &name_token.kind {
                    match self.registry.classify(name) {
                        Some(DecoratorKind::Block) => {
                            return Ok(vec![self
                                .parse_block_decorator(name.clone(), token.location)?]);
                        }
                        Some(DecoratorKind::Pattern) => {
                            return Ok(vec![self
                                .parse_pattern_decorator(name.clone(), token.location)?]);
                        }
                        Some(DecoratorKind::Function) => {}
                        None => {
                            return Err(ParseError::new(
                                ParseErrorKind::UnknownDecorator { name: name.clone() },
                                name_token.location,
                            ));
                        }
                    }
                }
                self.lexer.reset(save);
                self.parse_single_shell_line()
            }
            _ => {
                self.lexer.reset(save);
                self.parse_single_shell_line()
            }
        }
    }

    fn parse_single_shell_line(&mut self) -> Result<CommandBody, ParseError> {
        let token = self.lexer.next_shell_text().map_err(lex_err)?;
        let TokenKind::ShellText(raw) = token.kind else {
            unreachable!("next_shell_text always returns ShellText")
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let parts = decorator::extract_inline_decorators(&raw, &token.location, self.registry)?;
        Ok(vec![CommandContent::Shell(ShellContent {
            parts,
            location: token.location,
        })])
    }

    fn parse_block_items(&mut self) -> Result<CommandBody, ParseError> {
        let mut content = Vec::new();
        loop {
            self.lexer.skip_insignificant().map_err(lex_err)?;
            let save = self.lexer.mark();
            let token = self.lexer.next_structural().map_err(lex_err)?;
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedToken { expected: "'}'" },
                        token.location,
                    ));
                }
                _ => {
                    self.lexer.reset(save);
                    content.push(self.parse_content_item()?);
                }
            }
        }
        Ok(content)
    }

    /// Tries a block- or pattern-decorator lookahead; falls back to
    /// re-lexing the same span as a shell-text run when the `@name` isn't
    /// registered as either.
    fn parse_content_item(&mut self) -> Result<CommandContent, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let save = self.lexer.mark();
        let token = self.lexer.next_structural().map_err(lex_err)?;
        if token.kind == TokenKind::At {
            let name_token = self.lexer.next_structural().map_err(lex_err)?;
            if let TokenKind::Identifier(name) = &name_token.kind {
                match self.registry.classify(name) {
                    Some(DecoratorKind::Block) => {
                        return self.parse_block_decorator(name.clone(), token.location);
                    }
                    Some(DecoratorKind::Pattern) => {
                        return self.parse_pattern_decorator(name.clone(), token.location);
                    }
                    Some(DecoratorKind::Function) => {}
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::UnknownDecorator { name: name.clone() },
                            name_token.location,
                        ));
                    }
                }
            }
        }
        self.lexer.reset(save);
        let shell_token = self.lexer.next_shell_text().map_err(lex_err)?;
        let TokenKind::ShellText(raw) = shell_token.kind else {
            unreachable!("next_shell_text always returns ShellText")
        };
        let parts = decorator::extract_inline_decorators(&raw, &shell_token.location, self.registry)?;
        Ok(CommandContent::Shell(ShellContent {
            parts,
            location: shell_token.location,
        }))
    }

    fn parse_block_decorator(
        &mut self,
        name: String,
        at_location: Location,
    ) -> Result<CommandContent, ParseError> {
        let args = self.parse_optional_arg_list()?;
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let brace = self.lexer.next_structural().map_err(lex_err)?;
        if brace.kind != TokenKind::LBrace {
            return Err(ParseError::new(
                ParseErrorKind::MissingBlockBody { name },
                brace.location,
            ));
        }
        let content = self.parse_block_items()?;
        Ok(CommandContent::Block(BlockDecorator {
            name,
            args,
            content,
            location: at_location,
        }))
    }

    fn parse_pattern_decorator(
        &mut self,
        name: String,
        at_location: Location,
    ) -> Result<CommandContent, ParseError> {
        let args = self.parse_optional_arg_list()?;
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let brace = self.lexer.next_structural().map_err(lex_err)?;
        if brace.kind != TokenKind::LBrace {
            return Err(ParseError::new(
                ParseErrorKind::MissingBlockBody { name },
                brace.location,
            ));
        }
        let mut patterns = Vec::new();
        let mut seen_wildcard = false;
        loop {
            self.lexer.skip_insignificant().map_err(lex_err)?;
            let save = self.lexer.mark();
            let token = self.lexer.next_structural().map_err(lex_err)?;
            if token.kind == TokenKind::RBrace {
                break;
            }
            self.lexer.reset(save);
            let branch = self.parse_pattern_branch()?;
            if matches!(branch.pattern, Pattern::Wildcard) {
                if seen_wildcard {
                    return Err(ParseError::new(
                        ParseErrorKind::DuplicateWildcardBranch,
                        branch.location,
                    ));
                }
                seen_wildcard = true;
            }
            patterns.push(branch);
        }
        Ok(CommandContent::Pattern(PatternDecorator {
            name,
            args,
            patterns,
            location: at_location,
        }))
    }

    fn parse_pattern_branch(&mut self) -> Result<PatternBranch, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let name_token = self.lexer.next_structural().map_err(lex_err)?;
        let pattern = match name_token.kind {
            TokenKind::Identifier(name) if name == "default" => Pattern::Wildcard,
            TokenKind::Identifier(name) => Pattern::Identifier(name),
            TokenKind::Asterisk => Pattern::Wildcard,
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedToken {
                        expected: "a pattern branch name",
                    },
                    name_token.location,
                ));
            }
        };
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let colon = self.lexer.next_structural().map_err(lex_err)?;
        if colon.kind != TokenKind::Colon {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedToken { expected: "':'" },
                colon.location,
            ));
        }
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let save = self.lexer.mark();
        let peeked = self.lexer.next_structural().map_err(lex_err)?;
        let commands = if peeked.kind == TokenKind::LBrace {
            self.parse_block_items()?
        } else {
            self.lexer.reset(save);
            vec![self.parse_content_item()?]
        };
        Ok(PatternBranch {
            pattern,
            commands,
            location: name_token.location,
        })
    }

    /// `"(" [Arg ("," Arg)*] ")"`, or nothing if no `(` follows.
    fn parse_optional_arg_list(&mut self) -> Result<Vec<NamedParameter>, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let save = self.lexer.mark();
        let token = self.lexer.next_structural().map_err(lex_err)?;
        if token.kind != TokenKind::LParen {
            self.lexer.reset(save);
            return Ok(Vec::new());
        }
        let mut args = Vec::new();
        loop {
            self.lexer.skip_insignificant().map_err(lex_err)?;
            let save2 = self.lexer.mark();
            let peeked = self.lexer.next_structural().map_err(lex_err)?;
            if peeked.kind == TokenKind::RParen {
                break;
            }
            self.lexer.reset(save2);
            args.push(self.parse_arg()?);
            self.lexer.skip_insignificant().map_err(lex_err)?;
            let save3 = self.lexer.mark();
            let sep = self.lexer.next_structural().map_err(lex_err)?;
            match sep.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => break,
                _ => {
                    self.lexer.reset(save3);
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedToken {
                            expected: "',' or ')'",
                        },
                        sep.location,
                    ));
                }
            }
        }
        Ok(args)
    }

    /// `[IDENT "="] Expression` — a two-token lookahead decides whether a
    /// leading identifier names a parameter or is itself the positional
    /// value.
    fn parse_arg(&mut self) -> Result<NamedParameter, ParseError> {
        self.lexer.skip_insignificant().map_err(lex_err)?;
        let save = self.lexer.mark();
        let token = self.lexer.next_structural().map_err(lex_err)?;
        if let TokenKind::Identifier(name) = &token.kind {
            let save2 = self.lexer.mark();
            let next = self.lexer.next_structural().map_err(lex_err)?;
            if next.kind == TokenKind::Equals {
                let value = self.parse_expression()?;
                return Ok(NamedParameter {
                    name: Some(name.clone()),
                    value,
                });
            }
            self.lexer.reset(save2);
            return Ok(NamedParameter {
                name: None,
                value: Expression::Identifier {
                    name: name.clone(),
                    location: token.location,
                },
            });
        }
        self.lexer.reset(save);
        let value = self.parse_expression()?;
        Ok(NamedParameter { name: None, value })
    }

    /// Cross-checks the fully parsed program: duplicate/conflicting
    /// command names and references to undeclared variables via
    /// `@var(...)`.
    fn validate(&mut self, program: &Program) {
        let mut kinds_by_name: HashMap<&str, Vec<CommandKind>> = HashMap::new();
        for decl in &program.commands {
            let entry = kinds_by_name.entry(decl.name.as_str()).or_default();
            if entry.contains(&decl.kind) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::DuplicateCommand {
                        name: decl.name.clone(),
                    },
                    decl.location.clone(),
                ));
            } else {
                let allowed = !entry.is_empty()
                    && entry.iter().all(|k| *k != CommandKind::Command)
                    && decl.kind != CommandKind::Command;
                if !entry.is_empty() && !allowed {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::ConflictingCommandKind {
                            name: decl.name.clone(),
                        },
                        decl.location.clone(),
                    ));
                }
                entry.push(decl.kind);
            }
        }

        let mut declared: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let all_vars = program
            .variables
            .iter()
            .chain(program.var_groups.iter().flat_map(|g| g.variables.iter()));
        for var in all_vars {
            if !declared.insert(var.name.as_str()) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::DuplicateVariable {
                        name: var.name.clone(),
                    },
                    var.location.clone(),
                ));
            }
        }
        for decl in &program.commands {
            self.check_var_refs(&decl.body, &declared);
        }
    }

    fn check_var_refs(&mut self, body: &[CommandContent], declared: &std::collections::HashSet<&str>) {
        for item in body {
            match item {
                CommandContent::Shell(shell) => {
                    for part in &shell.parts {
                        if let crate::syntax::ShellPart::Decorator(func) = part {
                            self.check_function_decorator(func, declared);
                        }
                    }
                }
                CommandContent::Block(block) => {
                    for arg in &block.args {
                        self.check_expression_refs(&arg.value, declared);
                    }
                    self.check_var_refs(&block.content, declared);
                }
                CommandContent::Pattern(pattern) => {
                    for arg in &pattern.args {
                        self.check_expression_refs(&arg.value, declared);
                    }
                    for branch in &pattern.patterns {
                        self.check_var_refs(&branch.commands, declared);
                    }
                }
            }
        }
    }

    fn check_function_decorator(
        &mut self,
        func: &crate::syntax::FunctionDecorator,
        declared: &std::collections::HashSet<&str>,
    ) {
        if func.name == "var" {
            if let Some(arg) = func.args.first() {
                self.check_expression_refs(&arg.value, declared);
            }
        }
    }

    fn check_expression_refs(&mut self, expr: &Expression, declared: &std::collections::HashSet<&str>) {
        if let Expression::Identifier { name, location } = expr {
            if !declared.contains(name.as_str()) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UndefinedVariable { name: name.clone() },
                    location.clone(),
                ));
            }
        }
    }
}

enum VarItem {
    Decl(VarDecl),
    Group(VarGroup),
}

fn lex_err(e: crate::lex::LexError) -> ParseError {
    ParseError::new(lex_error_kind(&e.message), e.location)
}

fn lex_error_kind(message: &str) -> ParseErrorKind {
    if message.contains("string") {
        ParseErrorKind::UnterminatedString
    } else if message.contains("comment") {
        ParseErrorKind::UnterminatedComment
    } else if let Some(c) = message.strip_prefix("unexpected character '").and_then(|s| s.strip_suffix('\'')) {
        ParseErrorKind::UnexpectedCharacter {
            found: c.chars().next().unwrap_or('?'),
        }
    } else {
        ParseErrorKind::UnmatchedParen
    }
}
