//! Black-box scenarios covering the external contract of `opal_core`: the
//! AST shapes a few representative sources must parse to, and the
//! deterministic-text and binding properties the formatter/diff/binder
//! are held to regardless of input.

use opal_core::binder::{bind, BoundValue};
use opal_core::diff::{diff_plans, format_diff};
use opal_core::format::format_plan;
use opal_core::plan::{Command, ExecutionNode, Plan};
use opal_core::registry::DecoratorRegistry;
use opal_core::syntax::{CommandContent, Pattern, ShellPart};
use opal_core::{parse_program, ParseErrorKind};

#[test]
fn scenario_one_simple_shell_command() {
    let program = parse_program("build: echo hello", "<scenario1>").unwrap();
    assert_eq!(program.commands.len(), 1);
    let body = &program.commands[0].body;
    assert_eq!(body.len(), 1);
    let CommandContent::Shell(shell) = &body[0] else {
        panic!("expected a single ShellContent");
    };
    assert_eq!(shell.parts.len(), 1);
    assert!(matches!(&shell.parts[0], ShellPart::Text(t) if t.text == "echo hello"));

    let plan = Plan::new(
        "build",
        vec![ExecutionNode::Command(Command::shell("echo hello"))],
    );
    assert_eq!(
        format_plan(&plan),
        "target: build\nstep 1: @shell echo hello\n"
    );
}

#[test]
fn scenario_two_email_address_is_not_a_decorator() {
    let program = parse_program(
        "notify: echo 'Build failed' | mail admin@company.com",
        "<scenario2>",
    )
    .unwrap();
    let CommandContent::Shell(shell) = &program.commands[0].body[0] else {
        panic!("expected ShellContent");
    };
    assert_eq!(shell.parts.len(), 1);
    assert!(matches!(
        &shell.parts[0],
        ShellPart::Text(t) if t.text == "echo 'Build failed' | mail admin@company.com"
    ));
}

#[test]
fn scenario_three_inline_var_decorators_split_text_correctly() {
    let program = parse_program(
        "var IMAGE = \"app\"\nvar TAG = \"latest\"\ndeploy: docker build -t @var(IMAGE):@var(TAG)",
        "<scenario3>",
    )
    .unwrap();
    let CommandContent::Shell(shell) = &program.commands[0].body[0] else {
        panic!("expected ShellContent");
    };
    assert_eq!(shell.parts.len(), 4);
    assert!(matches!(&shell.parts[0], ShellPart::Text(t) if t.text == "docker build -t "));
    assert!(matches!(&shell.parts[1], ShellPart::Decorator(d) if d.name == "var"));
    assert!(matches!(&shell.parts[2], ShellPart::Text(t) if t.text == ":"));
    assert!(matches!(&shell.parts[3], ShellPart::Decorator(d) if d.name == "var"));
}

#[test]
fn scenario_four_parallel_block_holds_three_shell_items() {
    let program = parse_program(
        "services: @parallel { echo a\n echo b\n echo c }",
        "<scenario4>",
    )
    .unwrap();
    let CommandContent::Block(block) = &program.commands[0].body[0] else {
        panic!("expected BlockDecorator");
    };
    assert_eq!(block.name, "parallel");
    assert_eq!(block.content.len(), 3);
    for item in &block.content {
        assert!(matches!(item, CommandContent::Shell(_)));
    }
}

#[test]
fn scenario_five_when_pattern_has_a_wildcard_default_branch() {
    let program = parse_program(
        "deploy: @when(\"ENV\") { production: kubectl apply -f prod/\n default: echo unknown }",
        "<scenario5>",
    )
    .unwrap();
    let CommandContent::Pattern(pattern) = &program.commands[0].body[0] else {
        panic!("expected PatternDecorator");
    };
    assert_eq!(pattern.name, "when");
    assert_eq!(pattern.patterns.len(), 2);
    assert!(matches!(pattern.patterns[0].pattern, Pattern::Identifier(ref n) if n == "production"));
    assert!(matches!(pattern.patterns[1].pattern, Pattern::Wildcard));
}

#[test]
fn scenario_six_modified_step_diff_matches_fixed_layout() {
    let old = Plan::new(
        "deploy",
        vec![ExecutionNode::Command(Command::shell("echo \"Old\""))],
    );
    let new = Plan::new(
        "deploy",
        vec![ExecutionNode::Command(Command::shell("echo \"New\""))],
    );
    let result = diff_plans(&old, &new);
    assert_eq!(
        format_diff(&result, false),
        "Modified steps:\n  step 1:\n    - @shell echo \"Old\"\n    + @shell echo \"New\"\n\n"
    );
}

#[test]
fn property_formatting_is_idempotent_across_varied_plans() {
    let plan = Plan::new(
        "build",
        vec![
            ExecutionNode::Command(Command::shell("echo a")),
            ExecutionNode::Command(Command::shell("echo b")),
            ExecutionNode::Command(Command::shell("echo c")),
        ],
    );
    assert_eq!(format_plan(&plan), format_plan(&plan));
}

#[test]
fn property_diff_of_identical_plans_is_sound() {
    let plan = Plan::new(
        "build",
        vec![ExecutionNode::Command(Command::shell("echo a"))],
    );
    let result = diff_plans(&plan, &plan);
    assert!(result.is_empty());
    assert_eq!(format_diff(&result, false), "No differences found.\n");
}

#[test]
fn property_positional_alignment_counts_match_length_difference() {
    let shorter = Plan::new(
        "build",
        vec![ExecutionNode::Command(Command::shell("echo a"))],
    );
    let longer = Plan::new(
        "build",
        vec![
            ExecutionNode::Command(Command::shell("echo a")),
            ExecutionNode::Command(Command::shell("echo b")),
            ExecutionNode::Command(Command::shell("echo c")),
        ],
    );
    let result = diff_plans(&shorter, &longer);
    assert_eq!(result.added.len(), longer.steps.len() - shorter.steps.len());
    assert_eq!(result.removed.len(), 0);
}

#[test]
fn property_canonical_form_braces_are_a_no_op() {
    let unwrapped = parse_program("build: echo hello", "<a>").unwrap();
    let wrapped = parse_program("build: { echo hello }", "<b>").unwrap();
    let CommandContent::Shell(u) = &unwrapped.commands[0].body[0] else {
        panic!()
    };
    let CommandContent::Shell(w) = &wrapped.commands[0].body[0] else {
        panic!()
    };
    assert_eq!(u.parts.len(), w.parts.len());
    for (a, b) in u.parts.iter().zip(w.parts.iter()) {
        match (a, b) {
            (ShellPart::Text(a), ShellPart::Text(b)) => assert_eq!(a.text, b.text),
            _ => panic!("expected matching text parts"),
        }
    }
}

#[test]
fn property_decorator_detection_leaves_unregistered_at_forms_verbatim() {
    let program = parse_program(
        "notify: curl -X POST @internal-webhook-url",
        "<decorator-detection>",
    )
    .unwrap();
    let CommandContent::Shell(shell) = &program.commands[0].body[0] else {
        panic!("expected ShellContent");
    };
    assert_eq!(shell.parts.len(), 1);
    assert!(matches!(
        &shell.parts[0],
        ShellPart::Text(t) if t.text == "curl -X POST @internal-webhook-url"
    ));
}

#[test]
fn property_binding_is_total_for_a_well_typed_call() {
    let registry = DecoratorRegistry::with_builtins();
    let program = parse_program(
        "build: @retry(3) { echo flaky }",
        "<binding-totality>",
    )
    .unwrap();
    let CommandContent::Block(block) = &program.commands[0].body[0] else {
        panic!("expected BlockDecorator");
    };
    let spec = registry.lookup("retry").unwrap();
    let bound = bind(spec, &block.args, &block.location).unwrap();
    assert_eq!(bound.len(), spec.params.len());
    assert_eq!(bound[0].name, "attempts");
    assert!(matches!(bound[0].value, BoundValue::Number(ref n) if n == "3"));
    assert_eq!(bound[1].name, "delay");
    assert!(matches!(bound[1].value, BoundValue::Duration(0)));
}

#[test]
fn duplicate_command_names_are_reported_as_a_validation_error() {
    let err = parse_program(
        "build: echo one\nbuild: echo two",
        "<duplicate>",
    )
    .unwrap_err();
    assert!(err
        .errors()
        .iter()
        .any(|e| matches!(e.kind, ParseErrorKind::DuplicateCommand { .. })));
}

#[test]
fn unknown_decorator_as_a_block_sugar_position_falls_back_to_shell_text() {
    // `@hit-a-server` is not registered at all, so it must never be treated
    // as decorator syntax — the whole line stays literal shell text, `(`
    // included.
    let program = parse_program(
        "ping: curl https://example.com/@hit-a-server(live)",
        "<unregistered>",
    )
    .unwrap();
    let CommandContent::Shell(shell) = &program.commands[0].body[0] else {
        panic!("expected ShellContent");
    };
    assert_eq!(shell.parts.len(), 1);
}
