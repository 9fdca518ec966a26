//! Plan formatter: one-line-per-step canonical text form.

use crate::plan::{Command, ExecutionNode, Logic, Plan, Redirect, RedirectMode, Value};
use std::fmt::Write as _;

/// Formats a whole plan as:
///
/// ```text
/// target: <name>
/// step 1: <step>
/// step 2: <step>
/// ```
#[must_use]
pub fn format_plan(plan: &Plan) -> String {
    let mut out = format!("target: {}\n", plan.target);
    for (i, step) in plan.steps.iter().enumerate() {
        let _ = writeln!(out, "step {}: {}", i + 1, format_node(&step.tree));
    }
    out
}

/// Formats a single execution node via a post-order walk.
#[must_use]
pub fn format_node(node: &ExecutionNode) -> String {
    match node {
        ExecutionNode::Command(command) => format_command(command),
        ExecutionNode::Pipeline(pipeline) => pipeline
            .commands
            .iter()
            .map(format_node)
            .collect::<Vec<_>>()
            .join(" | "),
        ExecutionNode::And(and_or) => {
            format!("{} && {}", format_node(&and_or.left), format_node(&and_or.right))
        }
        ExecutionNode::Or(and_or) => {
            format!("{} || {}", format_node(&and_or.left), format_node(&and_or.right))
        }
        ExecutionNode::Sequence(sequence) => sequence
            .nodes
            .iter()
            .map(format_node)
            .collect::<Vec<_>>()
            .join(" ; "),
        ExecutionNode::Redirect(redirect) => format_redirect(redirect),
        ExecutionNode::Logic(logic) => format_logic(logic),
        ExecutionNode::Try(_) => "try { ... }".to_string(),
    }
}

fn format_command(command: &Command) -> String {
    if command.decorator == "shell" {
        if let Some(value) = command.command_string() {
            return format!("@shell {value}");
        }
    }
    if command.args.is_empty() {
        return format!("@{}", command.decorator);
    }
    let args = command
        .args
        .iter()
        .map(|arg| format!("{}={}", arg.key, format_value(&arg.value)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("@{}({args})", command.decorator)
}

fn format_redirect(redirect: &Redirect) -> String {
    let op = match redirect.mode {
        RedirectMode::Overwrite => ">",
        RedirectMode::Append => ">>",
    };
    format!(
        "{} {op} {}",
        format_node(&redirect.source),
        format_command(&redirect.target)
    )
}

pub(crate) fn format_logic(logic: &Logic) -> String {
    let kind = logic_kind_str(logic.kind);
    match (&logic.condition, &logic.result) {
        (Some(condition), Some(result)) => format!("{kind} {condition} -> {result}"),
        (Some(condition), None) => format!("{kind} {condition}"),
        (None, Some(result)) => format!("{kind} {result}"),
        (None, None) => kind.to_string(),
    }
}

fn logic_kind_str(kind: crate::plan::LogicKind) -> &'static str {
    use crate::plan::LogicKind::*;
    match kind {
        For => "for",
        Call => "call",
        If => "if",
        Else => "else",
    }
}

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Placeholder(r) => format!("${r}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;

    #[test]
    fn formats_a_single_shell_step() {
        let plan = Plan::new("build", vec![ExecutionNode::Command(Command::shell("echo hello"))]);
        assert_eq!(
            format_plan(&plan),
            "target: build\nstep 1: @shell echo hello\n"
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let plan = Plan::new(
            "build",
            vec![
                ExecutionNode::Command(Command::shell("echo a")),
                ExecutionNode::Command(Command::shell("echo b")),
            ],
        );
        assert_eq!(format_plan(&plan), format_plan(&plan));
    }

    #[test]
    fn pipeline_and_logic_rendering() {
        let node = ExecutionNode::Pipeline(crate::plan::Pipeline {
            commands: vec![
                ExecutionNode::Command(Command::shell("echo a")),
                ExecutionNode::Command(Command::shell("grep a")),
            ],
        });
        assert_eq!(format_node(&node), "@shell echo a | @shell grep a");

        let logic = ExecutionNode::Logic(Box::new(Logic {
            kind: crate::plan::LogicKind::For,
            condition: Some("file in files".into()),
            result: None,
            block: Vec::new(),
        }));
        assert_eq!(format_node(&logic), "for file in files");
    }
}
