//! Tree renderer: an indented tree view of a plan, with iteration
//! grouping for `for`-style logic nodes and dedicated try/catch/finally
//! layout.

use crate::format::{format_logic, format_value};
use crate::plan::{Command, ExecutionNode, Logic, LogicKind, Plan, Redirect, RedirectMode, Step, Try};

const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Renders one execution node the way the tree view does: like
/// [`crate::format::format_node`] for every node kind except `Command`,
/// whose decorator name is colorized and whose argument list drops the
/// formatter's parens/commas in favor of space-separated `k=v` pairs.
fn render_node(node: &ExecutionNode, use_color: bool) -> String {
    match node {
        ExecutionNode::Command(command) => render_command(command, use_color),
        ExecutionNode::Pipeline(pipeline) => pipeline
            .commands
            .iter()
            .map(|n| render_node(n, use_color))
            .collect::<Vec<_>>()
            .join(" | "),
        ExecutionNode::And(and_or) => format!(
            "{} && {}",
            render_node(&and_or.left, use_color),
            render_node(&and_or.right, use_color)
        ),
        ExecutionNode::Or(and_or) => format!(
            "{} || {}",
            render_node(&and_or.left, use_color),
            render_node(&and_or.right, use_color)
        ),
        ExecutionNode::Sequence(sequence) => sequence
            .nodes
            .iter()
            .map(|n| render_node(n, use_color))
            .collect::<Vec<_>>()
            .join(" ; "),
        ExecutionNode::Redirect(redirect) => render_redirect(redirect, use_color),
        ExecutionNode::Logic(logic) => format_logic(logic),
        ExecutionNode::Try(_) => "try { ... }".to_string(),
    }
}

/// Renders a `CommandNode`: the decorator name (blue when `use_color`),
/// followed by its string `command` arg verbatim if it has one, else by its
/// remaining args as space-separated `k=v` pairs.
fn render_command(command: &Command, use_color: bool) -> String {
    let name = format!("@{}", command.decorator);
    let name = if use_color {
        format!("{BLUE}{name}{RESET}")
    } else {
        name
    };
    if let Some(value) = command.command_string() {
        return format!("{name} {value}");
    }
    if command.args.is_empty() {
        return name;
    }
    let args = command
        .args
        .iter()
        .map(|arg| format!("{}={}", arg.key, format_value(&arg.value)))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{name} {args}")
}

fn render_redirect(redirect: &Redirect, use_color: bool) -> String {
    let op = match redirect.mode {
        RedirectMode::Overwrite => ">",
        RedirectMode::Append => ">>",
    };
    format!(
        "{} {op} {}",
        render_node(&redirect.source, use_color),
        render_command(&redirect.target, use_color)
    )
}

/// Renders a whole plan as an indented tree.
#[must_use]
pub fn render_tree(plan: &Plan, use_color: bool) -> String {
    let mut out = format!("{}:\n", plan.target);
    if plan.steps.is_empty() {
        out.push_str("(no steps)\n");
        return out;
    }
    render_steps(&plan.steps, "", &mut out, use_color);
    out
}

fn render_steps(steps: &[Step], prefix: &str, out: &mut String, use_color: bool) {
    let groups = group_for_loops(steps);
    let last = groups.len().saturating_sub(1);
    for (i, group) in groups.into_iter().enumerate() {
        let is_last = i == last;
        let branch = if is_last { "└─ " } else { "├─ " };
        let continuation = if is_last { "   " } else { "│  " };
        let child_prefix = format!("{prefix}{continuation}");

        match group {
            StepGroup::Single(step) => {
                if let ExecutionNode::Try(try_node) = &step.tree {
                    out.push_str(&format!("{prefix}{branch}"));
                    render_try(try_node, &child_prefix, out, use_color);
                } else {
                    out.push_str(&format!("{prefix}{branch}{}\n", render_node(&step.tree, use_color)));
                    render_node_children(&step.tree, &child_prefix, out, use_color);
                }
            }
            StepGroup::ForIterations { condition, iterations } => {
                out.push_str(&format!(
                    "{prefix}{branch}for {condition}: {} iterations\n",
                    iterations.len()
                ));
                let last_iter = iterations.len().saturating_sub(1);
                for (j, logic) in iterations.iter().enumerate() {
                    let iter_is_last = j == last_iter;
                    let iter_branch = if iter_is_last { "└─ " } else { "├─ " };
                    let iter_continuation = if iter_is_last { "   " } else { "│  " };
                    let label = iteration_label(logic, j);
                    if let Some(inline) = inline_child(logic, use_color) {
                        out.push_str(&format!(
                            "{child_prefix}{iter_branch}[{j}] {label}: {inline}\n"
                        ));
                    } else {
                        out.push_str(&format!("{child_prefix}{iter_branch}[{j}] {label}\n"));
                        let nested_prefix = format!("{child_prefix}{iter_continuation}");
                        render_steps(&logic.block, &nested_prefix, out, use_color);
                    }
                }
            }
        }
    }
}

fn render_node_children(node: &ExecutionNode, prefix: &str, out: &mut String, use_color: bool) {
    match node {
        ExecutionNode::Command(command) if !command.block.is_empty() => {
            render_steps(&command.block, prefix, out, use_color);
        }
        ExecutionNode::Logic(logic) if !logic.block.is_empty() => {
            render_steps(&logic.block, prefix, out, use_color);
        }
        _ => {}
    }
}

/// Renders a try/catch/finally node. `body_prefix` indents the `try {`
/// opening line, the nested blocks, and the closing braces; the caller is
/// responsible for any tree branch glyph that precedes the opening line.
fn render_try(try_node: &Try, body_prefix: &str, out: &mut String, use_color: bool) {
    let brace = |text: &str| -> String {
        if use_color {
            format!("{YELLOW}{text}{RESET}")
        } else {
            text.to_string()
        }
    };
    out.push_str(&format!("{}\n", brace("try {")));
    render_steps(&try_node.try_block, &format!("{body_prefix}  "), out, use_color);
    if !try_node.catch_block.is_empty() {
        out.push_str(&format!("{body_prefix}{}\n", brace("}")));
        out.push_str(&format!("{body_prefix}{}\n", brace("catch {")));
        render_steps(&try_node.catch_block, &format!("{body_prefix}  "), out, use_color);
    }
    if !try_node.finally_block.is_empty() {
        out.push_str(&format!("{body_prefix}{}\n", brace("}")));
        out.push_str(&format!("{body_prefix}{}\n", brace("finally {")));
        render_steps(&try_node.finally_block, &format!("{body_prefix}  "), out, use_color);
    }
    out.push_str(&format!("{body_prefix}{}\n", brace("}")));
}

enum StepGroup<'a> {
    Single(&'a Step),
    ForIterations {
        condition: String,
        iterations: Vec<&'a Logic>,
    },
}

/// Groups consecutive `for`-kind logic steps that share the same condition
/// into a single `StepGroup::ForIterations`.
fn group_for_loops(steps: &[Step]) -> Vec<StepGroup<'_>> {
    let mut groups = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        if let ExecutionNode::Logic(logic) = &steps[i].tree {
            if logic.kind == LogicKind::For {
                if let Some(condition) = &logic.condition {
                    let mut iterations = vec![logic.as_ref()];
                    let mut j = i + 1;
                    while j < steps.len() {
                        if let ExecutionNode::Logic(next) = &steps[j].tree {
                            if next.kind == LogicKind::For && next.condition.as_deref() == Some(condition) {
                                iterations.push(next.as_ref());
                                j += 1;
                                continue;
                            }
                        }
                        break;
                    }
                    groups.push(StepGroup::ForIterations {
                        condition: condition.clone(),
                        iterations,
                    });
                    i = j;
                    continue;
                }
            }
        }
        groups.push(StepGroup::Single(&steps[i]));
        i += 1;
    }
    groups
}

/// `iteration i` when no `Result` is given, else the `Result` with any
/// ` (iteration K)` suffix stripped.
fn iteration_label(logic: &Logic, index: usize) -> String {
    match &logic.result {
        None => format!("iteration {index}"),
        Some(result) => strip_iteration_suffix(result),
    }
}

fn strip_iteration_suffix(result: &str) -> String {
    if let Some(start) = result.rfind(" (iteration ") {
        if result.ends_with(')') {
            return result[..start].to_string();
        }
    }
    result.to_string()
}

/// An iteration's block can be inlined after `label:` iff it is a single
/// step whose tree is a `Command` or a `Logic` with an empty block (never a
/// `Try`).
fn inline_child(logic: &Logic, use_color: bool) -> Option<String> {
    let [only] = logic.block.as_slice() else {
        return None;
    };
    match &only.tree {
        ExecutionNode::Command(command) if command.block.is_empty() => {
            Some(render_node(&only.tree, use_color))
        }
        ExecutionNode::Logic(nested) if nested.block.is_empty() => {
            Some(render_node(&only.tree, use_color))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Arg, Command, Plan, Value};

    #[test]
    fn empty_plan_prints_no_steps() {
        let plan = Plan::new("build", vec![]);
        assert_eq!(render_tree(&plan, false), "build:\n(no steps)\n");
    }

    #[test]
    fn single_step_tree_uses_last_branch() {
        let plan = Plan::new("build", vec![ExecutionNode::Command(Command::shell("echo hi"))]);
        assert_eq!(render_tree(&plan, false), "build:\n└─ @shell echo hi\n");
    }

    #[test]
    fn for_iterations_are_grouped_and_inlined() {
        let make = |i: usize| {
            ExecutionNode::Logic(Box::new(Logic {
                kind: LogicKind::For,
                condition: Some("f in files".into()),
                result: None,
                block: vec![Step {
                    id: 1,
                    tree: ExecutionNode::Command(Command::shell(format!("echo {i}"))),
                }],
            }))
        };
        let plan = Plan::new("build", vec![make(0), make(1)]);
        let rendered = render_tree(&plan, false);
        assert_eq!(
            rendered,
            "build:\n└─ for f in files: 2 iterations\n   ├─ [0] iteration 0: @shell echo 0\n   └─ [1] iteration 1: @shell echo 1\n"
        );
    }

    #[test]
    fn non_shell_command_args_are_space_separated_without_parens() {
        let command = Command {
            decorator: "retry".into(),
            args: vec![
                Arg {
                    key: "times".into(),
                    value: Value::Int(3),
                },
                Arg {
                    key: "delay".into(),
                    value: Value::Int(1),
                },
            ],
            block: Vec::new(),
        };
        let plan = Plan::new("build", vec![ExecutionNode::Command(command)]);
        assert_eq!(render_tree(&plan, false), "build:\n└─ @retry times=3 delay=1\n");
    }

    #[test]
    fn decorator_name_is_blue_and_try_braces_stay_yellow_when_colored() {
        let command = Command {
            decorator: "retry".into(),
            args: vec![Arg {
                key: "times".into(),
                value: Value::Int(3),
            }],
            block: Vec::new(),
        };
        let plan = Plan::new("build", vec![ExecutionNode::Command(command)]);
        let rendered = render_tree(&plan, true);
        assert!(rendered.contains(&format!("{BLUE}@retry{RESET}")));

        let try_node = Try {
            try_block: vec![Step {
                id: 1,
                tree: ExecutionNode::Command(Command::shell("risky")),
            }],
            catch_block: Vec::new(),
            finally_block: Vec::new(),
        };
        let try_plan = Plan::new("build", vec![ExecutionNode::Try(Box::new(try_node))]);
        let try_rendered = render_tree(&try_plan, true);
        assert!(try_rendered.contains(&format!("{YELLOW}try {{{RESET}")));
    }

    #[test]
    fn try_catch_finally_layout() {
        let try_node = Try {
            try_block: vec![Step {
                id: 1,
                tree: ExecutionNode::Command(Command::shell("risky")),
            }],
            catch_block: vec![Step {
                id: 1,
                tree: ExecutionNode::Command(Command::shell("cleanup")),
            }],
            finally_block: Vec::new(),
        };
        let plan = Plan::new("build", vec![ExecutionNode::Try(Box::new(try_node))]);
        let rendered = render_tree(&plan, false);
        assert!(rendered.contains("try {"));
        assert!(rendered.contains("catch {"));
        assert!(!rendered.contains("finally {"));
    }
}
