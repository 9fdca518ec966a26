//! Plan diff: step-aligned structural diff between two plans.

use crate::format::format_node;
use crate::plan::Plan;

#[derive(Clone, Debug)]
pub struct StepDiff {
    pub step: usize,
    pub expected: String,
    pub actual: String,
}

#[derive(Clone, Debug)]
pub struct AddedStep {
    pub step: usize,
    pub actual: String,
}

#[derive(Clone, Debug)]
pub struct RemovedStep {
    pub step: usize,
    pub expected: String,
}

#[derive(Clone, Debug, Default)]
pub struct DiffResult {
    pub target_changed: Option<String>,
    pub added: Vec<AddedStep>,
    pub removed: Vec<RemovedStep>,
    pub modified: Vec<StepDiff>,
}

impl DiffResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_changed.is_none()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
    }
}

/// Computes a step-aligned diff between `expected` and `actual`.
///
/// Alignment is purely positional (no LCS): step `i` in one plan
/// is compared against step `i` in the other, using "step N" as the
/// identity across both plans.
#[must_use]
pub fn diff_plans(expected: &Plan, actual: &Plan) -> DiffResult {
    let mut result = DiffResult::default();
    if expected.target != actual.target {
        result.target_changed = Some(format!("{} -> {}", expected.target, actual.target));
    }

    let max_len = expected.steps.len().max(actual.steps.len());
    for i in 0..max_len {
        let step_no = i + 1;
        match (expected.steps.get(i), actual.steps.get(i)) {
            (Some(e), Some(a)) => {
                let e_text = format_node(&e.tree);
                let a_text = format_node(&a.tree);
                if e_text != a_text {
                    result.modified.push(StepDiff {
                        step: step_no,
                        expected: e_text,
                        actual: a_text,
                    });
                }
            }
            (Some(e), None) => {
                result.removed.push(RemovedStep {
                    step: step_no,
                    expected: format_node(&e.tree),
                });
            }
            (None, Some(a)) => {
                result.added.push(AddedStep {
                    step: step_no,
                    actual: format_node(&a.tree),
                });
            }
            (None, None) => unreachable!("loop bound is max of both lengths"),
        }
    }
    result
}

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Renders a [`DiffResult`] in its fixed layout.
#[must_use]
pub fn format_diff(result: &DiffResult, use_color: bool) -> String {
    let paint = |code: &str, text: &str| -> String {
        if use_color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    };

    let mut out = String::new();

    if let Some(target_changed) = &result.target_changed {
        out.push_str(&format!(
            "{}\n",
            paint(YELLOW, &format!("Target changed: {target_changed}"))
        ));
    }

    if !result.modified.is_empty() {
        out.push_str("Modified steps:\n");
        for step in &result.modified {
            out.push_str(&format!("  step {}:\n", step.step));
            out.push_str(&format!(
                "    {}\n",
                paint(RED, &format!("- {}", step.expected))
            ));
            out.push_str(&format!(
                "    {}\n",
                paint(GREEN, &format!("+ {}", step.actual))
            ));
        }
        out.push('\n');
    }

    if !result.added.is_empty() {
        out.push_str("Added steps:\n");
        for step in &result.added {
            out.push_str(&format!(
                "  {}\n",
                paint(GREEN, &format!("+ step {}: {}", step.step, step.actual))
            ));
        }
        out.push('\n');
    }

    if !result.removed.is_empty() {
        out.push_str("Removed steps:\n");
        for step in &result.removed {
            out.push_str(&format!(
                "  {}\n",
                paint(RED, &format!("- step {}: {}", step.step, step.expected))
            ));
        }
        out.push('\n');
    }

    if result.target_changed.is_none()
        && result.modified.is_empty()
        && result.added.is_empty()
        && result.removed.is_empty()
    {
        out.push_str("No differences found.\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Command, ExecutionNode, Plan};

    fn plan_of(target: &str, commands: &[&str]) -> Plan {
        Plan::new(
            target,
            commands
                .iter()
                .map(|c| ExecutionNode::Command(Command::shell(*c)))
                .collect(),
        )
    }

    #[test]
    fn diff_of_identical_plans_is_empty() {
        let plan = plan_of("build", &["echo a", "echo b"]);
        let result = diff_plans(&plan, &plan);
        assert!(result.is_empty());
        assert_eq!(format_diff(&result, false), "No differences found.\n");
    }

    #[test]
    fn positional_alignment_counts_added_and_removed() {
        let a = plan_of("build", &["echo a"]);
        let b = plan_of("build", &["echo a", "echo b", "echo c"]);
        let result = diff_plans(&a, &b);
        assert_eq!(result.added.len(), 2);
        assert_eq!(result.removed.len(), 0);

        let result = diff_plans(&b, &a);
        assert_eq!(result.added.len(), 0);
        assert_eq!(result.removed.len(), 2);
    }

    #[test]
    fn modified_step_formatting_matches_fixed_layout() {
        let a = plan_of("deploy", &["echo \"Old\""]);
        let b = plan_of("deploy", &["echo \"New\""]);
        let result = diff_plans(&a, &b);
        let rendered = format_diff(&result, false);
        assert_eq!(
            rendered,
            "Modified steps:\n  step 1:\n    - @shell echo \"Old\"\n    + @shell echo \"New\"\n\n"
        );
    }
}
