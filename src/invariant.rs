//! Invariant helper: programmer-bug assertions, distinct from the
//! user-facing error model in [`crate::error`]. A failure here always means
//! a defect in `opal-core` itself (or in a caller's use of it), never bad
//! input — so it terminates the process instead of returning a `Result`.

use std::fmt;

/// Kind of violation, used only in the printed message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ViolationKind {
    Precondition,
    Postcondition,
    Invariant,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::Precondition => "PRECONDITION",
            ViolationKind::Postcondition => "POSTCONDITION",
            ViolationKind::Invariant => "INVARIANT",
        };
        write!(f, "{s}")
    }
}

#[track_caller]
fn violate(kind: ViolationKind, message: &fmt::Arguments<'_>) -> ! {
    let location = std::panic::Location::caller();
    eprintln!(
        "{kind} VIOLATION: {message}\n  at {}:{}",
        location.file(),
        location.line()
    );
    std::process::exit(101);
}

/// Asserts `cond`; terminates the process with a formatted message if false.
#[track_caller]
pub fn precondition(cond: bool, args: fmt::Arguments<'_>) {
    if !cond {
        violate(ViolationKind::Precondition, &args);
    }
}

#[track_caller]
pub fn postcondition(cond: bool, args: fmt::Arguments<'_>) {
    if !cond {
        violate(ViolationKind::Postcondition, &args);
    }
}

#[track_caller]
pub fn invariant(cond: bool, args: fmt::Arguments<'_>) {
    if !cond {
        violate(ViolationKind::Invariant, &args);
    }
}

/// Asserts `val` is `Some`/non-null-equivalent, returning the unwrapped
/// value.
#[track_caller]
pub fn not_nil<T>(val: Option<T>, name: &str) -> T {
    match val {
        Some(v) => v,
        None => violate(ViolationKind::Precondition, &format_args!("'{name}' must not be nil")),
    }
}

/// Asserts `min <= val <= max`.
#[track_caller]
pub fn in_range<T: PartialOrd + fmt::Display>(val: T, min: T, max: T, name: &str) {
    if val < min || val > max {
        violate(
            ViolationKind::Precondition,
            &format_args!("'{name}' = {val} is out of range [{min}, {max}]"),
        );
    }
}

/// Asserts `val > 0`.
#[track_caller]
pub fn positive<T: PartialOrd + Default + fmt::Display>(val: T, name: &str) {
    if val <= T::default() {
        violate(
            ViolationKind::Precondition,
            &format_args!("'{name}' = {val} must be positive"),
        );
    }
}

/// Asserts `result` is `Ok`, returning the unwrapped value.
#[track_caller]
pub fn expect_no_error<T, E: fmt::Display>(result: Result<T, E>, msg: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => violate(ViolationKind::Postcondition, &format_args!("{msg}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_assertions_do_not_abort() {
        precondition(true, format_args!("unreachable"));
        postcondition(1 == 1, format_args!("unreachable"));
        invariant(!false, format_args!("unreachable"));
        assert_eq!(not_nil(Some(5), "x"), 5);
        in_range(5, 0, 10, "x");
        positive(1, "x");
        assert_eq!(expect_no_error::<_, std::convert::Infallible>(Ok(5), "x"), 5);
    }
}
