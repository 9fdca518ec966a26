//! Parameter binder: matches a decorator call's positional and named
//! arguments against its schema, then type-checks the result.

use crate::error::{ParseError, ParseErrorKind};
use crate::registry::{DecoratorSpec, DefaultValue, ParamType};
use crate::syntax::{Expression, NamedParameter};

/// One bound value, in schema order.
#[derive(Clone, Debug)]
pub struct BoundArg {
    pub name: &'static str,
    pub value: BoundValue,
}

#[derive(Clone, Debug)]
pub enum BoundValue {
    String(String),
    Number(String),
    Duration(u128),
    Boolean(bool),
    Identifier(String),
    /// Present only when the slot type is `Expression` (`@when`'s subject).
    Expression(Expression),
}

/// Binds `args` against `spec.params`, in schema order. Binding is
/// stable: the output vector's order always equals `spec.params`'s order,
/// regardless of how the call mixed positional and named arguments.
pub fn bind(
    spec: &DecoratorSpec,
    args: &[NamedParameter],
    call_location: &crate::source::Location,
) -> Result<Vec<BoundArg>, ParseError> {
    // Split into a positional prefix and a named tail: once a
    // named argument appears, every subsequent argument must be named too.
    let mut positional_end = args.len();
    for (i, arg) in args.iter().enumerate() {
        if arg.name.is_some() {
            positional_end = i;
            break;
        }
    }
    for arg in &args[positional_end..] {
        if arg.name.is_none() {
            return Err(ParseError::new(
                ParseErrorKind::PositionalAfterNamed,
                arg.value.location().clone(),
            ));
        }
    }
    let positional = &args[..positional_end];
    let named = &args[positional_end..];

    if positional.len() > spec.params.len() {
        return Err(ParseError::new(
            ParseErrorKind::TooManyArguments,
            positional[spec.params.len()].value.location().clone(),
        ));
    }

    // `filled[i]` tracks which schema slot has been given a value, so we can
    // detect both "positional then named for the same slot" and "unknown
    // named argument".
    let mut filled: Vec<Option<&Expression>> = vec![None; spec.params.len()];
    for (i, arg) in positional.iter().enumerate() {
        filled[i] = Some(&arg.value);
    }
    for arg in named {
        let name = arg.name.as_deref().expect("named tail has names");
        let Some(slot) = spec.params.iter().position(|p| p.name == name) else {
            return Err(ParseError::new(
                ParseErrorKind::UnknownParameter {
                    name: name.to_string(),
                },
                arg.value.location().clone(),
            ));
        };
        if filled[slot].is_some() {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateParameter {
                    name: name.to_string(),
                },
                arg.value.location().clone(),
            ));
        }
        filled[slot] = Some(&arg.value);
    }

    let mut bound = Vec::with_capacity(spec.params.len());
    for (slot, param) in spec.params.iter().enumerate() {
        let value = match filled[slot] {
            Some(expr) => {
                check_type(expr, param.ty).map_err(|found| {
                    ParseError::new(
                        ParseErrorKind::ParameterTypeMismatch {
                            name: param.name.to_string(),
                            expected: param.ty.tag(),
                            found,
                        },
                        expr.location().clone(),
                    )
                })?;
                expression_to_bound(expr)
            }
            None => match &param.default {
                Some(default) => default_to_bound(default),
                None => {
                    if param.required {
                        return Err(ParseError::new(
                            ParseErrorKind::MissingRequiredParameter {
                                name: param.name.to_string(),
                            },
                            call_location.clone(),
                        ));
                    }
                    continue;
                }
            },
        };
        bound.push(BoundArg {
            name: param.name,
            value,
        });
    }
    Ok(bound)
}

fn check_type(expr: &Expression, ty: ParamType) -> Result<(), &'static str> {
    let ok = match (ty, expr) {
        (ParamType::String, Expression::String { .. }) => true,
        (ParamType::Number, Expression::Number { .. }) => true,
        (ParamType::Duration, Expression::Duration { .. }) => true,
        (ParamType::Boolean, Expression::Boolean { .. }) => true,
        (ParamType::Identifier, Expression::Identifier { .. }) => true,
        // `Expression`-typed slots accept any non-literal identifier, per
        // for the subject of a pattern decorator.
        (ParamType::Expression, Expression::Identifier { .. }) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(expr.type_tag())
    }
}

fn expression_to_bound(expr: &Expression) -> BoundValue {
    match expr {
        Expression::String { value, .. } => BoundValue::String(value.clone()),
        Expression::Number { raw, .. } => BoundValue::Number(raw.clone()),
        Expression::Duration { nanos, .. } => BoundValue::Duration(*nanos),
        Expression::Boolean { value, .. } => BoundValue::Boolean(*value),
        Expression::Identifier { name, .. } => BoundValue::Identifier(name.clone()),
    }
}

fn default_to_bound(default: &DefaultValue) -> BoundValue {
    match default {
        DefaultValue::String(s) => BoundValue::String((*s).to_string()),
        DefaultValue::Number(n) => BoundValue::Number(n.to_string()),
        DefaultValue::Boolean(b) => BoundValue::Boolean(*b),
        DefaultValue::DurationNanos(n) => BoundValue::Duration(*n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DecoratorRegistry;
    use crate::source::Location;

    fn ident(name: &str) -> Expression {
        Expression::Identifier {
            name: name.into(),
            location: Location::dummy(),
        }
    }

    fn duration(nanos: u128) -> Expression {
        Expression::Duration {
            raw: format!("{nanos}ns"),
            nanos,
            location: Location::dummy(),
        }
    }

    #[test]
    fn binding_is_total_and_in_schema_order() {
        let registry = DecoratorRegistry::with_builtins();
        let spec = registry.lookup("retry").unwrap();
        let args = vec![NamedParameter {
            name: None,
            value: Expression::Number {
                raw: "3".into(),
                location: Location::dummy(),
            },
        }];
        let bound = bind(spec, &args, &Location::dummy()).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].name, "attempts");
        assert_eq!(bound[1].name, "delay");
    }

    #[test]
    fn named_argument_fills_correct_slot() {
        let registry = DecoratorRegistry::with_builtins();
        let spec = registry.lookup("timeout").unwrap();
        let args = vec![NamedParameter {
            name: Some("duration".into()),
            value: duration(30_000_000_000),
        }];
        let bound = bind(spec, &args, &Location::dummy()).unwrap();
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn missing_required_parameter_is_an_error() {
        let registry = DecoratorRegistry::with_builtins();
        let spec = registry.lookup("timeout").unwrap();
        let err = bind(spec, &[], &Location::dummy()).unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::MissingRequiredParameter { .. }
        ));
    }

    #[test]
    fn too_many_positional_arguments_is_an_error() {
        let registry = DecoratorRegistry::with_builtins();
        let spec = registry.lookup("var").unwrap();
        let args = vec![
            NamedParameter {
                name: None,
                value: ident("A"),
            },
            NamedParameter {
                name: None,
                value: ident("B"),
            },
        ];
        let err = bind(spec, &args, &Location::dummy()).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::TooManyArguments));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let registry = DecoratorRegistry::with_builtins();
        let spec = registry.lookup("timeout").unwrap();
        let args = vec![NamedParameter {
            name: None,
            value: ident("not_a_duration"),
        }];
        let err = bind(spec, &args, &Location::dummy()).unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::ParameterTypeMismatch { .. }
        ));
    }
}
