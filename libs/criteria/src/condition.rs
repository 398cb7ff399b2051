//! Condition tree and the per-entry condition assembler.

use serde::Serialize;

use crate::coerce::{coerce, coerce_all};
use crate::error::{Error, Result};
use crate::escape::{split_unescaped, unescape_list_item};
use crate::key::{Operator, FIELD_SEPARATOR};
use crate::path::AttributePath;
use crate::value::{FilterValue, Scalar};

/// Boolean condition over the queried entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Matches every row.
    True,
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Compare {
        operand: Operand,
        op: Comparison,
        value: Scalar,
    },
    /// Inclusive on both ends.
    Between {
        operand: Operand,
        low: Scalar,
        high: Scalar,
    },
    In {
        operand: Operand,
        values: Vec<Scalar>,
    },
    /// Substring match. For case-insensitive matches `needle` is already upper-cased.
    Like {
        operand: Operand,
        needle: String,
        case: CaseSensitivity,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Attribute(AttributePath),
    /// Upper-cased attribute values joined with a single space; null parts count as "".
    UpperConcat(Vec<AttributePath>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }
}

impl Condition {
    /// AND of `conditions`; `True` when there are none.
    pub fn all<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        let mut conditions: Vec<Condition> = conditions.into_iter().collect();
        match conditions.len() {
            0 => Self::True,
            1 => conditions.remove(0),
            _ => Self::And(conditions),
        }
    }

    /// OR of `conditions`. Callers never pass an empty set.
    pub fn any<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        let mut conditions: Vec<Condition> = conditions.into_iter().collect();
        if conditions.len() == 1 {
            conditions.remove(0)
        } else {
            Self::Or(conditions)
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Visit every attribute path referenced by the tree, depth first.
    pub fn for_each_path<'a>(&'a self, f: &mut impl FnMut(&'a AttributePath)) {
        match self {
            Self::True => {}
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_path(f);
                }
            }
            Self::Compare { operand, .. }
            | Self::Between { operand, .. }
            | Self::In { operand, .. }
            | Self::Like { operand, .. } => operand.for_each_path(f),
        }
    }
}

impl Operand {
    pub fn for_each_path<'a>(&'a self, f: &mut impl FnMut(&'a AttributePath)) {
        match self {
            Self::Attribute(path) => f(path),
            Self::UpperConcat(paths) => paths.iter().for_each(f),
        }
    }
}

/// Build the condition for one filter entry.
///
/// `paths` are the resolved paths of the key: exactly one for single-path
/// operators, one or more for `orlikeic` / `concatlikeic`.
pub fn assemble(
    key: &str,
    operator: Operator,
    mut paths: Vec<AttributePath>,
    raw: &FilterValue,
) -> Result<Condition> {
    let op = operator.as_str();
    let coercion = |source| Error::Coercion {
        key: key.to_string(),
        source,
    };

    match operator {
        Operator::Eq => {
            let path = single(paths, op)?;
            let value = coerce(scalar(raw, op)?, path.value_type).map_err(coercion)?;
            Ok(Condition::Compare {
                operand: Operand::Attribute(path),
                op: Comparison::Eq,
                value,
            })
        }
        Operator::Like | Operator::LikeIc => {
            let path = single(paths, op)?;
            require_textual(&path, op)?;
            let needle = needle_text(raw, op)?;
            Ok(like(Operand::Attribute(path), needle, operator == Operator::LikeIc))
        }
        Operator::Ge | Operator::Le | Operator::Gt | Operator::Lt => {
            let path = single(paths, op)?;
            require_orderable(&path, op)?;
            let value = coerce(scalar(raw, op)?, path.value_type).map_err(coercion)?;
            let cmp = match operator {
                Operator::Ge => Comparison::Ge,
                Operator::Le => Comparison::Le,
                Operator::Gt => Comparison::Gt,
                _ => Comparison::Lt,
            };
            Ok(Condition::Compare {
                operand: Operand::Attribute(path),
                op: cmp,
                value,
            })
        }
        Operator::Between => {
            let path = single(paths, op)?;
            require_orderable(&path, op)?;
            let items = list_items(raw, op)?;
            if items.len() < 2 {
                return Err(Error::MalformedValue {
                    operator: op,
                    message: format!(
                        "expected at least 2 values (from, to), got {}",
                        items.len()
                    ),
                });
            }
            let bounds = coerce_all(&items[..2], path.value_type).map_err(coercion)?;
            let [low, high]: [Scalar; 2] = bounds.try_into().map_err(|_| Error::MalformedValue {
                operator: op,
                message: "expected exactly 2 bounds".to_string(),
            })?;
            Ok(Condition::Between {
                operand: Operand::Attribute(path),
                low,
                high,
            })
        }
        Operator::In => {
            let path = single(paths, op)?;
            let items = list_items(raw, op)?;
            if items.is_empty() {
                return Err(Error::MalformedValue {
                    operator: op,
                    message: "expected at least 1 value".to_string(),
                });
            }
            let values = coerce_all(&items, path.value_type).map_err(coercion)?;
            Ok(Condition::In {
                operand: Operand::Attribute(path),
                values,
            })
        }
        Operator::OrLikeIc => {
            for path in &paths {
                require_textual(path, op)?;
            }
            let needle = needle_text(raw, op)?;
            Ok(Condition::any(
                paths
                    .drain(..)
                    .map(|p| like(Operand::Attribute(p), needle.clone(), true)),
            ))
        }
        Operator::ConcatLikeIc => {
            for path in &paths {
                require_textual(path, op)?;
            }
            let needle = needle_text(raw, op)?;
            Ok(like(Operand::UpperConcat(paths), needle, true))
        }
    }
}

fn like(operand: Operand, needle: String, ignore_case: bool) -> Condition {
    if ignore_case {
        Condition::Like {
            operand,
            needle: needle.to_uppercase(),
            case: CaseSensitivity::Insensitive,
        }
    } else {
        Condition::Like {
            operand,
            needle,
            case: CaseSensitivity::Sensitive,
        }
    }
}

fn single(mut paths: Vec<AttributePath>, operator: &'static str) -> Result<AttributePath> {
    if paths.len() != 1 {
        return Err(Error::MalformedValue {
            operator,
            message: format!("expected exactly one attribute path, got {}", paths.len()),
        });
    }
    Ok(paths.remove(0))
}

fn require_orderable(path: &AttributePath, operator: &'static str) -> Result<()> {
    if path.kind().is_orderable() {
        Ok(())
    } else {
        Err(Error::NotOrderable {
            path: path.to_string(),
            value_type: path.value_type,
            operator,
        })
    }
}

fn require_textual(path: &AttributePath, operator: &'static str) -> Result<()> {
    if path.kind().is_textual() {
        Ok(())
    } else {
        Err(Error::OperatorNotApplicable {
            path: path.to_string(),
            value_type: path.value_type,
            operator,
        })
    }
}

fn scalar<'a>(raw: &'a FilterValue, operator: &'static str) -> Result<&'a FilterValue> {
    match raw {
        FilterValue::List(_) => Err(Error::MalformedValue {
            operator,
            message: "expected a single value, got a list".to_string(),
        }),
        _ => Ok(raw),
    }
}

/// Text form of a pattern value.
fn needle_text(raw: &FilterValue, operator: &'static str) -> Result<String> {
    match raw {
        FilterValue::Text(s) => Ok(s.clone()),
        FilterValue::Integer(i) => Ok(i.to_string()),
        FilterValue::Float(f) => Ok(f.to_string()),
        FilterValue::Bool(b) => Ok(b.to_string()),
        FilterValue::Null | FilterValue::List(_) => Err(Error::MalformedValue {
            operator,
            message: format!("expected a single text value, got {}", raw.shape()),
        }),
    }
}

/// Elements of a range/membership value: a list, or comma-separated text.
///
/// Split items keep their whitespace; coercion trims them for non-text targets.
fn list_items(raw: &FilterValue, operator: &'static str) -> Result<Vec<FilterValue>> {
    match raw {
        FilterValue::List(items) => Ok(items.clone()),
        FilterValue::Text(s) => Ok(split_unescaped(s, FIELD_SEPARATOR)
            .into_iter()
            .map(|item| FilterValue::Text(unescape_list_item(item)))
            .collect()),
        other => Err(Error::MalformedValue {
            operator,
            message: format!("expected a list or comma-separated text, got {}", other.shape()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve;
    use crate::schema::{EntityDef, Schema};
    use crate::value::ValueType;
    use chrono::NaiveDate;

    fn schema() -> Schema {
        Schema::from_entities([
            (
                "Persona",
                EntityDef::new("personas")
                    .attribute("id", ValueType::Long)
                    .attribute("nombre", ValueType::Text)
                    .attribute("activo", ValueType::Boolean)
                    .attribute("nacimiento", ValueType::Date)
                    .relation("pais", "Pais", "pais_id"),
            ),
            (
                "Pais",
                EntityDef::new("paises").attribute("descripcion", ValueType::Text),
            ),
        ])
        .unwrap()
    }

    fn paths(exprs: &[&str]) -> Vec<AttributePath> {
        let schema = schema();
        exprs
            .iter()
            .map(|e| resolve(&schema, "Persona", e).unwrap())
            .collect()
    }

    #[test]
    fn eq_coerces_to_attribute_type() {
        let cond = assemble("eq:id", Operator::Eq, paths(&["id"]), &"12".into()).unwrap();
        match cond {
            Condition::Compare { op, value, .. } => {
                assert_eq!(op, Comparison::Eq);
                assert_eq!(value, Scalar::Long(12));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn likeic_upper_cases_needle() {
        let cond = assemble("nombre", Operator::LikeIc, paths(&["nombre"]), &"juan".into()).unwrap();
        assert!(matches!(
            cond,
            Condition::Like { ref needle, case: CaseSensitivity::Insensitive, .. } if needle == "JUAN"
        ));
    }

    #[test]
    fn like_keeps_case() {
        let cond = assemble("like:nombre", Operator::Like, paths(&["nombre"]), &"Juan".into()).unwrap();
        assert!(matches!(
            cond,
            Condition::Like { ref needle, case: CaseSensitivity::Sensitive, .. } if needle == "Juan"
        ));
    }

    #[test]
    fn ordering_on_boolean_is_a_configuration_error() {
        let err = assemble("gt:activo", Operator::Gt, paths(&["activo"]), &"true".into()).unwrap_err();
        assert!(matches!(err, Error::NotOrderable { operator: "gt", .. }));

        let err = assemble(
            "between:activo",
            Operator::Between,
            paths(&["activo"]),
            &FilterValue::list(["false", "true"]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotOrderable { operator: "between", .. }));
    }

    #[test]
    fn pattern_operators_require_text() {
        let err = assemble("likeic:id", Operator::LikeIc, paths(&["id"]), &"1".into()).unwrap_err();
        assert!(matches!(err, Error::OperatorNotApplicable { .. }));
    }

    #[test]
    fn between_uses_first_two_values() {
        let cond = assemble(
            "between:nacimiento",
            Operator::Between,
            paths(&["nacimiento"]),
            &FilterValue::list(["1990-01-01", "1999-12-31", "2030-01-01"]),
        )
        .unwrap();
        let Condition::Between { low, high, .. } = cond else {
            panic!("expected between");
        };
        assert_eq!(low, Scalar::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()));
        assert_eq!(high, Scalar::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()));
    }

    #[test]
    fn between_accepts_comma_separated_text() {
        let cond = assemble("between:id", Operator::Between, paths(&["id"]), &"1, 5".into()).unwrap();
        assert!(matches!(
            cond,
            Condition::Between { low: Scalar::Long(1), high: Scalar::Long(5), .. }
        ));
    }

    #[test]
    fn between_requires_two_values() {
        let err = assemble(
            "between:id",
            Operator::Between,
            paths(&["id"]),
            &FilterValue::list([1]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedValue { operator: "between", .. }));

        let err = assemble("between:id", Operator::Between, paths(&["id"]), &FilterValue::Integer(3))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedValue { .. }));
    }

    #[test]
    fn in_requires_values() {
        let err = assemble("in:id", Operator::In, paths(&["id"]), &FilterValue::List(vec![])).unwrap_err();
        assert!(matches!(err, Error::MalformedValue { operator: "in", .. }));

        let cond = assemble("in:nombre", Operator::In, paths(&["nombre"]), &"a\\,b,c".into()).unwrap();
        let Condition::In { values, .. } = cond else {
            panic!("expected in");
        };
        assert_eq!(values, vec![Scalar::Text("a,b".into()), Scalar::Text("c".into())]);
    }

    #[test]
    fn split_items_keep_whitespace_for_text_attributes() {
        let cond = assemble("in:nombre", Operator::In, paths(&["nombre"]), &"Ana, Juan ".into()).unwrap();
        let Condition::In { values, .. } = cond else {
            panic!("expected in");
        };
        assert_eq!(values, vec![Scalar::Text("Ana".into()), Scalar::Text(" Juan ".into())]);

        let cond = assemble("in:id", Operator::In, paths(&["id"]), &" 2 , 5".into()).unwrap();
        let Condition::In { values, .. } = cond else {
            panic!("expected in");
        };
        assert_eq!(values, vec![Scalar::Long(2), Scalar::Long(5)]);
    }

    #[test]
    fn coercion_errors_name_the_key() {
        let err = assemble("ge:id", Operator::Ge, paths(&["id"]), &"uno".into()).unwrap_err();
        match err {
            Error::Coercion { key, .. } => assert_eq!(key, "ge:id"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn scalar_operators_reject_lists() {
        let err = assemble("eq:id", Operator::Eq, paths(&["id"]), &FilterValue::list([1, 2])).unwrap_err();
        assert!(matches!(err, Error::MalformedValue { operator: "eq", .. }));
    }

    #[test]
    fn orlikeic_builds_or_over_paths() {
        let cond = assemble(
            "orlikeic:nombre,pais.descripcion",
            Operator::OrLikeIc,
            paths(&["nombre", "pais.descripcion"]),
            &"par".into(),
        )
        .unwrap();
        let Condition::Or(children) = cond else {
            panic!("expected or");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn concatlikeic_builds_single_like_over_concat() {
        let cond = assemble(
            "concatlikeic:nombre,pais.descripcion",
            Operator::ConcatLikeIc,
            paths(&["nombre", "pais.descripcion"]),
            &"juan par".into(),
        )
        .unwrap();
        let Condition::Like { operand: Operand::UpperConcat(parts), needle, .. } = cond else {
            panic!("expected concat like");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(needle, "JUAN PAR");
    }

    #[test]
    fn for_each_path_visits_every_operand() {
        let tree = Condition::all([
            assemble("eq:id", Operator::Eq, paths(&["id"]), &FilterValue::Integer(1)).unwrap(),
            assemble(
                "concatlikeic:nombre,pais.descripcion",
                Operator::ConcatLikeIc,
                paths(&["nombre", "pais.descripcion"]),
                &"x".into(),
            )
            .unwrap(),
        ]);
        let mut seen = Vec::new();
        tree.for_each_path(&mut |p| seen.push(p.to_string()));
        assert_eq!(seen, vec!["id", "nombre", "pais.descripcion"]);
    }

    #[test]
    fn all_of_nothing_is_true() {
        assert!(Condition::all(Vec::new()).is_true());
    }
}
