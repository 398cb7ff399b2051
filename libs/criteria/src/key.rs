//! Filter key parsing.
//!
//! Keys follow the `operator:path` convention, e.g. `eq:id`, `between:fecNacimiento`
//! or `orlikeic:codPersona,nombre`. A key without `:` is a case-insensitive
//! contains match on the whole key (`nombre` == `likeic:nombre`).

use std::fmt;

use serde::Serialize;

use crate::error::KeyError;

/// Separator between operator token and attribute path expression.
pub const OPERATOR_SEPARATOR: char = ':';

/// Separator between attribute paths of multi-field operators.
pub const FIELD_SEPARATOR: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Like,
    LikeIc,
    Ge,
    Le,
    Gt,
    Lt,
    Between,
    In,
    OrLikeIc,
    ConcatLikeIc,
}

impl Operator {
    /// Operator used when a key carries no explicit operator token.
    pub const DEFAULT: Self = Self::LikeIc;

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "like" => Some(Self::Like),
            "likeic" => Some(Self::LikeIc),
            "ge" => Some(Self::Ge),
            "le" => Some(Self::Le),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "between" => Some(Self::Between),
            "in" => Some(Self::In),
            "orlikeic" => Some(Self::OrLikeIc),
            "concatlikeic" => Some(Self::ConcatLikeIc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Like => "like",
            Self::LikeIc => "likeic",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Between => "between",
            Self::In => "in",
            Self::OrLikeIc => "orlikeic",
            Self::ConcatLikeIc => "concatlikeic",
        }
    }

    /// Operators whose path expression is a comma-separated list of paths.
    pub fn is_multi_path(self) -> bool {
        matches!(self, Self::OrLikeIc | Self::ConcatLikeIc)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey {
    pub operator: Operator,
    /// One path, or several for multi-path operators. Never empty.
    pub paths: Vec<String>,
}

impl FilterKey {
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        let (operator, expression) = match raw.split_once(OPERATOR_SEPARATOR) {
            Some((token, rest)) => {
                let operator = Operator::from_token(token)
                    .ok_or_else(|| KeyError::UnknownOperator(token.to_ascii_lowercase()))?;
                (operator, rest)
            }
            None => (Operator::DEFAULT, raw),
        };

        let paths: Vec<String> = if operator.is_multi_path() {
            expression
                .split(FIELD_SEPARATOR)
                .map(|p| p.trim().to_string())
                .collect()
        } else {
            vec![expression.trim().to_string()]
        };

        if paths.iter().any(|p| p.is_empty()) {
            return Err(KeyError::EmptyPath);
        }

        Ok(Self { operator, paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_without_operator_defaults_to_likeic() {
        let key = FilterKey::parse("nombre").unwrap();
        assert_eq!(key.operator, Operator::LikeIc);
        assert_eq!(key.paths, vec!["nombre"]);
    }

    #[test]
    fn operator_token_is_case_insensitive() {
        let key = FilterKey::parse("EQ:id").unwrap();
        assert_eq!(key.operator, Operator::Eq);
        assert_eq!(key.paths, vec!["id"]);

        let key = FilterKey::parse("Between:fecNacimiento").unwrap();
        assert_eq!(key.operator, Operator::Between);
    }

    #[test]
    fn splits_on_first_separator_only() {
        let key = FilterKey::parse("eq:pais:descripcion").unwrap();
        assert_eq!(key.operator, Operator::Eq);
        assert_eq!(key.paths, vec!["pais:descripcion"]);
    }

    #[test]
    fn nested_paths_are_kept_whole() {
        let key = FilterKey::parse("ge:pais.region.id").unwrap();
        assert_eq!(key.paths, vec!["pais.region.id"]);
    }

    #[test]
    fn multi_path_operators_split_and_trim() {
        let key = FilterKey::parse("orlikeic:codPersona, nombre").unwrap();
        assert_eq!(key.operator, Operator::OrLikeIc);
        assert_eq!(key.paths, vec!["codPersona", "nombre"]);

        let key = FilterKey::parse("concatlikeic:nombre,pais.descripcion").unwrap();
        assert_eq!(key.paths, vec!["nombre", "pais.descripcion"]);
    }

    #[test]
    fn single_path_operators_do_not_split_commas() {
        let key = FilterKey::parse("eq:a,b").unwrap();
        assert_eq!(key.paths, vec!["a,b"]);
    }

    #[test]
    fn unknown_operator_is_reported() {
        assert_eq!(
            FilterKey::parse("NE:id"),
            Err(KeyError::UnknownOperator("ne".to_string()))
        );
    }

    #[test]
    fn empty_paths_are_rejected() {
        assert_eq!(FilterKey::parse("eq:"), Err(KeyError::EmptyPath));
        assert_eq!(FilterKey::parse("orlikeic:a,,b"), Err(KeyError::EmptyPath));
        assert_eq!(FilterKey::parse(""), Err(KeyError::EmptyPath));
    }

    #[test]
    fn operator_tokens_round_trip() {
        for op in [
            Operator::Eq,
            Operator::Like,
            Operator::LikeIc,
            Operator::Ge,
            Operator::Le,
            Operator::Gt,
            Operator::Lt,
            Operator::Between,
            Operator::In,
            Operator::OrLikeIc,
            Operator::ConcatLikeIc,
        ] {
            assert_eq!(Operator::from_token(op.as_str()), Some(op));
        }
    }
}
