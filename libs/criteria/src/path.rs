//! Attribute path resolution.
//!
//! `pais.region.nombre` on `BswPersonas` resolves to two left joins
//! (`pais`, then `region`) and the attribute `nombre` of the last target.
//! Joins are for attribute access only: a root row without a related row is
//! never dropped by the join itself.

use std::fmt;

use serde::Serialize;

use crate::error::ResolveError;
use crate::schema::EntityModel;
use crate::value::{ValueKind, ValueType};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// One left-join traversal of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JoinStep {
    pub relation: String,
    pub source: String,
    pub target: String,
}

/// Resolved handle to a typed attribute reached from a root entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttributePath {
    pub root: String,
    pub joins: Vec<JoinStep>,
    pub attribute: String,
    /// Entity that owns `attribute` (the root when there are no joins).
    pub entity: String,
    pub value_type: ValueType,
}

impl AttributePath {
    pub fn kind(&self) -> ValueKind {
        self.value_type.kind()
    }

    /// Relation names from the root, in traversal order.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(|j| j.relation.as_str())
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for join in &self.joins {
            write!(f, "{}{}", join.relation, PATH_SEPARATOR)?;
        }
        f.write_str(&self.attribute)
    }
}

/// Resolve a dotted path expression against `root`.
pub fn resolve<M: EntityModel + ?Sized>(
    model: &M,
    root: &str,
    expression: &str,
) -> Result<AttributePath, ResolveError> {
    if !model.contains_entity(root) {
        return Err(ResolveError::UnknownEntity(root.to_string()));
    }
    if expression.trim().is_empty() {
        return Err(ResolveError::EmptyPath);
    }

    let segments: Vec<&str> = expression.split(PATH_SEPARATOR).map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ResolveError::EmptySegment);
    }

    let (attribute, relations) = segments
        .split_last()
        .ok_or(ResolveError::EmptyPath)?;

    let mut current = root.to_string();
    let mut joins = Vec::with_capacity(relations.len());
    for relation in relations {
        let target = model.relation_target(&current, relation).ok_or_else(|| {
            ResolveError::UnknownRelation {
                entity: current.clone(),
                relation: relation.to_string(),
            }
        })?;
        joins.push(JoinStep {
            relation: relation.to_string(),
            source: current.clone(),
            target: target.to_string(),
        });
        current = target.to_string();
    }

    let value_type = model.attribute_type(&current, attribute).ok_or_else(|| {
        ResolveError::UnknownAttribute {
            entity: current.clone(),
            attribute: attribute.to_string(),
        }
    })?;

    tracing::trace!(root, path = expression, joins = joins.len(), %value_type, "Resolved attribute path");

    Ok(AttributePath {
        root: root.to_string(),
        joins,
        attribute: attribute.to_string(),
        entity: current,
        value_type,
    })
}
