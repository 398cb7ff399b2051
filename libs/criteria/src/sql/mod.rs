//! SQL rendering of condition trees.
//!
//! Renders a PostgreSQL `SELECT` over the root entity's table with:
//! - one `LEFT JOIN` per distinct relation chain referenced by the condition
//! - `$n` placeholders for every value (no value is ever inlined)
//! - literal substring matching via escaped `LIKE ... ESCAPE '\'`
//!
//! Table and column names come from a validated [`Schema`] only.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::condition::{CaseSensitivity, Condition, Operand};
use crate::error::{Error, ResolveError, Result, SchemaError};
use crate::path::AttributePath;
use crate::schema::Schema;
use crate::value::Scalar;

mod bind;
#[cfg(feature = "postgres")]
mod execute;

use bind::{push_contains_pattern, push_value};
#[cfg(feature = "postgres")]
pub use execute::{ExecuteError, PgExecutor};

const ROOT_ALIAS: &str = "t0";

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BindValue {
    Int(i32),
    Long(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl From<Scalar> for BindValue {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Int(v) => Self::Int(v),
            Scalar::Long(v) => Self::Long(v),
            Scalar::Float(v) => Self::Float(v),
            Scalar::Decimal(v) => Self::Decimal(v),
            Scalar::Text(v) => Self::Text(v),
            Scalar::Date(v) => Self::Date(v),
            Scalar::DateTime(v) => Self::DateTime(v),
            Scalar::Bool(v) => Self::Bool(v),
        }
    }
}

impl From<&Scalar> for BindValue {
    fn from(value: &Scalar) -> Self {
        value.clone().into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    table: String,
    alias: String,
    source_alias: String,
    foreign_key: String,
    target_key: String,
}

/// A rendered query: table, joins, predicate and bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    joins: Vec<Join>,
    predicate: String,
    binds: Vec<BindValue>,
}

impl SelectQuery {
    /// Render `condition` as a query over `entity`.
    pub fn build(schema: &Schema, entity: &str, condition: &Condition) -> Result<Self> {
        let root = schema
            .entity(entity)
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_string()))?;

        let mut renderer = Renderer {
            schema,
            aliases: HashMap::new(),
            joins: Vec::new(),
            binds: Vec::new(),
        };
        let predicate = renderer.condition(condition)?;

        let query = Self {
            table: root.table.clone(),
            joins: renderer.joins,
            predicate,
            binds: renderer.binds,
        };
        tracing::debug!(
            entity,
            joins = query.joins.len(),
            binds = query.binds.len(),
            "Rendered select query"
        );
        Ok(query)
    }

    /// `SELECT t0.* ...`
    pub fn sql(&self) -> String {
        self.render(&format!("{}.*", ROOT_ALIAS))
    }

    /// `SELECT COUNT(*) ...` with the same joins, predicate and binds.
    pub fn count_sql(&self) -> String {
        self.render("COUNT(*)")
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    fn render(&self, projection: &str) -> String {
        let mut sql = format!("SELECT {} FROM {} {}", projection, self.table, ROOT_ALIAS);
        for join in &self.joins {
            sql.push_str(&format!(
                " LEFT JOIN {table} {alias} ON {alias}.{target_key} = {source}.{foreign_key}",
                table = join.table,
                alias = join.alias,
                target_key = join.target_key,
                source = join.source_alias,
                foreign_key = join.foreign_key,
            ));
        }
        sql.push_str(" WHERE ");
        sql.push_str(&self.predicate);
        sql
    }
}

struct Renderer<'s> {
    schema: &'s Schema,
    /// Relation chain from the root to join alias.
    aliases: HashMap<Vec<String>, String>,
    joins: Vec<Join>,
    binds: Vec<BindValue>,
}

impl Renderer<'_> {
    fn condition(&mut self, condition: &Condition) -> Result<String> {
        match condition {
            Condition::True => Ok("TRUE".to_string()),
            Condition::And(children) => self.group(children, " AND "),
            Condition::Or(children) => self.group(children, " OR "),
            Condition::Compare { operand, op, value } => {
                let lhs = self.operand(operand)?;
                let idx = push_value(&mut self.binds, value);
                Ok(format!("{} {} ${}", lhs, op.as_sql(), idx))
            }
            Condition::Between { operand, low, high } => {
                let lhs = self.operand(operand)?;
                let low = push_value(&mut self.binds, low);
                let high = push_value(&mut self.binds, high);
                Ok(format!("{} BETWEEN ${} AND ${}", lhs, low, high))
            }
            Condition::In { operand, values } => {
                let lhs = self.operand(operand)?;
                let placeholders = values
                    .iter()
                    .map(|v| format!("${}", push_value(&mut self.binds, v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(format!("{} IN ({})", lhs, placeholders))
            }
            Condition::Like {
                operand,
                needle,
                case,
            } => {
                let lhs = self.operand(operand)?;
                let idx = push_contains_pattern(&mut self.binds, needle);
                Ok(match (case, operand) {
                    (CaseSensitivity::Sensitive, _) => {
                        format!("{} LIKE ${} ESCAPE '\\'", lhs, idx)
                    }
                    (CaseSensitivity::Insensitive, Operand::UpperConcat(_)) => {
                        format!("{} LIKE UPPER(${}) ESCAPE '\\'", lhs, idx)
                    }
                    (CaseSensitivity::Insensitive, Operand::Attribute(_)) => {
                        format!("UPPER({}) LIKE UPPER(${}) ESCAPE '\\'", lhs, idx)
                    }
                })
            }
        }
    }

    fn group(&mut self, children: &[Condition], separator: &str) -> Result<String> {
        let parts = children
            .iter()
            .map(|c| self.condition(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", parts.join(separator)))
    }

    fn operand(&mut self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Attribute(path) => self.column(path),
            Operand::UpperConcat(paths) => {
                let parts = paths
                    .iter()
                    .map(|p| {
                        self.column(p)
                            .map(|column| format!("COALESCE(UPPER({}), '')", column))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" || ' ' || ")))
            }
        }
    }

    /// Qualified column for `path`, adding the joins it needs.
    fn column(&mut self, path: &AttributePath) -> Result<String> {
        let unresolved = |source| Error::Resolve {
            path: path.to_string(),
            source,
        };

        let mut alias = ROOT_ALIAS.to_string();
        let mut chain = Vec::with_capacity(path.joins.len());
        for step in &path.joins {
            chain.push(step.relation.clone());
            if let Some(existing) = self.aliases.get(&chain) {
                alias = existing.clone();
                continue;
            }

            let relation = self
                .schema
                .entity(&step.source)
                .and_then(|e| e.relations.get(&step.relation))
                .ok_or_else(|| {
                    unresolved(ResolveError::UnknownRelation {
                        entity: step.source.clone(),
                        relation: step.relation.clone(),
                    })
                })?;
            let target = self
                .schema
                .entity(&relation.target)
                .ok_or_else(|| unresolved(ResolveError::UnknownEntity(relation.target.clone())))?;

            let join_alias = format!("t{}", self.joins.len() + 1);
            self.joins.push(Join {
                table: target.table.clone(),
                alias: join_alias.clone(),
                source_alias: alias,
                foreign_key: relation.foreign_key.clone(),
                target_key: relation.target_key.clone(),
            });
            self.aliases.insert(chain.clone(), join_alias.clone());
            alias = join_alias;
        }

        let column = self
            .schema
            .entity(&path.entity)
            .and_then(|e| e.column_of(&path.attribute))
            .ok_or_else(|| {
                unresolved(ResolveError::UnknownAttribute {
                    entity: path.entity.clone(),
                    attribute: path.attribute.clone(),
                })
            })?;

        Ok(format!("{}.{}", alias, column))
    }
}
