//! Entity metadata.
//!
//! [`EntityModel`] is the only thing path resolution needs: attribute types and
//! relation targets per entity. [`Schema`] is the concrete model loaded from a
//! JSON document; it also carries the table/column mapping used for SQL rendering.
//!
//! A schema is validated once at load time and never mutated afterwards, so a
//! single `Arc<Schema>` can back any number of concurrent builds.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::value::ValueType;

/// Read-only entity graph introspection.
pub trait EntityModel: Send + Sync {
    fn contains_entity(&self, entity: &str) -> bool;

    /// Declared type of `entity.name`, if `name` is an attribute.
    fn attribute_type(&self, entity: &str, name: &str) -> Option<ValueType>;

    /// Target entity of `entity.name`, if `name` is a relation.
    fn relation_target(&self, entity: &str, name: &str) -> Option<&str>;
}

/// Validated entity graph. Deserializing runs [`Schema::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument")]
pub struct Schema {
    entities: BTreeMap<String, EntityDef>,
}

/// Schema document as written, before validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    entities: BTreeMap<String, EntityDef>,
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = SchemaError;

    fn try_from(document: SchemaDocument) -> Result<Self, Self::Error> {
        let schema = Self {
            entities: document.entities,
        };
        schema.validate()?;
        Ok(schema)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    pub table: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDef>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDef {
    /// Column name; defaults to the attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// To-one relation: `source.foreign_key` references `target.target_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationDef {
    pub target: String,
    pub foreign_key: String,
    #[serde(default = "default_target_key")]
    pub target_key: String,
}

fn default_target_key() -> String {
    "id".to_string()
}

impl EntityDef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            attributes: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.attributes.insert(
            name.into(),
            AttributeDef {
                column: None,
                value_type,
            },
        );
        self
    }

    pub fn column(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        self.attributes.insert(
            name.into(),
            AttributeDef {
                column: Some(column.into()),
                value_type,
            },
        );
        self
    }

    pub fn relation(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.insert(
            name.into(),
            RelationDef {
                target: target.into(),
                foreign_key: foreign_key.into(),
                target_key: default_target_key(),
            },
        );
        self
    }

    /// Column backing attribute `name`.
    pub fn column_of<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.attributes
            .get(name)
            .map(|a| a.column.as_deref().unwrap_or(name))
    }
}

impl Schema {
    /// Build and validate a schema from entity definitions.
    pub fn from_entities<I, S>(entities: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, EntityDef)>,
        S: Into<String>,
    {
        let schema = Self {
            entities: entities
                .into_iter()
                .map(|(name, def)| (name.into(), def))
                .collect(),
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument =
            serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::try_from(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Check relation targets and SQL identifiers.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (entity_name, entity) in &self.entities {
            check_table_name(&entity.table)?;

            for (name, attribute) in &entity.attributes {
                if entity.relations.contains_key(name) {
                    return Err(SchemaError::AmbiguousMember {
                        entity: entity_name.clone(),
                        name: name.clone(),
                    });
                }
                check_identifier(attribute.column.as_deref().unwrap_or(name))?;
            }

            for (name, relation) in &entity.relations {
                if !self.entities.contains_key(&relation.target) {
                    return Err(SchemaError::UnknownTarget {
                        entity: entity_name.clone(),
                        relation: name.clone(),
                        target: relation.target.clone(),
                    });
                }
                check_identifier(&relation.foreign_key)?;
                check_identifier(&relation.target_key)?;
            }
        }
        Ok(())
    }
}

impl EntityModel for Schema {
    fn contains_entity(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    fn attribute_type(&self, entity: &str, name: &str) -> Option<ValueType> {
        self.entities
            .get(entity)?
            .attributes
            .get(name)
            .map(|a| a.value_type)
    }

    fn relation_target(&self, entity: &str, name: &str) -> Option<&str> {
        self.entities
            .get(entity)?
            .relations
            .get(name)
            .map(|r| r.target.as_str())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(s: &str) -> Result<(), SchemaError> {
    if is_identifier(s) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(s.to_string()))
    }
}

/// Tables may be schema-qualified (`inv.bsw_personas`).
fn check_table_name(s: &str) -> Result<(), SchemaError> {
    let valid = match s.split_once('.') {
        Some((schema, table)) => is_identifier(schema) && is_identifier(table),
        None => is_identifier(s),
    };
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(s.to_string()))
    }
}
