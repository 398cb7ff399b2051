//! Filter mapping to condition tree.
//!
//! For every non-blank entry: parse the key, resolve each path, coerce and
//! assemble one condition. All conditions are AND-ed; no conditions means
//! [`Condition::True`].
//!
//! Failure policy: resolution, coercion and value-shape errors abort the whole
//! build. The only entries that may be skipped without failing are those with
//! an unknown operator token, and only under [`UnknownOperatorPolicy::Ignore`].

use serde::Deserialize;

use crate::condition::{assemble, Condition};
use crate::error::{Error, KeyError, Result, SchemaError};
use crate::key::FilterKey;
use crate::path::resolve;
use crate::schema::EntityModel;
use crate::value::FilterValue;

/// Default cap on the number of entries in one filter mapping.
pub const DEFAULT_MAX_FILTERS: usize = 64;

/// What to do with a key whose operator token is not recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownOperatorPolicy {
    /// Drop the entry (logged at `warn`).
    #[default]
    Ignore,
    /// Fail the build with [`Error::Key`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    pub unknown_operator: UnknownOperatorPolicy,
    pub max_filters: usize,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            unknown_operator: UnknownOperatorPolicy::default(),
            max_filters: DEFAULT_MAX_FILTERS,
        }
    }
}

/// Stateless builder over an entity model.
///
/// Holds only shared references, so one builder can serve concurrent requests.
#[derive(Debug)]
pub struct CriteriaBuilder<'m, M: EntityModel + ?Sized> {
    model: &'m M,
    options: BuilderOptions,
}

impl<'m, M: EntityModel + ?Sized> Clone for CriteriaBuilder<'m, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'m, M: EntityModel + ?Sized> Copy for CriteriaBuilder<'m, M> {}

impl<'m, M: EntityModel + ?Sized> CriteriaBuilder<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self::with_options(model, BuilderOptions::default())
    }

    pub fn with_options(model: &'m M, options: BuilderOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Build the condition for `entity` from a filter mapping.
    ///
    /// Accepts any map iterated as `(&String, &FilterValue)` (`BTreeMap`,
    /// `HashMap`, ...). The result does not depend on iteration order.
    pub fn build<'a, I>(&self, entity: &str, filters: I) -> Result<Condition>
    where
        I: IntoIterator<Item = (&'a String, &'a FilterValue)>,
    {
        if !self.model.contains_entity(entity) {
            return Err(SchemaError::UnknownEntity(entity.to_string()).into());
        }

        let entries: Vec<(&String, &FilterValue)> = filters
            .into_iter()
            .filter(|(key, value)| {
                let blank = value.is_blank();
                if blank {
                    tracing::trace!(key = %key, "Skipping blank filter value");
                }
                !blank
            })
            .collect();
        // Only non-blank entries count towards the cap.
        if entries.len() > self.options.max_filters {
            return Err(Error::TooManyFilters {
                count: entries.len(),
                max: self.options.max_filters,
            });
        }

        let span = tracing::debug_span!("build_criteria", entity, entries = entries.len());
        let _enter = span.enter();

        let mut conditions = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if let Some(condition) = self.build_entry(entity, key, value)? {
                conditions.push(condition);
            }
        }

        // Deterministic output for equal inputs, whatever the map type.
        conditions.sort_by_cached_key(|c| format!("{:?}", c));

        tracing::debug!(conditions = conditions.len(), "Built criteria");
        Ok(Condition::all(conditions))
    }

    /// Build the condition for a single entry; `None` when the entry is dropped.
    pub fn build_entry(
        &self,
        entity: &str,
        key: &str,
        value: &FilterValue,
    ) -> Result<Option<Condition>> {
        let parsed = match FilterKey::parse(key) {
            Ok(parsed) => parsed,
            Err(KeyError::UnknownOperator(token))
                if self.options.unknown_operator == UnknownOperatorPolicy::Ignore =>
            {
                tracing::warn!(key, operator = %token, "Ignoring filter with unknown operator");
                return Ok(None);
            }
            Err(source) => {
                return Err(Error::Key {
                    key: key.to_string(),
                    source,
                })
            }
        };

        let paths = parsed
            .paths
            .iter()
            .map(|p| {
                resolve(self.model, entity, p).map_err(|source| Error::Resolve {
                    path: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        assemble(key, parsed.operator, paths, value).map(Some)
    }
}
