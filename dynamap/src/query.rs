//! Query and scan specifications: key condition, projection, read
//! consistency.

use crate::client::{QueryRequest, ScanRequest};
use crate::condition::{Condition, ConditionBuilder};
use crate::error::Error;
use crate::expression::build_condition;
use crate::mapper::ItemMapper;
use crate::schema::{AttributeDescriptor, TableDefinition};
use std::sync::Arc;

/// Accumulates one query's parameters; frozen into a [`QuerySpec`] before the
/// first store call.
pub struct QueryBuilder<T> {
    condition: Option<Condition>,
    projection: Vec<String>,
    consistent_read: bool,
    mapper: Option<Arc<dyn ItemMapper<T>>>,
}

impl<T> QueryBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            condition: None,
            projection: Vec::new(),
            consistent_read: false,
            mapper: None,
        }
    }

    /// The key condition. Statements may only reference key attributes.
    pub fn matching(&mut self, build: impl FnOnce(&mut ConditionBuilder)) -> &mut Self {
        let mut builder = ConditionBuilder::new();
        build(&mut builder);
        self.condition = Some(builder.into_condition());
        self
    }

    /// Add an attribute to the projection; by default all attributes come
    /// back.
    pub fn attribute<V>(&mut self, attribute: &AttributeDescriptor<V>) -> &mut Self {
        self.projection.push(attribute.name().to_string());
        self
    }

    /// Ask the store for an up-to-date read instead of an eventually
    /// consistent one.
    pub fn consistent_read(&mut self) -> &mut Self {
        self.consistent_read = true;
        self
    }

    /// Decode result items with `mapper` instead of the table's default.
    pub fn map_with(&mut self, mapper: Arc<dyn ItemMapper<T>>) -> &mut Self {
        self.mapper = Some(mapper);
        self
    }

    pub(crate) fn into_spec(self, definition: &TableDefinition) -> Result<QuerySpec<T>, Error> {
        let condition = self
            .condition
            .unwrap_or_else(|| ConditionBuilder::new().into_condition());

        for term in &condition.terms {
            if !definition.contains_attribute(term.attribute) {
                return Err(Error::UnknownAttribute(term.attribute.to_string()));
            }
            if !definition.is_key_attribute(term.attribute) {
                return Err(Error::NonKeyCondition(term.attribute.to_string()));
            }
        }
        for name in &self.projection {
            if !definition.contains_attribute(name) {
                return Err(Error::UnknownAttribute(name.clone()));
            }
        }

        let rendered = build_condition(&condition, definition)?;

        Ok(QuerySpec {
            request: QueryRequest {
                key_condition: rendered.expression,
                names: rendered.names,
                values: rendered.values,
                projection: if self.projection.is_empty() {
                    None
                } else {
                    Some(self.projection)
                },
                consistent_read: self.consistent_read,
            },
            mapper: self.mapper,
        })
    }
}

/// Immutable, fully validated query parameters.
pub(crate) struct QuerySpec<T> {
    pub request: QueryRequest,
    pub mapper: Option<Arc<dyn ItemMapper<T>>>,
}

/// Accumulates one scan's parameters. A scan has no condition; projection and
/// the mapper override work as in [`QueryBuilder`].
pub struct ScanBuilder<T> {
    projection: Vec<String>,
    mapper: Option<Arc<dyn ItemMapper<T>>>,
}

impl<T> ScanBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            projection: Vec::new(),
            mapper: None,
        }
    }

    /// Add an attribute to the projection; by default all attributes come
    /// back.
    pub fn attribute<V>(&mut self, attribute: &AttributeDescriptor<V>) -> &mut Self {
        self.projection.push(attribute.name().to_string());
        self
    }

    /// Decode result items with `mapper` instead of the table's default.
    pub fn map_with(&mut self, mapper: Arc<dyn ItemMapper<T>>) -> &mut Self {
        self.mapper = Some(mapper);
        self
    }

    pub(crate) fn into_spec(self, definition: &TableDefinition) -> Result<ScanSpec<T>, Error> {
        for name in &self.projection {
            if !definition.contains_attribute(name) {
                return Err(Error::UnknownAttribute(name.clone()));
            }
        }

        Ok(ScanSpec {
            request: ScanRequest {
                projection: if self.projection.is_empty() {
                    None
                } else {
                    Some(self.projection)
                },
            },
            mapper: self.mapper,
        })
    }
}

/// Immutable, fully validated scan parameters.
pub(crate) struct ScanSpec<T> {
    pub request: ScanRequest,
    pub mapper: Option<Arc<dyn ItemMapper<T>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeType, KeyAttribute, TableDefinition};

    const USER_ID: AttributeDescriptor<String> = AttributeDescriptor::new("UserId");
    const SCORE: AttributeDescriptor<i64> = AttributeDescriptor::new("Score");
    const NOTE: AttributeDescriptor<String> = AttributeDescriptor::new("Note");

    fn definition() -> TableDefinition {
        TableDefinition::builder("rankings", KeyAttribute::new("UserId", AttributeType::String))
            .range_key(KeyAttribute::new("Score", AttributeType::Number))
            .attribute("Note", AttributeType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn key_only_condition_is_accepted() {
        let mut builder = QueryBuilder::<()>::new();
        builder.matching(|w| {
            w.eq(&USER_ID, "username_1").ge(&SCORE, 5);
        });
        let spec = builder.into_spec(&definition()).unwrap();
        assert_eq!(spec.request.key_condition, "#n0 = :v0 AND #n1 >= :v1");
        assert!(!spec.request.consistent_read);
    }

    #[test]
    fn non_key_condition_is_rejected_before_any_store_call() {
        let mut builder = QueryBuilder::<()>::new();
        builder.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&NOTE, "x");
        });
        let Err(err) = builder.into_spec(&definition()) else {
            panic!("expected a non-key condition error");
        };
        assert!(matches!(err, Error::NonKeyCondition(name) if name == "Note"));
    }

    #[test]
    fn unknown_projection_attribute_is_rejected() {
        const OTHER: AttributeDescriptor<String> = AttributeDescriptor::new("Other");
        let mut builder = QueryBuilder::<()>::new();
        builder
            .matching(|w| {
                w.eq(&USER_ID, "username_1");
            })
            .attribute(&OTHER);
        let Err(err) = builder.into_spec(&definition()) else {
            panic!("expected an unknown attribute error");
        };
        assert!(matches!(err, Error::UnknownAttribute(name) if name == "Other"));
    }

    #[test]
    fn scan_projection_is_validated_against_the_schema() {
        const OTHER: AttributeDescriptor<String> = AttributeDescriptor::new("Other");
        let mut builder = ScanBuilder::<()>::new();
        builder.attribute(&OTHER);
        let Err(err) = builder.into_spec(&definition()) else {
            panic!("expected an unknown attribute error");
        };
        assert!(matches!(err, Error::UnknownAttribute(name) if name == "Other"));
    }

    #[test]
    fn scan_without_projection_requests_all_attributes() {
        let spec = ScanBuilder::<()>::new().into_spec(&definition()).unwrap();
        assert!(spec.request.projection.is_none());
    }

    #[test]
    fn consistent_read_flag_is_carried_through() {
        let mut builder = QueryBuilder::<()>::new();
        builder
            .matching(|w| {
                w.eq(&USER_ID, "username_1");
            })
            .consistent_read();
        let spec = builder.into_spec(&definition()).unwrap();
        assert!(spec.request.consistent_read);
    }
}
