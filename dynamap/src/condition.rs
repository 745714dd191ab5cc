//! Declarative conditions over typed attribute descriptors.
//!
//! A condition is gathered by a builder block and frozen into an immutable
//! conjunction of comparison leaves, kept in declaration order so the rendered
//! expression is deterministic.

use crate::codec::AttributeValueType;
use crate::item::AttributeValue;
use crate::schema::{AttributeDescriptor, AttributeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    BeginsWith,
}

/// One comparison leaf: attribute, comparator, bound value(s).
#[derive(Debug, Clone)]
pub(crate) struct ConditionTerm {
    pub attribute: &'static str,
    pub attribute_type: AttributeType,
    pub comparator: Comparator,
    pub values: Vec<AttributeValue>,
}

/// Accumulates comparison statements; every statement in the block joins an
/// implicit conjunction.
#[derive(Default)]
pub struct ConditionBuilder {
    terms: Vec<ConditionTerm>,
}

impl ConditionBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        comparator: Comparator,
        values: Vec<AttributeValue>,
    ) -> &mut Self {
        self.terms.push(ConditionTerm {
            attribute: attribute.name(),
            attribute_type: V::ATTRIBUTE_TYPE,
            comparator,
            values,
        });
        self
    }

    pub fn eq<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        value: impl Into<V>,
    ) -> &mut Self {
        self.push(attribute, Comparator::Eq, vec![value.into().encode()])
    }

    pub fn lt<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        value: impl Into<V>,
    ) -> &mut Self {
        self.push(attribute, Comparator::Lt, vec![value.into().encode()])
    }

    pub fn le<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        value: impl Into<V>,
    ) -> &mut Self {
        self.push(attribute, Comparator::Le, vec![value.into().encode()])
    }

    pub fn gt<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        value: impl Into<V>,
    ) -> &mut Self {
        self.push(attribute, Comparator::Gt, vec![value.into().encode()])
    }

    pub fn ge<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        value: impl Into<V>,
    ) -> &mut Self {
        self.push(attribute, Comparator::Ge, vec![value.into().encode()])
    }

    /// Inclusive range on both ends.
    pub fn between<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        low: impl Into<V>,
        high: impl Into<V>,
    ) -> &mut Self {
        self.push(
            attribute,
            Comparator::Between,
            vec![low.into().encode(), high.into().encode()],
        )
    }

    pub fn begins_with(
        &mut self,
        attribute: &AttributeDescriptor<String>,
        prefix: impl Into<String>,
    ) -> &mut Self {
        self.push(
            attribute,
            Comparator::BeginsWith,
            vec![AttributeValue::S(prefix.into())],
        )
    }

    pub(crate) fn into_condition(self) -> Condition {
        Condition { terms: self.terms }
    }
}

/// Frozen conjunction of comparison leaves, in declaration order.
#[derive(Debug, Clone)]
pub(crate) struct Condition {
    pub terms: Vec<ConditionTerm>,
}
