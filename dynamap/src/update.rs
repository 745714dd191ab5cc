//! Building update expressions: a `SET` patch plus the key it addresses.

use crate::codec::AttributeValueType;
use crate::condition::{Comparator, Condition, ConditionBuilder, ConditionTerm};
use crate::error::Error;
use crate::expression::{build_condition, ConditionExpression};
use crate::item::{AttributeValue, Item};
use crate::schema::{AttributeDescriptor, TableDefinition};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Assignment {
    attribute: &'static str,
    attribute_type: crate::schema::AttributeType,
    value: AttributeValue,
}

/// Accumulates `set` assignments and the `matching` block that identifies the
/// target item.
#[derive(Default)]
pub struct UpdateBuilder {
    assignments: Vec<Assignment>,
    condition: Option<Condition>,
}

impl UpdateBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Assign a new value to `attribute`. Assignments keep declaration order;
    /// key attributes cannot be assigned.
    pub fn set<V: AttributeValueType>(
        &mut self,
        attribute: &AttributeDescriptor<V>,
        value: impl Into<V>,
    ) -> &mut Self {
        self.assignments.push(Assignment {
            attribute: attribute.name(),
            attribute_type: V::ATTRIBUTE_TYPE,
            value: value.into().encode(),
        });
        self
    }

    /// The condition identifying the item to patch. It must contain an
    /// equality statement for every key attribute of the table; further
    /// equality statements become a store-side gate on the update.
    pub fn matching(&mut self, build: impl FnOnce(&mut ConditionBuilder)) -> &mut Self {
        let mut builder = ConditionBuilder::new();
        build(&mut builder);
        self.condition = Some(builder.into_condition());
        self
    }

    pub(crate) fn into_expression(
        self,
        definition: &TableDefinition,
    ) -> Result<UpdateExpression, Error> {
        let condition = self.condition.unwrap_or_else(|| {
            ConditionBuilder::new().into_condition()
        });

        let key = extract_key(&condition, definition)?;

        // Statements the key extraction did not consume gate the update.
        let leftover: Vec<ConditionTerm> = condition
            .terms
            .iter()
            .filter(|term| {
                !(term.comparator == Comparator::Eq && definition.is_key_attribute(term.attribute))
            })
            .cloned()
            .collect();
        let gate = if leftover.is_empty() {
            None
        } else {
            Some(build_condition(
                &Condition { terms: leftover },
                definition,
            )?)
        };

        if self.assignments.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        let mut expression = String::from("SET ");
        let mut names = HashMap::new();
        let mut values = HashMap::new();
        for (index, assignment) in self.assignments.iter().enumerate() {
            let declared = definition
                .declared_type(assignment.attribute)
                .ok_or_else(|| Error::UnknownAttribute(assignment.attribute.to_string()))?;
            // Key attributes are immutable; the key is addressed, not patched.
            if definition.is_key_attribute(assignment.attribute) {
                return Err(Error::KeyAssignment(assignment.attribute.to_string()));
            }
            if declared != assignment.attribute_type {
                return Err(Error::mismatch(
                    assignment.attribute,
                    crate::codec::TypeMismatch {
                        expected: declared,
                        found: assignment.attribute_type.as_str(),
                    },
                ));
            }

            let alias = format!("#s{index}");
            let placeholder = format!(":u{index}");
            if index > 0 {
                expression.push_str(", ");
            }
            expression.push_str(&format!("{alias} = {placeholder}"));
            names.insert(alias, assignment.attribute.to_string());
            values.insert(placeholder, assignment.value.clone());
        }

        Ok(UpdateExpression {
            key,
            expression,
            names,
            values,
            condition: gate,
        })
    }
}

/// Every key attribute must appear as an equality leaf in the condition; the
/// backing store addresses an update by exact key, separate from the patch.
fn extract_key(condition: &Condition, definition: &TableDefinition) -> Result<Item, Error> {
    let mut key = Item::new();
    for name in definition.key_attribute_names() {
        let term = condition
            .terms
            .iter()
            .find(|term| term.attribute == name && term.comparator == Comparator::Eq)
            .ok_or_else(|| Error::IncompleteKey(name.to_string()))?;
        key.insert(name.to_string(), term.values[0].clone());
    }
    Ok(key)
}

/// A rendered update: the exact key, the `SET` expression with its bindings,
/// and an optional gating condition rendered separately.
#[derive(Debug, Clone)]
pub(crate) struct UpdateExpression {
    pub key: Item,
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    pub condition: Option<ConditionExpression>,
}
