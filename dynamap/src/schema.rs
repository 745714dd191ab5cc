//! Table schema: key layout and declared attributes.

use crate::error::Error;
use std::fmt;
use std::marker::PhantomData;

/// Native value types an attribute can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Binary,
    Bool,
    List,
    Map,
}

impl AttributeType {
    /// The store's short wire tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
            AttributeType::Bool => "BOOL",
            AttributeType::List => "L",
            AttributeType::Map => "M",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared attribute: name plus native type. Immutable once part of a
/// [`TableDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    name: String,
    attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }
}

/// Describes a table: name, hash key, optional range key, and the declared
/// non-key attributes. Pure data; validated on construction.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    name: String,
    hash_key: KeyAttribute,
    range_key: Option<KeyAttribute>,
    attributes: Vec<KeyAttribute>,
}

impl TableDefinition {
    pub fn builder(
        name: impl Into<String>,
        hash_key: KeyAttribute,
    ) -> TableDefinitionBuilder {
        TableDefinitionBuilder {
            name: name.into(),
            hash_key,
            range_key: None,
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash_key(&self) -> &KeyAttribute {
        &self.hash_key
    }

    pub fn range_key(&self) -> Option<&KeyAttribute> {
        self.range_key.as_ref()
    }

    /// Key attribute names in key order: hash key first, then the range key
    /// when the table has one.
    pub fn key_attribute_names(&self) -> Vec<&str> {
        let mut names = vec![self.hash_key.name()];
        if let Some(range) = &self.range_key {
            names.push(range.name());
        }
        names
    }

    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.hash_key.name() == name
            || self.range_key.as_ref().is_some_and(|k| k.name() == name)
    }

    /// Whether `name` is declared on this table, as a key or a plain attribute.
    pub fn contains_attribute(&self, name: &str) -> bool {
        self.declared_type(name).is_some()
    }

    /// The declared type of `name`, if the table declares it.
    pub fn declared_type(&self, name: &str) -> Option<AttributeType> {
        if self.hash_key.name() == name {
            return Some(self.hash_key.attribute_type());
        }
        if let Some(range) = &self.range_key {
            if range.name() == name {
                return Some(range.attribute_type());
            }
        }
        self.attributes
            .iter()
            .find(|a| a.name() == name)
            .map(KeyAttribute::attribute_type)
    }
}

/// Accumulates a table definition, then validates it in [`build`].
///
/// [`build`]: TableDefinitionBuilder::build
pub struct TableDefinitionBuilder {
    name: String,
    hash_key: KeyAttribute,
    range_key: Option<KeyAttribute>,
    attributes: Vec<KeyAttribute>,
}

impl TableDefinitionBuilder {
    pub fn range_key(mut self, key: KeyAttribute) -> Self {
        self.range_key = Some(key);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.attributes.push(KeyAttribute::new(name, attribute_type));
        self
    }

    /// Freeze the definition. All declared names, key or not, must be
    /// pairwise distinct.
    pub fn build(self) -> Result<TableDefinition, Error> {
        let mut seen = vec![self.hash_key.name()];
        if let Some(range) = &self.range_key {
            if seen.contains(&range.name()) {
                return Err(Error::DuplicateAttribute(range.name().to_string()));
            }
            seen.push(range.name());
        }
        for attribute in &self.attributes {
            if seen.contains(&attribute.name()) {
                return Err(Error::DuplicateAttribute(attribute.name().to_string()));
            }
            seen.push(attribute.name());
        }

        Ok(TableDefinition {
            name: self.name,
            hash_key: self.hash_key,
            range_key: self.range_key,
            attributes: self.attributes,
        })
    }
}

/// A typed, named column reference. Used both as a DSL handle when building
/// conditions and updates, and as the mapping key when binding domain fields
/// to attributes. Identity is the attribute name; the type parameter keeps a
/// string column from being compared to a numeric literal at compile time.
pub struct AttributeDescriptor<V> {
    name: &'static str,
    _value: PhantomData<fn() -> V>,
}

impl<V> AttributeDescriptor<V> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V> Clone for AttributeDescriptor<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for AttributeDescriptor<V> {}

impl<V> PartialEq for AttributeDescriptor<V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<V> Eq for AttributeDescriptor<V> {}

impl<V> fmt::Debug for AttributeDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttributeDescriptor").field(&self.name).finish()
    }
}
