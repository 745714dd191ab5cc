//! Bidirectional mapping between domain objects and store items.
//!
//! The default mapper is built from an explicit field-binding table rather
//! than runtime introspection, which keeps the mapping inspectable and
//! testable on its own. Custom types implement [`ItemMapper`] directly; the
//! only contract the rest of the layer relies on is
//! `from_item(to_item(x)) == x`.

use crate::codec::AttributeValueType;
use crate::error::Error;
use crate::item::{AttributeValue, Item};
use crate::schema::AttributeDescriptor;

/// The bidirectional function pair between a domain type and an [`Item`].
pub trait ItemMapper<T>: Send + Sync {
    fn to_item(&self, value: &T) -> Result<Item, Error>;

    fn from_item(&self, item: &Item) -> Result<T, Error>;
}

trait FieldBinding<T>: Send + Sync {
    fn write(&self, value: &T, item: &mut Item);

    fn read(&self, item: &Item, target: &mut T) -> Result<(), Error>;
}

struct Field<T, V> {
    attribute: &'static str,
    get: Box<dyn Fn(&T) -> Option<V> + Send + Sync>,
    set: Box<dyn Fn(&mut T, V) + Send + Sync>,
}

impl<T, V: AttributeValueType> FieldBinding<T> for Field<T, V> {
    fn write(&self, value: &T, item: &mut Item) {
        if let Some(field_value) = (self.get)(value) {
            item.insert(self.attribute.to_string(), field_value.encode());
        }
    }

    fn read(&self, item: &Item, target: &mut T) -> Result<(), Error> {
        match item.get(self.attribute) {
            // Declared but absent (or explicitly null) stays at the default.
            None | Some(AttributeValue::Null(_)) => Ok(()),
            Some(value) => {
                let decoded =
                    V::decode(value).map_err(|source| Error::mismatch(self.attribute, source))?;
                (self.set)(target, decoded);
                Ok(())
            }
        }
    }
}

/// Default mapper for schema-typed domain objects: one binding per declared
/// attribute, matched by descriptor name.
pub struct MappedSchema<T> {
    bindings: Vec<Box<dyn FieldBinding<T>>>,
}

impl<T: Default + 'static> Default for MappedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

// The boxed bindings capture closures over `T`, so `T` must outlive them.
impl<T: Default + 'static> MappedSchema<T> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind a field that is always present on the domain type.
    pub fn field<V: AttributeValueType>(
        mut self,
        attribute: &AttributeDescriptor<V>,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        self.bindings.push(Box::new(Field {
            attribute: attribute.name(),
            get: Box::new(move |value| Some(get(value))),
            set: Box::new(set),
        }));
        self
    }

    /// Bind an optional field; `None` is simply not written to the item.
    pub fn optional<V: AttributeValueType>(
        mut self,
        attribute: &AttributeDescriptor<V>,
        get: impl Fn(&T) -> Option<V> + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        self.bindings.push(Box::new(Field {
            attribute: attribute.name(),
            get: Box::new(get),
            set: Box::new(set),
        }));
        self
    }
}

impl<T: Default + Send + Sync> ItemMapper<T> for MappedSchema<T> {
    fn to_item(&self, value: &T) -> Result<Item, Error> {
        let mut item = Item::new();
        for binding in &self.bindings {
            binding.write(value, &mut item);
        }
        Ok(item)
    }

    fn from_item(&self, item: &Item) -> Result<T, Error> {
        let mut target = T::default();
        for binding in &self.bindings {
            binding.read(item, &mut target)?;
        }
        Ok(target)
    }
}
