//! The table façade: typed operations composed from the schema, builders,
//! mapper, and the external store client.

use crate::client::{StoreClient, UpdateRequest};
use crate::error::Error;
use crate::item::Item;
use crate::mapper::ItemMapper;
use crate::query::{QueryBuilder, ScanBuilder};
use crate::schema::TableDefinition;
use crate::update::UpdateBuilder;
use async_stream::try_stream;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Lazily produced, forward-only sequence of decoded items. Dropping it stops
/// further page fetches; each façade call produces a fresh, independent
/// stream.
pub type ItemStream<T> = Pin<Box<dyn Stream<Item = Result<T, Error>> + Send>>;

/// Public surface over one table. Thin by design: each operation builds a
/// spec, calls the store, and decodes through the mapper.
pub struct Table<T> {
    client: Arc<dyn StoreClient>,
    definition: Arc<TableDefinition>,
    mapper: Arc<dyn ItemMapper<T>>,
}

impl<T: Send + Sync + 'static> Table<T> {
    pub fn new(
        client: Arc<dyn StoreClient>,
        definition: TableDefinition,
        mapper: impl ItemMapper<T> + 'static,
    ) -> Self {
        Self {
            client,
            definition: Arc::new(definition),
            mapper: Arc::new(mapper),
        }
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    /// Key attributes of `value`, encoded. Fails when the mapper did not
    /// produce a value for some key attribute.
    fn key_of(&self, value: &T) -> Result<Item, Error> {
        let item = self.mapper.to_item(value)?;
        let mut key = Item::new();
        for name in self.definition.key_attribute_names() {
            let attribute = item
                .get(name)
                .ok_or_else(|| Error::IncompleteKey(name.to_string()))?;
            key.insert(name.to_string(), attribute.clone());
        }
        Ok(key)
    }

    /// Point lookup. An absent item is `Ok(None)`, not an error.
    pub async fn get(&self, key: &T) -> Result<Option<T>, Error> {
        let key = self.key_of(key)?;
        debug!(table = %self.definition.name(), "get item");
        match self.client.get_item(self.definition.name(), &key).await? {
            Some(item) => Ok(Some(self.mapper.from_item(&item)?)),
            None => Ok(None),
        }
    }

    /// Batch point lookup; only the keys that exist come back, missing keys
    /// are silently omitted.
    pub async fn get_batch(&self, keys: &[T]) -> Result<Vec<T>, Error> {
        let key_items = keys
            .iter()
            .map(|key| self.key_of(key))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(table = %self.definition.name(), count = key_items.len(), "batch get");
        let found = self
            .client
            .batch_get_item(self.definition.name(), &key_items)
            .await?;
        found.iter().map(|item| self.mapper.from_item(item)).collect()
    }

    /// Unconditional upsert.
    pub async fn put(&self, value: &T) -> Result<(), Error> {
        let item = self.mapper.to_item(value)?;
        debug!(table = %self.definition.name(), "put item");
        self.client.put_item(self.definition.name(), item).await?;
        Ok(())
    }

    /// Unconditional delete; deleting an absent key is a no-op.
    pub async fn delete(&self, key: &T) -> Result<(), Error> {
        let key = self.key_of(key)?;
        debug!(table = %self.definition.name(), "delete item");
        self.client.delete_item(self.definition.name(), &key).await?;
        Ok(())
    }

    /// Query by key condition. Spec errors (unknown attribute, non-key
    /// condition) surface here, before any store call; the stream then
    /// fetches pages only as the consumer asks for items.
    pub fn query(
        &self,
        build: impl FnOnce(&mut QueryBuilder<T>),
    ) -> Result<ItemStream<T>, Error> {
        let mut builder = QueryBuilder::new();
        build(&mut builder);
        let spec = builder.into_spec(&self.definition)?;

        let client = Arc::clone(&self.client);
        let definition = Arc::clone(&self.definition);
        let mapper = spec.mapper.unwrap_or_else(|| Arc::clone(&self.mapper));
        let request = spec.request;
        debug!(
            table = %definition.name(),
            key_condition = %request.key_condition,
            consistent_read = request.consistent_read,
            "query"
        );

        Ok(Box::pin(try_stream! {
            let mut start_key = None;
            loop {
                let page = client
                    .query(definition.name(), &request, start_key.take())
                    .await
                    .map_err(Error::from)?;
                for item in &page.items {
                    yield mapper.from_item(item)?;
                }
                match page.last_evaluated_key {
                    Some(key) => start_key = Some(key),
                    None => break,
                }
            }
        }))
    }

    /// Unconditional paginated read of the whole table, same streaming
    /// contract as [`query`](Table::query). The builder narrows the
    /// projection or swaps the mapper; projection errors surface here.
    pub fn scan(&self, build: impl FnOnce(&mut ScanBuilder<T>)) -> Result<ItemStream<T>, Error> {
        let mut builder = ScanBuilder::new();
        build(&mut builder);
        let spec = builder.into_spec(&self.definition)?;

        let client = Arc::clone(&self.client);
        let definition = Arc::clone(&self.definition);
        let mapper = spec.mapper.unwrap_or_else(|| Arc::clone(&self.mapper));
        let request = spec.request;
        debug!(table = %definition.name(), "scan");

        Ok(Box::pin(try_stream! {
            let mut start_key = None;
            loop {
                let page = client
                    .scan(definition.name(), &request, start_key.take())
                    .await
                    .map_err(Error::from)?;
                for item in &page.items {
                    yield mapper.from_item(item)?;
                }
                match page.last_evaluated_key {
                    Some(key) => start_key = Some(key),
                    None => break,
                }
            }
        }))
    }

    /// Apply a `SET` patch to the one item the `matching` block identifies.
    /// Attributes outside the patch are left untouched.
    pub async fn update(&self, build: impl FnOnce(&mut UpdateBuilder)) -> Result<(), Error> {
        let mut builder = UpdateBuilder::new();
        build(&mut builder);
        let update = builder.into_expression(&self.definition)?;

        let mut names = update.names;
        let mut values = update.values;
        let condition = update.condition.map(|gate| {
            names.extend(gate.names);
            values.extend(gate.values);
            gate.expression
        });

        let request = UpdateRequest {
            expression: update.expression,
            condition,
            names,
            values,
        };
        debug!(
            table = %self.definition.name(),
            expression = %request.expression,
            "update item"
        );
        self.client
            .update_item(self.definition.name(), update.key, &request)
            .await?;
        Ok(())
    }

    /// Administrative helper for test setup.
    pub async fn create_if_not_exists(&self) -> Result<(), Error> {
        self.client
            .create_table_if_not_exists(&self.definition)
            .await?;
        Ok(())
    }
}
