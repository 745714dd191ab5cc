//! In-memory [`StoreClient`] backend for tests and local development.
//!
//! Plays the role a local store container plays in an integration suite:
//! tables live in a concurrent registry, items in an ordered map per table,
//! and the restricted expression grammar the builders emit is parsed and
//! evaluated in-process. Page size is configurable so pagination paths can be
//! exercised with a handful of items.

mod eval;

use async_trait::async_trait;
use dashmap::DashMap;
use dynamap::{
    AttributeValue, Item, Page, QueryRequest, ScanRequest, StoreClient, StoreError,
    TableDefinition, UpdateRequest,
};
use eval::Bindings;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

const DEFAULT_PAGE_SIZE: usize = 100;

struct TableState {
    definition: TableDefinition,
    items: RwLock<BTreeMap<String, Item>>,
}

impl TableState {
    /// Composite primary-key string for an item, hash key first.
    fn key_string(&self, item: &Item) -> Result<String, StoreError> {
        let mut parts = Vec::new();
        for name in self.definition.key_attribute_names() {
            let value = item.get(name).ok_or_else(|| {
                StoreError::InvalidRequest(format!("missing key attribute: {name}"))
            })?;
            let part = match value {
                AttributeValue::S(s) => s.clone(),
                AttributeValue::N(n) => n.clone(),
                AttributeValue::B(b) => b.iter().map(|byte| format!("{byte:02x}")).collect(),
                other => {
                    return Err(StoreError::InvalidRequest(format!(
                        "invalid key attribute type {} for {name}",
                        other.tag()
                    )))
                }
            };
            parts.push(part);
        }
        Ok(parts.join("#"))
    }

    /// Key attributes of a stored item, for use as a `last_evaluated_key`.
    fn extract_key(&self, item: &Item) -> Item {
        let mut key = Item::new();
        for name in self.definition.key_attribute_names() {
            if let Some(value) = item.get(name) {
                key.insert(name.to_string(), value.clone());
            }
        }
        key
    }
}

/// In-memory store keyed by table name.
pub struct MemoryStore {
    tables: DashMap<String, TableState>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap pages at `page_size` items, forcing multi-page reads in tests.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn table(&self, name: &str) -> Result<dashmap::mapref::one::Ref<'_, String, TableState>, StoreError> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    /// Slice `items` into one page starting after `exclusive_start_key`.
    fn page_of(
        &self,
        table: &TableState,
        items: Vec<Item>,
        exclusive_start_key: Option<&Item>,
        projection: Option<&Vec<String>>,
    ) -> Result<Page, StoreError> {
        let start = match exclusive_start_key {
            Some(start_key) => {
                let start_string = table.key_string(start_key)?;
                items
                    .iter()
                    .position(|item| {
                        table.key_string(item).is_ok_and(|k| k == start_string)
                    })
                    .map_or(0, |position| position + 1)
            }
            None => 0,
        };

        let remaining = &items[start.min(items.len())..];
        let page: Vec<Item> = remaining.iter().take(self.page_size).cloned().collect();
        let last_evaluated_key = if remaining.len() > self.page_size {
            page.last().map(|item| table.extract_key(item))
        } else {
            None
        };

        let items = match projection {
            Some(attributes) => page
                .into_iter()
                .map(|mut item| {
                    item.retain(|name, _| attributes.contains(name));
                    item
                })
                .collect(),
            None => page,
        };

        Ok(Page {
            items,
            last_evaluated_key,
        })
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>, StoreError> {
        let table = self.table(table)?;
        let key_string = table.key_string(key)?;
        let item = table.items.read().get(&key_string).cloned();
        Ok(item)
    }

    async fn batch_get_item(&self, table: &str, keys: &[Item]) -> Result<Vec<Item>, StoreError> {
        let table = self.table(table)?;
        let items = table.items.read();
        let mut found = Vec::new();
        for key in keys {
            let key_string = table.key_string(key)?;
            if let Some(item) = items.get(&key_string) {
                found.push(item.clone());
            }
        }
        Ok(found)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let table = self.table(table)?;
        let key_string = table.key_string(&item)?;
        table.items.write().insert(key_string, item);
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Item) -> Result<(), StoreError> {
        let table = self.table(table)?;
        let key_string = table.key_string(key)?;
        // Removing an absent key is a no-op.
        table.items.write().remove(&key_string);
        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        request: &QueryRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page, StoreError> {
        let table = self.table(table)?;
        let bindings = Bindings {
            names: &request.names,
            values: &request.values,
        };
        let predicates = eval::parse_condition(&request.key_condition, &bindings)?;

        let mut matches: Vec<Item> = table
            .items
            .read()
            .values()
            .filter(|item| eval::evaluate(&predicates, item))
            .cloned()
            .collect();

        // Query results come back in range-key order within the partition.
        if let Some(range) = table.definition.range_key() {
            matches.sort_by(|a, b| {
                match (a.get(range.name()), b.get(range.name())) {
                    (Some(a), Some(b)) => {
                        eval::compare(a, b).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    _ => std::cmp::Ordering::Equal,
                }
            });
        }

        debug!(
            table = %table.definition.name(),
            matched = matches.len(),
            "query"
        );
        self.page_of(
            &table,
            matches,
            exclusive_start_key.as_ref(),
            request.projection.as_ref(),
        )
    }

    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page, StoreError> {
        let table = self.table(table)?;
        let items: Vec<Item> = table.items.read().values().cloned().collect();
        debug!(table = %table.definition.name(), total = items.len(), "scan");
        self.page_of(
            &table,
            items,
            exclusive_start_key.as_ref(),
            request.projection.as_ref(),
        )
    }

    async fn update_item(
        &self,
        table: &str,
        key: Item,
        request: &UpdateRequest,
    ) -> Result<(), StoreError> {
        let table = self.table(table)?;
        let key_string = table.key_string(&key)?;
        let bindings = Bindings {
            names: &request.names,
            values: &request.values,
        };
        let assignments = eval::parse_set_clause(&request.expression, &bindings)?;
        for (attribute, _) in &assignments {
            // Assigning a key attribute would orphan the item under its
            // stored key string.
            if table.definition.key_attribute_names().contains(&attribute.as_str()) {
                return Err(StoreError::InvalidRequest(format!(
                    "cannot update key attribute: {attribute}"
                )));
            }
        }
        let gate = match &request.condition {
            Some(condition) => eval::parse_condition(condition, &bindings)?,
            None => Vec::new(),
        };

        let mut items = table.items.write();
        // Updating an item that does not exist is a no-op.
        let Some(existing) = items.get(&key_string) else {
            return Ok(());
        };
        if !eval::evaluate(&gate, existing) {
            return Err(StoreError::ConditionFailed);
        }

        let mut updated = existing.clone();
        for (attribute, value) in assignments {
            updated.insert(attribute, value);
        }
        items.insert(key_string, updated);
        Ok(())
    }

    async fn create_table_if_not_exists(
        &self,
        definition: &TableDefinition,
    ) -> Result<(), StoreError> {
        self.tables
            .entry(definition.name().to_string())
            .or_insert_with(|| {
                debug!(table = %definition.name(), "create table");
                TableState {
                    definition: definition.clone(),
                    items: RwLock::new(BTreeMap::new()),
                }
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamap::{AttributeType, KeyAttribute};
    use std::collections::HashMap;

    fn definition() -> TableDefinition {
        TableDefinition::builder("rankings", KeyAttribute::new("UserId", AttributeType::String))
            .range_key(KeyAttribute::new("Score", AttributeType::Number))
            .build()
            .unwrap()
    }

    fn item(user: &str, score: i64) -> Item {
        let mut item = Item::new();
        item.insert("UserId".to_string(), AttributeValue::string(user));
        item.insert("Score".to_string(), AttributeValue::number(score.to_string()));
        item
    }

    async fn seeded_store(count: i64) -> MemoryStore {
        let store = MemoryStore::new().with_page_size(2);
        store.create_table_if_not_exists(&definition()).await.unwrap();
        for index in 0..count {
            store
                .put_item("rankings", item("username_1", index))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn unknown_table_is_reported() {
        let store = MemoryStore::new();
        let err = store.get_item("nope", &item("u", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn put_is_an_upsert_by_key() {
        let store = seeded_store(0).await;
        store.put_item("rankings", item("username_1", 5)).await.unwrap();
        store.put_item("rankings", item("username_1", 5)).await.unwrap();

        let page = store
            .scan("rankings", &ScanRequest::default(), None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn scan_pages_chain_through_last_evaluated_key() {
        let store = seeded_store(5).await;

        let mut all = Vec::new();
        let mut start = None;
        let mut pages = 0;
        loop {
            let page = store
                .scan("rankings", &ScanRequest::default(), start.take())
                .await
                .unwrap();
            pages += 1;
            all.extend(page.items);
            match page.last_evaluated_key {
                Some(key) => start = Some(key),
                None => break,
            }
        }

        assert_eq!(all.len(), 5);
        assert_eq!(pages, 3);
    }

    #[tokio::test]
    async fn query_returns_range_key_order() {
        let store = MemoryStore::new();
        store.create_table_if_not_exists(&definition()).await.unwrap();
        for score in [15, 5, 10] {
            store
                .put_item("rankings", item("username_1", score))
                .await
                .unwrap();
        }

        let request = QueryRequest {
            key_condition: "#n0 = :v0".to_string(),
            names: HashMap::from([("#n0".to_string(), "UserId".to_string())]),
            values: HashMap::from([(":v0".to_string(), AttributeValue::string("username_1"))]),
            projection: None,
            consistent_read: false,
        };
        let page = store.query("rankings", &request, None).await.unwrap();
        let scores: Vec<&str> = page
            .items
            .iter()
            .map(|item| item["Score"].as_number().unwrap())
            .collect();
        assert_eq!(scores, vec!["5", "10", "15"]);
    }

    #[tokio::test]
    async fn update_on_absent_key_is_a_no_op() {
        let store = seeded_store(0).await;
        let request = UpdateRequest {
            expression: "SET #s0 = :u0".to_string(),
            condition: None,
            names: HashMap::from([("#s0".to_string(), "Note".to_string())]),
            values: HashMap::from([(":u0".to_string(), AttributeValue::string("x"))]),
        };

        store
            .update_item("rankings", item("username_1", 5), &request)
            .await
            .unwrap();

        let page = store
            .scan("rankings", &ScanRequest::default(), None)
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn failing_gate_reports_condition_failed() {
        let store = seeded_store(0).await;
        store.put_item("rankings", item("username_1", 5)).await.unwrap();

        let request = UpdateRequest {
            expression: "SET #s0 = :u0".to_string(),
            condition: Some("#n0 = :v0".to_string()),
            names: HashMap::from([
                ("#s0".to_string(), "Note".to_string()),
                ("#n0".to_string(), "Score".to_string()),
            ]),
            values: HashMap::from([
                (":u0".to_string(), AttributeValue::string("x")),
                (":v0".to_string(), AttributeValue::number("999")),
            ]),
        };

        let err = store
            .update_item("rankings", item("username_1", 5), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed));
    }

    #[tokio::test]
    async fn set_on_a_key_attribute_is_an_invalid_request() {
        let store = seeded_store(0).await;
        store.put_item("rankings", item("username_1", 5)).await.unwrap();

        let request = UpdateRequest {
            expression: "SET #s0 = :u0".to_string(),
            condition: None,
            names: HashMap::from([("#s0".to_string(), "Score".to_string())]),
            values: HashMap::from([(":u0".to_string(), AttributeValue::number("10"))]),
        };

        let err = store
            .update_item("rankings", item("username_1", 5), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }
}
