//! The external store capability this layer depends on.
//!
//! Transport, retries, and wire encoding live behind this trait; the core
//! hands it rendered expressions and raw items and passes its failures
//! through untouched.

use crate::item::{AttributeValue, Item};
use crate::schema::TableDefinition;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by the backing store. Opaque to the core: no retries, no
/// remapping to empty results.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("condition failed")]
    ConditionFailed,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One page of a paginated read. The consumer drives the next fetch by
/// passing `last_evaluated_key` back as the exclusive start key.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

/// Wire-level query parameters, as produced by the expression builder.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub key_condition: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    pub projection: Option<Vec<String>>,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub projection: Option<Vec<String>>,
}

/// Wire-level update parameters: a `SET` expression, its bindings, and an
/// optional gating condition over the same binding tables.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub expression: String,
    pub condition: Option<String>,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Async request/response surface of the backing store, keyed on table name,
/// key attributes, and raw attribute maps.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>, StoreError>;

    /// Batch point lookup; missing keys are silently omitted from the result.
    async fn batch_get_item(&self, table: &str, keys: &[Item]) -> Result<Vec<Item>, StoreError>;

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError>;

    async fn delete_item(&self, table: &str, key: &Item) -> Result<(), StoreError>;

    async fn query(
        &self,
        table: &str,
        request: &QueryRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page, StoreError>;

    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page, StoreError>;

    async fn update_item(
        &self,
        table: &str,
        key: Item,
        request: &UpdateRequest,
    ) -> Result<(), StoreError>;

    /// Administrative; used by test setup, not by core logic.
    async fn create_table_if_not_exists(
        &self,
        definition: &TableDefinition,
    ) -> Result<(), StoreError>;
}
