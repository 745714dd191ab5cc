//! Typed data access over a remote key/value document store.
//!
//! A table's schema is declared once (partition key, optional sort key, and
//! typed attribute descriptors) and calling code then works with domain
//! objects instead of raw attribute maps. Condition and update builders
//! translate declarative statements into the store's expression language
//! with deterministic placeholder numbering; an item mapper converts between
//! domain objects and tagged attribute maps; query and scan results stream
//! lazily, one page per consumer demand.
//!
//! The network side lives behind the [`StoreClient`] trait; this crate adds
//! no transport, retries, or locking of its own.

pub mod client;
pub mod codec;
pub mod condition;
pub mod error;
pub mod expression;
pub mod item;
pub mod mapper;
pub mod query;
pub mod schema;
pub mod table;
pub mod update;

pub use client::{Page, QueryRequest, ScanRequest, StoreClient, StoreError, UpdateRequest};
pub use codec::{AttributeValueType, TypeMismatch};
pub use condition::ConditionBuilder;
pub use error::Error;
pub use expression::ConditionExpression;
pub use item::{AttributeValue, Item};
pub use mapper::{ItemMapper, MappedSchema};
pub use query::{QueryBuilder, ScanBuilder};
pub use schema::{AttributeDescriptor, AttributeType, KeyAttribute, TableDefinition};
pub use table::{ItemStream, Table};
pub use update::UpdateBuilder;

#[cfg(test)]
mod update_tests;
