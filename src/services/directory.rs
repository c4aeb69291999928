//! Config-backed tenant directory.
//!
//! # Responsibilities
//! - Map context ids to schema names from the `[[contexts]]` table
//! - Swap the whole table atomically on config reload
//!
//! # Design Decisions
//! - Readers never block: the table lives behind an `ArcSwap`
//! - Unknown contexts are reported, never defaulted

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::config::ContextConfig;
use crate::services::{DirectoryError, SchemaDirectory};

/// Static context → schema table.
#[derive(Debug)]
pub struct StaticSchemaDirectory {
    table: ArcSwap<HashMap<u32, String>>,
}

impl StaticSchemaDirectory {
    /// Create a directory from an explicit table.
    pub fn new(table: HashMap<u32, String>) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    /// Create a directory from configuration entries.
    pub fn from_config(contexts: &[ContextConfig]) -> Self {
        Self::new(Self::table_from(contexts))
    }

    /// Replace the table with a freshly loaded one.
    pub fn replace(&self, contexts: &[ContextConfig]) {
        let table = Self::table_from(contexts);
        tracing::info!(contexts = table.len(), "Context directory reloaded");
        self.table.store(Arc::new(table));
    }

    /// Number of known contexts.
    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    /// True when no context is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table_from(contexts: &[ContextConfig]) -> HashMap<u32, String> {
        contexts
            .iter()
            .map(|c| (c.id, c.schema.clone()))
            .collect()
    }
}

#[async_trait]
impl SchemaDirectory for StaticSchemaDirectory {
    async fn schema_name(&self, context_id: u32) -> Result<String, DirectoryError> {
        self.table
            .load()
            .get(&context_id)
            .cloned()
            .ok_or(DirectoryError::UnknownContext(context_id))
    }
}
