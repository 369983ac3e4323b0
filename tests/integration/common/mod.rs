#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::sync::{Arc, Once};

use sombra_planner::config::PlannerConfig;
use sombra_planner::query::executor::{Element, QueryExecutor};
use sombra_planner::query::metadata::{InMemorySchema, TxSnapshot};
use sombra_planner::query::CompiledQuery;
use sombra_planner::schema::{DataType, PropertyKey};
use sombra_planner::types::{KeyId, Result};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sombra_planner=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_test_writer()
            .try_init();
    });
}

pub fn name() -> PropertyKey {
    PropertyKey::new(KeyId(1), "name", DataType::String)
}

pub fn age() -> PropertyKey {
    PropertyKey::new(KeyId(2), "age", DataType::Int)
}

pub fn city() -> PropertyKey {
    PropertyKey::new(KeyId(3), "city", DataType::String)
}

pub fn bio() -> PropertyKey {
    PropertyKey::new(KeyId(4), "bio", DataType::String)
}

/// Schema knowing `name`, `age`, `city` and `bio`, without indexes.
pub fn people_schema() -> InMemorySchema {
    InMemorySchema::new()
        .with_property(name())
        .with_property(age())
        .with_property(city())
        .with_property(bio())
}

pub fn snapshot(schema: InMemorySchema) -> TxSnapshot {
    TxSnapshot::new(Arc::new(schema), PlannerConfig::default())
}

/// Executor returning a fixed element list and recording every query it receives.
pub struct RecordingExecutor {
    elements: Vec<Element>,
    calls: Cell<usize>,
    seen: RefCell<Vec<CompiledQuery>>,
}

impl RecordingExecutor {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            calls: Cell::new(0),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_query(&self) -> Option<CompiledQuery> {
        self.seen.borrow().last().cloned()
    }
}

impl QueryExecutor for RecordingExecutor {
    fn execute(&self, query: &CompiledQuery) -> Result<Vec<Element>> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push(query.clone());
        Ok(self.elements.clone())
    }
}
