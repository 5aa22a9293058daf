//! In-memory host ORM used by the integration tests.
//!
//! Tables hold rows with an id, foreign key columns and a display label.
//! `destroy` runs the pre-delete hook chain the way a host unit of work
//! would: a rollback halt keeps the row, a failed halt surfaces the error.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use elif_restrict::{
    DeleteGuard, DependencySource, DependentFilter, DependentRow, HookChain, HookHalt,
    MessageFormatter, PolicyRegistry, Record, RecordKey, RestrictError, SourceError,
};

#[derive(Debug, Clone)]
pub struct Row {
    pub id: i64,
    pub columns: HashMap<String, i64>,
    pub label: String,
}

/// Handle to a persisted row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    pub model: &'static str,
    pub id: i64,
}

impl Record for Model {
    fn model_name(&self) -> &str {
        self.model
    }

    fn key(&self) -> RecordKey {
        RecordKey::Int(self.id)
    }
}

#[derive(Default)]
pub struct MemoryDb {
    tables: RefCell<HashMap<String, BTreeMap<i64, Row>>>,
    sequences: RefCell<HashMap<String, i64>>,
    failing: Cell<bool>,
    queries: RefCell<Vec<String>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row; each table has its own id sequence starting at 1
    pub fn create(&self, model: &'static str, columns: &[(&str, i64)]) -> Model {
        let id = {
            let mut sequences = self.sequences.borrow_mut();
            let next = sequences.entry(model.to_string()).or_insert(0);
            *next += 1;
            *next
        };

        let row = Row {
            id,
            columns: columns
                .iter()
                .map(|(column, value)| (column.to_string(), *value))
                .collect(),
            label: format!("{} {}", model, id),
        };
        self.tables
            .borrow_mut()
            .entry(model.to_string())
            .or_default()
            .insert(id, row);

        Model { model, id }
    }

    pub fn find(&self, model: &str, id: i64) -> Option<Row> {
        self.tables.borrow().get(model)?.get(&id).cloned()
    }

    pub fn count_of(&self, model: &str) -> usize {
        self.tables.borrow().get(model).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn delete_all(&self, model: &str) {
        self.tables.borrow_mut().remove(model);
    }

    pub fn delete_row(&self, record: Model) {
        if let Some(table) = self.tables.borrow_mut().get_mut(record.model) {
            table.remove(&record.id);
        }
    }

    /// Make every dependency query fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    pub fn clear_queries(&self) {
        self.queries.borrow_mut().clear();
    }

    /// Run the pre-delete hooks, then delete. `Ok(false)` means the unit of
    /// work was rolled back and the row is still there.
    pub fn destroy(&self, hooks: &HookChain, record: Model) -> Result<bool, RestrictError> {
        match hooks.run_pre_delete(&record, self) {
            Ok(()) => {
                self.delete_row(record);
                Ok(true)
            }
            Err(HookHalt::Rollback) => Ok(false),
            Err(HookHalt::Failed(error)) => Err(error),
        }
    }

    fn matching(&self, filter: &DependentFilter<'_>) -> Result<Vec<Row>, SourceError> {
        if self.failing.get() {
            return Err("connection to server was lost".into());
        }

        let RecordKey::Int(parent) = filter.parent_key else {
            return Err("only integer keys are stored".into());
        };

        let tables = self.tables.borrow();
        let Some(targets) = tables.get(filter.target_type) else {
            return Ok(Vec::new());
        };

        let rows = match filter.foreign_key.through {
            Some(ref pivot) => {
                let linked: Vec<i64> = tables
                    .get(&pivot.table)
                    .map(|links| {
                        links
                            .values()
                            .filter(|link| link.columns.get(&filter.foreign_key.column) == Some(parent))
                            .filter_map(|link| link.columns.get(&pivot.related_column).copied())
                            .collect()
                    })
                    .unwrap_or_default();
                targets
                    .values()
                    .filter(|row| linked.contains(&row.id))
                    .cloned()
                    .collect()
            }
            None => targets
                .values()
                .filter(|row| row.columns.get(&filter.foreign_key.column) == Some(parent))
                .cloned()
                .collect(),
        };

        Ok(rows)
    }

    fn log(&self, query: &str, filter: &DependentFilter<'_>) {
        self.queries
            .borrow_mut()
            .push(format!("{} {}", query, filter.target_type));
    }
}

impl DependencySource for MemoryDb {
    fn exists(&self, filter: &DependentFilter<'_>) -> Result<bool, SourceError> {
        self.log("exists", filter);
        Ok(!self.matching(filter)?.is_empty())
    }

    fn count(&self, filter: &DependentFilter<'_>) -> Result<u64, SourceError> {
        self.log("count", filter);
        Ok(self.matching(filter)?.len() as u64)
    }

    fn fetch_ordered(
        &self,
        filter: &DependentFilter<'_>,
        limit: usize,
    ) -> Result<Vec<DependentRow>, SourceError> {
        self.log("fetch", filter);
        // BTreeMap values are already ascending by id
        Ok(self
            .matching(filter)?
            .into_iter()
            .take(limit)
            .map(|row| DependentRow::new(row.id, row.label))
            .collect())
    }
}

/// Guard plus the host hook chain it is installed on
pub struct Harness {
    pub db: MemoryDb,
    pub hooks: HookChain,
    pub guard: DeleteGuard,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_formatter(MessageFormatter::new())
    }

    pub fn with_formatter(formatter: MessageFormatter) -> Self {
        let hooks = HookChain::new();
        let guard = DeleteGuard::new(PolicyRegistry::new(), formatter);
        guard.install_hooks(Arc::new(hooks.clone()));

        Self {
            db: MemoryDb::new(),
            hooks,
            guard,
        }
    }

    pub fn destroy(&self, record: Model) -> Result<bool, RestrictError> {
        self.db.destroy(&self.hooks, record)
    }
}
