//! Process-wide mapping from fully-qualified type name to
//! [`WellKnownTypeHandler`], seeded at construction with the seven default
//! handlers.
//!
//! The global table follows the `OnceLock<RwLock<...>>` caching pattern
//! `prost-types` uses for its own `Any` value cache
//! (`prost-types/src/any_v2.rs`, `CACHED_INIT: RwLock<Option<Box<dyn
//! AnyValue>>>`): lazily initialized behind a once-guard, read-shared,
//! write-exclusive. `clear()`'s thread-safety is resolved by keeping it a
//! real, `RwLock`-serialized method on the shared global (so it can never
//! race *unsafely*, only *confusingly* against other tests), and
//! additionally offering [`WellKnownTypesRegistry::new_isolated`] so tests
//! that want real isolation never have to touch the shared table at all.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use log::{debug, warn};

use crate::dynamic::DynamicMessage;
use crate::error::{Error, Result};

use super::{
    any::AnyHandler, duration::DurationHandler, empty::EmptyHandler, field_mask::FieldMaskHandler,
    struct_value::{StructHandler, ValueHandler}, timestamp::TimestampHandler, SpecializedValue,
    WellKnownTypeHandler,
};

type HandlerTable = HashMap<String, Arc<dyn WellKnownTypeHandler>>;

fn default_handlers() -> HandlerTable {
    let handlers: Vec<Arc<dyn WellKnownTypeHandler>> = vec![
        Arc::new(TimestampHandler),
        Arc::new(DurationHandler),
        Arc::new(EmptyHandler),
        Arc::new(FieldMaskHandler),
        Arc::new(StructHandler),
        Arc::new(ValueHandler),
        Arc::new(AnyHandler),
    ];
    handlers
        .into_iter()
        .map(|h| (h.handled_type_name().to_string(), h))
        .collect()
}

fn shared_table() -> &'static RwLock<HandlerTable> {
    static TABLE: OnceLock<RwLock<HandlerTable>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(default_handlers()))
}

/// Maps a well-known type's fully qualified name to the handler that
/// services it.
///
/// The default constructor ([`WellKnownTypesRegistry::new`]) shares a single
/// process-wide table; [`WellKnownTypesRegistry::new_isolated`] gives a
/// caller (typically a test) an independent table instead, so `clear()` can
/// be exercised without disturbing other code running concurrently.
pub struct WellKnownTypesRegistry {
    table: Table,
}

enum Table {
    Shared,
    Isolated(RwLock<HandlerTable>),
}

impl Default for WellKnownTypesRegistry {
    fn default() -> Self {
        WellKnownTypesRegistry::new()
    }
}

impl WellKnownTypesRegistry {
    /// A handle to the shared, process-wide table, seeded with the seven
    /// default handlers on first access.
    pub fn new() -> Self {
        WellKnownTypesRegistry { table: Table::Shared }
    }

    /// An independent table, seeded with the seven default handlers, that
    /// does not share state with [`WellKnownTypesRegistry::new`]'s global.
    /// Intended for tests that need to `register`/`clear` without affecting
    /// other concurrently-running tests.
    pub fn new_isolated() -> Self {
        WellKnownTypesRegistry {
            table: Table::Isolated(RwLock::new(default_handlers())),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&HandlerTable) -> R) -> R {
        match &self.table {
            Table::Shared => f(&shared_table().read().expect("well-known-types registry lock poisoned")),
            Table::Isolated(lock) => f(&lock.read().expect("well-known-types registry lock poisoned")),
        }
    }

    fn write<R>(&self, f: impl FnOnce(&mut HandlerTable) -> R) -> R {
        match &self.table {
            Table::Shared => f(&mut shared_table().write().expect("well-known-types registry lock poisoned")),
            Table::Isolated(lock) => f(&mut lock.write().expect("well-known-types registry lock poisoned")),
        }
    }

    /// Registers `handler`, replacing any existing handler for the same
    /// fully-qualified type name. Idempotent by type name.
    pub fn register(&self, handler: Arc<dyn WellKnownTypeHandler>) {
        let type_name = handler.handled_type_name().to_string();
        debug!("registering well-known-type handler for `{type_name}`");
        self.write(|table| {
            table.insert(type_name, handler);
        });
    }

    pub fn get_handler(&self, fqn: &str) -> Option<Arc<dyn WellKnownTypeHandler>> {
        self.read(|table| table.get(fqn).cloned())
    }

    /// Routes to the handler for `fqn`. Fails with
    /// [`Error::HandlerNotFound`] if none is registered.
    pub fn create_specialized(&self, msg: &DynamicMessage, fqn: &str) -> Result<SpecializedValue> {
        let handler = self
            .get_handler(fqn)
            .ok_or_else(|| Error::HandlerNotFound(fqn.to_string()))?;
        handler.create_specialized(msg)
    }

    /// Routes to the handler for `fqn`. Fails with
    /// [`Error::HandlerNotFound`] if none is registered.
    pub fn create_dynamic(&self, value: &SpecializedValue, fqn: &str) -> Result<DynamicMessage> {
        let handler = self
            .get_handler(fqn)
            .ok_or_else(|| Error::HandlerNotFound(fqn.to_string()))?;
        handler.create_dynamic(value)
    }

    /// Removes every registered handler.
    ///
    /// Exists for test isolation only: calling this on the shared,
    /// process-wide table (i.e. a [`WellKnownTypesRegistry::new`] handle)
    /// races against any other code concurrently calling
    /// `get_handler`/`create_specialized`/`create_dynamic` on the same
    /// table. The `RwLock` keeps that race memory-safe, but the result is
    /// still a table with no handlers, visible to every other shared-table
    /// consumer in the process. Production code must not call this;
    /// [`WellKnownTypesRegistry::new_isolated`] is the safe alternative for
    /// tests.
    pub fn clear(&self) {
        warn!("clearing well-known-types registry; this is a test-only operation");
        self.write(|table| table.clear());
    }
}
