use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::state::config::RefreshTriggers;
use crate::state::data_model::{self, JsonRecord, Record, RecordId, Row};
use crate::state::ordering::{self, Query};

/// Field a store sets when it finalizes a record.
pub const FINALIZED_FIELD: &str = "finalized";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeCause {
    /// The change arrived from a remote sync rather than from this page.
    ExternalSync,
    Local,
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeNotification {
    pub change_kind: ChangeKind,
    pub record_kind: String,
    pub record_id: RecordId,
    pub cause: ChangeCause,
    /// Whether this change moved the record into its terminal state.
    pub finalized: bool,
}

impl ChangeNotification {
    pub fn triggers_refresh(&self, triggers: &RefreshTriggers) -> bool {
        if self.cause == ChangeCause::ExternalSync && triggers.synced_kinds.contains(&self.record_kind)
        {
            return true;
        }
        self.finalized && triggers.finalizable_kind.as_deref() == Some(self.record_kind.as_str())
    }
}

type Listener = Rc<dyn Fn(&ChangeNotification)>;

struct StoreInner {
    kind: String,
    records: Vec<JsonRecord>,
    listeners: Vec<Listener>,
}

/// In-memory observable store of JSON records of one kind.
///
/// Handles are cheap clones sharing the same data. Removing a record
/// invalidates every copy previously handed out.
#[derive(Clone)]
pub struct RecordStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl RecordStore {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                kind: kind.into(),
                records: Vec::new(),
                listeners: Vec::new(),
            })),
        }
    }

    pub fn from_rows(kind: impl Into<String>, rows: Vec<Row>) -> Self {
        let store = Self::new(kind);
        store.inner.borrow_mut().records = data_model::records_from_rows(rows);
        store
    }

    pub fn kind(&self) -> String {
        self.inner.borrow().kind.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().records.is_empty()
    }

    pub fn all(&self) -> Vec<JsonRecord> {
        self.inner.borrow().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<JsonRecord> {
        self.inner
            .borrow()
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Filters and sorts the stored records the same way a static table
    /// would, so the store can back a pull source.
    pub fn query(&self, search_key: Option<&str>, query: &Query) -> Vec<JsonRecord> {
        let inner = self.inner.borrow();
        ordering::filter_and_sort(&inner.records, search_key, query)
    }

    pub fn subscribe(&self, listener: impl Fn(&ChangeNotification) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    pub fn insert(&self, record: JsonRecord, cause: ChangeCause) {
        let id = record.id();
        let finalized = is_finalized(&record);
        self.inner.borrow_mut().records.push(record);
        self.emit(ChangeKind::Create, id, cause, finalized);
    }

    pub fn update_field(&self, id: &str, key: &str, value: Value, cause: ChangeCause) -> bool {
        let finalized = {
            let mut inner = self.inner.borrow_mut();
            let Some(record) = inner.records.iter_mut().find(|record| record.id() == id) else {
                return false;
            };
            let was_finalized = is_finalized(record);
            if !record.set_field(key, value) {
                return false;
            }
            !was_finalized && is_finalized(record)
        };
        self.emit(ChangeKind::Update, id.to_string(), cause, finalized);
        true
    }

    pub fn remove(&self, id: &str, cause: ChangeCause) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let Some(index) = inner.records.iter().position(|record| record.id() == id) else {
                return false;
            };
            inner.records.remove(index)
        };
        removed.invalidate();
        self.emit(ChangeKind::Delete, id.to_string(), cause, false);
        true
    }

    pub fn finalize(&self, id: &str, cause: ChangeCause) -> bool {
        self.update_field(id, FINALIZED_FIELD, Value::Bool(true), cause)
    }

    fn emit(&self, change_kind: ChangeKind, record_id: RecordId, cause: ChangeCause, finalized: bool) {
        // Listeners may read the store, so release the borrow first.
        let (listeners, record_kind) = {
            let inner = self.inner.borrow();
            (inner.listeners.clone(), inner.kind.clone())
        };
        let notification = ChangeNotification {
            change_kind,
            record_kind,
            record_id,
            cause,
            finalized,
        };
        log::trace!("store change: {notification:?}");
        for listener in listeners {
            listener(&notification);
        }
    }
}

fn is_finalized(record: &JsonRecord) -> bool {
    matches!(record.field(FINALIZED_FIELD), Some(Value::Bool(true)))
}
