use std::collections::BTreeMap;

use crate::state::data_model::RecordId;

/// Address of an editable cell as registered during one refresh.
///
/// `position` is an index into the derived row sequence of that refresh and
/// says nothing about the row after the next one; `generation` lets the chain
/// reject handles that outlived their refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellHandle {
    pub generation: u64,
    pub position: usize,
    pub column_key: String,
    pub record_id: RecordId,
}

impl CellHandle {
    /// DOM id of the input this handle points at.
    pub fn element_id(&self) -> String {
        cell_input_id(self.position, &self.column_key)
    }
}

/// What `FocusChain::advance` decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FocusMove {
    Focus(CellHandle),
    Release(CellHandle),
    Nothing,
}

/// Row position to editable cell registry, rebuilt on every refresh.
#[derive(Debug, Default)]
pub struct FocusChain {
    generation: u64,
    entries: BTreeMap<usize, CellHandle>,
    focused: Option<usize>,
}

impl FocusChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every handle and starts a new generation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.focused = None;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registers an editable cell. A later registration for the same row
    /// replaces the earlier one.
    pub fn register(&mut self, position: usize, column_key: &str, record_id: RecordId) {
        self.entries.insert(
            position,
            CellHandle {
                generation: self.generation,
                position,
                column_key: column_key.to_string(),
                record_id,
            },
        );
    }

    pub fn get(&self, position: usize) -> Option<&CellHandle> {
        self.entries.get(&position)
    }

    pub fn is_current(&self, handle: &CellHandle) -> bool {
        handle.generation == self.generation && self.entries.get(&handle.position) == Some(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn positions(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Marks the cell at `position` as focused if it is registered.
    pub fn focus(&mut self, position: usize) -> Option<CellHandle> {
        let handle = self.entries.get(&position)?.clone();
        self.focused = Some(position);
        Some(handle)
    }

    /// Moves to the entry right after `current`, or releases `current` when
    /// there is none.
    pub fn advance(&mut self, current: usize) -> FocusMove {
        if let Some(next) = current.checked_add(1).and_then(|next| self.focus(next)) {
            return FocusMove::Focus(next);
        }

        match self.entries.get(&current) {
            Some(handle) => {
                if self.focused == Some(current) {
                    self.focused = None;
                }
                FocusMove::Release(handle.clone())
            }
            None => FocusMove::Nothing,
        }
    }
}

pub fn cell_input_id(position: usize, column_key: &str) -> String {
    format!("cell-input-{}-{}", position, sanitize_id(column_key))
}

/// Escapes `value` for use in a DOM id. ASCII alphanumerics pass through,
/// every other char becomes `_<hex code point>_`, so distinct keys never
/// share an id.
pub fn sanitize_id(value: &str) -> String {
    let mut id = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            id.push(ch);
        } else {
            id.push_str(&format!("_{:x}_", u32::from(ch)));
        }
    }
    id
}
