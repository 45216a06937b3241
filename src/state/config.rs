use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::state::cell::CellTemplate;
use crate::state::data_model::{self, Row};
use crate::state::ordering::{SortOrder, SortSpec};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_column_width")]
    pub width: f32,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub align_text: TextAlign,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, title: impl Into<String>, width: f32) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            width,
            sortable: false,
            align_text: TextAlign::Left,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align_text = align;
        self
    }
}

fn default_column_width() -> f32 {
    1.0
}

/// Colours used by the presentation layer, passed in with the config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableTheme {
    pub row: String,
    pub alternate_row: String,
    pub header: String,
    pub checkable_checked: String,
    pub checkable_unchecked: String,
    pub checkable_disabled: String,
    pub editable_underline: String,
}

impl Default for TableTheme {
    fn default() -> Self {
        Self {
            row: "#f4f6f8".to_string(),
            alternate_row: "white".to_string(),
            header: "#e1e6eb".to_string(),
            checkable_checked: "#2f6fb3".to_string(),
            checkable_unchecked: "#8a949e".to_string(),
            checkable_disabled: "#c8cdd2".to_string(),
            editable_underline: "#2f6fb3".to_string(),
        }
    }
}

/// Which change notifications from a store cause a refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshTriggers {
    /// Record kinds whose externally synced changes refresh the table.
    pub synced_kinds: BTreeSet<String>,
    /// Record kind whose records refresh the table once finalized.
    pub finalizable_kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub columns: Vec<ColumnDescriptor>,
    pub search_key: Option<String>,
    pub default_sort_key: Option<String>,
    pub default_sort_direction: SortOrder,
    pub row_height: f32,
    pub footer_rows: usize,
    pub search_placeholder: Option<String>,
    /// Cell kinds by column key; unlisted columns show their raw value.
    pub cells: BTreeMap<String, CellTemplate>,
    pub theme: TableTheme,
    pub refresh_triggers: RefreshTriggers,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            search_key: None,
            default_sort_key: None,
            default_sort_direction: SortOrder::Ascending,
            row_height: 45.0,
            footer_rows: 8,
            search_placeholder: None,
            cells: BTreeMap::new(),
            theme: TableTheme::default(),
            refresh_triggers: RefreshTriggers::default(),
        }
    }
}

impl TableConfig {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Config for a dataset without a page definition: one sortable column
    /// per key, searching on the first one.
    pub fn derived_from_rows(rows: &[Row]) -> Self {
        let columns: Vec<ColumnDescriptor> = data_model::derive_columns(rows)
            .into_iter()
            .map(|key| ColumnDescriptor::new(key.clone(), key, 1.0).sortable())
            .collect();
        let search_key = columns.first().map(|column| column.key.clone());
        Self {
            columns,
            search_key,
            ..Self::default()
        }
    }

    pub fn with_search_key(mut self, key: impl Into<String>) -> Self {
        self.search_key = Some(key.into());
        self
    }

    pub fn with_default_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.default_sort_key = Some(key.into());
        self.default_sort_direction = order;
        self
    }

    pub fn with_row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_cell(mut self, key: impl Into<String>, template: CellTemplate) -> Self {
        self.cells.insert(key.into(), template);
        self
    }

    pub fn with_refresh_triggers(mut self, triggers: RefreshTriggers) -> Self {
        self.refresh_triggers = triggers;
        self
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn initial_sort(&self) -> Option<SortSpec> {
        self.default_sort_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(|key| SortSpec {
                column: key.clone(),
                order: self.default_sort_direction,
            })
    }

    pub fn has_titles(&self) -> bool {
        self.columns.iter().any(|column| !column.title.is_empty())
    }

    pub fn footer_height(&self) -> f32 {
        self.footer_rows as f32 * self.row_height
    }
}
