use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::config::{ColumnDescriptor, TextAlign};
use crate::state::data_model::{self, Record, RecordId};

pub const DEFAULT_ICON_CHECKED: &str = "md-radio-button-on";
pub const DEFAULT_ICON_NOT_CHECKED: &str = "md-radio-button-off";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyboardType {
    Default,
    #[default]
    Numeric,
    EmailAddress,
    PhonePad,
}

impl KeyboardType {
    /// The matching HTML `inputmode` attribute.
    pub fn input_mode(self) -> &'static str {
        match self {
            KeyboardType::Default => "text",
            KeyboardType::Numeric => "decimal",
            KeyboardType::EmailAddress => "email",
            KeyboardType::PhonePad => "tel",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKeyType {
    Done,
    Go,
    #[default]
    Next,
    Search,
    Send,
}

impl ReturnKeyType {
    /// The matching HTML `enterkeyhint` attribute.
    pub fn enter_key_hint(self) -> &'static str {
        match self {
            ReturnKeyType::Done => "done",
            ReturnKeyType::Go => "go",
            ReturnKeyType::Next => "next",
            ReturnKeyType::Search => "search",
            ReturnKeyType::Send => "send",
        }
    }
}

/// Icon choice for a checkable cell, before defaults are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckIcons {
    #[default]
    Default,
    Single(String),
    Pair {
        checked: String,
        not_checked: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedIcons {
    pub checked: String,
    pub not_checked: String,
}

impl CheckIcons {
    /// Applies the priority order: an explicit pair, then a single icon for
    /// both states, then the built-in pair.
    pub fn from_parts(
        icon: Option<String>,
        icon_checked: Option<String>,
        icon_not_checked: Option<String>,
    ) -> Self {
        match (icon_checked, icon_not_checked, icon) {
            (Some(checked), Some(not_checked), _) => CheckIcons::Pair {
                checked,
                not_checked,
            },
            (_, _, Some(icon)) => CheckIcons::Single(icon),
            _ => CheckIcons::Default,
        }
    }

    pub fn resolve(&self) -> ResolvedIcons {
        match self {
            CheckIcons::Pair {
                checked,
                not_checked,
            } => ResolvedIcons {
                checked: checked.clone(),
                not_checked: not_checked.clone(),
            },
            CheckIcons::Single(icon) => ResolvedIcons {
                checked: icon.clone(),
                not_checked: icon.clone(),
            },
            CheckIcons::Default => ResolvedIcons {
                checked: DEFAULT_ICON_CHECKED.to_string(),
                not_checked: DEFAULT_ICON_NOT_CHECKED.to_string(),
            },
        }
    }
}

/// Opaque renderable supplied by a cell policy or an expansion renderer.
/// The controller only positions it; the presentation layer downcasts.
#[derive(Clone)]
pub struct CustomCell(Rc<dyn Any>);

impl CustomCell {
    pub fn new<T: Any>(content: T) -> Self {
        Self(Rc::new(content))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCell(..)")
    }
}

impl PartialEq for CustomCell {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// How one (column, record) pair should be rendered and interacted with.
#[derive(Clone, Debug, PartialEq)]
pub enum CellDescription {
    Text {
        contents: Value,
        lines: Option<u32>,
    },
    Editable {
        contents: Value,
        keyboard_type: KeyboardType,
        return_key_type: ReturnKeyType,
        placeholder: Option<String>,
    },
    Checkable {
        is_checked: Option<bool>,
        is_disabled: bool,
        icons: CheckIcons,
    },
    Custom(CustomCell),
}

impl CellDescription {
    pub fn text(contents: impl Into<Value>) -> Self {
        CellDescription::Text {
            contents: contents.into(),
            lines: None,
        }
    }

    pub fn editable(contents: impl Into<Value>) -> Self {
        CellDescription::Editable {
            contents: contents.into(),
            keyboard_type: KeyboardType::default(),
            return_key_type: ReturnKeyType::default(),
            placeholder: None,
        }
    }

    pub fn checkable() -> Self {
        CellDescription::Checkable {
            is_checked: None,
            is_disabled: false,
            icons: CheckIcons::Default,
        }
    }

    pub fn custom<T: Any>(content: T) -> Self {
        CellDescription::Custom(CustomCell::new(content))
    }

    pub fn with_lines(self, count: u32) -> Self {
        match self {
            CellDescription::Text { contents, .. } => CellDescription::Text {
                contents,
                lines: Some(count),
            },
            other => other,
        }
    }

    pub fn with_placeholder(self, text: impl Into<String>) -> Self {
        match self {
            CellDescription::Editable {
                contents,
                keyboard_type,
                return_key_type,
                ..
            } => CellDescription::Editable {
                contents,
                keyboard_type,
                return_key_type,
                placeholder: Some(text.into()),
            },
            other => other,
        }
    }

    pub fn with_keyboard(self, keyboard: KeyboardType, return_key: ReturnKeyType) -> Self {
        match self {
            CellDescription::Editable {
                contents,
                placeholder,
                ..
            } => CellDescription::Editable {
                contents,
                keyboard_type: keyboard,
                return_key_type: return_key,
                placeholder,
            },
            other => other,
        }
    }

    pub fn with_icons(self, next: CheckIcons) -> Self {
        match self {
            CellDescription::Checkable {
                is_checked,
                is_disabled,
                ..
            } => CellDescription::Checkable {
                is_checked,
                is_disabled,
                icons: next,
            },
            other => other,
        }
    }

    pub fn checked(self, value: bool) -> Self {
        match self {
            CellDescription::Checkable {
                is_disabled, icons, ..
            } => CellDescription::Checkable {
                is_checked: Some(value),
                is_disabled,
                icons,
            },
            other => other,
        }
    }

    pub fn disabled(self, value: bool) -> Self {
        match self {
            CellDescription::Checkable {
                is_checked, icons, ..
            } => CellDescription::Checkable {
                is_checked,
                is_disabled: value,
                icons,
            },
            other => other,
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, CellDescription::Editable { .. })
    }
}

/// Maps a (column, record) pair to a cell description. Returning `None`
/// falls back to the raw field value rendered as text.
pub trait CellPolicy<R: Record> {
    fn describe(&self, column: &ColumnDescriptor, record: &R) -> Option<CellDescription>;
}

impl<R, F> CellPolicy<R> for F
where
    R: Record,
    F: Fn(&ColumnDescriptor, &R) -> Option<CellDescription>,
{
    fn describe(&self, column: &ColumnDescriptor, record: &R) -> Option<CellDescription> {
        self(column, record)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCellPolicy;

/// Declarative cell kind for one column, as written in a page config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellTemplate {
    Text {
        #[serde(default)]
        lines: Option<u32>,
    },
    Editable {
        #[serde(default)]
        keyboard_type: KeyboardType,
        #[serde(default)]
        return_key_type: ReturnKeyType,
        #[serde(default)]
        placeholder: Option<String>,
    },
    Checkable {
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        icon_checked: Option<String>,
        #[serde(default)]
        icon_not_checked: Option<String>,
        #[serde(default)]
        disabled: bool,
    },
}

impl CellTemplate {
    pub fn describe<R: Record>(&self, column: &ColumnDescriptor, record: &R) -> CellDescription {
        let contents = record.field(&column.key).cloned().unwrap_or(Value::Null);
        match self {
            CellTemplate::Text { lines } => CellDescription::Text {
                contents,
                lines: *lines,
            },
            CellTemplate::Editable {
                keyboard_type,
                return_key_type,
                placeholder,
            } => CellDescription::Editable {
                contents,
                keyboard_type: *keyboard_type,
                return_key_type: *return_key_type,
                placeholder: placeholder.clone(),
            },
            CellTemplate::Checkable {
                icon,
                icon_checked,
                icon_not_checked,
                disabled,
            } => CellDescription::Checkable {
                is_checked: None,
                is_disabled: *disabled,
                icons: CheckIcons::from_parts(
                    icon.clone(),
                    icon_checked.clone(),
                    icon_not_checked.clone(),
                ),
            },
        }
    }
}

/// Policy built from per-column templates; columns without one pass through.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateCellPolicy {
    templates: BTreeMap<String, CellTemplate>,
}

impl TemplateCellPolicy {
    pub fn new(templates: BTreeMap<String, CellTemplate>) -> Self {
        Self { templates }
    }
}

impl<R: Record> CellPolicy<R> for TemplateCellPolicy {
    fn describe(&self, column: &ColumnDescriptor, record: &R) -> Option<CellDescription> {
        self.templates
            .get(&column.key)
            .map(|template| template.describe(column, record))
    }
}

impl<R: Record> CellPolicy<R> for DefaultCellPolicy {
    fn describe(&self, column: &ColumnDescriptor, record: &R) -> Option<CellDescription> {
        record.field(&column.key).cloned().map(CellDescription::text)
    }
}

/// A cell ready for the presentation layer: defaults applied, checked state
/// and icons resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct CellView {
    pub column_key: String,
    pub width: f32,
    pub align: TextAlign,
    pub kind: CellKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellKind {
    Text {
        content: String,
        lines: Option<u32>,
    },
    Editable {
        value: String,
        keyboard_type: KeyboardType,
        return_key_type: ReturnKeyType,
        placeholder: Option<String>,
    },
    Checkable {
        is_checked: bool,
        is_disabled: bool,
        icons: ResolvedIcons,
    },
    Custom(CustomCell),
}

impl CellView {
    pub fn is_editable(&self) -> bool {
        matches!(self.kind, CellKind::Editable { .. })
    }
}

pub fn resolve_cell<R: Record>(
    policy: &dyn CellPolicy<R>,
    column: &ColumnDescriptor,
    record: &R,
    selection: &BTreeSet<RecordId>,
) -> CellView {
    let description = policy
        .describe(column, record)
        .or_else(|| record.field(&column.key).cloned().map(CellDescription::text))
        .unwrap_or_else(|| CellDescription::text(Value::Null));

    let kind = match description {
        CellDescription::Text { contents, lines } => CellKind::Text {
            content: data_model::display_value(&contents),
            lines,
        },
        CellDescription::Editable {
            contents,
            keyboard_type,
            return_key_type,
            placeholder,
        } => CellKind::Editable {
            value: data_model::display_value(&contents),
            keyboard_type,
            return_key_type,
            placeholder,
        },
        CellDescription::Checkable {
            is_checked,
            is_disabled,
            icons,
        } => CellKind::Checkable {
            is_checked: is_checked.unwrap_or_else(|| selection.contains(&record.id())),
            is_disabled,
            icons: icons.resolve(),
        },
        CellDescription::Custom(cell) => CellKind::Custom(cell),
    };

    CellView {
        column_key: column.key.clone(),
        width: column.width,
        align: column.align_text,
        kind,
    }
}
