use dioxus::prelude::{Key, *};

use crate::state::cell::{CellKind, CellView};
use crate::state::config::TableTheme;
use crate::state::controller::{HeaderCell, RowView};
use crate::state::data_model::{JsonRecord, Record};
use crate::state::focus;
use crate::state::i18n::{self, Language};
use crate::state::ordering::SortOrder;
use crate::ui::actions::{self, ExpansionFields, PageSession, TABLE_CONTAINER_ID};

#[component]
pub fn Table(language: Signal<Language>, session: Signal<Option<PageSession>>) -> Element {
    let current_language = *language.read();
    let read = session.read();
    let Some(page) = read.as_ref() else {
        let empty = i18n::tr(current_language, "table.empty");
        return rsx! {
            p { class: "empty-message", id: "empty-message", "{empty}" }
        };
    };

    let controller = &page.controller;
    let headers = controller.header_cells();
    let theme = controller.config().theme.clone();
    let row_height = controller.config().row_height;
    let pressable = controller.has_expansion();
    let rows: Vec<(RowView<JsonRecord>, Option<ExpansionFields>)> = controller
        .visible_rows()
        .map(|row| {
            let expansion = controller
                .expansion_for(&row.record)
                .and_then(|cell| cell.downcast_ref::<ExpansionFields>().cloned());
            (row.clone(), expansion)
        })
        .collect();
    let footer = controller.footer();
    drop(read);

    let no_matches = i18n::tr(current_language, "table.no_matches");
    let expand_empty = i18n::tr(current_language, "table.expand_empty");

    rsx! {
        div { class: "table-container", id: TABLE_CONTAINER_ID,
            if !headers.is_empty() {
                div { class: "table-header", style: "background-color: {theme.header};",
                    for header in headers {
                        HeaderCellView { key: "{header.key}", header: header.clone(), session }
                    }
                }
            }
            if rows.is_empty() {
                p { class: "empty-message", "{no_matches}" }
            }
            for (row, expansion) in rows {
                TableRow {
                    key: "{row.record_id()}",
                    row,
                    expansion,
                    expand_empty,
                    theme: theme.clone(),
                    row_height,
                    pressable,
                    session,
                }
            }
            if let Some(row) = footer.row {
                TableRow {
                    row,
                    expansion: None,
                    expand_empty,
                    theme: theme.clone(),
                    row_height,
                    pressable: false,
                    session,
                }
            }
            div { class: "table-footer", style: "height: {footer.spacer_height}px;" }
        }
    }
}

#[component]
fn HeaderCellView(header: HeaderCell, session: Signal<Option<PageSession>>) -> Element {
    let indicator = match header.sort_indicator {
        Some(SortOrder::Ascending) => " \u{25B2}",
        Some(SortOrder::Descending) => " \u{25BC}",
        None => "",
    };
    let class = if header.sortable {
        "header-cell sortable"
    } else {
        "header-cell"
    };
    let style = format!("flex: {}; text-align: {};", header.width, header.align.css());
    let column_key = header.key.clone();
    let sortable = header.sortable;

    rsx! {
        div {
            class: "{class}",
            style: "{style}",
            id: format!("col-{}", focus::sanitize_id(&header.key)),
            onclick: move |_| {
                if sortable {
                    let column_key = column_key.clone();
                    actions::dispatch(session, move |controller| {
                        controller.sort_by(&column_key);
                    });
                }
            },
            "{header.title}{indicator}"
        }
    }
}

#[component]
fn TableRow(
    row: RowView<JsonRecord>,
    #[props(!optional)]
    expansion: Option<ExpansionFields>,
    expand_empty: &'static str,
    theme: TableTheme,
    row_height: f32,
    pressable: bool,
    session: Signal<Option<PageSession>>,
) -> Element {
    let background = if row.alternate {
        theme.alternate_row.clone()
    } else {
        theme.row.clone()
    };
    let row_class = if pressable { "row pressable" } else { "row" };
    let record = row.record.clone();

    rsx! {
        div {
            class: "{row_class}",
            id: format!("row-{}", row.position),
            style: "background-color: {background};",
            onclick: move |_| {
                if pressable {
                    let record = record.clone();
                    actions::dispatch(session, move |controller| {
                        controller.press_row(&record);
                    });
                }
            },
            div { class: "row-cells",
                for cell in row.cells.iter().cloned() {
                    CellNode {
                        key: "{cell.column_key}",
                        cell,
                        position: row.position,
                        record: row.record.clone(),
                        theme: theme.clone(),
                        row_height,
                        session,
                    }
                }
            }
            if let Some(fields) = expansion {
                div { class: "row-expansion",
                    if fields.is_empty() {
                        span { class: "expansion-empty", "{expand_empty}" }
                    }
                    for (name, value) in fields {
                        div { class: "expansion-field",
                            span { class: "expansion-name", "{name}" }
                            span { class: "expansion-value", "{value}" }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CellNode(
    cell: CellView,
    position: usize,
    record: JsonRecord,
    theme: TableTheme,
    row_height: f32,
    session: Signal<Option<PageSession>>,
) -> Element {
    // Typed text not yet committed; Enter and blur both commit it once.
    let mut draft = use_signal(|| None::<String>);
    let cell_style = format!(
        "flex: {}; text-align: {}; height: {}px;",
        cell.width,
        cell.align.css(),
        row_height
    );

    match cell.kind {
        CellKind::Text { content, lines } => {
            let (class, clamp) = match lines {
                Some(count) => ("cell clamped", format!(" -webkit-line-clamp: {count};")),
                None => ("cell", String::new()),
            };
            rsx! {
                div { class: "{class}", style: "{cell_style}{clamp}", "{content}" }
            }
        }
        CellKind::Editable {
            value,
            keyboard_type,
            return_key_type,
            placeholder,
        } => {
            let element_id = focus::cell_input_id(position, &cell.column_key);
            let column_key = cell.column_key.clone();
            let submit_key = cell.column_key.clone();
            let submit_record = record.clone();
            rsx! {
                div { class: "cell editable-cell", style: "{cell_style}",
                    input {
                        class: "cell-input",
                        id: "{element_id}",
                        style: "border-bottom-color: {theme.editable_underline};",
                        value: "{value}",
                        placeholder: placeholder.unwrap_or_default(),
                        "inputmode": keyboard_type.input_mode(),
                        "enterkeyhint": return_key_type.enter_key_hint(),
                        onclick: move |evt| evt.stop_propagation(),
                        onfocus: move |_| {
                            let _ = document::eval("document.activeElement?.select?.();");
                        },
                        oninput: move |evt| draft.set(Some(evt.value())),
                        onchange: move |_| {
                            let Some(new_value) = draft.take() else {
                                return;
                            };
                            let column_key = column_key.clone();
                            let record = record.clone();
                            actions::dispatch(session, move |controller| {
                                controller.commit_edit(&column_key, &record, &new_value);
                            });
                        },
                        onkeydown: move |evt| {
                            if evt.key() == Key::Enter {
                                let pending = draft.take();
                                let column_key = submit_key.clone();
                                let record = submit_record.clone();
                                actions::dispatch(session, move |controller| {
                                    controller.submit_edit(
                                        &column_key,
                                        &record,
                                        pending.as_deref(),
                                        position,
                                    );
                                });
                            }
                        }
                    }
                }
            }
        }
        CellKind::Checkable {
            is_checked,
            is_disabled,
            icons,
        } => {
            let (icon, color) = if is_disabled {
                (icons.not_checked, theme.checkable_disabled.clone())
            } else if is_checked {
                (icons.checked, theme.checkable_checked.clone())
            } else {
                (icons.not_checked, theme.checkable_unchecked.clone())
            };
            let glyph = icon_glyph(&icon);
            let record_id = record.id();
            rsx! {
                div { class: "cell checkable-cell", style: "{cell_style}",
                    button {
                        class: "check-btn",
                        title: "{icon}",
                        disabled: is_disabled,
                        style: "color: {color};",
                        onclick: move |evt| {
                            evt.stop_propagation();
                            let record_id = record_id.clone();
                            actions::dispatch(session, move |controller| {
                                controller.toggle_selection(&record_id);
                            });
                        },
                        "{glyph}"
                    }
                }
            }
        }
        CellKind::Custom(custom) => {
            let text = custom.downcast_ref::<String>().cloned().unwrap_or_default();
            rsx! {
                div { class: "cell custom-cell", style: "{cell_style}", "{text}" }
            }
        }
    }
}

/// Stand-ins for the Ionicons names cell policies refer to.
fn icon_glyph(icon: &str) -> &'static str {
    if icon.ends_with("radio-button-on") {
        "\u{25C9}"
    } else if icon.ends_with("radio-button-off") {
        "\u{25CB}"
    } else if icon.contains("remove") {
        "\u{2296}"
    } else if icon.contains("checkmark") {
        "\u{2714}"
    } else {
        "\u{25CF}"
    }
}
