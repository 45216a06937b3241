use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::{json, Value};

use tablepage::state::cell::{CellDescription, CellKind, CustomCell};
use tablepage::state::config::{ColumnDescriptor, RefreshTriggers, TableConfig};
use tablepage::state::controller::{
    self, DataSource, RowPress, TableController, TableHooks, ViewCommand,
};
use tablepage::state::data_model::{JsonRecord, Record, Row};
use tablepage::state::ordering::{Query, SortOrder};
use tablepage::state::store::{ChangeCause, ChangeKind, ChangeNotification, RecordStore};

fn record(id: &str, fields: Value) -> JsonRecord {
    let Value::Object(map) = fields else {
        panic!("fixture must be an object");
    };
    JsonRecord::new(id, map.into_iter().collect::<Row>())
}

fn fruits() -> Vec<JsonRecord> {
    vec![
        record("b", json!({"name": "Banana", "qty": 3})),
        record("a", json!({"name": "apple", "qty": 10})),
        record("c", json!({"name": "Cherry", "qty": 7})),
    ]
}

fn config() -> TableConfig {
    TableConfig::new(vec![
        ColumnDescriptor::new("name", "Name", 2.0).sortable(),
        ColumnDescriptor::new("qty", "Qty", 1.0).sortable(),
        ColumnDescriptor::new("note", "Note", 1.0),
    ])
    .with_search_key("name")
}

fn editable_qty() -> TableHooks<JsonRecord> {
    TableHooks::new().with_cell_policy(
        |column: &ColumnDescriptor, record: &JsonRecord| -> Option<CellDescription> {
            match column.key.as_str() {
                "qty" => Some(CellDescription::editable(
                    record.field("qty").cloned().unwrap_or(Value::Null),
                )),
                _ => None,
            }
        },
    )
}

fn static_table(hooks: TableHooks<JsonRecord>) -> TableController<JsonRecord> {
    TableController::new(config(), DataSource::Static(fruits()), hooks)
}

fn names(controller: &TableController<JsonRecord>) -> Vec<String> {
    controller
        .visible_rows()
        .map(|row| {
            row.record
                .field("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

fn synced(kind: &str) -> ChangeNotification {
    ChangeNotification {
        change_kind: ChangeKind::Update,
        record_kind: kind.to_string(),
        record_id: "a".to_string(),
        cause: ChangeCause::ExternalSync,
        finalized: false,
    }
}

#[test]
fn test_initial_rows_follow_source_order() {
    let mut table = static_table(TableHooks::new());
    assert_eq!(names(&table), vec!["Banana", "apple", "Cherry"]);
    assert_eq!(table.take_commands(), vec![ViewCommand::Republish]);
}

#[test]
fn test_default_sort_applies_on_construction() {
    let config = config().with_default_sort("qty", SortOrder::Descending);
    let table = TableController::new(config, DataSource::Static(fruits()), TableHooks::new());
    assert_eq!(names(&table), vec!["apple", "Cherry", "Banana"]);
    assert_eq!(table.sort_spec().map(|s| s.order), Some(SortOrder::Descending));
}

#[test]
fn test_refresh_is_idempotent_but_always_republishes() {
    let mut table = static_table(editable_qty());
    let before: Vec<_> = table.rows().to_vec();
    let positions = table.focus_chain().positions();
    table.take_commands();

    table.refresh();
    assert_eq!(table.rows(), before.as_slice());
    assert_eq!(table.focus_chain().positions(), positions);
    assert_eq!(table.take_commands(), vec![ViewCommand::Republish]);
}

#[test]
fn test_search_filters_and_scrolls_to_top() {
    let mut table = static_table(TableHooks::new());
    table.take_commands();

    table.set_search_term("c");
    assert_eq!(names(&table), vec!["Cherry"]);
    assert_eq!(
        table.take_commands(),
        vec![ViewCommand::Republish, ViewCommand::ScrollTo { offset: 0.0 }]
    );

    table.set_search_term("");
    assert_eq!(names(&table).len(), 3);
}

#[test]
fn test_sort_click_semantics() {
    let mut table = static_table(TableHooks::new());

    assert!(table.sort_by("name"));
    assert_eq!(names(&table), vec!["apple", "Banana", "Cherry"]);

    assert!(table.sort_by("name"));
    assert_eq!(names(&table), vec!["Cherry", "Banana", "apple"]);
    assert_eq!(table.sort_spec().map(|s| s.order), Some(SortOrder::Descending));

    assert!(table.sort_by("qty"));
    assert_eq!(table.sort_spec().map(|s| s.column.as_str()), Some("qty"));
    assert_eq!(table.sort_spec().map(|s| s.order), Some(SortOrder::Ascending));
    assert_eq!(names(&table), vec!["Banana", "Cherry", "apple"]);
}

#[test]
fn test_non_sortable_column_is_ignored() {
    let mut table = static_table(TableHooks::new());
    table.take_commands();

    assert!(!table.sort_by("note"));
    assert!(!table.sort_by("missing"));
    assert_eq!(table.sort_spec(), None);
    assert!(table.take_commands().is_empty());
}

#[test]
fn test_toggle_selection_twice_restores_state() {
    let changes: Rc<RefCell<Vec<BTreeSet<String>>>> = Rc::default();
    let hooks = TableHooks::new().with_selection_change({
        let changes = Rc::clone(&changes);
        move |selection| changes.borrow_mut().push(selection.clone())
    });
    let mut table = static_table(hooks);

    assert!(table.toggle_selection("a"));
    assert!(table.selection().contains("a"));
    assert!(!table.toggle_selection("a"));
    assert!(table.selection().is_empty());

    let changes = changes.borrow();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0], BTreeSet::from(["a".to_string()]));
    assert!(changes[1].is_empty());
}

#[test]
fn test_selection_drives_checkable_cells() {
    let hooks = TableHooks::new().with_cell_policy(
        |column: &ColumnDescriptor, _: &JsonRecord| -> Option<CellDescription> {
            (column.key == "note").then(CellDescription::checkable)
        },
    );
    let mut table = static_table(hooks);
    table.toggle_selection("c");

    let checked: Vec<bool> = table
        .visible_rows()
        .map(|row| match &row.cells[2].kind {
            CellKind::Checkable { is_checked, .. } => *is_checked,
            other => panic!("unexpected cell {other:?}"),
        })
        .collect();
    assert_eq!(checked, vec![false, false, true]);
}

#[test]
fn test_external_selection_replaces_internal() {
    let mut table = static_table(TableHooks::new());
    table.toggle_selection("a");

    table.set_external_selection(BTreeSet::from(["b".to_string(), "c".to_string()]));
    assert_eq!(table.selection().len(), 2);
    assert!(!table.selection().contains("a"));

    table.toggle_selection("b");
    assert_eq!(table.selection(), &BTreeSet::from(["c".to_string()]));
}

#[test]
fn test_press_row_prefers_expansion() {
    let pressed = Rc::new(RefCell::new(0));
    let hooks = TableHooks::new()
        .with_row_press({
            let pressed = Rc::clone(&pressed);
            move |_| *pressed.borrow_mut() += 1
        })
        .with_expansion(|record: &JsonRecord| CustomCell::new(format!("details of {}", record.id())));
    let mut table = static_table(hooks);
    let banana = fruits().remove(0);

    assert_eq!(table.press_row(&banana), RowPress::Expanded(true));
    assert!(table.rows()[0].is_expanded);
    let expansion = table.expansion_for(&banana).unwrap();
    assert_eq!(
        expansion.downcast_ref::<String>().map(String::as_str),
        Some("details of b")
    );

    assert_eq!(table.press_row(&banana), RowPress::Expanded(false));
    assert!(table.expansion_for(&banana).is_none());
    assert_eq!(*pressed.borrow(), 0);
}

#[test]
fn test_press_row_without_expansion() {
    let pressed: Rc<RefCell<Vec<String>>> = Rc::default();
    let hooks = TableHooks::new().with_row_press({
        let pressed = Rc::clone(&pressed);
        move |record: &JsonRecord| pressed.borrow_mut().push(record.id())
    });
    let mut table = static_table(hooks);
    let apple = fruits().remove(1);

    assert_eq!(table.press_row(&apple), RowPress::Pressed);
    assert_eq!(*pressed.borrow(), vec!["a".to_string()]);
    assert!(table.expanded_rows().is_empty());

    let mut plain = static_table(TableHooks::new());
    assert_eq!(plain.press_row(&apple), RowPress::Ignored);
}

#[test]
fn test_commit_edit_calls_hook_then_refreshes() {
    let edits: Rc<RefCell<Vec<(String, String, String)>>> = Rc::default();
    let hooks = editable_qty().with_end_editing({
        let edits = Rc::clone(&edits);
        move |column, record: &JsonRecord, value| {
            edits
                .borrow_mut()
                .push((column.to_string(), record.id(), value.to_string()))
        }
    });
    let mut table = static_table(hooks);
    table.take_commands();
    let cherry = fruits().remove(2);

    assert!(table.commit_edit("qty", &cherry, "8"));
    assert_eq!(
        *edits.borrow(),
        vec![("qty".to_string(), "c".to_string(), "8".to_string())]
    );
    assert_eq!(table.take_commands(), vec![ViewCommand::Republish]);
}

#[test]
fn test_commit_edit_without_hook_is_a_no_op() {
    let mut table = static_table(editable_qty());
    table.take_commands();
    let generation = table.focus_chain().generation();

    assert!(!table.commit_edit("qty", &fruits()[0], "8"));
    assert!(table.take_commands().is_empty());
    assert_eq!(table.focus_chain().generation(), generation);
}

#[test]
fn test_invalid_records_are_not_rendered_or_focusable() {
    let records = fruits();
    records[1].invalidate();
    let mut table = TableController::new(config(), DataSource::Static(records), editable_qty());

    assert_eq!(table.rows().len(), 3);
    assert_eq!(names(&table), vec!["Banana", "Cherry"]);
    assert_eq!(table.focus_chain().positions(), vec![0, 2]);

    // Advancing from row 0 does not skip over the hole at row 1.
    table.take_commands();
    table.advance_focus(0);
    assert!(matches!(
        table.take_commands().as_slice(),
        [ViewCommand::Blur(handle)] if handle.position == 0
    ));
}

#[test]
fn test_enter_moves_focus_down_and_scrolls() {
    let mut table = static_table(editable_qty());
    table.take_commands();

    table.advance_focus(0);
    let commands = table.take_commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0], ViewCommand::ScrollTo { offset: 0.0 });
    let ViewCommand::Focus(handle) = &commands[1] else {
        panic!("expected focus, got {commands:?}");
    };
    assert_eq!(handle.position, 1);
    assert_eq!(handle.column_key, "qty");
    assert_eq!(handle.record_id, "a");
    assert!(table.is_current_handle(handle));

    table.advance_focus(1);
    table.advance_focus(2);
    let commands = table.take_commands();
    assert!(matches!(commands.last(), Some(ViewCommand::Blur(h)) if h.position == 2));
}

#[test]
fn test_handles_go_stale_after_refresh() {
    let mut table = static_table(editable_qty());
    let handle = table.focus_chain().get(1).cloned().unwrap();

    table.sort_by("qty");
    assert!(!table.is_current_handle(&handle));
    assert_eq!(table.focus_chain().get(1).map(|h| h.record_id.as_str()), Some("c"));
}

#[test]
fn test_rightmost_editable_cell_owns_the_row() {
    let hooks = TableHooks::new().with_cell_policy(
        |column: &ColumnDescriptor, record: &JsonRecord| -> Option<CellDescription> {
            Some(CellDescription::editable(
                record.field(&column.key).cloned().unwrap_or(Value::Null),
            ))
        },
    );
    let table = static_table(hooks);
    assert_eq!(table.focus_chain().len(), 3);
    assert_eq!(
        table.focus_chain().get(0).map(|h| h.column_key.as_str()),
        Some("note")
    );
}

#[test]
fn test_pull_source_receives_query_and_is_shown_as_returned() {
    let queries: Rc<RefCell<Vec<Query>>> = Rc::default();
    let source = DataSource::pull({
        let queries = Rc::clone(&queries);
        move |query: &Query| {
            queries.borrow_mut().push(query.clone());
            fruits()
        }
    });
    let mut table = TableController::new(config(), source, TableHooks::new());

    table.set_search_term("zzz");
    table.sort_by("qty");

    let queries = queries.borrow();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[2].search_term, "zzz");
    assert_eq!(queries[2].sort_key(), Some("qty"));
    assert!(queries[2].is_ascending());
    assert_eq!(names(&table), vec!["Banana", "apple", "Cherry"]);
}

#[test]
fn test_replace_data_switches_to_static_source() {
    let mut table = static_table(TableHooks::new());
    table.sort_by("name");
    table.replace_data(vec![record("z", json!({"name": "Zucchini"})), record("k", json!({"name": "kiwi"}))]);
    assert_eq!(names(&table), vec!["kiwi", "Zucchini"]);
}

#[test]
fn test_notifications_coalesce_into_one_refresh() {
    let triggers = RefreshTriggers {
        synced_kinds: BTreeSet::from(["fruits".to_string()]),
        finalizable_kind: None,
    };
    let store = RecordStore::new("fruits");
    for record in fruits() {
        store.insert(record, ChangeCause::Local);
    }
    let source = DataSource::pull({
        let store = store.clone();
        move |query: &Query| store.query(Some("name"), query)
    });
    let mut table = TableController::new(
        config().with_refresh_triggers(triggers),
        source,
        TableHooks::new(),
    );
    table.take_commands();

    assert!(!table.notify_change(&synced("veg")));
    assert!(!table.is_refresh_pending());

    store.remove("a", ChangeCause::ExternalSync);
    assert!(table.notify_change(&synced("fruits")));
    assert!(!table.notify_change(&synced("fruits")));
    assert!(table.is_refresh_pending());
    assert!(table.take_commands().is_empty());

    assert!(table.flush_pending_refresh());
    assert!(!table.flush_pending_refresh());
    assert_eq!(table.take_commands(), vec![ViewCommand::Republish]);
    assert_eq!(names(&table), vec!["Banana", "Cherry"]);
}

#[test]
fn test_removed_record_disappears_before_refresh() {
    let store = RecordStore::new("fruits");
    for record in fruits() {
        store.insert(record, ChangeCause::Local);
    }
    let source = DataSource::pull({
        let store = store.clone();
        move |query: &Query| store.query(None, query)
    });
    let table = TableController::new(config(), source, TableHooks::new());

    store.remove("b", ChangeCause::Local);
    assert_eq!(table.rows().len(), 3);
    assert_eq!(names(&table), vec!["apple", "Cherry"]);
}

#[test]
fn test_header_cells_show_sort_indicator() {
    let mut table = static_table(TableHooks::new());
    table.sort_by("qty");
    table.sort_by("qty");

    let headers = table.header_cells();
    assert_eq!(headers.len(), 3);
    assert_eq!(headers[0].title, "Name");
    assert_eq!(headers[0].width, 2.0);
    assert_eq!(headers[0].sort_indicator, None);
    assert_eq!(headers[1].sort_indicator, Some(SortOrder::Descending));
    assert!(!headers[2].sortable);
}

#[test]
fn test_header_hidden_without_titles() {
    let config = TableConfig::new(vec![ColumnDescriptor::new("name", "", 1.0)]);
    let table = TableController::new(config, DataSource::Static(fruits()), TableHooks::new());
    assert!(table.header_cells().is_empty());
}

#[test]
fn test_footer_row_and_spacer() {
    let total = record("total", json!({"name": "Total", "qty": 20}));
    let hooks = TableHooks::new().with_footer_record(total.clone());
    let table = TableController::new(
        config().with_row_height(40.0),
        DataSource::Static(fruits()),
        hooks,
    );

    let footer = table.footer();
    assert_eq!(footer.spacer_height, 320.0);
    let row = footer.row.unwrap();
    assert_eq!(row.record_id(), "total");
    assert_eq!(row.cells.len(), 3);

    total.invalidate();
    assert!(table.footer().row.is_none());
}

#[test]
fn test_alternate_rows() {
    let table = static_table(TableHooks::new());
    let pattern: Vec<bool> = table.rows().iter().map(|row| row.alternate).collect();
    assert_eq!(pattern, vec![true, false, true]);
}

#[test]
fn test_scroll_offset_keeps_two_rows_of_context() {
    assert_eq!(controller::scroll_offset_for_row(0, 45.0), 0.0);
    assert_eq!(controller::scroll_offset_for_row(2, 45.0), 0.0);
    assert_eq!(controller::scroll_offset_for_row(5, 45.0), 135.0);

    let mut table = static_table(TableHooks::new());
    table.take_commands();
    assert_eq!(table.request_scroll_to_row(4), 90.0);
    assert_eq!(table.take_commands(), vec![ViewCommand::ScrollTo { offset: 90.0 }]);
}

#[test]
fn test_enter_commits_then_focuses_a_current_handle() {
    let hooks = editable_qty().with_end_editing(|_, _: &JsonRecord, _| {});
    let mut table = static_table(hooks);
    let banana = fruits().remove(0);
    let generation = table.focus_chain().generation();
    table.take_commands();

    table.submit_edit("qty", &banana, Some("4"), 0);

    assert!(table.focus_chain().generation() > generation);
    let commands = table.take_commands();
    let Some(ViewCommand::Focus(handle)) = commands.last() else {
        panic!("expected focus, got {commands:?}");
    };
    assert_eq!(handle.position, 1);
    assert!(table.is_current_handle(handle));
}

#[test]
fn test_enter_without_pending_value_only_moves_focus() {
    let edits = Rc::new(RefCell::new(0));
    let hooks = editable_qty().with_end_editing({
        let edits = Rc::clone(&edits);
        move |_, _: &JsonRecord, _| *edits.borrow_mut() += 1
    });
    let mut table = static_table(hooks);
    let banana = fruits().remove(0);
    let generation = table.focus_chain().generation();

    table.submit_edit("qty", &banana, None, 0);

    assert_eq!(*edits.borrow(), 0);
    assert_eq!(table.focus_chain().generation(), generation);
    assert!(matches!(
        table.take_commands().last(),
        Some(ViewCommand::Focus(handle)) if handle.position == 1
    ));
}
