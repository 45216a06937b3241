use std::collections::BTreeSet;
use std::rc::Rc;

use crate::state::cell::{self, CellPolicy, CellView, CustomCell, DefaultCellPolicy};
use crate::state::config::{ColumnDescriptor, TableConfig, TextAlign};
use crate::state::data_model::{Record, RecordId};
use crate::state::focus::{CellHandle, FocusChain, FocusMove};
use crate::state::ordering::{self, Query, SortOrder, SortSpec};
use crate::state::store::ChangeNotification;

pub type PullFn<R> = Box<dyn FnMut(&Query) -> Vec<R>>;

/// Where the table's records come from.
pub enum DataSource<R> {
    /// A fixed record array, filtered and sorted by the controller.
    Static(Vec<R>),
    /// Called on every refresh; the result is shown as returned.
    Pull(PullFn<R>),
}

impl<R> DataSource<R> {
    pub fn pull(f: impl FnMut(&Query) -> Vec<R> + 'static) -> Self {
        DataSource::Pull(Box::new(f))
    }
}

/// Optional extension points. The controller always does its own
/// selection and expansion bookkeeping; hooks are only told about it.
pub struct TableHooks<R: Record> {
    pub cell_policy: Rc<dyn CellPolicy<R>>,
    pub on_end_editing: Option<Rc<dyn Fn(&str, &R, &str)>>,
    pub on_row_press: Option<Rc<dyn Fn(&R)>>,
    pub on_selection_change: Option<Rc<dyn Fn(&BTreeSet<RecordId>)>>,
    pub render_expansion: Option<Rc<dyn Fn(&R) -> CustomCell>>,
    pub footer_record: Option<R>,
}

impl<R: Record> Default for TableHooks<R> {
    fn default() -> Self {
        Self {
            cell_policy: Rc::new(DefaultCellPolicy),
            on_end_editing: None,
            on_row_press: None,
            on_selection_change: None,
            render_expansion: None,
            footer_record: None,
        }
    }
}

impl<R: Record> Clone for TableHooks<R> {
    fn clone(&self) -> Self {
        Self {
            cell_policy: Rc::clone(&self.cell_policy),
            on_end_editing: self.on_end_editing.clone(),
            on_row_press: self.on_row_press.clone(),
            on_selection_change: self.on_selection_change.clone(),
            render_expansion: self.render_expansion.clone(),
            footer_record: self.footer_record.clone(),
        }
    }
}

impl<R: Record> TableHooks<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell_policy(mut self, policy: impl CellPolicy<R> + 'static) -> Self {
        self.cell_policy = Rc::new(policy);
        self
    }

    pub fn with_end_editing(mut self, f: impl Fn(&str, &R, &str) + 'static) -> Self {
        self.on_end_editing = Some(Rc::new(f));
        self
    }

    pub fn with_row_press(mut self, f: impl Fn(&R) + 'static) -> Self {
        self.on_row_press = Some(Rc::new(f));
        self
    }

    pub fn with_selection_change(mut self, f: impl Fn(&BTreeSet<RecordId>) + 'static) -> Self {
        self.on_selection_change = Some(Rc::new(f));
        self
    }

    pub fn with_expansion(mut self, f: impl Fn(&R) -> CustomCell + 'static) -> Self {
        self.render_expansion = Some(Rc::new(f));
        self
    }

    pub fn with_footer_record(mut self, record: R) -> Self {
        self.footer_record = Some(record);
        self
    }
}

/// Interaction state owned by the controller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search_term: String,
    pub sort: Option<SortSpec>,
    pub selection: BTreeSet<RecordId>,
    pub expanded_rows: BTreeSet<RecordId>,
}

/// Instructions for the presentation container, drained after each event.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewCommand {
    Republish,
    ScrollTo { offset: f32 },
    Focus(CellHandle),
    Blur(CellHandle),
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderCell {
    pub key: String,
    pub title: String,
    pub width: f32,
    pub align: TextAlign,
    pub sortable: bool,
    /// Set on the active sort column only.
    pub sort_indicator: Option<SortOrder>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowView<R> {
    pub position: usize,
    pub record: R,
    pub cells: Vec<CellView>,
    pub is_expanded: bool,
    /// Set on every other row, starting with the first.
    pub alternate: bool,
}

impl<R: Record> RowView<R> {
    pub fn record_id(&self) -> RecordId {
        self.record.id()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FooterView<R> {
    pub row: Option<RowView<R>>,
    pub spacer_height: f32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowPress {
    Expanded(bool),
    Pressed,
    Ignored,
}

pub struct TableController<R: Record> {
    config: TableConfig,
    source: DataSource<R>,
    hooks: TableHooks<R>,
    view: ViewState,
    rows: Vec<RowView<R>>,
    focus: FocusChain,
    commands: Vec<ViewCommand>,
    refresh_pending: bool,
}

impl<R: Record> TableController<R> {
    pub fn new(config: TableConfig, source: DataSource<R>, hooks: TableHooks<R>) -> Self {
        let view = ViewState {
            sort: config.initial_sort(),
            ..ViewState::default()
        };
        let mut controller = Self {
            config,
            source,
            hooks,
            view,
            rows: Vec::new(),
            focus: FocusChain::new(),
            commands: Vec::new(),
            refresh_pending: false,
        };
        controller.refresh();
        controller
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn search_term(&self) -> &str {
        &self.view.search_term
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.view.sort.as_ref()
    }

    pub fn selection(&self) -> &BTreeSet<RecordId> {
        &self.view.selection
    }

    pub fn expanded_rows(&self) -> &BTreeSet<RecordId> {
        &self.view.expanded_rows
    }

    pub fn focus_chain(&self) -> &FocusChain {
        &self.focus
    }

    pub fn has_expansion(&self) -> bool {
        self.hooks.render_expansion.is_some()
    }

    /// Derived row sequence of the last refresh, including records that
    /// have been invalidated since.
    pub fn rows(&self) -> &[RowView<R>] {
        &self.rows
    }

    /// Rows to render: the derived sequence minus invalid records.
    pub fn visible_rows(&self) -> impl Iterator<Item = &RowView<R>> + '_ {
        self.rows.iter().filter(|row| row.record.is_valid())
    }

    pub fn records(&self) -> Vec<R> {
        self.rows.iter().map(|row| row.record.clone()).collect()
    }

    pub fn query(&self) -> Query {
        Query {
            search_term: self.view.search_term.clone(),
            sort: self.view.sort.clone(),
        }
    }

    pub fn take_commands(&mut self) -> Vec<ViewCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.search_term = term.into();
        self.refresh();
        self.commands.push(ViewCommand::ScrollTo { offset: 0.0 });
    }

    /// Clicking the active column flips direction, any other sortable
    /// column becomes active ascending.
    pub fn sort_by(&mut self, column_key: &str) -> bool {
        let sortable = self
            .config
            .column(column_key)
            .map(|column| column.sortable)
            .unwrap_or(false);
        if !sortable {
            log::debug!("ignoring sort on non-sortable column '{column_key}'");
            return false;
        }

        let order = match self.view.sort.as_ref() {
            Some(spec) if spec.column == column_key => spec.order.toggled(),
            _ => SortOrder::Ascending,
        };
        log::debug!("sorting by '{column_key}' {order:?}");
        self.view.sort = Some(SortSpec {
            column: column_key.to_string(),
            order,
        });
        self.refresh();
        true
    }

    pub fn toggle_selection(&mut self, record_id: &str) -> bool {
        let selected = toggle_member(&mut self.view.selection, record_id);
        if let Some(notify) = self.hooks.on_selection_change.clone() {
            notify(&self.view.selection);
        }
        self.refresh();
        selected
    }

    /// Replaces the selection with one controlled from outside. Later
    /// toggles apply on top of it.
    pub fn set_external_selection(&mut self, selection: BTreeSet<RecordId>) {
        if self.view.selection == selection {
            return;
        }
        self.view.selection = selection;
        self.refresh();
    }

    pub fn toggle_expansion(&mut self, record_id: &str) -> bool {
        let expanded = toggle_member(&mut self.view.expanded_rows, record_id);
        self.refresh();
        expanded
    }

    /// Expansion wins over the press hook when both are configured.
    pub fn press_row(&mut self, record: &R) -> RowPress {
        if self.hooks.render_expansion.is_some() {
            return RowPress::Expanded(self.toggle_expansion(&record.id()));
        }
        match self.hooks.on_row_press.clone() {
            Some(on_press) => {
                on_press(record);
                RowPress::Pressed
            }
            None => RowPress::Ignored,
        }
    }

    pub fn expansion_for(&self, record: &R) -> Option<CustomCell> {
        if !self.view.expanded_rows.contains(&record.id()) {
            return None;
        }
        self.hooks.render_expansion.as_ref().map(|render| render(record))
    }

    pub fn commit_edit(&mut self, column_key: &str, record: &R, new_value: &str) -> bool {
        let Some(on_end_editing) = self.hooks.on_end_editing.clone() else {
            return false;
        };
        on_end_editing(column_key, record, new_value);
        self.refresh();
        true
    }

    /// Enter in an editable cell: commits the pending value, if any, and
    /// then moves focus down. The focus target comes from the chain rebuilt
    /// by the commit, so it is still current when the container applies it.
    pub fn submit_edit(
        &mut self,
        column_key: &str,
        record: &R,
        pending_value: Option<&str>,
        current_position: usize,
    ) {
        if let Some(new_value) = pending_value {
            self.commit_edit(column_key, record, new_value);
        }
        self.advance_focus(current_position);
    }

    pub fn replace_data(&mut self, records: Vec<R>) {
        self.source = DataSource::Static(records);
        self.refresh();
    }

    /// Schedules a refresh if the notification is relevant. Returns true
    /// only for the notification that scheduled it; later ones coalesce.
    pub fn notify_change(&mut self, notification: &ChangeNotification) -> bool {
        if !notification.triggers_refresh(&self.config.refresh_triggers) {
            return false;
        }
        if self.refresh_pending {
            log::debug!("coalescing change of '{}'", notification.record_kind);
            return false;
        }
        self.refresh_pending = true;
        true
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn flush_pending_refresh(&mut self) -> bool {
        if !std::mem::take(&mut self.refresh_pending) {
            return false;
        }
        self.refresh();
        true
    }

    /// Recomputes the derived rows and the focus chain, then asks the
    /// container to republish.
    pub fn refresh(&mut self) {
        self.focus.clear();
        self.refresh_pending = false;

        let query = self.query();
        let records = match &mut self.source {
            DataSource::Static(records) => {
                let search_key = self.config.search_key.as_deref();
                ordering::filter_and_sort(records.as_slice(), search_key, &query)
            }
            DataSource::Pull(pull) => pull(&query),
        };

        self.rows = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            let row = self.build_row(position, record);
            if row.record.is_valid() {
                self.register_editables(&row);
            } else {
                log::trace!("skipping invalid record '{}'", row.record.id());
            }
            self.rows.push(row);
        }

        log::debug!(
            "refreshed {} rows, {} editable, generation {}",
            self.rows.len(),
            self.focus.len(),
            self.focus.generation()
        );
        self.commands.push(ViewCommand::Republish);
    }

    /// Focuses the editable cell one row down, or releases the current one
    /// when there is none.
    pub fn advance_focus(&mut self, current_position: usize) {
        match self.focus.advance(current_position) {
            FocusMove::Focus(handle) => {
                log::debug!("focus moves to row {}", handle.position);
                self.request_scroll_to_row(handle.position);
                self.commands.push(ViewCommand::Focus(handle));
            }
            FocusMove::Release(handle) => {
                log::debug!("releasing focus at row {current_position}");
                self.commands.push(ViewCommand::Blur(handle));
            }
            FocusMove::Nothing => {}
        }
    }

    /// Scrolls so two rows of context stay above `position`.
    pub fn request_scroll_to_row(&mut self, position: usize) -> f32 {
        let offset = scroll_offset_for_row(position, self.config.row_height);
        self.commands.push(ViewCommand::ScrollTo { offset });
        offset
    }

    pub fn is_current_handle(&self, handle: &CellHandle) -> bool {
        self.focus.is_current(handle)
    }

    /// Empty when no column has a title.
    pub fn header_cells(&self) -> Vec<HeaderCell> {
        if !self.config.has_titles() {
            return Vec::new();
        }
        self.config
            .columns
            .iter()
            .map(|column| HeaderCell {
                key: column.key.clone(),
                title: column.title.clone(),
                width: column.width,
                align: column.align_text,
                sortable: column.sortable,
                sort_indicator: self
                    .view
                    .sort
                    .as_ref()
                    .filter(|spec| spec.column == column.key)
                    .map(|spec| spec.order),
            })
            .collect()
    }

    pub fn footer(&self) -> FooterView<R> {
        let row = self
            .hooks
            .footer_record
            .clone()
            .filter(|record| record.is_valid())
            .map(|record| {
                let cells = self.cells_for(&record);
                RowView {
                    position: 0,
                    record,
                    cells,
                    is_expanded: false,
                    alternate: true,
                }
            });
        FooterView {
            row,
            spacer_height: self.config.footer_height(),
        }
    }

    fn build_row(&self, position: usize, record: R) -> RowView<R> {
        let cells = self.cells_for(&record);
        let is_expanded = self.view.expanded_rows.contains(&record.id());
        RowView {
            position,
            record,
            cells,
            is_expanded,
            alternate: position % 2 == 0,
        }
    }

    fn cells_for(&self, record: &R) -> Vec<CellView> {
        self.config
            .columns
            .iter()
            .map(|column: &ColumnDescriptor| {
                cell::resolve_cell(self.hooks.cell_policy.as_ref(), column, record, &self.view.selection)
            })
            .collect()
    }

    fn register_editables(&mut self, row: &RowView<R>) {
        for cell in row.cells.iter().filter(|cell| cell.is_editable()) {
            self.focus.register(row.position, &cell.column_key, row.record.id());
        }
    }
}

pub fn scroll_offset_for_row(position: usize, row_height: f32) -> f32 {
    (position as f32 - 2.0).max(0.0) * row_height
}

fn toggle_member(set: &mut BTreeSet<RecordId>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}
