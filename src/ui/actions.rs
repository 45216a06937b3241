use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use dioxus::prelude::*;

use crate::io::page_io::{self, LoadedPage};
use crate::state::cell::{CustomCell, TemplateCellPolicy};
use crate::state::controller::{DataSource, TableController, TableHooks, ViewCommand};
use crate::state::data_model::{self, JsonRecord, Record};
use crate::state::i18n::{self, Language};
use crate::state::store::{ChangeCause, ChangeNotification, RecordStore};

/// Delay before a coalesced refresh runs, roughly one paint.
pub const FRAME: Duration = Duration::from_millis(16);

pub const TABLE_CONTAINER_ID: &str = "table-container";

/// Fields shown when a row is expanded: everything the columns don't show.
pub type ExpansionFields = Vec<(String, String)>;

/// One opened dataset: the store holding its records and the controller
/// showing them.
pub struct PageSession {
    pub controller: TableController<JsonRecord>,
    pub store: RecordStore,
    inbox: Rc<RefCell<Vec<ChangeNotification>>>,
}

impl PageSession {
    pub fn open(page: LoadedPage, kind: &str) -> Self {
        let LoadedPage { rows, config } = page;
        let store = RecordStore::from_rows(kind, rows);

        let inbox: Rc<RefCell<Vec<ChangeNotification>>> = Rc::default();
        store.subscribe({
            let inbox = Rc::clone(&inbox);
            move |notification| inbox.borrow_mut().push(notification.clone())
        });

        let column_keys: Vec<String> = config.columns.iter().map(|c| c.key.clone()).collect();
        let hooks = TableHooks::new()
            .with_cell_policy(TemplateCellPolicy::new(config.cells.clone()))
            .with_end_editing({
                let store = store.clone();
                move |column_key, record: &JsonRecord, new_value| {
                    let value = data_model::parse_cell_input(new_value);
                    store.update_field(&record.id(), column_key, value, ChangeCause::Local);
                }
            })
            .with_selection_change(|selection| {
                log::info!("{} records selected", selection.len());
            })
            .with_expansion(move |record: &JsonRecord| {
                let fields: ExpansionFields = record
                    .fields()
                    .iter()
                    .filter(|(key, _)| !column_keys.contains(*key))
                    .map(|(key, value)| (key.clone(), data_model::display_value(value)))
                    .collect();
                CustomCell::new(fields)
            });

        let source = DataSource::pull({
            let store = store.clone();
            let search_key = config.search_key.clone();
            move |query| store.query(search_key.as_deref(), query)
        });

        Self {
            controller: TableController::new(config, source, hooks),
            store,
            inbox,
        }
    }

    /// Feeds store notifications to the controller. True when a refresh
    /// got scheduled.
    fn drain_notifications(&mut self) -> bool {
        let pending: Vec<ChangeNotification> = self.inbox.borrow_mut().drain(..).collect();
        let mut scheduled = false;
        for notification in &pending {
            scheduled |= self.controller.notify_change(notification);
        }
        scheduled
    }
}

/// Runs one interaction against the controller, then carries out the
/// commands it queued.
pub fn dispatch(
    mut session: Signal<Option<PageSession>>,
    event: impl FnOnce(&mut TableController<JsonRecord>),
) {
    let (commands, scheduled) = session.with_mut(|slot| {
        let Some(page) = slot.as_mut() else {
            return (Vec::new(), false);
        };
        event(&mut page.controller);
        let scheduled = page.drain_notifications();
        (page.controller.take_commands(), scheduled)
    });
    run_commands(session, commands);

    if scheduled {
        spawn(async move {
            tokio::time::sleep(FRAME).await;
            let commands = session.with_mut(|slot| {
                let Some(page) = slot.as_mut() else {
                    return Vec::new();
                };
                page.controller.flush_pending_refresh();
                page.controller.take_commands()
            });
            run_commands(session, commands);
        });
    }
}

fn run_commands(session: Signal<Option<PageSession>>, commands: Vec<ViewCommand>) {
    let dom_commands: Vec<ViewCommand> = commands
        .into_iter()
        .filter(|command| !matches!(command, ViewCommand::Republish))
        .collect();
    if dom_commands.is_empty() {
        return;
    }

    // Let the re-render land before touching the DOM.
    spawn(async move {
        tokio::time::sleep(FRAME).await;
        for command in dom_commands {
            match command {
                ViewCommand::ScrollTo { offset } => {
                    let _ = document::eval(&format!(
                        "document.getElementById('{TABLE_CONTAINER_ID}')?.scrollTo({{ top: {offset} }});"
                    ));
                }
                ViewCommand::Focus(handle) => {
                    let current = session
                        .read()
                        .as_ref()
                        .map(|page| page.controller.is_current_handle(&handle))
                        .unwrap_or(false);
                    if !current {
                        log::debug!("dropping stale focus for row {}", handle.position);
                        continue;
                    }
                    let _ = document::eval(&format!(
                        "const el = document.getElementById('{}'); if (el) {{ el.focus(); el.select(); }}",
                        handle.element_id()
                    ));
                }
                ViewCommand::Blur(handle) => {
                    let _ = document::eval(&format!(
                        "document.getElementById('{}')?.blur();",
                        handle.element_id()
                    ));
                }
                ViewCommand::Republish => {}
            }
        }
    });
}

pub fn load_path(
    mut session: Signal<Option<PageSession>>,
    mut file_path: Signal<Option<PathBuf>>,
    mut error_message: Signal<Option<String>>,
    language: Language,
    path: PathBuf,
) {
    match page_io::load_page(&path) {
        Ok(page) if page.config.columns.is_empty() && !page.rows.is_empty() => {
            error_message.set(Some(i18n::tr(language, "error.no_columns").to_string()));
        }
        Ok(page) => {
            let kind = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "record".to_string());
            session.set(Some(PageSession::open(page, &kind)));
            file_path.set(Some(path));
            error_message.set(None);
        }
        Err(err) => {
            log::warn!("failed to open {}: {err}", path.display());
            error_message.set(Some(err.to_string()));
        }
    }
}

pub async fn open_file(
    session: Signal<Option<PageSession>>,
    language: Signal<Language>,
    file_path: Signal<Option<PathBuf>>,
    error_message: Signal<Option<String>>,
) {
    let current_language = *language.read();
    let picked = rfd::AsyncFileDialog::new()
        .add_filter(i18n::tr(current_language, "dialog.json_filter"), &["json"])
        .pick_file()
        .await;

    if let Some(handle) = picked {
        load_path(
            session,
            file_path,
            error_message,
            current_language,
            handle.path().to_path_buf(),
        );
    }
}
