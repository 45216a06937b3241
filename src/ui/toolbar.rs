use dioxus::prelude::*;
use std::path::PathBuf;

use crate::state::i18n::{self, Language};
use crate::ui::actions::{self, PageSession};

#[component]
pub fn Toolbar(
    language: Signal<Language>,
    session: Signal<Option<PageSession>>,
    file_path: Signal<Option<PathBuf>>,
    error_message: Signal<Option<String>>,
) -> Element {
    let current_language = *language.read();
    let open_label = i18n::tr(current_language, "toolbar.open");
    let language_label = i18n::tr(current_language, "toolbar.language");
    let rows_label = i18n::tr(current_language, "toolbar.row_count");

    let (searchable, search_term, placeholder, counts) = match session.read().as_ref() {
        Some(page) => {
            let config = page.controller.config();
            let placeholder = config
                .search_placeholder
                .clone()
                .unwrap_or_else(|| i18n::tr(current_language, "search.placeholder").to_string());
            let visible = page.controller.visible_rows().count();
            (
                config.search_key.is_some(),
                page.controller.search_term().to_string(),
                placeholder,
                Some((visible, page.store.len(), page.controller.selection().len())),
            )
        }
        None => (false, String::new(), String::new(), None),
    };

    rsx! {
        div { class: "toolbar",
            div { class: "toolbar-group",
                span { class: "toolbar-label", "{language_label}" }
                select {
                    class: "toolbar-select toolbar-select-sm",
                    id: "select-language",
                    value: "{current_language.code()}",
                    onchange: move |evt| {
                        if let Some(next_language) = Language::from_code(&evt.value()) {
                            let mut language = language;
                            language.set(next_language);
                        }
                    },
                    for lang in Language::all().iter().copied() {
                        option { value: "{lang.code()}", "{i18n::tr(current_language, lang.label_key())}" }
                    }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-open",
                    onclick: move |_| {
                        spawn(async move {
                            actions::open_file(session, language, file_path, error_message).await;
                        });
                    },
                    "\u{1F4C2} {open_label}"
                }
            }
            if searchable {
                div { class: "toolbar-separator" }
                div { class: "toolbar-group search-bar",
                    input {
                        class: "toolbar-input",
                        id: "input-search",
                        r#type: "search",
                        placeholder: "{placeholder}",
                        value: "{search_term}",
                        oninput: move |evt| {
                            let term = evt.value();
                            actions::dispatch(session, move |controller| {
                                controller.set_search_term(term);
                            });
                        }
                    }
                }
            }
            div { class: "toolbar-info",
                if let Some((visible, total, selected)) = counts {
                    span {
                        class: "toolbar-label",
                        id: "label-row-count",
                        "{rows_label}: {visible} / {total} \u{2022} \u{2714} {selected}"
                    }
                }
                if let Some(path) = file_path.read().as_ref() {
                    span { class: "file-path", "{path.display()}" }
                }
                if let Some(err) = error_message.read().as_ref() {
                    span { class: "error-message", "{err}" }
                }
            }
        }
    }
}
