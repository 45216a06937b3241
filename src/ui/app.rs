use dioxus::prelude::*;
use std::path::PathBuf;

use crate::state::i18n::Language;
use crate::ui::actions::{self, PageSession};
use crate::ui::table::Table;
use crate::ui::toolbar::Toolbar;

const STYLES: Asset = asset!("/assets/styles.css");

/// Dataset opened at start-up, before anything is picked by hand.
pub const OPEN_ENV: &str = "TABLEPAGE_OPEN";

#[component]
pub fn App() -> Element {
    let language = use_signal(Language::default);
    let session = use_signal::<Option<PageSession>>(|| None);
    let file_path = use_signal::<Option<PathBuf>>(|| None);
    let error_message = use_signal::<Option<String>>(|| None);

    use_effect(move || {
        if let Ok(path) = std::env::var(OPEN_ENV) {
            actions::load_path(
                session,
                file_path,
                error_message,
                Language::default(),
                PathBuf::from(path),
            );
        }
    });

    rsx! {
        document::Stylesheet { href: STYLES }
        div { class: "app",
            Toolbar { language, session, file_path, error_message }
            Table { language, session }
        }
    }
}
