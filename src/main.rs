use std::fs::File;

use dioxus::prelude::*;
use simplelog::{Config, LevelFilter, SimpleLogger, WriteLogger};
use tablepage::ui::app::App;

/// Path of a debug log file; without it only warnings reach stderr.
const LOG_ENV: &str = "TABLEPAGE_LOG";

fn init_logging() {
    let result = match std::env::var(LOG_ENV) {
        Ok(path) => match File::create(&path) {
            Ok(file) => WriteLogger::init(LevelFilter::Debug, Config::default(), file),
            Err(err) => {
                eprintln!("cannot create log file {path}: {err}");
                SimpleLogger::init(LevelFilter::Warn, Config::default())
            }
        },
        Err(_) => SimpleLogger::init(LevelFilter::Warn, Config::default()),
    };
    if let Err(err) = result {
        eprintln!("logger already initialised: {err}");
    }
}

fn main() {
    init_logging();

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new().with_window(
                dioxus::desktop::WindowBuilder::new()
                    .with_title("Table Page")
                    .with_inner_size(dioxus::desktop::LogicalSize::new(1024.0, 768.0)),
            ),
        )
        .launch(App);
}
