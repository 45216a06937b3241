use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::json_io::{self, JsonIoError};
use crate::state::config::TableConfig;
use crate::state::data_model::Row;

#[derive(Debug, thiserror::Error)]
pub enum PageIoError {
    #[error("{0}")]
    Json(#[from] JsonIoError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("page config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A dataset together with the page definition used to show it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedPage {
    pub rows: Vec<Row>,
    pub config: TableConfig,
}

pub fn sidecar_path_for_json(json_path: &Path) -> PathBuf {
    let mut os: OsString = json_path.as_os_str().to_os_string();
    os.push(".tablepage");
    PathBuf::from(os)
}

pub fn load_page(json_path: &Path) -> Result<LoadedPage, PageIoError> {
    let rows = json_io::load_json(json_path)?;
    let config = load_config_for_rows(json_path, &rows)?;
    log::debug!(
        "loaded {} rows and {} columns from {}",
        rows.len(),
        config.columns.len(),
        json_path.display()
    );
    Ok(LoadedPage { rows, config })
}

/// Reads the sidecar next to `json_path`, or derives a config from the rows
/// when there is none. A sidecar without columns also gets derived ones.
pub fn load_config_for_rows(json_path: &Path, rows: &[Row]) -> Result<TableConfig, PageIoError> {
    let path = sidecar_path_for_json(json_path);
    if !path.exists() {
        return Ok(TableConfig::derived_from_rows(rows));
    }

    let content = fs::read_to_string(path)?;
    let mut config: TableConfig = serde_json::from_str(&content)?;
    if config.columns.is_empty() {
        let derived = TableConfig::derived_from_rows(rows);
        config.columns = derived.columns;
        if config.search_key.is_none() {
            config.search_key = derived.search_key;
        }
    }
    Ok(config)
}
