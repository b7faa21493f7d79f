use std::fs;
use std::path::{Path, PathBuf};

use rc_core::{RunCodeError, RunCodeOptions};
use rc_parser::{load_behavior_document, BehaviorDocument};
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_scan, map_config_invalid, map_config_read};

pub(crate) fn load_documents(document: &str) -> Result<Vec<BehaviorDocument>, RunCodeError> {
    let root = resolve_source_path(document)?;
    if root.is_file() {
        return Ok(vec![load_behavior_document(&root)?]);
    }

    let files = collect_xml_files(&root)?;
    if files.is_empty() {
        return Err(RunCodeError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .xml files under {}", root.display()),
        ));
    }
    files
        .iter()
        .map(|path| load_behavior_document(path))
        .collect()
}

pub(crate) fn load_options(config: Option<&str>) -> Result<RunCodeOptions, RunCodeError> {
    let Some(config) = config else {
        return Ok(RunCodeOptions::default());
    };
    let raw = fs::read_to_string(config).map_err(map_config_read)?;
    let options: RunCodeOptions = serde_json::from_str(&raw).map_err(map_config_invalid)?;
    options.validate()?;
    Ok(options)
}

pub(crate) fn resolve_source_path(document: &str) -> Result<PathBuf, RunCodeError> {
    let path = PathBuf::from(document);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(RunCodeError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("document does not exist: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

pub(crate) fn collect_xml_files(root: &Path) -> Result<Vec<PathBuf>, RunCodeError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(map_cli_source_scan)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) == Some("xml") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
