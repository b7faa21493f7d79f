use rc_core::RunCodeError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> RunCodeError {
    RunCodeError::new(code, error.to_string())
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn emit_error(error: RunCodeError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> RunCodeError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: walkdir::Error) -> RunCodeError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_config_read(error: std::io::Error) -> RunCodeError {
    map_error("CONFIG_READ", error)
}

pub(crate) fn map_config_invalid(error: serde_json::Error) -> RunCodeError {
    map_error("CONFIG_INVALID", error)
}
