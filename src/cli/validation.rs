//! Value parsers for CLI arguments that clap cannot check on its own.

use std::net::IpAddr;
use std::path::PathBuf;

pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!(
            "Port must be a number between 1 and 65535, got: '{value}'"
        )),
    }
}

/// The file must exist, be a regular file and be readable.
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!("Configuration file does not exist or is not a file: '{value}'"));
    }
    std::fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{value}': {e}"))
}

pub fn validate_rollback_steps(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(steps @ 1..=100) => Ok(steps),
        Ok(0) => Err("Rollback steps must be greater than 0".to_string()),
        Ok(_) => Err("Rollback steps cannot exceed 100".to_string()),
        Err(_) => Err(format!(
            "Rollback steps must be a positive number, got: '{value}'"
        )),
    }
}

/// Accepts IP addresses and RFC 1123 host names.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();
    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }
    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }

    let valid_label = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if host.split('.').all(valid_label) && !host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Ok(host.to_string())
    } else {
        Err(format!("Invalid host address: '{value}'"))
    }
}
