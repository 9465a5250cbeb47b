//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse derived values (device mode, host whitelist)
//! - Normalise paths (`~` expansion of the data directory)
//! - Validate value ranges (port and timeouts non-zero)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is handed to the daemon

use std::fmt;

use crate::config::schema::DaemonConfig;
use crate::device::DaemonMode;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the configuration and fill in its parsed fields.
pub fn post_process(config: &mut DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let app = &mut config.app;

    match app.daemon_mode.parse::<DaemonMode>() {
        Ok(mode) => app.parsed_mode = mode,
        Err(e) => errors.push(ValidationError::new("daemon_mode", e.to_string())),
    }

    app.parsed_whitelist = parse_whitelist(&app.host_whitelist);

    if app.web_interface_port == 0 {
        errors.push(ValidationError::new("web_interface_port", "must be non-zero"));
    }
    if app.web_interface_addr.trim().is_empty() {
        errors.push(ValidationError::new("web_interface_addr", "must not be empty"));
    }
    if app.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::new("shutdown_timeout_secs", "must be greater than 0"));
    }
    if app.request_timeout_secs == 0 {
        errors.push(ValidationError::new("request_timeout_secs", "must be greater than 0"));
    }
    if app.profile_cpu && app.profile_cpu_file.trim().is_empty() {
        errors.push(ValidationError::new("profile_cpu_file", "required when profile_cpu is set"));
    }

    match expand_home(&app.data_directory) {
        Some(dir) => app.data_directory = dir,
        None => errors.push(ValidationError::new(
            "data_directory",
            "cannot expand ~ without a home directory",
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_whitelist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

fn expand_home(path: &str) -> Option<String> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Some(path.to_string()),
    };
    let home = dirs::home_dir()?;
    Some(format!("{}{}", home.display(), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let mut config = DaemonConfig::default();
        post_process(&mut config).unwrap();
        assert_eq!(config.app.mode(), DaemonMode::Usb);
        assert!(config.app.whitelist().is_empty());
        assert!(!config.app.data_directory.starts_with('~'));
    }

    #[test]
    fn test_whitelist_is_split_and_trimmed() {
        let mut config = DaemonConfig::default();
        config.app.host_whitelist = " wallet.local:9510, ,example.com ".to_string();
        post_process(&mut config).unwrap();
        assert_eq!(config.app.whitelist(), ["wallet.local:9510", "example.com"]);
    }

    #[test]
    fn test_emulator_mode_is_case_insensitive() {
        let mut config = DaemonConfig::default();
        config.app.daemon_mode = "emulator".to_string();
        post_process(&mut config).unwrap();
        assert_eq!(config.app.mode(), DaemonMode::Emulator);
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = DaemonConfig::default();
        config.app.daemon_mode = "BLUETOOTH".to_string();
        config.app.web_interface_port = 0;
        config.app.shutdown_timeout_secs = 0;

        let errors = post_process(&mut config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["daemon_mode", "web_interface_port", "shutdown_timeout_secs"]);
    }

    #[test]
    fn test_plain_paths_untouched() {
        assert_eq!(expand_home("/var/lib/hwd").as_deref(), Some("/var/lib/hwd"));
        assert_eq!(expand_home("~other/dir").as_deref(), Some("~other/dir"));
    }
}
