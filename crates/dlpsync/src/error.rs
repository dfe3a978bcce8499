//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text. Only startup failures reach here; destination
//! and item failures live in the report.

use miette::Diagnostic;
use thiserror::Error;

use dlpsync_config::ConfigError;
use dlpsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(dlpsync::no_config),
        help(
            "Create ./config.yaml or pass --config PATH.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dlpsync::validation))]
    Validation { field: String, reason: String },

    #[error("No API key configured for tenant '{tenant}'")]
    #[diagnostic(
        code(dlpsync::no_credentials),
        help(
            "Set api_key_env to a variable holding the key, store it in the\n\
             system keyring under service 'dlpsync' as '{tenant}/api-key',\n\
             or set api_key in the configuration file."
        )
    )]
    NoCredentials { tenant: String },

    #[error(transparent)]
    #[diagnostic(code(dlpsync::config))]
    Config(Box<figment::Error>),

    // ── Source tenant ────────────────────────────────────────────────
    #[error("Authentication failed for tenant '{tenant}'")]
    #[diagnostic(
        code(dlpsync::auth_failed),
        help(
            "{message}\n\
             Verify the service account, API key and tsg_id for '{tenant}'."
        )
    )]
    AuthFailed { tenant: String, message: String },

    #[error("Could not read the source tenant: {message}")]
    #[diagnostic(
        code(dlpsync::source_fetch),
        help("Nothing was written. Re-run with -vv for request details.")
    )]
    SourceFetch { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(dlpsync::connection_failed),
        help(
            "{reason}\n\
             Check network access, or set api.ca_cert for a TLS-inspecting proxy."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(dlpsync::timeout),
        help("Increase api.timeout (or DLPSYNC_API__TIMEOUT) and try again.")
    )]
    Timeout,

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Applying changes to '{tenant}' requires confirmation")]
    #[diagnostic(
        code(dlpsync::confirmation_required),
        help(
            "stdin is not a terminal. Use --yes (-y) to confirm every destination,\n\
             --execute --all, or --execute --tenant NAME."
        )
    )]
    NonInteractiveRequiresYes { tenant: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render {format} output: {message}")]
    #[diagnostic(code(dlpsync::render), help("Try a different --output format."))]
    Render { format: &'static str, message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { tenant } => Self::NoCredentials { tenant },
            ConfigError::Figment(err) => Self::Config(err),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { tenant, message } => {
                Self::AuthFailed { tenant, message }
            }
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            other => Self::SourceFetch {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use dlpsync_core::EntityKind;

    use super::*;

    #[test]
    fn missing_file_maps_to_no_config() {
        let err: CliError = ConfigError::NotFound {
            path: PathBuf::from("/nope/config.yaml"),
        }
        .into();
        assert!(matches!(&err, CliError::NoConfig { path } if path == "/nope/config.yaml"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn source_auth_failure_exits_with_auth_code() {
        let err: CliError = CoreError::AuthenticationFailed {
            tenant: "Source".into(),
            message: "HTTP 401".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn listing_failure_is_a_source_fetch() {
        let err: CliError = CoreError::Fetch {
            kind: EntityKind::Pattern,
            message: "HTTP 500".into(),
        }
        .into();
        match err {
            CliError::SourceFetch { message } => assert!(message.contains("HTTP 500")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn timeout_keeps_its_exit_code() {
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
    }
}
