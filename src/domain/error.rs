//! Domain error type.

/// Top-level error type for stocksim.
#[derive(Debug, thiserror::Error)]
pub enum StocksimError {
    #[error("market data provider unavailable for {ticker}: {reason}")]
    ProviderUnavailable { ticker: String, reason: String },

    #[error("no data for {ticker} in the requested window")]
    NoData { ticker: String },

    #[error("invalid configuration {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StocksimError {
    pub fn provider(ticker: &str, reason: impl Into<String>) -> Self {
        StocksimError::ProviderUnavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        StocksimError::InvalidConfiguration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl StocksimError {
    /// Process exit status for this kind of failure.
    pub fn exit_status(&self) -> u8 {
        match self {
            StocksimError::Io(_) | StocksimError::Report { .. } => 1,
            StocksimError::InvalidConfiguration { .. }
            | StocksimError::ConfigParse { .. }
            | StocksimError::ConfigMissing { .. } => 2,
            StocksimError::ProviderUnavailable { .. } => 3,
            StocksimError::NoData { .. } => 5,
        }
    }
}

impl From<&StocksimError> for std::process::ExitCode {
    fn from(err: &StocksimError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_message_names_ticker() {
        let err = StocksimError::provider("AAPL", "connection refused");
        assert_eq!(
            err.to_string(),
            "market data provider unavailable for AAPL: connection refused"
        );
    }

    #[test]
    fn invalid_configuration_message() {
        let err = StocksimError::invalid("starting_cash", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration starting_cash: must be positive"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StocksimError = io.into();
        assert!(matches!(err, StocksimError::Io(_)));
    }

    #[test]
    fn exit_status_distinguishes_kinds() {
        assert_eq!(StocksimError::provider("X", "down").exit_status(), 3);
        assert_eq!(StocksimError::invalid("k", "bad").exit_status(), 2);
        let no_data = StocksimError::NoData {
            ticker: "X".into(),
        };
        assert_eq!(no_data.exit_status(), 5);
        let report = StocksimError::Report {
            reason: "disk full".into(),
        };
        assert_eq!(report.exit_status(), 1);
    }
}
