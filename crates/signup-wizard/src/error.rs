use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::wizard::WizardError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Wizard(WizardError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Wizard(err) => write!(f, "wizard error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Wizard(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<WizardError> for AppError {
    fn from(value: WizardError) -> Self {
        Self::Wizard(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardStep;
    use std::error::Error;

    #[test]
    fn wizard_errors_keep_their_source() {
        let err = AppError::from(WizardError::Incomplete(WizardStep::Identity));
        assert!(err.to_string().starts_with("wizard error: "));
        let source = err.source().expect("source kept");
        assert_eq!(
            source.to_string(),
            WizardError::Incomplete(WizardStep::Identity).to_string()
        );
    }

    #[test]
    fn io_errors_convert_for_question_mark() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port busy").into();
        assert!(matches!(err, AppError::Io(_)));
        assert_eq!(err.to_string(), "io error: port busy");
    }
}
