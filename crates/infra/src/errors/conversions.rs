//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use courier_domain::{CourierError, ServiceError};
use reqwest::Error as HttpError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CourierError);

impl From<InfraError> for CourierError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CourierError> for InfraError {
    fn from(value: CourierError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCourierError {
    fn into_courier(self) -> CourierError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for HttpError {
    fn into_courier(self) -> CourierError {
        if self.is_timeout() {
            return CourierError::Transport("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return CourierError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return CourierError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return CourierError::Decode(format!("unreadable HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("UnknownStatus");
            return CourierError::Service(ServiceError::new(
                reason.replace(' ', ""),
                format!("HTTP {code} {reason}"),
                code,
            ));
        }

        CourierError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for TomlError {
    fn into_courier(self) -> CourierError {
        CourierError::Config(format!("Invalid TOML format: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for IoError {
    fn into_courier(self) -> CourierError {
        CourierError::Config(format!("Failed to read config file: {self}"))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
