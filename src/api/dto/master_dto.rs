//! Query-string parameters of the master server endpoint.
//!
//! The legacy protocol selects the operation by the mere presence of a key,
//! e.g. `?heartbeat&port=27910`. [`MasterParams`] captures the raw strings
//! and [`MasterRequest`] is the validated form handed to the service.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::Operation;
use crate::error::MasterError;

/// Raw query parameters. Selector values are ignored; only presence counts.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MasterParams {
    /// Refresh the calling server's entry.
    pub heartbeat: Option<String>,
    /// Register or refresh the calling server.
    pub ping: Option<String>,
    /// Withdraw the calling server.
    pub shutdown: Option<String>,
    /// Fetch the live server list.
    pub query: Option<String>,
    /// Game port of the calling server. Defaults to the configured port.
    pub port: Option<String>,
}

/// Validated request: one operation and the caller's game port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterRequest {
    /// Selected operation.
    pub operation: Operation,
    /// Game port forming the identity key with the caller's address.
    pub port: u16,
}

impl MasterParams {
    /// First selector present, in [`Operation::ALL`] order.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        Operation::ALL.into_iter().find(|op| self.selector(*op).is_some())
    }

    const fn selector(&self, op: Operation) -> Option<&String> {
        match op {
            Operation::Heartbeat => self.heartbeat.as_ref(),
            Operation::Ping => self.ping.as_ref(),
            Operation::Shutdown => self.shutdown.as_ref(),
            Operation::Query => self.query.as_ref(),
        }
    }
}

impl MasterRequest {
    /// Validates raw parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::UnknownOperation`] when no selector is present,
    /// and [`MasterError::MalformedIdentity`] when `port` is present but is
    /// not an integer in `1..=65535`.
    pub fn from_params(params: &MasterParams, default_port: u16) -> Result<Self, MasterError> {
        let operation = params.operation().ok_or(MasterError::UnknownOperation)?;
        let port = match params.port.as_deref() {
            None => default_port,
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| MasterError::MalformedIdentity(raw.to_string()))?,
        };
        Ok(Self { operation, port })
    }
}
