//! Turns raw property change payloads into device status events.
use std::collections::HashMap;

use zbus::zvariant::{OwnedValue, Value};

use crate::{
    constants::{BOLT_DEVICE_INTERFACE, STATUS_PROPERTY},
    error::DockHookError,
};

/// The body of a `PropertiesChanged` signal, tagged with its source path.
#[derive(Debug)]
pub struct RawSignal {
    /// Object path the signal was emitted on.
    pub path: String,
    /// Interface whose properties changed.
    pub interface: String,
    /// Changed properties with their new values.
    pub changed: HashMap<String, OwnedValue>,
    /// Properties invalidated without a new value.
    pub invalidated: Vec<String>,
}

/// A status change reported for a device path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub path: String,
    pub status: String,
}

/// Extracts the new `Status` of a bolt device from `signal`.
///
/// Returns `Ok(None)` when the signal only reports other properties.
pub fn decode(signal: &RawSignal) -> Result<Option<StatusEvent>, DockHookError> {
    if signal.interface != BOLT_DEVICE_INTERFACE {
        return Err(DockHookError::UnexpectedInterface {
            interface: signal.interface.clone(),
        });
    }

    let Some(value) = signal.changed.get(STATUS_PROPERTY) else {
        return Ok(None);
    };

    match &**value {
        Value::Str(status) => Ok(Some(StatusEvent {
            path: signal.path.clone(),
            status: status.to_string(),
        })),
        other => Err(DockHookError::MalformedPayload {
            path: signal.path.clone(),
            reason: format!(
                "{STATUS_PROPERTY} has signature '{}', expected a string",
                other.value_signature()
            ),
        }),
    }
}
