//! The set of watched docks, keyed by their bus object path.
use std::collections::{BTreeMap, HashMap};

use strum_macros::{AsRefStr, Display};

use crate::{
    command::HandlerCommand, config::DockConfig, constants::BOLT_DEVICE_PATH,
    error::DockHookError,
};

/// Status transitions dockhook can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    /// The dock reached the `authorized` status.
    Authorize,
    /// The dock reached the `disconnected` status.
    Disconnect,
}

impl Action {
    /// Maps a bolt device status to the action it triggers, if any.
    ///
    /// Intermediate states such as `connecting`, `connected` or `auth-error`
    /// are intentionally not acted upon.
    pub fn for_status(status: &str) -> Option<Self> {
        match status {
            "authorized" => Some(Action::Authorize),
            "disconnected" => Some(Action::Disconnect),
            _ => None,
        }
    }
}

/// Handlers of a single dock, one optional command per action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerSet {
    authorize: Option<HandlerCommand>,
    disconnect: Option<HandlerCommand>,
}

impl HandlerSet {
    pub fn new(authorize: Option<HandlerCommand>, disconnect: Option<HandlerCommand>) -> Self {
        Self {
            authorize,
            disconnect,
        }
    }

    /// The command configured for `action`.
    pub fn get(&self, action: Action) -> Option<&HandlerCommand> {
        match action {
            Action::Authorize => self.authorize.as_ref(),
            Action::Disconnect => self.disconnect.as_ref(),
        }
    }
}

/// Builds the bolt object path of a device from its UUID.
pub fn object_path(uuid: &str) -> String {
    format!("{BOLT_DEVICE_PATH}{uuid}")
}

/// A configured dock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    name: String,
    object_path: String,
    handlers: HandlerSet,
}

impl DeviceRecord {
    /// Creates a record; the UUID must not be empty.
    pub fn new(
        name: impl Into<String>,
        uuid: &str,
        handlers: HandlerSet,
    ) -> Result<Self, DockHookError> {
        let name = name.into();
        if uuid.is_empty() {
            return Err(DockHookError::MissingIdentifier { device: name });
        }

        Ok(Self {
            name,
            object_path: object_path(uuid),
            handlers,
        })
    }

    /// Builds a record from its configuration entry.
    pub fn from_config(name: &str, config: &DockConfig) -> Result<Self, DockHookError> {
        Self::new(
            name,
            &config.uuid,
            HandlerSet::new(config.authorize.clone(), config.disconnect.clone()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }
}

/// Lookup table from object path to dock. Populated once at startup.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, DeviceRecord>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from the configured docks, in name order.
    pub fn from_config(docks: &BTreeMap<String, DockConfig>) -> Result<Self, DockHookError> {
        let mut registry = Self::new();
        for (name, dock) in docks {
            registry.register(DeviceRecord::from_config(name, dock)?)?;
        }
        Ok(registry)
    }

    /// Adds a dock; its object path must not be taken yet.
    pub fn register(&mut self, record: DeviceRecord) -> Result<(), DockHookError> {
        if let Some(existing) = self.devices.get(record.object_path()) {
            return Err(DockHookError::DuplicateDevice {
                device: record.name,
                existing: existing.name.clone(),
                path: record.object_path,
            });
        }

        self.devices.insert(record.object_path.clone(), record);
        Ok(())
    }

    /// Finds the dock registered under `path`.
    pub fn resolve(&self, path: &str) -> Result<&DeviceRecord, DockHookError> {
        self.devices
            .get(path)
            .ok_or_else(|| DockHookError::UnknownDevice {
                path: path.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.values()
    }
}
