//! Bus names and default locations used throughout dockhook.

/// Well-known bus name owned by the Thunderbolt management daemon.
pub const BOLT_SENDER_NAME: &str = "org.freedesktop.bolt";

/// Interface reported in the payload of device property changes.
pub const BOLT_DEVICE_INTERFACE: &str = "org.freedesktop.bolt1.Device";

/// Prefix of every device object path; the device UUID is appended.
pub const BOLT_DEVICE_PATH: &str = "/org/freedesktop/bolt/devices/";

/// Standard interface carrying the `PropertiesChanged` signal.
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Member name of the property change signal.
pub const PROPERTIES_CHANGED: &str = "PropertiesChanged";

/// Name of the property holding the device status.
pub const STATUS_PROPERTY: &str = "Status";

/// File name looked up in the configuration directories.
pub const CONFIG_FILE_NAME: &str = "dockhook.yaml";

/// System-wide configuration directory.
pub const SYSTEM_CONFIG_DIR: &str = "/etc/dockhook";
