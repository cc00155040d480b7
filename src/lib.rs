//! Dockhook listens on D-Bus for status changes of Thunderbolt docks reported by
//! boltd and runs user-configured programs when a dock becomes authorized or is
//! disconnected.

/// Message bus connection and signal subscription.
pub mod bus;

/// CLI interface.
pub mod cli;

/// Execution of external handlers.
pub mod command;

/// Configuration management.
pub mod config;

/// Bus names and default locations.
pub mod constants;

/// Decoding of property change payloads.
pub mod decoder;

/// Signal dispatch loop.
pub mod dispatcher;

/// Error handling.
pub mod error;

/// Registry of watched docks.
pub mod registry;
