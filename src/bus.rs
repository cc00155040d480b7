//! Connection to the message bus and subscription to dock property changes.
use std::collections::HashMap;

use tracing::debug;
use zbus::{
    MatchRule, Message,
    blocking::{Connection, MessageIterator, connection, fdo::DBusProxy},
    message::Type as MessageType,
    zvariant::OwnedValue,
};

use crate::{
    config::BusKind,
    constants::{BOLT_SENDER_NAME, PROPERTIES_CHANGED, PROPERTIES_INTERFACE},
    decoder::RawSignal,
    error::DockHookError,
    registry::DeviceRecord,
};

/// Which senders a match rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Only signals emitted by boltd.
    #[default]
    Strict,
    /// Signals from any sender, so they can be injected with e.g. `dbus-send`.
    AnySender,
}

impl MatchMode {
    pub fn from_test_mode(test_mode: bool) -> Self {
        if test_mode {
            MatchMode::AnySender
        } else {
            MatchMode::Strict
        }
    }
}

/// Builds the rule selecting property changes of the object at `path`.
pub fn match_rule(path: &str, mode: MatchMode) -> zbus::Result<MatchRule<'_>> {
    let mut builder = MatchRule::builder()
        .msg_type(MessageType::Signal)
        .path(path)?
        .interface(PROPERTIES_INTERFACE)?
        .member(PROPERTIES_CHANGED)?;

    if mode == MatchMode::Strict {
        builder = builder.sender(BOLT_SENDER_NAME)?;
    }

    Ok(builder.build())
}

/// Capacity zbus gives the inbound queue unless told otherwise.
const DEFAULT_QUEUED: usize = 64;

/// Inbound queue capacity needed to subscribe `docks` devices.
///
/// Nothing reads the queue until dispatching starts, so it has to hold one
/// `AddMatch` reply per dock plus any early signals. Once full, zbus stops
/// reading from the socket and the next subscription never completes.
pub fn queue_capacity(docks: usize) -> usize {
    docks.saturating_add(DEFAULT_QUEUED)
}

/// Bus connection that dock subscriptions are installed on.
///
/// The inbound message queue is opened together with the connection, so
/// nothing sent after a subscription is installed can be missed.
pub struct Subscriber {
    connection: Connection,
    messages: MessageIterator,
    mode: MatchMode,
}

impl Subscriber {
    /// Connects to `bus`, sizing the inbound queue for `docks` subscriptions.
    pub fn connect(bus: BusKind, mode: MatchMode, docks: usize) -> Result<Self, DockHookError> {
        debug!("Connecting to the {} bus", bus);

        let builder = match bus {
            BusKind::System => connection::Builder::system(),
            BusKind::Session => connection::Builder::session(),
        };
        let connection = builder
            .and_then(|builder| builder.max_queued(queue_capacity(docks)).build())
            .map_err(|source| DockHookError::Connection {
                bus: bus.to_string(),
                source,
            })?;

        Ok(Self::with_connection(connection, mode))
    }

    /// Wraps an established connection. Its `max_queued` bounds the inbound
    /// queue, see [`queue_capacity`].
    pub fn with_connection(connection: Connection, mode: MatchMode) -> Self {
        let messages = MessageIterator::from(connection.clone());
        Self {
            connection,
            messages,
            mode,
        }
    }

    /// Asks the bus to route property changes of `device` to us.
    pub fn subscribe(&self, device: &DeviceRecord) -> Result<(), DockHookError> {
        debug!("Watching for signals of {}", device.object_path());

        self.add_match(device.object_path())
            .map_err(|source| DockHookError::SubscriptionFailed {
                device: device.name().to_string(),
                path: device.object_path().to_string(),
                source,
            })
    }

    fn add_match(&self, path: &str) -> zbus::Result<()> {
        let rule = match_rule(path, self.mode)?;
        DBusProxy::new(&self.connection)?.add_match_rule(rule)?;
        Ok(())
    }

    /// Consumes the subscriber, yielding the received property changes.
    pub fn into_signals(self) -> SignalStream {
        SignalStream {
            messages: self.messages,
            _connection: self.connection,
        }
    }
}

/// Blocking iterator over `PropertiesChanged` signals; ends when the bus
/// connection closes. Dropping it releases the connection.
pub struct SignalStream {
    messages: MessageIterator,
    _connection: Connection,
}

impl Iterator for SignalStream {
    type Item = Result<RawSignal, DockHookError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let message = match self.messages.next()? {
                Ok(message) => message,
                Err(err) => return Some(Err(DockHookError::Receive(err))),
            };

            if !is_properties_changed(&message) {
                continue;
            }

            debug!("Received: {:?}", message);
            return Some(raw_signal(&message));
        }
    }
}

/// Whether `message` is a `PropertiesChanged` signal.
pub fn is_properties_changed(message: &Message) -> bool {
    let header = message.header();
    header.message_type() == MessageType::Signal
        && header.interface().map(|name| name.as_str()) == Some(PROPERTIES_INTERFACE)
        && header.member().map(|name| name.as_str()) == Some(PROPERTIES_CHANGED)
}

/// Unpacks the `(sa{sv}as)` body of a `PropertiesChanged` signal.
pub fn raw_signal(message: &Message) -> Result<RawSignal, DockHookError> {
    let path = message
        .header()
        .path()
        .map(|path| path.to_string())
        .unwrap_or_default();

    let (interface, changed, invalidated): (String, HashMap<String, OwnedValue>, Vec<String>) =
        message
            .body()
            .deserialize()
            .map_err(|err| DockHookError::MalformedPayload {
                path: path.clone(),
                reason: err.to_string(),
            })?;

    Ok(RawSignal {
        path,
        interface,
        changed,
        invalidated,
    })
}
