//! The event loop turning dock status changes into handler invocations.
//!
//! Signals are processed strictly one at a time: a handler runs to
//! completion before the next signal is looked at.
use tracing::{debug, error, info, warn};

use crate::{
    command::CommandRunner,
    config::{FailurePolicy, PolicyConfig},
    decoder::{RawSignal, decode},
    error::DockHookError,
    registry::{Action, DeviceRegistry},
};

/// Lifecycle of a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Created, docks not yet subscribed.
    Idle,
    /// Waiting for the next signal.
    AwaitingSignal,
    /// Handling a signal, including any handler it triggers.
    ProcessingSignal,
    /// The loop ended; no further signals are accepted.
    Terminated,
}

/// Why a signal did not lead to a handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The signal did not carry a `Status` change.
    NoStatus,
    /// The status is not one dockhook acts on.
    UntrackedStatus(String),
    /// The dock has no handler configured for the action.
    NoHandler(Action),
    /// No dock is registered under the path (lenient policy only).
    UnknownDevice(String),
}

/// Result of handling a single signal.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler for `action` ran successfully.
    Handled { device: String, action: Action },
    /// Nothing had to be done.
    Ignored(IgnoreReason),
    /// The handler failed and the failure policy is to carry on.
    HandlerFailed(DockHookError),
}

/// Resolves signals against the registry and runs the matching handlers.
pub struct Dispatcher<R> {
    registry: DeviceRegistry,
    runner: R,
    policy: PolicyConfig,
    state: DispatcherState,
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn new(registry: DeviceRegistry, runner: R, policy: PolicyConfig) -> Self {
        Self {
            registry,
            runner,
            policy,
            state: DispatcherState::Idle,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Consumes `signals` until the stream ends or a fatal error occurs.
    ///
    /// Must only be called once every dock is subscribed.
    pub fn run<I>(&mut self, signals: I) -> Result<(), DockHookError>
    where
        I: IntoIterator<Item = Result<RawSignal, DockHookError>>,
    {
        self.state = DispatcherState::AwaitingSignal;
        info!("Waiting for status changes of {} dock(s)", self.registry.len());

        let result = self.consume(signals);
        self.state = DispatcherState::Terminated;

        if result.is_ok() {
            warn!("Signal stream closed");
        }
        result
    }

    fn consume<I>(&mut self, signals: I) -> Result<(), DockHookError>
    where
        I: IntoIterator<Item = Result<RawSignal, DockHookError>>,
    {
        for signal in signals {
            let outcome = self.handle(&signal?)?;
            debug!("Dispatch outcome: {:?}", outcome);
        }
        Ok(())
    }

    /// Handles one signal. Errors returned from here end the loop.
    pub fn handle(&mut self, signal: &RawSignal) -> Result<DispatchOutcome, DockHookError> {
        self.state = DispatcherState::ProcessingSignal;
        let outcome = self.process(signal);
        self.state = match outcome {
            Ok(_) => DispatcherState::AwaitingSignal,
            Err(_) => DispatcherState::Terminated,
        };
        outcome
    }

    fn process(&mut self, signal: &RawSignal) -> Result<DispatchOutcome, DockHookError> {
        let device = match self.registry.resolve(&signal.path) {
            Ok(device) => device,
            Err(err) => {
                return match self.policy.unknown_device {
                    FailurePolicy::Abort => Err(err),
                    FailurePolicy::Skip => {
                        warn!("Ignoring signal for unexpected path {}", signal.path);
                        Ok(DispatchOutcome::Ignored(IgnoreReason::UnknownDevice(
                            signal.path.clone(),
                        )))
                    }
                };
            }
        };

        let Some(event) = decode(signal)? else {
            return Ok(DispatchOutcome::Ignored(IgnoreReason::NoStatus));
        };
        debug!("Status of {} is now '{}'", device.name(), event.status);

        let Some(action) = Action::for_status(&event.status) else {
            return Ok(DispatchOutcome::Ignored(IgnoreReason::UntrackedStatus(
                event.status,
            )));
        };

        let Some(command) = device.handlers().get(action) else {
            debug!("Ignoring {} for {}", action, device.name());
            return Ok(DispatchOutcome::Ignored(IgnoreReason::NoHandler(action)));
        };

        info!("Running {} handler for {}", action, device.name());
        match self.runner.run(command) {
            Ok(()) => Ok(DispatchOutcome::Handled {
                device: device.name().to_string(),
                action,
            }),
            Err(source) => {
                let err = DockHookError::HandlerFailed {
                    device: device.name().to_string(),
                    action: action.to_string(),
                    source,
                };
                match self.policy.handler_failure {
                    FailurePolicy::Abort => Err(err),
                    FailurePolicy::Skip => {
                        error!("{err}");
                        Ok(DispatchOutcome::HandlerFailed(err))
                    }
                }
            }
        }
    }
}
