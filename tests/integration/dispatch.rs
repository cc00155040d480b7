#[path = "common/mod.rs"]
mod common;

use std::collections::HashMap;

use common::{read_lines, write_config, write_script};
use dockhook::{
    bus::raw_signal,
    command::ProcessRunner,
    config::{FailurePolicy, load_config},
    constants::{BOLT_DEVICE_INTERFACE, PROPERTIES_CHANGED, PROPERTIES_INTERFACE},
    decoder::RawSignal,
    dispatcher::{DispatchOutcome, Dispatcher, DispatcherState},
    error::DockHookError,
    registry::{Action, DeviceRegistry},
};
use tempfile::tempdir;
use zbus::{Message, zvariant::Value};

const PATH: &str = "/org/freedesktop/bolt/devices/abc123";

fn properties_changed(path: &str, interface: &str, status: Option<&str>) -> RawSignal {
    let mut changed: HashMap<&str, Value<'_>> = HashMap::new();
    if let Some(status) = status {
        changed.insert("Status", Value::from(status));
    }
    changed.insert("Label", Value::from("Dock"));

    let message = Message::signal(path, PROPERTIES_INTERFACE, PROPERTIES_CHANGED)
        .expect("valid signal header")
        .build(&(interface, changed, Vec::<String>::new()))
        .expect("valid signal body");
    raw_signal(&message).expect("well-formed payload")
}

#[test]
fn authorized_signal_runs_configured_handler_once() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let log = dir.join("handler.log");
    let script = write_script(dir, "notify.sh", &format!("echo \"$@\" >> {}", log.display()));

    let config_path = write_config(
        dir,
        &format!(
            r#"
docks:
  dock1:
    uuid: abc123
    authorize:
      cmd: /bin/sh
      args: ["{}", "ready"]
"#,
            script.display()
        ),
    );

    let config = load_config(Some(&config_path)).expect("load config");
    let registry = DeviceRegistry::from_config(&config.docks).expect("build registry");
    let mut dispatcher = Dispatcher::new(registry, ProcessRunner::new(false), config.policy);

    let signals = vec![Ok(properties_changed(
        PATH,
        BOLT_DEVICE_INTERFACE,
        Some("authorized"),
    ))];
    dispatcher.run(signals).expect("dispatch");

    assert_eq!(read_lines(&log), vec!["ready".to_string()]);
    assert_eq!(dispatcher.state(), DispatcherState::Terminated);
}

#[test]
fn only_authorize_and_disconnect_trigger_handlers() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let log = dir.join("handler.log");
    let up = write_script(dir, "up.sh", &format!("echo up >> {}", log.display()));
    let down = write_script(dir, "down.sh", &format!("echo down >> {}", log.display()));

    let config_path = write_config(
        dir,
        &format!(
            r#"
docks:
  dock1:
    uuid: abc123
    authorize:
      cmd: /bin/sh
      args: ["{}"]
    disconnect:
      cmd: /bin/sh
      args: ["{}"]
"#,
            up.display(),
            down.display()
        ),
    );

    let config = load_config(Some(&config_path)).expect("load config");
    let registry = DeviceRegistry::from_config(&config.docks).expect("build registry");
    let mut dispatcher = Dispatcher::new(registry, ProcessRunner::new(false), config.policy);

    let signals = ["connecting", "connected", "authorizing", "authorized", "disconnected"]
        .into_iter()
        .map(|status| Ok(properties_changed(PATH, BOLT_DEVICE_INTERFACE, Some(status))))
        .chain(std::iter::once(Ok(properties_changed(
            PATH,
            BOLT_DEVICE_INTERFACE,
            None,
        ))));
    dispatcher.run(signals).expect("dispatch");

    assert_eq!(read_lines(&log), vec!["up".to_string(), "down".to_string()]);
}

#[test]
fn failing_handler_stops_the_loop_by_default() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let log = dir.join("handler.log");
    let fail = write_script(dir, "fail.sh", "exit 4");
    let down = write_script(dir, "down.sh", &format!("echo down >> {}", log.display()));

    let config_path = write_config(
        dir,
        &format!(
            r#"
docks:
  dock1:
    uuid: abc123
    authorize:
      cmd: /bin/sh
      args: ["{}"]
    disconnect:
      cmd: /bin/sh
      args: ["{}"]
"#,
            fail.display(),
            down.display()
        ),
    );

    let config = load_config(Some(&config_path)).expect("load config");
    let registry = DeviceRegistry::from_config(&config.docks).expect("build registry");
    let mut dispatcher = Dispatcher::new(registry, ProcessRunner::new(false), config.policy);

    let signals = vec![
        Ok(properties_changed(PATH, BOLT_DEVICE_INTERFACE, Some("authorized"))),
        Ok(properties_changed(PATH, BOLT_DEVICE_INTERFACE, Some("disconnected"))),
    ];
    let err = dispatcher.run(signals).expect_err("handler failure is fatal");

    assert_eq!(
        err.to_string(),
        "authorize for dock1: '/bin/sh' exited with status 4"
    );
    assert!(read_lines(&log).is_empty());
}

#[test]
fn skip_policies_keep_the_loop_running() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let log = dir.join("handler.log");
    let down = write_script(dir, "down.sh", &format!("echo down >> {}", log.display()));

    let config_path = write_config(
        dir,
        &format!(
            r#"
policy:
  unknown_device: skip
  handler_failure: skip
docks:
  dock1:
    uuid: abc123
    authorize:
      cmd: {}
    disconnect:
      cmd: /bin/sh
      args: ["{}"]
"#,
            dir.join("missing.sh").display(),
            down.display()
        ),
    );

    let config = load_config(Some(&config_path)).expect("load config");
    assert_eq!(config.policy.handler_failure, FailurePolicy::Skip);
    let registry = DeviceRegistry::from_config(&config.docks).expect("build registry");
    let mut dispatcher = Dispatcher::new(registry, ProcessRunner::new(false), config.policy);

    let outcome = dispatcher
        .handle(&properties_changed(
            "/org/freedesktop/bolt/devices/other",
            BOLT_DEVICE_INTERFACE,
            Some("authorized"),
        ))
        .expect("unknown device is skipped");
    assert!(matches!(outcome, DispatchOutcome::Ignored(_)));

    let outcome = dispatcher
        .handle(&properties_changed(PATH, BOLT_DEVICE_INTERFACE, Some("authorized")))
        .expect("handler failure is reported");
    assert!(matches!(
        outcome,
        DispatchOutcome::HandlerFailed(DockHookError::HandlerFailed { .. })
    ));

    let outcome = dispatcher
        .handle(&properties_changed(PATH, BOLT_DEVICE_INTERFACE, Some("disconnected")))
        .expect("disconnect handler runs");
    assert!(matches!(
        outcome,
        DispatchOutcome::Handled {
            action: Action::Disconnect,
            ..
        }
    ));
    assert_eq!(read_lines(&log), vec!["down".to_string()]);
}

#[test]
fn foreign_interface_terminates_the_loop() {
    let temp = tempdir().expect("failed to create tempdir");
    let config_path = write_config(temp.path(), "docks:\n  dock1:\n    uuid: abc123\n");

    let config = load_config(Some(&config_path)).expect("load config");
    let registry = DeviceRegistry::from_config(&config.docks).expect("build registry");
    let mut dispatcher = Dispatcher::new(registry, ProcessRunner::new(false), config.policy);

    let signals = vec![Ok(properties_changed(
        PATH,
        "org.freedesktop.bolt1.Manager",
        Some("authorized"),
    ))];
    match dispatcher.run(signals) {
        Err(DockHookError::UnexpectedInterface { interface }) => {
            assert_eq!(interface, "org.freedesktop.bolt1.Manager")
        }
        other => panic!("expected unexpected interface, got {other:?}"),
    }
}
