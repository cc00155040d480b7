use std::process;

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use dockhook::{
    bus::{MatchMode, Subscriber},
    cli::{Cli, parse_args},
    command::ProcessRunner,
    config::{Config, default_config_path, load_config},
    dispatcher::Dispatcher,
    error::DockHookError,
    registry::DeviceRegistry,
};

fn main() {
    let args = parse_args();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    let config = match load_config(Some(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            init_logging(&args, false);
            exit_with(err);
        }
    };

    let debug = init_logging(&args, config.debug);
    debug!("Loaded config from {}", config_path.display());

    if let Err(err) = run(&args, config, debug) {
        exit_with(err);
    }
}

/// Installs the global subscriber and returns whether debug output is on.
fn init_logging(args: &Cli, config_debug: bool) -> bool {
    let debug = match args.log_level {
        Some(level) => level.is_debug(),
        None => args.debug || config_debug,
    };

    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.to_string())
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    debug
}

fn run(args: &Cli, config: Config, debug: bool) -> Result<(), DockHookError> {
    let registry = DeviceRegistry::from_config(&config.docks)?;
    if registry.is_empty() {
        warn!("No docks configured; nothing will be handled");
    }

    let mode = MatchMode::from_test_mode(args.test_mode);
    if mode == MatchMode::AnySender {
        warn!("Test mode enabled: accepting property changes from any sender");
    }

    let subscriber = Subscriber::connect(config.bus, mode, registry.len())?;
    for device in registry.iter() {
        subscriber.subscribe(device)?;
    }
    info!("Listening on the {} bus", config.bus);

    let mut dispatcher = Dispatcher::new(registry, ProcessRunner::new(debug), config.policy);
    dispatcher.run(subscriber.into_signals())
}

fn exit_with(err: DockHookError) -> ! {
    error!("{err}");
    process::exit(1);
}
