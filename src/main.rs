use clap::Parser;
use futures::{future, Future};
use log::{error, info};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

use htsd::{
    agent::{ConsolePairing, IoCapability},
    config::{Config, DEFAULT_AGENT_PATH, DEFAULT_LOCAL_NAME, DEFAULT_TIMEOUT},
    peripheral::DefaultTransport,
    thermometer::HealthThermometer,
    Coordinator, Error,
};

const DEFAULT_LOG_FILTER: &str = "htsd=debug";

/// Health thermometer peripheral for BlueZ.
#[derive(Debug, Parser)]
#[command(name = "htsd", version)]
struct Args {
    /// Seconds to run before shutting down.
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Local name to advertise.
    #[arg(short, long, default_value = DEFAULT_LOCAL_NAME)]
    name: String,

    /// Object path of the pairing agent.
    #[arg(long, default_value = DEFAULT_AGENT_PATH)]
    agent_path: String,

    /// Pairing IO capability, as named by BlueZ.
    #[arg(long, default_value = "KeyboardDisplay")]
    io_capability: IoCapability,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            timeout: Duration::from_secs(args.timeout),
            local_name: args.name,
            agent_path: args.agent_path,
            io_capability: args.io_capability,
        }
    }
}

/// Installs the SIGINT handler right away, so an interrupt during setup is
/// caught too, and resolves on the first SIGINT.
fn interrupted() -> Result<impl Future<Output = ()>, Error> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(async move {
        if interrupt.recv().await.is_none() {
            error!("SIGINT stream closed");
            future::pending::<()>().await;
        }
    })
}

fn main() -> Result<(), Error> {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let config = Config::from(Args::parse());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let trigger = runtime.block_on(async {
        let interrupt = interrupted()?;
        let mut coordinator = Coordinator::new(
            DefaultTransport::new(),
            config,
            HealthThermometer,
            ConsolePairing::new(),
        );
        Ok::<_, Error>(coordinator.run(interrupt).await)
    })?;

    // A pending passkey prompt may still be blocked reading stdin.
    runtime.shutdown_background();
    info!("exiting ({:?})", trigger);
    Ok(())
}
