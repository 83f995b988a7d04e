use std::path::{Path, PathBuf};
use tokio::{
    net::UnixListener,
    sync::broadcast,
    sync::mpsc::unbounded_channel,
    time::Duration,
};

mod ratesampler;
mod debounce;
mod probe;
mod monitor;
mod commands;
pub use commands::MonitorCommand;
mod unixsocket;
mod tracker;
mod webapp;

pub use tracing::{debug, error, info, trace, warn};

type Anything<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
type Id = String;

#[derive(clap::Parser, Debug)]
struct Config {
    #[clap(short = 'p', long = "port", default_value = "3000")]
    port: u16,
    #[clap(short = 's', long = "socket")]
    socket: Option<PathBuf>,
    #[clap(short = 'v', action = clap::ArgAction::Count)]
    verbosity: u8,
    /// seconds between polls
    #[clap(long = "poll-interval", default_value = "10")]
    poll_interval: u64,
    /// minimum seconds between rate recomputations
    #[clap(long = "min-rate-interval", default_value = "30")]
    min_rate_interval: u64,
    /// seconds a fetched counter pair may be reused
    #[clap(long = "cache-ttl", default_value = "5")]
    cache_ttl: u64,
    /// consecutive off polls a switch must exceed before restore
    #[clap(long = "confirm-checks", default_value = "5")]
    confirm_checks: u32,
    /// seconds before a probe is abandoned
    #[clap(long = "probe-timeout", default_value = "15")]
    probe_timeout: u64,
    #[clap(
        long = "rx-command",
        default_value = "cat /sys/class/net/ppp0/statistics/rx_bytes"
    )]
    rx_command: String,
    #[clap(
        long = "tx-command",
        default_value = "cat /sys/class/net/ppp0/statistics/tx_bytes"
    )]
    tx_command: String,
    /// command printing one "<id> on|off" line per monitored switch
    #[clap(long = "switch-command")]
    switch_command: Option<String>,
    /// command run to re-activate a switch, {id} replaced with its id
    #[clap(long = "restore-command")]
    restore_command: Option<String>,
}

async fn setup(config: &Config) {
    let loglevel = match config.verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(loglevel)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to start tracing");
}

fn get_socket_path(config: &Config) -> Result<PathBuf, String> {
    if let Some(p) = config.socket.clone() {
        return Ok(p);
    }
    if let Ok(d) = std::env::var("XDG_RUNTIME_DIR") {
        let mut socket_path = PathBuf::new();
        socket_path.push(d);
        socket_path.push("routermon");
        debug!("Using default socket path");
        Ok(socket_path)
    } else {
        error!("Socket path must be specified");
        Err("No socket path".into())
    }
}

async fn start_unix_socket(socket_path: impl AsRef<Path>) -> std::io::Result<UnixListener> {
    // attempt to remove the socket, if it exists already
    if let Ok(true) = tokio::fs::try_exists(&socket_path).await {
        tokio::fs::remove_file(&socket_path).await?;
    }
    UnixListener::bind(socket_path)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[tokio::main]
async fn main() -> Anything<()> {
    let c: Config = clap::Parser::parse();
    setup(&c).await;
    // figure out the path for the unix socket
    let socket_path = get_socket_path(&c)?;
    info!("Socket path is: {:?}", socket_path);
    let socket = start_unix_socket(socket_path).await?;
    // set up app channels
    let (cmd_tx, cmd_rx) = unbounded_channel::<MonitorCommand>();
    let (update_tx, _) = broadcast::channel(1024);
    // start web server
    let web_ui = webapp::server(update_tx.subscribe(), c.port);
    // start unix socket
    let unix_socket = unixsocket::server(socket, cmd_tx.clone());
    // start the monitor loops
    let throughput = monitor::throughput_loop(
        monitor::ThroughputConfig {
            rx_command: c.rx_command.clone(),
            tx_command: c.tx_command.clone(),
            poll_interval: secs(c.poll_interval),
            min_rate_interval: secs(c.min_rate_interval),
            cache_ttl: secs(c.cache_ttl),
            probe_timeout: secs(c.probe_timeout),
        },
        update_tx.clone(),
    );
    if let Some(switch_command) = c.switch_command.clone() {
        tokio::spawn(monitor::switch_loop(
            monitor::SwitchConfig {
                switch_command,
                restore_command: c.restore_command.clone(),
                poll_interval: secs(c.poll_interval),
                confirm_checks: c.confirm_checks,
                probe_timeout: secs(c.probe_timeout),
            },
            cmd_rx,
            update_tx.clone(),
        ));
    } else {
        info!("No switch command configured, switch monitor disabled");
        drop(cmd_rx);
    }
    tokio::join!(web_ui, throughput, unix_socket);
    unreachable!()
}

pub fn humanize_bytes(x: u64) -> String {
    let mut result = x as f64;
    for i in ["B", "KB", "MB", "GB", "TB", "PB", "EB"] {
        if result < 1000.0 {
            return format!("{result:.1} {i}");
        }
        result /= 1000.0;
    }
    format!("{result:.1} ZB")
}
