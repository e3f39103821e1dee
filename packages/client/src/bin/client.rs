//! FHUB chat client.
//!
//! Connects to an FHUB server, prints every relayed chat line and sends what
//! you type. `/help` lists the commands, `/exit` (or Ctrl+C, Ctrl+D) leaves.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin fhub-client -- --username alice
//! cargo run --bin fhub-client -- -H 192.168.1.20 -p 7000 -u bob
//! ```

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use clap::Parser;
use fhub_client::{
    config::ClientConfig,
    error::ClientError,
    formatter::MessageFormatter,
    runner::{connect, run_client},
    session::SessionEnd,
};
use fhub_shared::{
    config::{DEFAULT_CONNECT_HOST, DEFAULT_PORT, DEFAULT_USERNAME, parse_username, resolve_port},
    console::{Console, ConsoleLine, TerminalConsole, spawn_line_reader},
    logger::setup_logger,
};

#[derive(Parser, Debug)]
#[command(name = "fhub-client")]
#[command(about = "FHUB chat client", long_about = None)]
struct Args {
    /// Server address
    #[arg(short = 'H', long, default_value_t = DEFAULT_CONNECT_HOST)]
    host: IpAddr,

    /// Server port (ports up to 1024 fall back to the default)
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Name shown next to your messages (must not contain '>')
    #[arg(short = 'u', long, default_value = DEFAULT_USERNAME, value_parser = parse_username)]
    username: String,
}

fn main() {
    let args = Args::parse();
    // Chat shares the terminal with stderr, so only warnings by default
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    match run(args) {
        Ok(end) => tracing::info!("Client finished: {:?}", end),
        Err(e) => {
            tracing::error!("Client error: {}", e);
            TerminalConsole::stdout().emit(ConsoleLine::error(e.to_string()));
            std::process::exit(e.exit_code());
        }
    }
}

fn run(args: Args) -> Result<SessionEnd, ClientError> {
    let startup = TerminalConsole::stdout();

    let port = resolve_port(args.port);
    if let Some(warning) = port.warning() {
        startup.emit(ConsoleLine::warning(warning));
    }
    let config = ClientConfig::new(SocketAddr::new(args.host, port.port()), &args.username)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ClientError::Runtime)?;

    startup.emit(ConsoleLine::plain(MessageFormatter::connecting(
        config.addr,
        &config.username,
    )));
    let stream = runtime.block_on(connect(config.addr))?;

    let (lines, console) = spawn_line_reader(format!("{}> ", config.username));
    let console: Arc<dyn Console> = Arc::new(console);
    runtime.block_on(run_client(stream, &config.username, lines, console))
}
