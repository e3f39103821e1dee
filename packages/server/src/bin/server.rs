//! FHUB chat server.
//!
//! Relays chat packets between TCP clients and reads admin commands from
//! the terminal.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin fhub-server
//! cargo run --bin fhub-server -- --port 7000 --root ./files --monitor
//! ```

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use clap::Parser;
use fhub_server::{
    config::{DEFAULT_ROOT, ServerConfig},
    error::ServerError,
    infrastructure::LocalFileBrowser,
    ui::{AdminConsole, AppState, Server, signal},
};
use fhub_shared::{
    chat_log::{DEFAULT_MAX_ENTRIES, OverflowPolicy},
    config::{DEFAULT_LISTEN_HOST, DEFAULT_PORT, resolve_port},
    console::{Console, ConsoleLine, TerminalConsole, spawn_line_reader},
    logger::setup_logger,
    time::SystemClock,
};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "fhub-server")]
#[command(about = "FHUB chat server with an admin console", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short = 'H', long, default_value_t = DEFAULT_LISTEN_HOST)]
    host: IpAddr,

    /// Port to listen on (ports up to 1024 fall back to the default)
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory the admin file commands are confined to
    #[arg(short = 'r', long, default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Maximum number of chat lines kept in the log
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    max_log_entries: usize,

    /// Drop the oldest chat line when the log is full instead of refusing new ones
    #[arg(long)]
    evict_oldest: bool,

    /// Start with monitor mode on
    #[arg(long)]
    monitor: bool,

    /// Start with talk mode on
    #[arg(long)]
    talk: bool,
}

fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        TerminalConsole::stdout().emit(ConsoleLine::error(e.to_string()));
        std::process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<(), ServerError> {
    let startup = TerminalConsole::stdout();

    let port = resolve_port(args.port);
    if let Some(warning) = port.warning() {
        tracing::warn!("Port {} refused", args.port);
        startup.emit(ConsoleLine::warning(warning));
    }

    let config = ServerConfig {
        addr: SocketAddr::new(args.host, port.port()),
        root: args.root,
        max_log_entries: args.max_log_entries,
        overflow: if args.evict_oldest {
            OverflowPolicy::EvictOldest
        } else {
            OverflowPolicy::Reject
        },
        monitor: args.monitor,
        talk: args.talk,
    };
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)?;

    startup.emit(ConsoleLine::plain(format!(
        "Starting chat server on port {}...",
        config.addr.port()
    )));
    let server = runtime.block_on(async { Server::bind(config.addr) })?;
    match server.local_addr() {
        Ok(addr) => tracing::info!("FHUB server listening on {}", addr),
        Err(e) => tracing::warn!("Listening address unavailable: {}", e),
    }
    startup.emit(ConsoleLine::plain(format!(
        "Server initialized! Now listening on port {}",
        config.addr.port()
    )));

    // The prompt starts only once the port is ours
    let (lines, console) = spawn_line_reader("ADMIN> ".to_string());
    runtime.block_on(serve(server, config, Arc::new(console), lines));
    Ok(())
}

async fn serve(
    server: Server,
    config: ServerConfig,
    console: Arc<dyn Console>,
    lines: mpsc::UnboundedReceiver<String>,
) {
    // Initialize dependencies in order:
    // 1. AppState (chat log, client registry, use cases)
    // 2. File browser
    // 3. Admin console
    // 4. Signal handler
    // 5. Accept loop

    // 1. Create AppState
    let state = Arc::new(AppState::new(&config, console, Arc::new(SystemClock)));

    // 2. Create the file browser confined to the root directory
    let browser = Arc::new(LocalFileBrowser::new(config.root.clone()));

    // 3. Start the admin console
    let admin = tokio::spawn(AdminConsole::new(state.clone(), browser).run(lines));

    // 4. Ctrl+C outside the line editor also shuts down
    let signal_state = state.clone();
    tokio::spawn(async move {
        signal::ctrl_c().await;
        signal_state.shutdown().await;
    });

    // 5. Serve until shutdown
    server.run(state.clone()).await;

    if let Err(e) = admin.await {
        tracing::warn!("Admin console ended abnormally: {}", e);
    }
    tracing::info!(
        "Relayed {} chat line(s) during this session",
        state.logged_messages().await
    );
}
