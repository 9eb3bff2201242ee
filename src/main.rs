use clap::{Parser, Subcommand};
use rawline::{Session, SymbolCompleter, config::Config, net::telnet};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const CTRL_C: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "rawline", version, about = "Byte-at-a-time line editor")]
struct Cli {
    /// TOML config file (overrides RAWLINE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the line editor over telnet
    Serve {
        /// Listen address, e.g. 127.0.0.1:4000
        #[arg(long)]
        addr: Option<String>,
    },
    /// Edit lines read from stdin; put the tty in raw mode first (`stty raw -echo`)
    Stdin,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                cfg.tcp_addr = addr;
            }
            let tcp_addr: SocketAddr = cfg.tcp_addr.parse()?;
            tracing::info!(%tcp_addr, "rawline console (telnet) listening");
            telnet::serve(tcp_addr, Arc::new(cfg)).await?;
        }
        Command::Stdin => {
            tokio::task::spawn_blocking(move || edit_stdin(&cfg)).await??;
        }
    }

    Ok(())
}

fn edit_stdin(cfg: &Config) -> anyhow::Result<()> {
    let mut session = Session::default();
    session.set_history_policy(cfg.history.clone());
    session.set_completer(SymbolCompleter::new(cfg.symbols.iter().cloned()));

    let mut out = std::io::stdout();
    for byte in std::io::stdin().lock().bytes() {
        let byte = byte?;
        if byte == CTRL_C {
            break;
        }
        if let Some(line) = session.interpret(byte)? {
            write!(out, "line: {line}\r\n")?;
            out.flush()?;
        }
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}
