use crate::config::Config;
use crate::error::InfraResult;
use crate::input::completion::SymbolCompleter;
use crate::input::history::History;
use crate::net::OutFrame;
use crate::net::sink::ClientSink;
use crate::net::sink::telnet::TelnetSink;
use crate::session::Session;
use crate::util::telnet::{TelnetIn, TelnetMachine};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::net::TcpStream;

const CTRL_C: u8 = 3;

/// Words the console understands on its own.
const COMMANDS: [&str; 4] = ["exit", "help", "history", "quit"];

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

pub(super) async fn handle_connection(stream: TcpStream, cfg: Arc<Config>) -> InfraResult<()> {
    let (read_half, mut write_half) = stream.into_split();

    let mut telnet = TelnetMachine::new();
    telnet.start_negotiation(&mut write_half).await?;

    let mut out = TelnetSink::new(write_half);
    let mut session = Session::with_policy(Vec::new(), cfg.history.clone());
    session.set_prompt(cfg.prompt.clone());
    session.set_completer(SymbolCompleter::new(
        COMMANDS.iter().map(|s| s.to_string()).chain(cfg.symbols.iter().cloned()),
    ));

    out.send_frame(OutFrame::Prompt(cfg.prompt.clone())).await?;

    let mut reader = BufReader::new(read_half);
    read_loop(&mut reader, &mut telnet, &mut session, &mut out, &cfg).await
}

async fn read_loop<R, C>(
    reader: &mut R,
    telnet: &mut TelnetMachine,
    session: &mut Session<Vec<u8>>,
    out: &mut C,
    cfg: &Config,
) -> InfraResult<()>
where
    R: AsyncRead + Unpin,
    C: ClientSink,
{
    let mut one = [0u8; 1];

    loop {
        let n = reader.read(&mut one).await?;
        if n == 0 {
            break; // disconnect
        }

        let response = telnet.push(one[0]);
        if let Some(bytes) = response.response {
            out.send_frame(OutFrame::Negotiation(bytes)).await?;
        }

        match response.event {
            Some(TelnetIn::Data(CTRL_C)) => break,
            Some(TelnetIn::Data(b)) => {
                let line = session.interpret(b)?;

                let echo = std::mem::take(session.sink_mut());
                if !echo.is_empty() {
                    out.send_frame(OutFrame::Echo(echo)).await?;
                }

                if let Some(line) = line
                    && handle_line(&line, session.history(), out, cfg).await? == Flow::Close
                {
                    break;
                }
            }
            Some(TelnetIn::Naws { cols, rows }) => {
                tracing::debug!(cols, rows, "client window size");
            }
            None => {}
        }
    }
    Ok(())
}

async fn handle_line<C: ClientSink>(line: &str, history: &History, out: &mut C, cfg: &Config) -> InfraResult<Flow> {
    tracing::debug!(%line, "line completed");

    match line.trim() {
        "exit" | "quit" => {
            out.send_frame(OutFrame::Line("bye".into())).await?;
            return Ok(Flow::Close);
        }
        "help" => {
            out.send_frame(OutFrame::Line(format!("commands: {}", COMMANDS.join(", "))))
                .await?;
        }
        "history" => {
            let listing: Vec<String> = history
                .iter()
                .enumerate()
                .map(|(ix, entry)| format!("{:>4}  {}", ix + 1, entry))
                .collect();
            out.send_frame(OutFrame::Line(listing.join("\n"))).await?;
        }
        _ => {
            let bytes: Vec<String> = line.bytes().map(|b| b.to_string()).collect();
            out.send_frame(OutFrame::Line(format!("line: {line}\n{}", bytes.join(" "))))
                .await?;
        }
    }

    out.send_frame(OutFrame::Prompt(cfg.prompt.clone())).await?;
    Ok(Flow::Continue)
}
