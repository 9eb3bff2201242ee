use crate::net::OutFrame;
use crate::net::sink::ClientSink;
use crate::util::telnet::escape_iac;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

pub struct TelnetSink<W> {
    writer: W,
}

impl<W> TelnetSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ClientSink for TelnetSink<W>
where
    W: AsyncWriteExt + Unpin + Send,
{
    async fn send_frame(&mut self, frame: OutFrame) -> std::io::Result<()> {
        match frame {
            OutFrame::Echo(bytes) => {
                self.writer.write_all(&escape_iac(&bytes)).await?;
            }
            OutFrame::Negotiation(bytes) => {
                self.writer.write_all(&bytes).await?;
            }
            OutFrame::Line(s) => {
                for line in s.lines() {
                    self.writer.write_all(line.as_bytes()).await?;
                    self.writer.write_all(b"\r\n").await?;
                }
            }
            OutFrame::Prompt(p) => {
                // No newline: the editor continues on the prompt's line.
                self.writer.write_all(p.as_bytes()).await?;
            }
        }

        self.writer.flush().await
    }
}
