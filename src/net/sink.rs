pub mod telnet;

use crate::net::OutFrame;
use async_trait::async_trait;

#[async_trait]
pub trait ClientSink: Send {
    async fn send_frame(&mut self, frame: OutFrame) -> std::io::Result<()>;
}
