use std::net::Ipv4Addr;

use anyhow::{bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};

use crate::daemon::protocol::{Command, Notification, Reply};

/// Line-JSON client for the daemon's command socket.
pub struct DaemonClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl DaemonClient {
    pub async fn connect(port: u16) -> Result<Self> {
        let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port))
            .await
            .context("Couldn't reach the daemon. Is it running? Try `focusduck init`")?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    pub async fn request(&mut self, command: &Command) -> Result<Reply> {
        self.send(command).await?;
        let line = self.receive().await?;
        Ok(serde_json::from_str(&line)?)
    }

    /// Switches the connection into push mode and hands every notification
    /// to the callback until the daemon goes away.
    pub async fn watch(mut self, mut on_notification: impl FnMut(&Notification)) -> Result<()> {
        self.send(&Command::Subscribe).await?;
        let ack = self.receive().await?;
        if !matches!(serde_json::from_str(&ack)?, Reply::Ack { ok: true }) {
            bail!("Subscription was refused");
        }

        loop {
            let line = self.receive().await?;
            match serde_json::from_str::<Notification>(&line) {
                Ok(notification) => on_notification(&notification),
                Err(e) => bail!("Unexpected notification {line:?}: {e}"),
            }
        }
    }

    async fn send(&mut self, command: &Command) -> Result<()> {
        let mut buffer = serde_json::to_vec(command)?;
        buffer.push(b'\n');
        self.writer.write_all(&buffer).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            bail!("The daemon closed the connection");
        }
        Ok(line)
    }
}
