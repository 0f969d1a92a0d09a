use anyhow::Result;
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpListener, TcpStream},
    sync::{broadcast, mpsc, oneshot},
};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::daemon::{
    coordinator::Event,
    protocol::{Command, Notification, Reply},
};

/// Accepts collaborator connections and relays their commands into the
/// coordinator loop. One JSON object per line in both directions.
pub struct CommandServer {
    listener: TcpListener,
    events: mpsc::Sender<Event>,
    notifications: broadcast::Sender<Notification>,
    shutdown: CancellationToken,
}

impl CommandServer {
    pub fn new(
        listener: TcpListener,
        events: mpsc::Sender<Event>,
        notifications: broadcast::Sender<Notification>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            listener,
            events,
            notifications,
            shutdown,
        }
    }

    pub async fn run(self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, address)) => {
                        debug!("Connection from {address}");
                        let connection = Connection {
                            events: self.events.clone(),
                            notifications: self.notifications.clone(),
                            shutdown: self.shutdown.clone(),
                        };
                        tokio::spawn(async move {
                            if let Err(e) = connection.handle(stream).await {
                                debug!("Connection from {address} ended with {e:?}");
                            }
                        });
                    }
                    Err(e) => warn!("Failed to accept a connection {e:?}"),
                }
            }
        }
    }
}

struct Connection {
    events: mpsc::Sender<Event>,
    notifications: broadcast::Sender<Notification>,
    shutdown: CancellationToken,
}

impl Connection {
    async fn handle(self, stream: TcpStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { return Ok(()) };

            let command = match serde_json::from_str::<Command>(&line) {
                Ok(v) => v,
                Err(e) => {
                    // Unknown commands are dropped, never answered.
                    debug!("Ignoring unparsable command {line:?}: {e}");
                    continue;
                }
            };

            if command == Command::Subscribe {
                drop(lines);
                return self.push_notifications(writer).await;
            }

            let (reply_sender, reply_receiver) = oneshot::channel();
            let event = Event::Command {
                command,
                reply: reply_sender,
            };
            if self.events.send(event).await.is_err() {
                // Coordinator already shut down.
                return Ok(());
            }
            let Ok(reply) = reply_receiver.await else {
                return Ok(());
            };
            write_line(&mut writer, &reply).await?;
        }
    }

    /// Push mode: acknowledge the subscription, then forward every state
    /// change until the client hangs up. Lagging subscribers skip
    /// notifications instead of stalling the channel.
    async fn push_notifications(self, mut writer: OwnedWriteHalf) -> Result<()> {
        write_line(&mut writer, &Reply::Ack { ok: true }).await?;

        let mut stream = BroadcastStream::new(self.notifications.subscribe());
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                notification = stream.next() => match notification {
                    Some(Ok(notification)) => {
                        write_line(&mut writer, &notification).await?;
                    }
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        debug!("Subscriber lagged, skipped {skipped} notifications");
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, value: &impl serde::Serialize) -> Result<()> {
    let mut buffer = serde_json::to_vec(value)?;
    buffer.push(b'\n');
    writer.write_all(&buffer).await?;
    Ok(())
}
