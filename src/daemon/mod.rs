use std::{net::Ipv4Addr, path::PathBuf, sync::Arc};

use anyhow::Result;
use coordinator::{
    ticker::{IdleTicker, TICK_PERIOD},
    Coordinator, Event,
};
use server::CommandServer;
use summary::{gemini::GeminiClient, SummaryService};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::utils::{
    clock::{Clock, SystemClock},
    dir::store_path,
};

use storage::kv::{JsonFileStore, KeyValueStore};

pub mod args;
pub mod coordinator;
pub mod protocol;
pub mod server;
pub mod shutdown;
pub mod storage;
pub mod summary;

/// "duck" on a phone keypad.
pub const DEFAULT_PORT: u16 = 3825;

const EVENT_QUEUE_SIZE: usize = 16;
const NOTIFICATION_QUEUE_SIZE: usize = 16;

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, port: u16) -> Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(store_path(&dir)));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let generator = GeminiClient::from_env()
        .map(|client| Box::new(client) as Box<dyn summary::gemini::TextGenerator>);

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    let shutdown_token = CancellationToken::new();
    let (events_sender, events_receiver) = mpsc::channel::<Event>(EVENT_QUEUE_SIZE);
    let (notifications, _) = broadcast::channel(NOTIFICATION_QUEUE_SIZE);

    let coordinator = create_coordinator(
        store,
        generator,
        events_sender.clone(),
        notifications.clone(),
        clock,
    )
    .await;
    let server = CommandServer::new(listener, events_sender, notifications, shutdown_token.clone());

    let (_, coordinator_result, server_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        coordinator.run(events_receiver, shutdown_token.clone()),
        server.run(),
    );

    if let Err(coordinator_result) = coordinator_result {
        error!("Coordinator got an error {:?}", coordinator_result);
    }

    if let Err(server_result) = server_result {
        error!("Command server got an error {:?}", server_result);
    }

    Ok(())
}

async fn create_coordinator(
    store: Arc<dyn KeyValueStore>,
    generator: Option<Box<dyn summary::gemini::TextGenerator>>,
    events: mpsc::Sender<Event>,
    notifications: broadcast::Sender<protocol::Notification>,
    clock: Arc<dyn Clock>,
) -> Coordinator {
    let summary = Arc::new(SummaryService::new(store.clone(), generator));
    let ticker = IdleTicker::new(events, clock.clone(), TICK_PERIOD);
    Coordinator::restore(store, summary, notifications, ticker, clock).await
}
