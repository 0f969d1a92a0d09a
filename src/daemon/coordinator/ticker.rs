use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::utils::clock::Clock;

use super::Event;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drives [Event::Tick] into the coordinator once per period. The ticker
/// holds nothing but the cancellation handle of the currently live task;
/// the idle counter itself lives in the coordinator.
pub struct IdleTicker {
    events: mpsc::Sender<Event>,
    clock: Arc<dyn Clock>,
    period: Duration,
    live: Option<CancellationToken>,
}

impl IdleTicker {
    pub fn new(events: mpsc::Sender<Event>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            events,
            clock,
            period,
            live: None,
        }
    }

    /// Starts a fresh tick task. At most one is live: any previous instance
    /// is cancelled first, so restarting is idempotent.
    pub fn restart(&mut self) {
        if let Some(previous) = self.live.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.live = Some(token.clone());

        let events = self.events.clone();
        let clock = self.clock.clone();
        let period = self.period;
        tokio::spawn(async move {
            // Absolute schedule so ticks don't drift with handling time.
            let mut tick_point = clock.instant() + period;
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = clock.sleep_until(tick_point) => ()
                }
                if events.send(Event::Tick).await.is_err() {
                    // Coordinator is gone, nothing left to drive.
                    return;
                }
                tick_point += period;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::sync::mpsc;

    use crate::{daemon::coordinator::Event, utils::clock::SystemClock};

    use super::{IdleTicker, TICK_PERIOD};

    async fn count_ticks(receiver: &mut mpsc::Receiver<Event>, window: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + window;
        let mut ticks = 0;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return ticks,
                event = receiver.recv() => {
                    if event.is_none() {
                        return ticks;
                    }
                    ticks += 1;
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (sender, mut receiver) = mpsc::channel(10);
        let mut ticker = IdleTicker::new(sender, Arc::new(SystemClock), TICK_PERIOD);
        ticker.restart();

        let ticks = count_ticks(&mut receiver, Duration::from_millis(3500)).await;
        assert_eq!(ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_instance() {
        let (sender, mut receiver) = mpsc::channel(10);
        let mut ticker = IdleTicker::new(sender, Arc::new(SystemClock), TICK_PERIOD);
        ticker.restart();
        ticker.restart();
        ticker.restart();

        let ticks = count_ticks(&mut receiver, Duration::from_millis(3500)).await;
        assert_eq!(ticks, 3);
    }
}
