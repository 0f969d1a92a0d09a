//! The productivity state machine. Merges three independent signals, the
//! domain classification of the tracked tab, the idle counter and manual
//! overrides, into one authoritative state, and fans effective transitions
//! out to subscribers.

pub mod classify;
pub mod ticker;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    daemon::{
        protocol::{Command, Notification, Reply, StateReply, TransitionReason},
        storage::{
            kv::KeyValueStore, read_bool, read_site_list, read_u32, KEY_INACTIVE_TIME,
            KEY_IS_PRODUCTIVE, KEY_PRODUCTIVE_SITES, KEY_SITE_DURATIONS, KEY_UNPRODUCTIVE_SITES,
        },
        summary::SummaryService,
    },
    utils::clock::Clock,
};

use classify::{
    classify, extract_domain, Classification, SiteList, DEFAULT_PRODUCTIVE_SITES,
    DEFAULT_UNPRODUCTIVE_SITES,
};
use ticker::IdleTicker;

/// Seconds without user activity before a productive state is demoted.
pub const INACTIVITY_THRESHOLD_SECONDS: u32 = 30;

/// Everything the coordinator loop reacts to. Commands arrive from socket
/// connections, ticks from the idle ticker.
pub enum Event {
    Command {
        command: Command,
        reply: oneshot::Sender<Reply>,
    },
    Tick,
}

/// Canonical productivity state for the session. Owned exclusively by the
/// coordinator, handed out only as snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductivityState {
    pub is_productive: bool,
    pub inactive_seconds: u32,
    pub current_url: String,
    pub reason: TransitionReason,
}

impl Default for ProductivityState {
    fn default() -> Self {
        Self {
            is_productive: true,
            inactive_seconds: 0,
            current_url: String::new(),
            reason: TransitionReason::UserActivity,
        }
    }
}

pub struct Coordinator {
    state: ProductivityState,
    store: Arc<dyn KeyValueStore>,
    summary: Arc<SummaryService>,
    notifications: broadcast::Sender<Notification>,
    ticker: IdleTicker,
    clock: Arc<dyn Clock>,
    active_since: DateTime<Utc>,
}

impl Coordinator {
    /// Rehydrates persisted state and seeds the default site lists on a
    /// fresh install. A failing store read just means starting from the
    /// defaults, the in-memory state is authoritative from here on.
    pub async fn restore(
        store: Arc<dyn KeyValueStore>,
        summary: Arc<SummaryService>,
        notifications: broadcast::Sender<Notification>,
        ticker: IdleTicker,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut state = ProductivityState::default();
        match store
            .get(&[
                KEY_IS_PRODUCTIVE,
                KEY_INACTIVE_TIME,
                KEY_PRODUCTIVE_SITES,
                KEY_UNPRODUCTIVE_SITES,
            ])
            .await
        {
            Ok(values) => {
                state.is_productive = read_bool(&values, KEY_IS_PRODUCTIVE).unwrap_or(true);
                state.inactive_seconds = read_u32(&values, KEY_INACTIVE_TIME)
                    .unwrap_or(0)
                    .min(INACTIVITY_THRESHOLD_SECONDS);

                let mut seeded = Map::new();
                if read_site_list(&values, KEY_PRODUCTIVE_SITES).is_none() {
                    seeded.insert(
                        KEY_PRODUCTIVE_SITES.to_string(),
                        json!(DEFAULT_PRODUCTIVE_SITES),
                    );
                }
                if read_site_list(&values, KEY_UNPRODUCTIVE_SITES).is_none() {
                    seeded.insert(
                        KEY_UNPRODUCTIVE_SITES.to_string(),
                        json!(DEFAULT_UNPRODUCTIVE_SITES),
                    );
                }
                if !seeded.is_empty() {
                    info!("Seeding default site lists");
                    if let Err(e) = store.set(seeded).await {
                        warn!("Failed to seed default site lists {e:?}");
                    }
                }
            }
            Err(e) => {
                warn!("Failed to restore persisted state, starting fresh {e:?}");
            }
        }

        let active_since = clock.time();
        Self {
            state,
            store,
            summary,
            notifications,
            ticker,
            clock,
            active_since,
        }
    }

    /// Executes the coordinator event loop. Every event runs to completion
    /// before the next one is taken, so ticks and commands never interleave
    /// partial updates.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<Event>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        self.ticker.restart();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.finalize().await;
                    return Ok(())
                }
                event = events.recv() => match event {
                    Some(Event::Tick) => self.on_tick(),
                    Some(Event::Command { command, reply }) => {
                        debug!("Handling command");
                        let response = self.handle_command(command).await;
                        // The connection may be gone by now, that's fine.
                        let _ = reply.send(response);
                    }
                    None => return Ok(()),
                }
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> Reply {
        match command {
            Command::TabNavigated { url } => {
                self.on_navigation(url).await;
                Reply::Ack { ok: true }
            }
            Command::SetProductivity { productive } => {
                self.set_manual(productive);
                Reply::Ack { ok: true }
            }
            Command::GetProductivity => Reply::State(self.state_reply()),
            Command::UserActivity => {
                self.on_activity().await;
                Reply::Ack { ok: true }
            }
            Command::GetWebsiteLists => {
                let (productive, unproductive) = self.site_lists().await;
                Reply::Lists {
                    productive_sites: productive.entries().to_vec(),
                    unproductive_sites: unproductive.entries().to_vec(),
                }
            }
            Command::UpdateWebsiteLists {
                productive_sites,
                unproductive_sites,
            } => {
                let mut entries = Map::new();
                entries.insert(
                    KEY_PRODUCTIVE_SITES.to_string(),
                    json!(SiteList::from_entries(productive_sites)),
                );
                entries.insert(
                    KEY_UNPRODUCTIVE_SITES.to_string(),
                    json!(SiteList::from_entries(unproductive_sites)),
                );
                let ok = self.persist_now(entries).await;
                self.evaluate_current().await;
                Reply::Ack { ok }
            }
            Command::AddWebsite { website, list_type } => {
                let ok = self
                    .mutate_list(list_type.key(), |list| list.add(website))
                    .await;
                Reply::Ack { ok }
            }
            Command::RemoveWebsite { website, list_type } => {
                let ok = self
                    .mutate_list(list_type.key(), |list| list.remove(&website))
                    .await;
                Reply::Ack { ok }
            }
            Command::GenerateSummaryNow => {
                let success = match self.summary.generate().await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Summary generation failed {e:?}");
                        false
                    }
                };
                Reply::Summary { success }
            }
            // Handled by the connection itself, answered here only if a
            // client somehow raced one past the server.
            Command::Subscribe => Reply::Ack { ok: false },
        }
    }

    /// Attributes elapsed time to the previous domain, then classifies the
    /// new one.
    async fn on_navigation(&mut self, url: String) {
        debug!("Navigated to {url}");
        if let Some(entries) = self.updated_ledger().await {
            self.persist(entries);
        }
        self.state.current_url = url;
        self.evaluate_current().await;
    }

    /// User interaction resets the idle counter. It promotes an
    /// unproductive state back to productive only when the current domain is
    /// not itself on the unproductive list: being active on a distracting
    /// site does not make it productive.
    async fn on_activity(&mut self) {
        self.state.inactive_seconds = 0;
        if !self.state.is_productive {
            let domain = extract_domain(&self.state.current_url);
            let (_, unproductive) = self.site_lists().await;
            if !unproductive.matches(&domain) {
                self.apply(true, TransitionReason::UserActivity);
            }
        }
        self.ticker.restart();
    }

    fn on_tick(&mut self) {
        self.state.inactive_seconds =
            (self.state.inactive_seconds + 1).min(INACTIVITY_THRESHOLD_SECONDS);
        if self.state.inactive_seconds >= INACTIVITY_THRESHOLD_SECONDS && self.state.is_productive
        {
            self.apply(false, TransitionReason::Inactivity);
        }
        let mut entries = Map::new();
        entries.insert(
            KEY_INACTIVE_TIME.to_string(),
            json!(self.state.inactive_seconds),
        );
        self.persist(entries);
    }

    /// Manual override always wins, whatever the lists or the idle counter
    /// say.
    fn set_manual(&mut self, productive: bool) {
        self.apply(productive, TransitionReason::Manual);
    }

    pub fn state(&self) -> &ProductivityState {
        &self.state
    }

    fn state_reply(&self) -> StateReply {
        StateReply {
            is_productive: self.state.is_productive,
            inactive_time: self.state.inactive_seconds,
            current_url: self.state.current_url.clone(),
        }
    }

    /// Classifies the current domain and applies the outcome. A domain on
    /// neither list behaves like plain user activity and defers to the idle
    /// counter.
    async fn evaluate_current(&mut self) {
        let domain = extract_domain(&self.state.current_url);
        let (productive, unproductive) = self.site_lists().await;
        match classify(&domain, &productive, &unproductive) {
            Classification::Unproductive => self.apply(false, TransitionReason::UnproductiveSite),
            Classification::Productive => self.apply(true, TransitionReason::ProductiveSite),
            Classification::Unchanged => self.on_activity().await,
        }
    }

    /// The single transition point. Persists the outcome, notifies
    /// subscribers on an effective flip and schedules summary generation
    /// when productive turns unproductive.
    fn apply(&mut self, productive: bool, reason: TransitionReason) {
        let was_productive = self.state.is_productive;
        self.state.is_productive = productive;
        // Forcing the counter keeps the next tick from re-evaluating the
        // threshold against a stale value.
        self.state.inactive_seconds = if productive {
            0
        } else {
            INACTIVITY_THRESHOLD_SECONDS
        };
        self.state.reason = reason;

        let mut entries = Map::new();
        entries.insert(KEY_IS_PRODUCTIVE.to_string(), json!(productive));
        entries.insert(
            KEY_INACTIVE_TIME.to_string(),
            json!(self.state.inactive_seconds),
        );
        self.persist(entries);

        if was_productive != productive {
            info!("Productivity changed to {productive} because of {reason:?}");
            let notification = Notification::ProductivityChanged { productive, reason };
            if self.notifications.send(notification).is_err() {
                // No widget or popup attached right now.
                debug!("Dropped notification, nobody is subscribed");
            }
            if was_productive && !productive {
                self.schedule_summary();
            }
        }

        if productive {
            self.ticker.restart();
        }
    }

    async fn site_lists(&self) -> (SiteList, SiteList) {
        match self
            .store
            .get(&[KEY_PRODUCTIVE_SITES, KEY_UNPRODUCTIVE_SITES])
            .await
        {
            Ok(values) => (
                read_site_list(&values, KEY_PRODUCTIVE_SITES).unwrap_or_default(),
                read_site_list(&values, KEY_UNPRODUCTIVE_SITES).unwrap_or_default(),
            ),
            Err(e) => {
                warn!("Failed to read site lists {e:?}");
                (SiteList::default(), SiteList::default())
            }
        }
    }

    /// Reads, mutates and writes back one site list, then re-classifies the
    /// current domain against the updated lists. A no-op mutation skips the
    /// write but still counts as success.
    async fn mutate_list(&mut self, key: &str, mutation: impl FnOnce(&mut SiteList) -> bool) -> bool {
        let mut list = match self.store.get(&[key]).await {
            Ok(values) => read_site_list(&values, key).unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read site list {key} {e:?}");
                return false;
            }
        };

        let mut ok = true;
        if mutation(&mut list) {
            let mut entries = Map::new();
            entries.insert(key.to_string(), json!(list));
            ok = self.persist_now(entries).await;
        }
        self.evaluate_current().await;
        ok
    }

    /// Attributes wall-clock time since the previous navigation to the
    /// domain that was current, returning the merged ledger entry to
    /// persist. Returns None when there was no previous URL to attribute to.
    async fn updated_ledger(&mut self) -> Option<Map<String, Value>> {
        let now = self.clock.time();
        let elapsed = (now - self.active_since).num_milliseconds() as f64 / 1000.;
        self.active_since = now;

        if self.state.current_url.is_empty() {
            return None;
        }
        let domain = extract_domain(&self.state.current_url);

        let mut durations: Map<String, Value> = match self.store.get(&[KEY_SITE_DURATIONS]).await {
            Ok(values) => values
                .get(KEY_SITE_DURATIONS)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read the duration ledger {e:?}");
                return None;
            }
        };

        let accumulated = durations.get(&domain).and_then(Value::as_f64).unwrap_or(0.);
        durations.insert(domain, json!(accumulated + elapsed));

        let mut entries = Map::new();
        entries.insert(KEY_SITE_DURATIONS.to_string(), Value::Object(durations));
        Some(entries)
    }

    /// Fire-and-forget persistence. The in-memory state stays authoritative
    /// whether or not the write lands.
    fn persist(&self, entries: Map<String, Value>) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.set(entries).await {
                warn!("Failed to persist state {e:?}");
            }
        });
    }

    /// Awaited persistence for interactive list edits, so the follow-up
    /// re-classification reads what was just written.
    async fn persist_now(&self, entries: Map<String, Value>) -> bool {
        match self.store.set(entries).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist state {e:?}");
                false
            }
        }
    }

    fn schedule_summary(&self) {
        let summary = self.summary.clone();
        tokio::spawn(async move {
            if let Err(e) = summary.generate().await {
                warn!("Failed to generate summary {e:?}");
            }
        });
    }

    /// Last ledger attribution before shutdown, awaited so the write gets a
    /// chance to land.
    async fn finalize(&mut self) {
        if let Some(entries) = self.updated_ledger().await {
            if let Err(e) = self.store.set(entries).await {
                warn!("Failed to flush the duration ledger {e:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use serde_json::json;
    use tokio::{
        sync::{broadcast, mpsc},
        time::Instant,
    };

    use crate::{
        daemon::{
            protocol::{ListKind, Notification, TransitionReason},
            storage::{
                kv::fake::MemoryStore, read_durations, KEY_AI_SUMMARY, KEY_INACTIVE_TIME,
                KEY_IS_PRODUCTIVE, KEY_PRODUCTIVE_SITES, KEY_SITE_DURATIONS,
                KEY_UNPRODUCTIVE_SITES,
            },
            summary::SummaryService,
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    use super::{
        ticker::{IdleTicker, TICK_PERIOD},
        Coordinator, Event, INACTIVITY_THRESHOLD_SECONDS,
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    /// Wall clock advanced by hand from the test body.
    struct TestClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl TestClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc.from_utc_datetime(&TEST_START_DATE)),
            })
        }

        fn advance(&self, seconds: i64) {
            *self.now.lock().unwrap() += Duration::seconds(seconds);
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    struct Fixture {
        coordinator: Coordinator,
        store: Arc<MemoryStore>,
        clock: Arc<TestClock>,
        notifications: broadcast::Receiver<Notification>,
        _events: mpsc::Receiver<Event>,
    }

    async fn fixture() -> Fixture {
        *TEST_LOGGING;
        let store = Arc::new(MemoryStore::default());
        fixture_with_store(store).await
    }

    async fn fixture_with_store(store: Arc<MemoryStore>) -> Fixture {
        let clock = TestClock::new();
        let (events_sender, events_receiver) = mpsc::channel(64);
        let (notifications_sender, notifications_receiver) = broadcast::channel(64);
        let summary = Arc::new(SummaryService::new(store.clone(), None));
        let ticker = IdleTicker::new(events_sender, clock.clone(), TICK_PERIOD);
        let coordinator = Coordinator::restore(
            store.clone(),
            summary,
            notifications_sender,
            ticker,
            clock.clone(),
        )
        .await;
        Fixture {
            coordinator,
            store,
            clock,
            notifications: notifications_receiver,
            _events: events_receiver,
        }
    }

    /// Lets fire-and-forget persistence and summary tasks run to
    /// completion. Every spawned task only awaits the in-memory store, so a
    /// handful of scheduler passes is enough.
    async fn drain_tasks() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn received(notifications: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
        let mut result = vec![];
        while let Ok(notification) = notifications.try_recv() {
            result.push(notification);
        }
        result
    }

    #[tokio::test]
    async fn test_fresh_state_defaults_to_productive() {
        let f = fixture().await;

        let state = f.coordinator.state();
        assert!(state.is_productive);
        assert_eq!(state.inactive_seconds, 0);
        assert_eq!(state.current_url, "");

        // First start seeds the default lists.
        let snapshot = f.store.snapshot();
        assert!(snapshot.contains_key(KEY_PRODUCTIVE_SITES));
        assert!(snapshot.contains_key(KEY_UNPRODUCTIVE_SITES));
    }

    #[tokio::test]
    async fn test_restore_picks_up_persisted_state() {
        let store = Arc::new(MemoryStore::default());
        store.seed(KEY_IS_PRODUCTIVE, json!(false));
        store.seed(KEY_INACTIVE_TIME, json!(12));

        let f = fixture_with_store(store).await;
        assert!(!f.coordinator.state().is_productive);
        assert_eq!(f.coordinator.state().inactive_seconds, 12);
    }

    #[tokio::test]
    async fn test_navigation_to_unproductive_site_demotes() {
        let mut f = fixture().await;

        f.coordinator
            .on_navigation("https://youtube.com/watch?v=1".into())
            .await;

        let state = f.coordinator.state();
        assert!(!state.is_productive);
        assert_eq!(state.reason, TransitionReason::UnproductiveSite);
        assert_eq!(state.current_url, "https://youtube.com/watch?v=1");
        assert_eq!(state.inactive_seconds, INACTIVITY_THRESHOLD_SECONDS);

        assert_eq!(
            received(&mut f.notifications),
            vec![Notification::ProductivityChanged {
                productive: false,
                reason: TransitionReason::UnproductiveSite,
            }]
        );
    }

    #[tokio::test]
    async fn test_unproductive_wins_when_domain_is_on_both_lists() {
        let store = Arc::new(MemoryStore::default());
        store.seed(KEY_PRODUCTIVE_SITES, json!(["google.com"]));
        store.seed(KEY_UNPRODUCTIVE_SITES, json!(["google.com"]));

        let mut f = fixture_with_store(store).await;
        f.coordinator
            .on_navigation("https://docs.google.com/doc".into())
            .await;

        assert!(!f.coordinator.state().is_productive);
        assert_eq!(
            f.coordinator.state().reason,
            TransitionReason::UnproductiveSite
        );
    }

    #[tokio::test]
    async fn test_thirty_ticks_demote_a_productive_state() {
        let mut f = fixture().await;

        for _ in 0..INACTIVITY_THRESHOLD_SECONDS - 1 {
            f.coordinator.on_tick();
        }
        assert!(f.coordinator.state().is_productive);
        assert_eq!(
            f.coordinator.state().inactive_seconds,
            INACTIVITY_THRESHOLD_SECONDS - 1
        );
        assert!(received(&mut f.notifications).is_empty());

        f.coordinator.on_tick();

        let state = f.coordinator.state();
        assert!(!state.is_productive);
        assert_eq!(state.reason, TransitionReason::Inactivity);
        assert_eq!(
            received(&mut f.notifications),
            vec![Notification::ProductivityChanged {
                productive: false,
                reason: TransitionReason::Inactivity,
            }]
        );
    }

    #[tokio::test]
    async fn test_tick_persists_the_idle_counter() {
        let f = fixture().await;
        let mut coordinator = f.coordinator;

        coordinator.on_tick();
        drain_tasks().await;

        assert_eq!(f.store.snapshot()[KEY_INACTIVE_TIME], json!(1));
    }

    #[tokio::test]
    async fn test_activity_promotes_after_idle_demotion() {
        let mut f = fixture().await;
        f.coordinator.on_navigation("https://example.org/".into()).await;

        for _ in 0..INACTIVITY_THRESHOLD_SECONDS {
            f.coordinator.on_tick();
        }
        assert!(!f.coordinator.state().is_productive);
        let _ = received(&mut f.notifications);

        f.coordinator.on_activity().await;

        let state = f.coordinator.state();
        assert!(state.is_productive);
        assert_eq!(state.inactive_seconds, 0);
        assert_eq!(state.reason, TransitionReason::UserActivity);
        assert_eq!(
            received(&mut f.notifications),
            vec![Notification::ProductivityChanged {
                productive: true,
                reason: TransitionReason::UserActivity,
            }]
        );
    }

    #[tokio::test]
    async fn test_activity_does_not_override_an_unproductive_site() {
        let mut f = fixture().await;
        f.coordinator
            .on_navigation("https://youtube.com/watch?v=1".into())
            .await;
        let _ = received(&mut f.notifications);

        f.coordinator.on_activity().await;

        assert!(!f.coordinator.state().is_productive);
        assert_eq!(f.coordinator.state().inactive_seconds, 0);
        assert!(received(&mut f.notifications).is_empty());
    }

    #[tokio::test]
    async fn test_manual_toggles_notify_once_per_flip() {
        let mut f = fixture().await;

        f.coordinator.set_manual(true);
        f.coordinator.set_manual(false);
        f.coordinator.set_manual(true);

        let state = f.coordinator.state();
        assert!(state.is_productive);
        assert_eq!(state.inactive_seconds, 0);
        assert_eq!(state.reason, TransitionReason::Manual);

        // The initial redundant set_manual(true) is not an effective
        // transition, only the two flips notify.
        assert_eq!(
            received(&mut f.notifications),
            vec![
                Notification::ProductivityChanged {
                    productive: false,
                    reason: TransitionReason::Manual,
                },
                Notification::ProductivityChanged {
                    productive: true,
                    reason: TransitionReason::Manual,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_manual_demotion_pins_the_idle_counter() {
        let mut f = fixture().await;

        f.coordinator.set_manual(false);
        assert_eq!(
            f.coordinator.state().inactive_seconds,
            INACTIVITY_THRESHOLD_SECONDS
        );
        let _ = received(&mut f.notifications);

        // The next tick re-evaluates the threshold against an already
        // unproductive state, nothing flips twice.
        f.coordinator.on_tick();
        assert!(!f.coordinator.state().is_productive);
        assert!(received(&mut f.notifications).is_empty());
    }

    #[tokio::test]
    async fn test_adding_current_domain_to_unproductive_list_reclassifies() {
        let mut f = fixture().await;
        f.coordinator.on_navigation("https://example.org/".into()).await;
        assert!(f.coordinator.state().is_productive);
        let _ = received(&mut f.notifications);

        let ok = f
            .coordinator
            .mutate_list(ListKind::Unproductive.key(), |list| {
                list.add("example.org".into())
            })
            .await;

        assert!(ok);
        assert!(!f.coordinator.state().is_productive);
        assert_eq!(
            f.coordinator.state().reason,
            TransitionReason::UnproductiveSite
        );
    }

    #[tokio::test]
    async fn test_duplicate_add_and_absent_remove_are_noops() {
        let f = fixture().await;
        let mut coordinator = f.coordinator;

        let ok = coordinator
            .mutate_list(ListKind::Unproductive.key(), |list| {
                list.add("youtube.com".into())
            })
            .await;
        assert!(ok);

        let ok = coordinator
            .mutate_list(ListKind::Productive.key(), |list| list.remove("missing.example"))
            .await;
        assert!(ok);

        let snapshot = f.store.snapshot();
        let unproductive = snapshot[KEY_UNPRODUCTIVE_SITES].as_array().unwrap();
        let youtube_entries = unproductive
            .iter()
            .filter(|v| v.as_str() == Some("youtube.com"))
            .count();
        assert_eq!(youtube_entries, 1);
    }

    #[tokio::test]
    async fn test_navigation_attributes_time_to_the_previous_domain() {
        let mut f = fixture().await;

        f.coordinator
            .on_navigation("https://github.com/focusduck".into())
            .await;
        f.clock.advance(90);
        f.coordinator
            .on_navigation("https://youtube.com/watch?v=1".into())
            .await;
        drain_tasks().await;

        let snapshot = f.store.snapshot();
        let durations = read_durations(&snapshot, KEY_SITE_DURATIONS);
        assert_eq!(durations, vec![("github.com".to_string(), 90.)]);
    }

    #[tokio::test]
    async fn test_unproductive_navigation_schedules_one_summary() {
        let mut f = fixture().await;

        f.coordinator
            .on_navigation("https://github.com/focusduck".into())
            .await;
        f.clock.advance(120);
        f.coordinator
            .on_navigation("https://youtube.com/watch?v=1".into())
            .await;
        drain_tasks().await;

        let snapshot = f.store.snapshot();
        let summary = snapshot[KEY_AI_SUMMARY].as_str().unwrap();
        assert!(summary.contains("github.com"));

        // Navigating to a second unproductive site is not an effective
        // transition and must not regenerate the summary.
        f.store.seed(KEY_AI_SUMMARY, json!("sentinel"));
        f.coordinator
            .on_navigation("https://reddit.com/r/rust".into())
            .await;
        drain_tasks().await;
        assert_eq!(f.store.snapshot()[KEY_AI_SUMMARY], json!("sentinel"));
    }
}
