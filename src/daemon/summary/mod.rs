//! Turns the duration ledger into a short human-readable summary, through
//! the generative collaborator when one is configured and through a
//! deterministic local fallback otherwise. Generation is best-effort by
//! contract: any generator failure degrades to the fallback instead of
//! propagating.

pub mod gemini;

use std::{cmp::Ordering, sync::Arc};

use anyhow::Result;
use serde_json::{json, Map};
use tracing::{info, warn};

use crate::daemon::{
    coordinator::classify::SiteList,
    storage::{
        kv::KeyValueStore, read_durations, read_site_list, KEY_AI_SUMMARY,
        KEY_PRODUCTIVE_SITES, KEY_SITE_DURATIONS, KEY_UNPRODUCTIVE_SITES,
    },
};

use gemini::TextGenerator;

pub struct SummaryService {
    store: Arc<dyn KeyValueStore>,
    generator: Option<Box<dyn TextGenerator>>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn KeyValueStore>, generator: Option<Box<dyn TextGenerator>>) -> Self {
        Self { store, generator }
    }

    /// Builds and persists a summary of the session so far. Succeeds
    /// without writing anything when no activity has been tracked yet.
    pub async fn generate(&self) -> Result<()> {
        let values = self
            .store
            .get(&[
                KEY_SITE_DURATIONS,
                KEY_PRODUCTIVE_SITES,
                KEY_UNPRODUCTIVE_SITES,
            ])
            .await?;

        let durations = read_durations(&values, KEY_SITE_DURATIONS);
        if durations.is_empty() {
            info!("No tracked activity yet, skipping summary");
            return Ok(());
        }
        let productive = read_site_list(&values, KEY_PRODUCTIVE_SITES).unwrap_or_default();
        let unproductive = read_site_list(&values, KEY_UNPRODUCTIVE_SITES).unwrap_or_default();

        let text = match &self.generator {
            Some(generator) => {
                let prompt = build_prompt(&durations, &productive, &unproductive);
                match generator.generate(&prompt).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Generator failed, falling back to the local summary {e:?}");
                        local_summary(&durations, &productive, &unproductive)
                    }
                }
            }
            None => local_summary(&durations, &productive, &unproductive),
        };

        let mut entries = Map::new();
        entries.insert(KEY_AI_SUMMARY.to_string(), json!(text));
        self.store.set(entries).await?;
        Ok(())
    }
}

fn minutes(seconds: f64) -> i64 {
    (seconds / 60.).round() as i64
}

fn by_time_descending(durations: &[(String, f64)]) -> Vec<&(String, f64)> {
    let mut sorted = durations.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    sorted
}

fn build_prompt(
    durations: &[(String, f64)],
    productive: &SiteList,
    unproductive: &SiteList,
) -> String {
    let activity = durations
        .iter()
        .map(|(domain, seconds)| format!("{domain}: {} minutes", minutes(*seconds)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Summarize the user's productivity today in a warm, friendly tone.\n\
         Highlight positive focus, note distractions, and give short encouragement.\n\
         \n\
         Productive sites: {}\n\
         Unproductive sites: {}\n\
         \n\
         Activity data:\n\
         {activity}",
        join_or_none(productive),
        join_or_none(unproductive),
    )
}

fn join_or_none(list: &SiteList) -> String {
    if list.entries().is_empty() {
        "None".to_string()
    } else {
        list.entries().join(", ")
    }
}

/// Deterministic offline summary: top three domains by time plus the size
/// of each list.
pub fn local_summary(
    durations: &[(String, f64)],
    productive: &SiteList,
    unproductive: &SiteList,
) -> String {
    let top_sites = by_time_descending(durations)
        .into_iter()
        .take(3)
        .map(|(domain, seconds)| format!("{domain} ({} min)", minutes(*seconds)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You spent most of your time on: {top_sites}.\n\
         {} productive sites, {} distractions.\n\
         Keep building focus and reward yourself for progress!",
        productive.entries().len(),
        unproductive.entries().len(),
    )
}
