//! Wire contract between the daemon and its collaborators (popup CLI,
//! on-page widget, tab-event shim). One JSON object per line, tagged with
//! `action` inbound and `event` outbound. Field names mirror the persistent
//! store keys so collaborators deal with a single vocabulary.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Cause of the most recent productivity transition. Informational, carried
/// on notifications so the widget can react differently to a manual toggle
/// than to an idle demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    ProductiveSite,
    UnproductiveSite,
    Inactivity,
    UserActivity,
    Manual,
}

/// Which of the two site lists a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Productive,
    Unproductive,
}

impl ListKind {
    pub fn key(self) -> &'static str {
        match self {
            ListKind::Productive => crate::daemon::storage::KEY_PRODUCTIVE_SITES,
            ListKind::Unproductive => crate::daemon::storage::KEY_UNPRODUCTIVE_SITES,
        }
    }
}

/// Inbound command surface. Anything that fails to parse into this enum is
/// ignored by the server, never answered with an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    SetProductivity {
        productive: bool,
    },
    GetProductivity,
    UserActivity,
    GetWebsiteLists,
    #[serde(rename_all = "camelCase")]
    UpdateWebsiteLists {
        productive_sites: Vec<String>,
        unproductive_sites: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    AddWebsite {
        website: String,
        list_type: ListKind,
    },
    #[serde(rename_all = "camelCase")]
    RemoveWebsite {
        website: String,
        list_type: ListKind,
    },
    GenerateSummaryNow,
    /// Tab navigation/activation relayed by the browser-side shim.
    TabNavigated {
        url: String,
    },
    /// Switches the connection into push mode for notifications.
    Subscribe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReply {
    pub is_productive: bool,
    pub inactive_time: u32,
    pub current_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    State(StateReply),
    #[serde(rename_all = "camelCase")]
    Lists {
        productive_sites: Vec<String>,
        unproductive_sites: Vec<String>,
    },
    Summary {
        success: bool,
    },
    Ack {
        ok: bool,
    },
}

/// Pushed to every subscriber whenever the productivity flag actually flips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Notification {
    ProductivityChanged {
        productive: bool,
        reason: TransitionReason,
    },
}
