pub mod report;

use ansi_term::Colour;

use crate::daemon::protocol::{Notification, StateReply, TransitionReason};

fn productivity_label(productive: bool) -> ansi_term::ANSIGenericString<'static, str> {
    if productive {
        Colour::Green.paint("productive")
    } else {
        Colour::Red.paint("unproductive")
    }
}

fn reason_label(reason: TransitionReason) -> &'static str {
    match reason {
        TransitionReason::ProductiveSite => "a productive site",
        TransitionReason::UnproductiveSite => "an unproductive site",
        TransitionReason::Inactivity => "inactivity",
        TransitionReason::UserActivity => "user activity",
        TransitionReason::Manual => "a manual override",
    }
}

pub fn print_state(state: &StateReply) {
    println!("Currently {}", productivity_label(state.is_productive));
    println!("Idle for {}s", state.inactive_time);
    if state.current_url.is_empty() {
        println!("No tab tracked yet");
    } else {
        println!("Tracking {}", state.current_url);
    }
}

pub fn print_lists(productive_sites: &[String], unproductive_sites: &[String]) {
    println!("{}", Colour::Green.paint("Productive sites:"));
    for site in productive_sites {
        println!("  {site}");
    }
    println!("{}", Colour::Red.paint("Unproductive sites:"));
    for site in unproductive_sites {
        println!("  {site}");
    }
}

pub fn print_notification(notification: &Notification) {
    match notification {
        Notification::ProductivityChanged { productive, reason } => {
            println!(
                "Now {} because of {}",
                productivity_label(*productive),
                reason_label(*reason)
            );
        }
    }
}
