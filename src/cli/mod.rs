pub mod client;
pub mod output;
pub mod process;

use std::{env, path::PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{
        protocol::{Command as DaemonCommand, ListKind, Reply},
        start_daemon,
        storage::{
            kv::{JsonFileStore, KeyValueStore},
            read_durations, KEY_AI_SUMMARY, KEY_SITE_DURATIONS,
        },
        DEFAULT_PORT,
    },
    utils::{
        dir::{create_application_default_path, store_path},
        logging::{enable_logging, CLI_PREFIX},
        percentage::Percentage,
    },
};

use client::DaemonClient;
use output::{print_lists, print_notification, print_state, report};
use process::{kill_previous_daemons, restart_daemon};

#[derive(Parser, Debug)]
#[command(name = "Focusduck", version, long_about = None)]
#[command(about = "Companion daemon for tracking site productivity", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(long, default_value_t = DEFAULT_PORT, help = "Port the daemon listens on")]
    port: u16,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {},
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Show the current productivity state")]
    Status {},
    #[command(about = "Inspect or edit the site lists")]
    Sites {
        #[command(subcommand)]
        command: SitesCommand,
    },
    #[command(about = "Display time spent per domain")]
    Report {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
        #[arg(short = 'p', long = "percentage", help = "Filter domains to have at least specified percentage", default_value_t = Percentage::new_opt(1.).unwrap())]
        min_percentage: Percentage,
    },
    #[command(about = "Show the last generated summary")]
    Summary {
        #[arg(long, help = "Ask the daemon to regenerate the summary first")]
        refresh: bool,
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stream productivity changes as they happen")]
    Watch {},
}

#[derive(Subcommand, Debug)]
enum SitesCommand {
    #[command(about = "Show both lists")]
    Show {},
    #[command(about = "Add a site to a list")]
    Add { list: ListKind, website: String },
    #[command(about = "Remove a site from a list")]
    Remove { list: ListKind, website: String },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = create_application_default_path()?;
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init {} => restart_daemon(args.port),
        Commands::Stop {} => {
            let process_name = env::current_exe().unwrap();
            kill_previous_daemons(&process_name);
            Ok(())
        }
        Commands::Serve { dir } => start_daemon(dir.unwrap_or(app_dir), args.port).await,
        Commands::Status {} => {
            let mut client = DaemonClient::connect(args.port).await?;
            match client.request(&DaemonCommand::GetProductivity).await? {
                Reply::State(state) => {
                    print_state(&state);
                    Ok(())
                }
                reply => bail!("Unexpected reply {reply:?}"),
            }
        }
        Commands::Sites { command } => run_sites_command(command, args.port).await,
        Commands::Report {
            dir,
            min_percentage,
        } => {
            let store = JsonFileStore::new(store_path(&dir.unwrap_or(app_dir)));
            let values = store.get(&[KEY_SITE_DURATIONS]).await?;
            let durations = read_durations(&values, KEY_SITE_DURATIONS);
            let (usages, total) = report::analyze_domains(durations, min_percentage);
            report::print_report(&usages, total);
            Ok(())
        }
        Commands::Summary { refresh, dir } => {
            if refresh {
                let mut client = DaemonClient::connect(args.port).await?;
                match client.request(&DaemonCommand::GenerateSummaryNow).await? {
                    Reply::Summary { success: true } => {}
                    _ => bail!("The daemon couldn't generate a summary"),
                }
            }
            let store = JsonFileStore::new(store_path(&dir.unwrap_or(app_dir)));
            let values = store.get(&[KEY_AI_SUMMARY]).await?;
            match values.get(KEY_AI_SUMMARY).and_then(|v| v.as_str()) {
                Some(summary) => println!("{summary}"),
                None => println!("No summary generated yet"),
            }
            Ok(())
        }
        Commands::Watch {} => {
            let client = DaemonClient::connect(args.port).await?;
            println!("Waiting for productivity changes, ctrl-c to stop");
            client.watch(print_notification).await
        }
    }
}

async fn run_sites_command(command: SitesCommand, port: u16) -> Result<()> {
    let mut client = DaemonClient::connect(port).await?;
    match command {
        SitesCommand::Show {} => match client.request(&DaemonCommand::GetWebsiteLists).await? {
            Reply::Lists {
                productive_sites,
                unproductive_sites,
            } => {
                print_lists(&productive_sites, &unproductive_sites);
                Ok(())
            }
            reply => bail!("Unexpected reply {reply:?}"),
        },
        SitesCommand::Add { list, website } => {
            // Entries match by containment against lowercase hostnames, so
            // they're normalized up front.
            let command = DaemonCommand::AddWebsite {
                website: website.to_lowercase(),
                list_type: list,
            };
            expect_ack(client.request(&command).await?)
        }
        SitesCommand::Remove { list, website } => {
            let command = DaemonCommand::RemoveWebsite {
                website: website.to_lowercase(),
                list_type: list,
            };
            expect_ack(client.request(&command).await?)
        }
    }
}

fn expect_ack(reply: Reply) -> Result<()> {
    match reply {
        Reply::Ack { ok: true } => {
            println!("Done");
            Ok(())
        }
        reply => bail!("The daemon refused the change: {reply:?}"),
    }
}
