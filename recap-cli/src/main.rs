mod cli;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use chat_events::{NormalizerConfig, StreamSession, WelcomeRequest};
use twitch_chat::{ChatClient, ChatCredentials, ChatItem, HelixClient};

use crate::cli::Args;
use crate::config::Credentials;

/// Literal chat command the broadcaster uses to raid out at stream end.
const RAID_COMMAND_PREFIX: &str = "/raid ";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

async fn run(args: Args) -> Result<()> {
    let credentials = Credentials::from_env()?;

    // Roster fetch is fatal on failure: the session must not start with an
    // empty or partial roster.
    let helix = HelixClient::new(&credentials.client_id, &credentials.api_token)?;
    let broadcaster_id = helix
        .authenticated_user_id()
        .await
        .context("failed to resolve broadcaster id")?;
    let roster = helix
        .fetch_team_roster(&args.team)
        .await
        .context("failed to fetch team roster")?;

    let normalizer_config = NormalizerConfig::new(
        broadcaster_id,
        &args.follow_announcer_id,
        &args.follow_pattern,
        RAID_COMMAND_PREFIX,
    )?;
    let session = Arc::new(StreamSession::new(normalizer_config, Arc::new(roster)));

    let chat = ChatClient::new(ChatCredentials::new(
        &args.bot_username,
        &credentials.chat_token,
    ));
    let mut connection = chat.connect(&args.channel).await?;
    info!(channel = connection.channel(), "session started");

    let mut report_timer = tokio::time::interval(Duration::from_secs(args.report_interval.max(1)));
    report_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so the first report has data.
    report_timer.tick().await;

    loop {
        tokio::select! {
            item = connection.recv() => {
                match item {
                    Some(ChatItem::Notification(notification)) => {
                        match session.handle(&notification) {
                            Ok(Some(welcome)) => {
                                let text = welcome_text(&welcome);
                                if let Err(e) = connection.send_message(&text).await {
                                    warn!("failed to send welcome: {e}");
                                }
                            }
                            Ok(None) => {}
                            Err(e) => warn!("dropping notification: {e}"),
                        }
                    }
                    Some(ChatItem::Presence { users }) => {
                        session.set_approximate_viewers(users.len() as u32);
                    }
                    None => {
                        warn!("chat connection ended");
                        break;
                    }
                }
            }

            _ = report_timer.tick() => {
                write_report(&session, &args).await;
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    write_report(&session, &args).await;
    connection.disconnect().await;
    Ok(())
}

async fn write_report(session: &StreamSession, args: &Args) {
    let document = session.compose_report();
    match tokio::fs::write(&args.output, document).await {
        Ok(()) => info!(path = %args.output.display(), "report written"),
        Err(e) => error!(path = %args.output.display(), "failed to write report: {e}"),
    }
}

fn welcome_text(welcome: &WelcomeRequest) -> String {
    format!(
        "Welcome @{} from the {} team! They are awesome and you should check out their channel at {}",
        welcome.username, welcome.team_name, welcome.channel_url
    )
}
