//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "recap",
    about = "Joins a channel's chat, aggregates supporter events and writes a session report",
    version
)]
pub struct Args {
    /// Channel whose chat to join
    #[arg(short, long, env = "RECAP_CHANNEL")]
    pub channel: String,

    /// Team url slug used to build the welcome roster
    #[arg(short, long, env = "RECAP_TEAM")]
    pub team: String,

    /// Bot account username
    #[arg(long, env = "RECAP_BOT_USERNAME")]
    pub bot_username: String,

    /// User id of the third-party bot that announces new followers
    #[arg(long, env = "RECAP_FOLLOW_ANNOUNCER_ID", default_value = "100135110")]
    pub follow_announcer_id: String,

    /// Follow announcement pattern; must contain a `username` capture group
    #[arg(
        long,
        env = "RECAP_FOLLOW_PATTERN",
        default_value = "Welcome to the class (?<username>[^!]+)!"
    )]
    pub follow_pattern: String,

    /// Path the session report is written to
    #[arg(short, long, default_value = "stream-report.md")]
    pub output: PathBuf,

    /// Seconds between periodic report rewrites
    #[arg(long, default_value_t = 60)]
    pub report_interval: u64,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_with_defaults() {
        let args = Args::parse_from([
            "recap",
            "--channel",
            "nick_larsen",
            "--team",
            "livecoders",
            "--bot-username",
            "nick_larsen_bot",
        ]);
        assert_eq!(args.channel, "nick_larsen");
        assert_eq!(args.report_interval, 60);
        assert_eq!(args.output, PathBuf::from("stream-report.md"));
        assert!(args.follow_pattern.contains("username"));
    }
}
