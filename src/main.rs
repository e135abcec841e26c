use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

mod cmd;
mod config;
mod nakama;
mod utils;

use cmd::{
    ChallengeArgs, CommandContext, DrawArgs, GetArgs, GoArgs, JoinArgs, LeaderboardArgs,
    PoolUserArgs, ResultArgs, SubmitArgs, TicketIdArgs, TopArgs,
};
use config::{Config, Overrides};
use nakama::NakamaClient;

/// dl - Data League command-line client
///
/// Every invocation authenticates as the chat author named by the global
/// flags (or config / DL_* environment), runs one command against the
/// league backend and prints chat-ready text on stdout.
///
/// Examples:
///   dl go -m 1vs1 -d 3
///   dl challenge <@554195751274807297> -m 2vs2
///   dl ready
///   dl submit 10.5 example.com/replay
///   dl win 0 -p https://example.com/proof
///   dl get match -a
#[derive(Parser, Debug)]
#[command(
    name = "dl",
    version,
    author,
    about = "dl - Data League matchmaking and league client",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (YAML or JSON); defaults to ~/.dataleague.yaml when present
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend address, e.g. http://127.0.0.1:7350
    #[arg(long, global = true)]
    address: Option<String>,

    #[arg(long, global = true)]
    server_key: Option<String>,

    /// Chat author id the command runs as
    #[arg(long, global = true)]
    author_id: Option<String>,

    #[arg(long, global = true)]
    username: Option<String>,

    #[arg(long, global = true)]
    discriminator: Option<String>,

    /// Originating chat channel
    #[arg(long, global = true)]
    channel_id: Option<String>,

    /// Originating chat guild
    #[arg(long, global = true)]
    guild_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get a match, ticket, user or leaderboard
    Get(GetArgs),

    /// Get the match leaderboard
    Lb(LeaderboardArgs),

    /// Get the league leaderboard
    Top(TopArgs),

    /// Search for a match
    #[command(visible_aliases = ["new", "search", "ticket", "t"])]
    Go(GoArgs),

    /// Challenge another user to a captains draft
    #[command(visible_aliases = ["chal", "chall", "c"])]
    Challenge(ChallengeArgs),

    /// Confirm you are ready for the assigned match
    #[command(visible_alias = "r")]
    Ready(TicketIdArgs),

    /// Cancel the assigned match or drop a pending ticket
    Cancel(TicketIdArgs),

    /// Submit a score and a proof link to the match leaderboard
    #[command(visible_aliases = ["score", "s"])]
    Submit(SubmitArgs),

    /// Report an early win before the match ends
    #[command(visible_alias = "victory")]
    Win(ResultArgs),

    /// Report an early draw before the match ends
    Draw(DrawArgs),

    /// Report an early loss before the match ends
    #[command(visible_aliases = ["ff", "loss"])]
    Lose(ResultArgs),

    /// Join the captains draft pool of a match
    #[command(visible_alias = "j")]
    Join(JoinArgs),

    /// Pick a user from the draft pool (captains only)
    #[command(visible_alias = "p")]
    Pick(PoolUserArgs),

    /// Add a user to the draft pool of your match
    #[command(visible_alias = "a")]
    Add(PoolUserArgs),

    /// Log in from the current channel
    #[command(visible_alias = "l")]
    Login,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            address: self.address.clone(),
            server_key: self.server_key.clone(),
            author_id: self.author_id.clone(),
            username: self.username.clone(),
            discriminator: self.discriminator.clone(),
            channel_id: self.channel_id.clone(),
            guild_id: self.guild_id.clone(),
        }
    }
}

async fn dispatch(ctx: &CommandContext<'_>, command: Commands) -> Result<String> {
    match command {
        Commands::Get(args) => cmd::execute_get(ctx, args).await,
        Commands::Lb(args) => cmd::execute_leaderboard(ctx, args).await,
        Commands::Top(args) => cmd::execute_top(ctx, args).await,
        Commands::Go(args) => cmd::execute_go(ctx, args).await,
        Commands::Challenge(args) => cmd::execute_challenge(ctx, args).await,
        Commands::Ready(args) => cmd::execute_ready(ctx, args).await,
        Commands::Cancel(args) => cmd::execute_cancel(ctx, args).await,
        Commands::Submit(args) => cmd::execute_submit(ctx, args).await,
        Commands::Win(args) => cmd::execute_win(ctx, args).await,
        Commands::Draw(args) => cmd::execute_draw(ctx, args).await,
        Commands::Lose(args) => cmd::execute_lose(ctx, args).await,
        Commands::Join(args) => cmd::execute_join(ctx, args).await,
        Commands::Pick(args) => cmd::execute_pick(ctx, args).await,
        Commands::Add(args) => cmd::execute_add(ctx, args).await,
        Commands::Login => cmd::execute_login(ctx).await,
    }
}

fn run(cli: Cli) -> Result<String> {
    let config = Config::load(cli.config.as_deref(), cli.overrides())?;
    tracing::debug!(address = %config.address, author = %config.message.author_id, "config resolved");

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(async {
        let client = NakamaClient::connect(&config)
            .await
            .with_context(|| format!("failed to connect to {}", config.address))?;
        let ctx = CommandContext::new(&client, &config.message);
        dispatch(&ctx, cli.command).await
    })
}

/// Write the command output or the error; returns the process exit code.
fn report(result: Result<String>, out: &mut impl Write, err: &mut impl Write) -> i32 {
    match result {
        Ok(output) => {
            if !output.is_empty() {
                let _ = writeln!(out, "{output}");
            }
            0
        }
        Err(e) => {
            let _ = writeln!(err, "{e:#}");
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let code = report(run(cli), &mut std::io::stdout(), &mut std::io::stderr());
    if code != 0 {
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_reported_once() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let failed = Err(anyhow::anyhow!("No match found").context("MatchStateGet failed"));
        assert_eq!(report(failed, &mut out, &mut err), 1);
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "MatchStateGet failed: No match found\n"
        );
    }

    #[test]
    fn output_goes_to_stdout() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        assert_eq!(report(Ok("done".into()), &mut out, &mut err), 0);
        assert_eq!(out, b"done\n");
        assert!(err.is_empty());

        let mut quiet = Vec::new();
        assert_eq!(report(Ok(String::new()), &mut quiet, &mut err), 0);
        assert!(quiet.is_empty());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn aliases_and_global_flags() {
        let cli = Cli::try_parse_from([
            "dl",
            "search",
            "-m",
            "1vs1,2vs2",
            "-d",
            "5",
            "--author-id",
            "42",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.author_id.as_deref(), Some("42"));
        let Commands::Go(args) = cli.command else {
            panic!("expected go");
        };
        assert_eq!(args.mode, vec!["1vs1", "2vs2"]);
        assert_eq!(args.search.duration, 5);
        assert!(args.search.ready);
    }

    #[test]
    fn ready_flag_takes_explicit_value() {
        let cli = Cli::try_parse_from(["dl", "go", "--ready=false"]).unwrap();
        let Commands::Go(args) = cli.command else {
            panic!("expected go");
        };
        assert!(!args.search.ready);
        assert_eq!(args.mode, vec!["1vs1"]);
    }

    #[test]
    fn result_positionals() {
        let cli = Cli::try_parse_from(["dl", "ff", "1", "m1", "example.com"]).unwrap();
        let Commands::Lose(args) = cli.command else {
            panic!("expected lose");
        };
        assert_eq!(args.team, Some(1));
        assert_eq!(args.target_match.as_deref(), Some("m1"));
        assert_eq!(args.target_proof.as_deref(), Some("example.com"));
    }

    #[test]
    fn get_subjects() {
        let cli = Cli::try_parse_from(["dl", "get", "m", "-a"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Get(GetArgs {
                subject: cmd::get::GetSubject::Match(cmd::matches::GetMatchArgs { all: true, .. })
            })
        ));

        let cli = Cli::try_parse_from(["dl", "submit", "-s", "10.5", "-p", "example.com"]).unwrap();
        let Commands::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.score, Some(10.5));
        assert_eq!(args.proof.as_deref(), Some("example.com"));
    }

    #[test]
    fn login_alias() {
        let cli = Cli::try_parse_from(["dl", "l", "--channel-id", "c9"]).unwrap();
        assert!(matches!(cli.command, Commands::Login));
        assert_eq!(cli.channel_id.as_deref(), Some("c9"));
    }
}
