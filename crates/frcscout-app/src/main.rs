// frcscout entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, so stdout stays clean for reports)
// 3. Load config (copying defaults/ into config/ on first run)
// 4. Run the requested command and print its output

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use frcscout_app::commands::{self, parse_weighted, Context};
use frcscout_app::config;
use frcscout_app::refresh;
use frcscout_app::report::{self, OutputFormat};
use frcscout_core::schema::{SheetKind, SPEAKER_COORDINATES};
use frcscout_core::scoring::{rank, WeightedColumn};
use frcscout_core::{TeamId, ViewKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "frcscout", about = "FRC scouting data analysis")]
struct Cli {
    /// Config file (defaults to config/frcscout.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one team's row in a view
    Team {
        team: String,
        #[arg(long, default_value = "average")]
        view: ViewKind,
    },
    /// Per-match values of one column for a team
    History {
        team: String,
        #[arg(long)]
        column: String,
        #[arg(long, default_value = "allMatches")]
        view: ViewKind,
    },
    /// Rank teams by a weighted composite score
    Rank {
        /// Weighted column as COLUMN=WEIGHT (up to 5; config default if none)
        #[arg(long = "column", value_parser = parse_weighted)]
        columns: Vec<WeightedColumn>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "average")]
        view: ViewKind,
    },
    /// Project a match: three red teams then three blue teams ("-" for an empty slot)
    Strategy {
        #[arg(num_args = 6, required = true)]
        teams: Vec<String>,
        #[arg(long, default_value = "average")]
        view: ViewKind,
    },
    /// Compare up to six teams side by side, with ranking-point progress for
    /// the first three (blue) and the rest (red)
    Compare {
        #[arg(num_args = 1..=6, required = true)]
        teams: Vec<String>,
        #[arg(long, default_value = "average")]
        view: ViewKind,
    },
    /// Recorded field positions for a team, scaled onto a field image
    Shots {
        team: String,
        #[arg(long, default_value = SPEAKER_COORDINATES)]
        column: String,
        #[arg(long, default_value_t = 1000.0)]
        width: f64,
        #[arg(long, default_value_t = 500.0)]
        height: f64,
        #[arg(long, default_value = "allMatches")]
        view: ViewKind,
    },
    /// Compare a team's two most recent matches
    Trend {
        team: String,
        #[arg(long, default_value = "allMatches")]
        view: ViewKind,
    },
    /// Min and max of every numeric column
    Ranges {
        #[arg(long, default_value = "average")]
        view: ViewKind,
    },
    /// Case-insensitive search over the pit or super scouting table
    Search {
        #[arg(value_enum)]
        table: TableArg,
        query: String,
    },
    /// Reload the views periodically and reprint the ranking
    Watch {
        #[arg(long, default_value = "average")]
        view: ViewKind,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TableArg {
    Pit,
    Super,
}

impl From<TableArg> for SheetKind {
    fn from(t: TableArg) -> Self {
        match t {
            TableArg::Pit => SheetKind::Pit,
            TableArg::Super => SheetKind::Super,
        }
    }
}

fn team_id(arg: &str) -> TeamId {
    if arg == "-" {
        TeamId::new("")
    } else {
        TeamId::new(arg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => config::load_config_file(path),
        None => config::load_config(),
    }
    .context("failed to load configuration")?;
    info!("config loaded, {} views configured", config.views.configured().len());

    let ctx = Context::new(config, cli.format)?;

    let output = match cli.command {
        Command::Team { team, view } => commands::team(&ctx, view, &team_id(&team))?,
        Command::History { team, column, view } => {
            commands::history(&ctx, view, &team_id(&team), &column)?
        }
        Command::Rank {
            columns,
            limit,
            view,
        } => commands::rank_teams(&ctx, view, columns, limit)?,
        Command::Strategy { teams, view } => {
            let ids: Vec<TeamId> = teams.iter().map(|t| team_id(t)).collect();
            commands::strategy(&ctx, view, &ids)?
        }
        Command::Compare { teams, view } => {
            let ids: Vec<TeamId> = teams.iter().map(|t| team_id(t)).collect();
            commands::compare(&ctx, view, &ids)?
        }
        Command::Shots {
            team,
            column,
            width,
            height,
            view,
        } => commands::shots(&ctx, view, &team_id(&team), &column, width, height)?,
        Command::Trend { team, view } => commands::team_trend(&ctx, view, &team_id(&team))?,
        Command::Ranges { view } => commands::ranges(&ctx, view)?,
        Command::Search { table, query } => commands::search_table(&ctx, table.into(), &query)?,
        Command::Watch { view, limit } => return watch(ctx, view, limit).await,
    };

    print!("{output}");
    Ok(())
}

/// Reprint the ranking for `view` every time the refresh loop publishes a
/// snapshot. Runs until Ctrl+C.
async fn watch(ctx: Context, view: ViewKind, limit: Option<usize>) -> anyhow::Result<()> {
    let selection = ctx.config.scoring.selection()?;
    let (tx, mut rx) = mpsc::channel(4);
    let source = Arc::new(ctx.source.clone());
    let refresh_handle = tokio::spawn(refresh::run(source, ctx.config.refresh.interval(), tx));

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let Some(v) = snapshot.get(view) else {
                    warn!("the {} view is not configured", view);
                    continue;
                };
                match rank(v, &selection) {
                    Ok(ranked) => match ctx.format {
                        OutputFormat::Text => {
                            println!("{} at {}", view, snapshot.loaded_at.format("%H:%M:%S"));
                            print!("{}", report::format_ranking(&ranked, limit));
                        }
                        OutputFormat::Json => println!("{}", serde_json::to_string(&ranked)?),
                    },
                    Err(e) => warn!("cannot rank: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, stopping");
                break;
            }
        }
    }

    drop(rx);
    refresh_handle
        .await
        .context("refresh task panicked")??;
    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "frcscout_app=debug,frcscout_core=debug,warn"
    } else {
        "frcscout_app=info,frcscout_core=info,warn"
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
