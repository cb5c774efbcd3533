mod cli;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use calm::config::CalmConfig;
use calm::profile::types::ProfileUpdate;

#[derive(Parser)]
#[command(name = "calm", version, about = "Calm Sphere: a supportive chat companion")]
struct Cli {
    /// Config file (defaults to ~/.calm/config.toml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    Serve,
    /// Chat interactively in the terminal
    Chat {
        /// Username to log in as
        user: String,
    },
    /// Set profile details for a user
    Profile {
        user: String,
        #[command(flatten)]
        fields: ProfileArgs,
    },
    /// Toggle incognito mode for a user
    Incognito { user: String },
    /// Show a user's stored conversation
    History {
        user: String,
        /// Only show the newest N messages
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show conversation analytics for a user
    Stats { user: String },
    /// Export user records as JSON
    Export {
        /// Export only this user
        user: Option<String>,
    },
    /// Permanently delete everything stored for a user
    Forget {
        user: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Check database health and configuration
    Doctor,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    college: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    friends: Option<String>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        Self {
            name: args.name,
            age: args.age,
            college: args.college,
            location: args.location,
            phone: args.phone,
            friends: args.friends,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Pick up HUGGINGFACE_API_KEY and friends from a local .env, if present.
    dotenvy::dotenv().ok();

    let config = CalmConfig::load_at_startup(cli.config.as_deref())?;

    // Log to stderr so stdout stays clean for chat and export output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => calm::server::serve(config).await?,
        Command::Chat { user } => cli::chat::chat(config, &user).await?,
        Command::Profile { user, fields } => cli::profile(&config, &user, &fields.into())?,
        Command::Incognito { user } => cli::incognito(&config, &user)?,
        Command::History { user, limit } => cli::history::history(&config, &user, limit)?,
        Command::Stats { user } => cli::stats::stats(&config, &user)?,
        Command::Export { user } => cli::export::export(&config, user.as_deref())?,
        Command::Forget { user, yes } => cli::forget::forget(&config, &user, yes)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
