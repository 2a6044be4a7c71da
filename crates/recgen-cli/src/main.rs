mod generate;
mod generations;

use clap::{Parser, Subcommand};
use recgen_core::CandidateStatus;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "recgen-cli")]
#[command(about = "Brand recommendation generation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the recommendation pipeline for one subject
    Generate {
        /// Subject (brand) id
        #[arg(long)]
        subject: i64,

        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a persisted generation and its recommendations
    Show {
        #[arg(long)]
        generation: i64,
    },
    /// Move a recommendation through its workflow
    SetStatus {
        /// Recommendation id
        #[arg(long)]
        candidate: i64,

        /// One of: new, `in_progress`, done, dismissed
        #[arg(long)]
        status: CandidateStatus,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = recgen_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = recgen_db::PoolConfig::from_app_config(&config);
    let pool = recgen_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Generate { subject, json } => {
            let ok = generate::run_generate(&config, pool, subject, json).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Show { generation } => generations::run_show(pool, generation).await?,
        Commands::SetStatus { candidate, status } => {
            generations::run_set_status(pool, candidate, status).await?;
        }
        Commands::Migrate => {
            recgen_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
    }

    Ok(())
}
