use clap::{Parser, Subcommand};
use riskportal_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "riskportal", version, about = "Vendor risk portal CLI")]
struct Cli {
    /// Bearer token (overrides auth.token)
    #[arg(long, global = true, env = "RISKPORTAL_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Role the token belongs to: Vendor or RA_Team (overrides auth.role)
    #[arg(long, global = true, env = "RISKPORTAL_ROLE")]
    role: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vendor questionnaires: show, fill, answer, upload, submit
    Questionnaire {
        #[command(subcommand)]
        action: commands::questionnaire::QuestionnaireAction,
    },
    /// Vendor assessment status and unlock order
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// RA-team review of submitted assessments
    Review {
        #[command(subcommand)]
        action: commands::review::ReviewAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_filter));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config.logging.filter);

    let overrides = commands::Overrides {
        token: cli.token,
        role: cli.role,
    };

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Questionnaire { action } => {
            commands::block_on(commands::questionnaire::run(action, &config, &overrides))
        }
        Commands::Status { json } => commands::block_on(commands::status::run(json, &config, &overrides)),
        Commands::Review { action } => {
            commands::block_on(commands::review::run(action, &config, &overrides))
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
