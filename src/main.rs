use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use mandi::core::identity::Role;
use mandi::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Seller,
    Stockist,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Role {
        match role {
            RoleArg::Seller => Role::Seller,
            RoleArg::Stockist => Role::Stockist,
        }
    }
}

impl From<Commands> for mandi::AppCommand {
    fn from(cmd: Commands) -> mandi::AppCommand {
        match cmd {
            Commands::Summary {
                mobile,
                role,
                as_of,
            } => mandi::AppCommand::Summary {
                mobile,
                role: role.map(Role::from),
                as_of,
            },
            Commands::Details { mobile, role } => mandi::AppCommand::Details {
                mobile,
                role: role.map(Role::from),
            },
            Commands::Tabs => mandi::AppCommand::Tabs,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the position summary for a subscriber number
    Summary {
        /// Subscriber mobile number
        #[arg(short, long)]
        mobile: String,

        /// Restrict output to one role when the number holds several
        #[arg(short, long)]
        role: Option<RoleArg>,

        /// Compute accruals as of this date instead of now
        #[arg(short, long)]
        as_of: Option<String>,
    },
    /// Print the raw ledger rows for a subscriber number
    Details {
        /// Subscriber mobile number
        #[arg(short, long)]
        mobile: String,

        /// Restrict output to one role when the number holds several
        #[arg(short, long)]
        role: Option<RoleArg>,
    },
    /// List spreadsheet tabs and known sellers
    Tabs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => mandi::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = mandi::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
gateway:
  base_url: "https://sheets.googleapis.com"
  sheet_id: ""
  # api_key: ""

directory:
  seller_contacts_tab: "Contact details"
  stockist_contacts_tab: "Stockist Contact details"
  dialing_prefix: "+91"

seller:
  tabs: []

# Column positions follow the current sheet revision; override per field
# when the sheet layout changes.
# ledger_schema:
#   date: 0
#   commodity: 4
#   quantity: 5

# allocation: per-loan-independent
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
