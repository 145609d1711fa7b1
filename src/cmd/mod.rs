use crate::{conf::Settings, pkg::server::listen, prelude::Result};
use clap::{Parser, Subcommand};

mod migrate;
mod sync;

#[derive(Parser)]
#[command(about = "starts applicant intake web services")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    Listen,
    Migrate,
    Sync {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = false)]
        full: bool,
    },
}

pub async fn run() -> Result<()> {
    let args = Cmd::parse();
    let settings = Settings::new()?;
    match args.command {
        Some(SubCommandType::Listen) => {
            listen(settings).await?;
        }
        Some(SubCommandType::Migrate) => {
            migrate::apply(&settings).await?;
        }
        Some(SubCommandType::Sync { user, full }) => {
            sync::run(&settings, &user, full).await?;
        }
        None => {
            tracing::error!("no subcommand passed");
        }
    }
    Ok(())
}
