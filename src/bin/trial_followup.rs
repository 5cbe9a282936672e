use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use trial_followup::auth::{token_manager::TokenManager, token_store};
use trial_followup::config::{load_config, resolve_replied_path};
use trial_followup::gmail::client::GmailClient;
use trial_followup::pipeline::run::{RunOptions, run_once};
use trial_followup::store::open_store;

#[derive(Parser)]
#[command(name = "trial_followup")]
#[command(about = "Reply once to every \"Trial expired by ...\" email", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the inbox and send follow-ups (the default)
    Run {
        /// Compose replies and print them without sending or recording
        #[arg(long)]
        dry_run: bool,
    },

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd.unwrap_or(Command::Run { dry_run: false }) {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_client_secret(&client_id, secret.trim())?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }

        Command::Run { dry_run } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let store = open_store(cfg.store, &resolve_replied_path(&cfg)?)?;

            let session = TokenManager::from_config(&cfg)?.authenticate()?;
            let gmail = GmailClient::new(session)?;

            run_once(
                &gmail,
                store.as_ref(),
                &cfg.run,
                RunOptions {
                    dry_run,
                    ..RunOptions::default()
                },
            )?;
            Ok(())
        }
    }
}
