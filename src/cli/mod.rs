mod play;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use crate::application::{BankerConfig, BankerSession, DEFAULT_DATABASE, DEFAULT_STORAGE_KEY};
use crate::domain::{
    AccountId, MAX_PLAYERS, NAME_RESET_DELAY_MS, PlayerId, TransferRecord, format_dollars,
    parse_amount,
};

/// Monopoly Banker - table-side cash tracker
#[derive(Parser)]
#[command(name = "banker")]
#[command(about = "Track 2-4 players, the tax pile and an unlimited bank without pencil math")]
#[command(version)]
pub struct Cli {
    /// Database file holding the saved game
    #[arg(short, long, env = "BANKER_DATABASE", default_value = DEFAULT_DATABASE, global = true)]
    pub database: String,

    /// Key of the saved game inside the database
    #[arg(short, long, default_value = DEFAULT_STORAGE_KEY, global = true)]
    pub key: String,

    /// Seats for a new game when nothing is saved (2-4)
    #[arg(long, default_value_t = MAX_PLAYERS, global = true)]
    pub seats: usize,

    /// Milliseconds before a blank player name reverts to the default
    #[arg(long, default_value_t = NAME_RESET_DELAY_MS, global = true)]
    pub name_reset_ms: i64,

    /// Keep the game in memory only
    #[arg(long, global = true)]
    pub no_save: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every balance
    Show,

    /// Change the number of players (2-4)
    Players {
        /// New player count
        count: usize,
    },

    /// Rename a player
    Rename {
        /// Player number (1-4)
        id: PlayerId,

        /// New display name (max 24 characters)
        name: String,
    },

    /// Move money between accounts
    Transfer {
        /// Amount to move (e.g., "200" or "$1,500")
        amount: String,

        /// Source account: bank, tax, player-N or N
        #[arg(long)]
        from: String,

        /// Destination account: bank, tax, player-N or N
        #[arg(long)]
        to: String,
    },

    /// List recent transfers, newest first
    History,

    /// Start a new game with the same number of players
    Reset,

    /// Write the saved game as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Interactive banker at the table
    Play,
}

impl Cli {
    pub fn config(&self) -> BankerConfig {
        let config = if self.no_save {
            BankerConfig::in_memory()
        } else {
            BankerConfig::new(&self.database)
        };

        config
            .with_storage_key(&self.key)
            .with_initial_players(self.seats)
            .with_name_reset_delay(Duration::milliseconds(self.name_reset_ms))
    }

    /// Default log filter: info for this crate, debug with --verbose.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "monopoly_banker=debug"
        } else {
            "monopoly_banker=info"
        }
    }

    pub async fn run(self) -> Result<()> {
        let mut session = BankerSession::open(self.config())
            .await
            .context("Failed to open the banker")?;

        match self.command {
            Commands::Show => print_board(&session),

            Commands::Players { count } => {
                let normalized = session.set_player_count(count).await?;
                if normalized != count {
                    println!("Player count clamped to {}.", normalized);
                }
                print_board(&session);
            }

            Commands::Rename { id, name } => {
                session.rename_player(id, &name, Utc::now()).await?;
                if name.trim().is_empty() {
                    println!(
                        "Player {} has a blank name; it reverts to the default after {} ms in `banker play`.",
                        id,
                        session.config().name_reset_delay.num_milliseconds()
                    );
                } else {
                    println!("Player {} is now {}.", id, name.trim_end());
                }
            }

            Commands::Transfer { amount, from, to } => {
                let amount =
                    parse_amount(&amount).context("Invalid amount. Use '200' or '$1,500'")?;
                let source: AccountId = from.parse()?;
                let target: AccountId = to.parse()?;

                let receipt = session.transfer(source, target, amount, Utc::now()).await?;
                println!("{}", receipt.message);
            }

            Commands::History => print_history(&session),

            Commands::Reset => {
                session.reset_board().await?;
                println!("Board reset.");
                print_board(&session);
            }

            Commands::Export { output } => {
                let json = session.export_json()?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, json)
                            .with_context(|| format!("Failed to write export file: {}", path))?;
                        eprintln!("Exported game to {}", path);
                    }
                    None => println!("{}", json),
                }
            }

            Commands::Play => play::run(&mut session).await?,
        }

        session.close().await?;
        Ok(())
    }
}

pub(crate) fn print_board(session: &BankerSession) {
    let ledger = session.ledger();

    println!("{:<4} {:<24} {:>12}", "SEAT", "NAME", "BALANCE");
    println!("{}", "-".repeat(42));
    for player in ledger.players() {
        println!(
            "{:<4} {:<24} {:>12}",
            player.id,
            player.name,
            format_dollars(player.balance)
        );
    }
    println!("{}", "-".repeat(42));
    println!(
        "{:<4} {:<24} {:>12}",
        "",
        "Tax Pile",
        format_dollars(ledger.tax_balance())
    );
    println!("{:<4} {:<24} {:>12}", "", "Bank", "unlimited");
}

pub(crate) fn print_history(session: &BankerSession) {
    let history = session.ledger().history();
    if history.is_empty() {
        println!("No transfers yet.");
        return;
    }

    println!("{:<20} {:>10}  {}", "WHEN", "AMOUNT", "FROM -> TO");
    println!("{}", "-".repeat(60));
    for record in history.iter() {
        println!(
            "{:<20} {:>10}  {} -> {}",
            format_when(record),
            format_dollars(record.amount),
            record.source_name,
            record.target_name
        );
    }
}

fn format_when(record: &TransferRecord) -> String {
    match record.recorded_at() {
        Some(at) if record.timestamp > 0 => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds_config() {
        let cli = Cli::parse_from([
            "banker",
            "--database",
            "/tmp/x.db",
            "--seats",
            "3",
            "--name-reset-ms",
            "500",
            "show",
        ]);
        let config = cli.config();

        assert_eq!(config.database.as_deref(), Some("/tmp/x.db"));
        assert_eq!(config.initial_players, 3);
        assert_eq!(config.name_reset_delay, Duration::milliseconds(500));
        assert_eq!(cli.log_filter(), "monopoly_banker=info");
    }

    #[test]
    fn test_no_save_is_in_memory() {
        let cli = Cli::parse_from(["banker", "transfer", "200", "--from", "bank", "--to", "1", "--no-save", "-v"]);
        assert!(cli.config().database.is_none());
        assert_eq!(cli.log_filter(), "monopoly_banker=debug");
        assert!(matches!(cli.command, Commands::Transfer { .. }));
    }

    #[test]
    fn test_seats_out_of_range_are_clamped() {
        let cli = Cli::parse_from(["banker", "--seats", "5", "--no-save", "show"]);
        let config = cli.config();
        assert_eq!(config.initial_players, 4);
        assert!(config.validate().is_ok());
    }
}
