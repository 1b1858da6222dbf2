//! Interactive banker: one command per line, while a timer tick restores
//! blank player names in the background.

use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Duration, MissedTickBehavior};

use crate::application::{AppError, BankerSession};
use crate::domain::{AccountId, DENOMINATIONS, Dollars, PlayerId, format_dollars};

use super::{print_board, print_history};

const TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlayCommand {
    Adjust(Dollars),
    Custom(String),
    ClearAmount,
    From(AccountId),
    To(AccountId),
    Swap,
    Apply,
    Players(usize),
    Rename(PlayerId, String),
    Show,
    Accounts,
    History,
    Reset,
    Help,
    Quit,
}

pub(crate) fn parse_command(line: &str) -> Result<PlayCommand, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));

    if let Some(digits) = word.strip_prefix('+') {
        return parse_adjustment(word, digits).map(PlayCommand::Adjust);
    }
    if let Some(digits) = word.strip_prefix('-') {
        // Digits only, so the value is non-negative and negation cannot overflow.
        return parse_adjustment(word, digits).map(|amount| PlayCommand::Adjust(-amount));
    }

    let account = |text: &str| text.parse::<AccountId>().map_err(|e| e.to_string());

    match word.to_lowercase().as_str() {
        "amount" => Ok(PlayCommand::Custom(rest.trim().to_string())),
        "clear" => Ok(PlayCommand::ClearAmount),
        "from" => account(rest).map(PlayCommand::From),
        "to" => account(rest).map(PlayCommand::To),
        "swap" => Ok(PlayCommand::Swap),
        "go" | "apply" => Ok(PlayCommand::Apply),
        "players" => rest
            .trim()
            .parse()
            .map(PlayCommand::Players)
            .map_err(|_| "usage: players <2-4>".to_string()),
        "name" => {
            let (id, name) = rest.split_once(' ').unwrap_or((rest, ""));
            let id: PlayerId = id
                .trim()
                .parse()
                .map_err(|_| "usage: name <seat> <new name>".to_string())?;
            Ok(PlayCommand::Rename(id, name.to_string()))
        }
        "show" => Ok(PlayCommand::Show),
        "accounts" => Ok(PlayCommand::Accounts),
        "history" => Ok(PlayCommand::History),
        "reset" => Ok(PlayCommand::Reset),
        "help" | "?" => Ok(PlayCommand::Help),
        "quit" | "exit" => Ok(PlayCommand::Quit),
        "" => Err("type `help` for commands".to_string()),
        other => Err(format!("unknown command '{}'; type `help`", other)),
    }
}

/// The unsigned part of `+N` / `-N`: ASCII digits that fit in `Dollars`.
fn parse_adjustment(word: &str, digits: &str) -> Result<Dollars, String> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a whole-dollar adjustment", word));
    }
    digits
        .parse()
        .map_err(|_| format!("'{}' is too large an adjustment", word))
}

pub async fn run(session: &mut BankerSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    print_help();
    print_board(session);
    print_staging(session);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match session.run_due_name_resets(Utc::now()).await {
                    Ok(restored) => {
                        for id in restored {
                            println!("Seat {} name restored to the default.", id);
                        }
                    }
                    Err(err) => println!("{}", err),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(PlayCommand::Quit) => break,
                    Ok(command) => execute(session, command).await,
                    Err(message) => println!("{}", message),
                }
            }
        }
    }

    Ok(())
}

/// Run one command and print its outcome. Failures, including a game that
/// could not be saved, are reported and the table plays on.
async fn execute(session: &mut BankerSession, command: PlayCommand) {
    let outcome = match command {
        PlayCommand::Adjust(delta) => {
            session.adjust_pending_amount(delta);
            print_staging(session);
            Ok(())
        }
        PlayCommand::Custom(text) => {
            session.set_custom_amount(text);
            session.apply_custom_amount().map(|_| print_staging(session))
        }
        PlayCommand::ClearAmount => {
            session.reset_amount();
            print_staging(session);
            Ok(())
        }
        PlayCommand::From(account) => session
            .select_source(account)
            .map(|_| print_staging(session)),
        PlayCommand::To(account) => session
            .select_target(account)
            .map(|_| print_staging(session)),
        PlayCommand::Swap => {
            if session.swap_accounts() {
                print_staging(session);
            }
            Ok(())
        }
        PlayCommand::Apply => session.apply_transfer(Utc::now()).await.map(|_| ()),
        PlayCommand::Players(count) => session
            .set_player_count(count)
            .await
            .map(|_| print_board(session)),
        PlayCommand::Rename(id, name) => session.rename_player(id, &name, Utc::now()).await,
        PlayCommand::Show => {
            print_board(session);
            Ok(())
        }
        PlayCommand::Accounts => {
            for option in session.accounts() {
                println!("  {:<10} {}", option.id.to_string(), option.label);
            }
            Ok(())
        }
        PlayCommand::History => {
            print_history(session);
            Ok(())
        }
        PlayCommand::Reset => session.reset_board().await.map(|_| print_board(session)),
        PlayCommand::Help => {
            print_help();
            Ok(())
        }
        PlayCommand::Quit => Ok(()),
    };

    match outcome {
        Ok(()) => {
            if let Some(feedback) = session.feedback() {
                println!("{}", feedback);
            }
        }
        Err(err @ (AppError::Storage(_) | AppError::Serialization(_))) => {
            println!("{} (last change not applied)", err);
        }
        Err(err) => println!("{}", err),
    }
}

fn print_staging(session: &BankerSession) {
    let ledger = session.ledger();
    println!(
        "Pending {} | from {} | to {}",
        format_dollars(session.pending_amount()),
        ledger.describe_account(session.source()),
        ledger.describe_account(session.target())
    );
}

fn print_help() {
    let bills: Vec<String> = DENOMINATIONS.iter().map(|d| d.to_string()).collect();
    println!("Commands:");
    println!("  +N / -N            add or remove N from the pending amount (bills: {})", bills.join(", "));
    println!("  amount <value>     set the pending amount directly");
    println!("  clear              reset the pending amount");
    println!("  from <acct>        source account (bank, tax, player-N or N)");
    println!("  to <acct>          destination account");
    println!("  swap               swap source and destination");
    println!("  go                 apply the transfer");
    println!("  players <2-4>      change the number of players");
    println!("  name <seat> <name> rename a player");
    println!("  show | accounts | history | reset | help | quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adjustments() {
        assert_eq!(parse_command("+100"), Ok(PlayCommand::Adjust(100)));
        assert_eq!(parse_command(" -5 "), Ok(PlayCommand::Adjust(-5)));
        assert!(parse_command("+ten").is_err());
        assert!(parse_command("+").is_err());
        assert!(parse_command("--5").is_err());
        assert!(parse_command("+-5").is_err());
        assert!(parse_command("-+5").is_err());
        assert!(parse_command("--9223372036854775808").is_err());
        assert!(parse_command("-9223372036854775808").is_err());
        assert_eq!(
            parse_command("-9223372036854775807"),
            Ok(PlayCommand::Adjust(-Dollars::MAX))
        );
    }

    #[test]
    fn test_parse_accounts_and_names() {
        assert_eq!(parse_command("from bank"), Ok(PlayCommand::From(AccountId::Bank)));
        assert_eq!(parse_command("to 2"), Ok(PlayCommand::To(AccountId::Player(2))));
        assert!(parse_command("to boardwalk").is_err());
        assert_eq!(
            parse_command("name 1 Rich Uncle"),
            Ok(PlayCommand::Rename(1, "Rich Uncle".to_string()))
        );
        assert_eq!(parse_command("name 3"), Ok(PlayCommand::Rename(3, String::new())));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command("amount $1,500"), Ok(PlayCommand::Custom("$1,500".to_string())));
        assert_eq!(parse_command("players 3"), Ok(PlayCommand::Players(3)));
        assert_eq!(parse_command("GO"), Ok(PlayCommand::Apply));
        assert_eq!(parse_command("quit"), Ok(PlayCommand::Quit));
        assert!(parse_command("").is_err());
        assert!(parse_command("buy hotel").is_err());
    }
}
