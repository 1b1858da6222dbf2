use chrono::{DateTime, Utc};

use super::{
    AccountId, AccountOption, Dollars, History, LedgerSnapshot, Player, PlayerId, TransferRecord,
    clamp_player_count, default_name, format_dollars, truncate_name,
};

/// In-memory state of one game: the seated players, the tax pile and the
/// recent transfer history. The bank has no balance and is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    players: Vec<Player>,
    tax_balance: Dollars,
    history: History,
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub record: TransferRecord,
    /// Confirmation shown to the table, e.g. "Moved $200 from Ann to the bank."
    pub message: String,
}

impl Ledger {
    /// Start a game with `player_count` players (clamped to 2..=4) at the
    /// starting balance and an empty tax pile.
    pub fn new(player_count: usize) -> Self {
        let count = clamp_player_count(player_count);
        Self {
            players: (1..=count).map(|id| Player::new(id as PlayerId)).collect(),
            tax_balance: 0,
            history: History::new(),
        }
    }

    /// Rebuild from a snapshot that already went through sanitization.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            players: snapshot.players,
            tax_balance: snapshot.tax_balance,
            history: snapshot.history,
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            players: self.players.clone(),
            tax_balance: self.tax_balance,
            history: self.history.clone(),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn tax_balance(&self) -> Dollars {
        self.tax_balance
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Grow or shrink the table. New players get the next sequential ids and
    /// the starting balance; removal drops the highest ids first.
    /// Returns the normalized count.
    pub fn set_player_count(&mut self, count: usize) -> usize {
        let count = clamp_player_count(count);
        let current = self.players.len();

        if count > current {
            self.players
                .extend((current + 1..=count).map(|id| Player::new(id as PlayerId)));
        } else {
            self.players.truncate(count);
        }

        count
    }

    /// Set a player's display name verbatim (cut to the input limit).
    /// Blank names are allowed here; restoring the default is up to the caller.
    pub fn rename_player(&mut self, id: PlayerId, name: &str) -> Option<&Player> {
        let player = self.players.iter_mut().find(|player| player.id == id)?;
        player.name = truncate_name(name);
        Some(player)
    }

    /// Put back "Player {id}" if the name is still blank. Returns true if it changed.
    pub fn restore_default_name(&mut self, id: PlayerId) -> bool {
        match self.players.iter_mut().find(|player| player.id == id) {
            Some(player) if player.has_blank_name() => {
                player.name = default_name(id);
                true
            }
            _ => false,
        }
    }

    /// Current balance of an account; `None` for the bank and unknown players.
    pub fn balance_of(&self, account: AccountId) -> Option<Dollars> {
        match account {
            AccountId::Bank => None,
            AccountId::Tax => Some(self.tax_balance),
            AccountId::Player(id) => self.player(id).map(|player| player.balance),
        }
    }

    pub fn contains(&self, account: AccountId) -> bool {
        match account {
            AccountId::Bank | AccountId::Tax => true,
            AccountId::Player(id) => self.player(id).is_some(),
        }
    }

    /// The bank can always pay; everyone else needs the cash on hand.
    pub fn can_debit(&self, account: AccountId, amount: Dollars) -> bool {
        match account {
            AccountId::Bank => true,
            other => self
                .balance_of(other)
                .is_some_and(|balance| balance >= amount),
        }
    }

    /// Money on the table: every player plus the tax pile. Widened so that
    /// several near-maximum balances cannot overflow the sum.
    pub fn total_balance(&self) -> i128 {
        self.players
            .iter()
            .map(|player| i128::from(player.balance))
            .sum::<i128>()
            + i128::from(self.tax_balance)
    }

    pub fn describe_account(&self, account: AccountId) -> String {
        match account {
            AccountId::Bank => "the bank".to_string(),
            AccountId::Tax => "the tax pile".to_string(),
            AccountId::Player(id) => self
                .player(id)
                .map(|player| player.name.clone())
                .unwrap_or_else(|| "player".to_string()),
        }
    }

    /// Every account a transfer can use: the players, then the tax pile, then the bank.
    pub fn accounts(&self) -> Vec<AccountOption> {
        let mut options: Vec<AccountOption> = self
            .players
            .iter()
            .map(|player| AccountOption {
                id: AccountId::Player(player.id),
                label: format!("{} ({})", player.name, format_dollars(player.balance)),
            })
            .collect();

        options.push(AccountOption {
            id: AccountId::Tax,
            label: format!("Tax Pile ({})", format_dollars(self.tax_balance)),
        });
        options.push(AccountOption {
            id: AccountId::Bank,
            label: "Bank (unlimited)".to_string(),
        });

        options
    }

    /// Move `amount` from `source` to `target`.
    ///
    /// Checks run in order and the first failure wins: positive amount,
    /// distinct accounts, enough funds at the source, known target, and a
    /// target balance that stays representable.
    /// Nothing is mutated unless every check passes.
    pub fn transfer(
        &mut self,
        source: AccountId,
        target: AccountId,
        amount: Dollars,
        now: DateTime<Utc>,
    ) -> Result<TransferReceipt, TransferError> {
        if amount <= 0 {
            return Err(TransferError::NonPositiveAmount(amount));
        }
        if source == target {
            return Err(TransferError::SameAccount(source));
        }
        if !self.can_debit(source, amount) {
            return Err(TransferError::InsufficientFunds {
                account: source,
                balance: self.balance_of(source).unwrap_or(0),
                required: amount,
            });
        }
        if !self.contains(target) {
            return Err(TransferError::UnknownAccount(target));
        }

        let source_after = self.balance_after(source, -amount)?;
        let target_after = self.balance_after(target, amount)?;
        self.set_balance(source, source_after);
        self.set_balance(target, target_after);

        let source_name = self.describe_account(source);
        let target_name = self.describe_account(target);
        let message = format!(
            "Moved {} from {} to {}.",
            format_dollars(amount),
            source_name,
            target_name
        );

        let record =
            TransferRecord::new(source, target, amount, now).with_names(source_name, target_name);
        self.history.push(record.clone());

        Ok(TransferReceipt { record, message })
    }

    /// Start over with the same number of seats.
    pub fn reset(&mut self) {
        *self = Self::new(self.players.len());
    }

    /// Balance `account` would hold after `delta`; `None` for the bank.
    fn balance_after(
        &self,
        account: AccountId,
        delta: Dollars,
    ) -> Result<Option<Dollars>, TransferError> {
        match self.balance_of(account) {
            None => Ok(None),
            Some(balance) => balance
                .checked_add(delta)
                .map(Some)
                .ok_or(TransferError::BalanceOverflow(account)),
        }
    }

    fn set_balance(&mut self, account: AccountId, balance: Option<Dollars>) {
        let Some(balance) = balance else {
            return;
        };
        match account {
            AccountId::Bank => {}
            AccountId::Tax => self.tax_balance = balance,
            AccountId::Player(id) => {
                if let Some(player) = self.players.iter_mut().find(|player| player.id == id) {
                    player.balance = balance;
                }
            }
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(super::MAX_PLAYERS)
    }
}

/// Reasons a transfer is refused. The display text is what the table sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    NonPositiveAmount(Dollars),
    SameAccount(AccountId),
    InsufficientFunds {
        account: AccountId,
        balance: Dollars,
        required: Dollars,
    },
    UnknownAccount(AccountId),
    /// The target already holds so much that the amount does not fit
    BalanceOverflow(AccountId),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::NonPositiveAmount(_) => write!(f, "Choose an amount greater than zero."),
            TransferError::SameAccount(_) => {
                write!(f, "Pick different source and destination accounts.")
            }
            TransferError::InsufficientFunds { .. } => {
                write!(f, "Insufficient funds in the selected source.")
            }
            TransferError::UnknownAccount(account) => write!(f, "Unknown account: {}.", account),
            TransferError::BalanceOverflow(account) => {
                write!(f, "That amount would overflow the balance of {}.", account)
            }
        }
    }
}

impl std::error::Error for TransferError {}
