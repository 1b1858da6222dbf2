use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    AccountId, AccountOption, Dollars, Ledger, NameResetSchedule, PlayerId, TransferReceipt,
    parse_amount, sanitize_snapshot,
};
use crate::storage::StateStore;

use super::{AppError, BankerConfig};

/// One game at the table: the ledger plus everything a front end stages
/// before applying a transfer (amount, source, target, last message).
///
/// Every change to players, tax pile or history is written back to the
/// store before it becomes visible; a change that cannot be saved is
/// dropped. Staging state lives only in memory.
pub struct BankerSession {
    config: BankerConfig,
    ledger: Ledger,
    pending_amount: Dollars,
    custom_amount: String,
    source: AccountId,
    target: AccountId,
    feedback: Option<String>,
    name_resets: NameResetSchedule,
    store: Option<StateStore>,
}

impl BankerSession {
    /// A session with no storage behind it.
    pub fn new(config: BankerConfig) -> Self {
        let ledger = Ledger::new(config.initial_players);
        Self::with_ledger(config, ledger, None)
    }

    /// Open the configured database and resume the saved game, if there is one.
    pub async fn open(config: BankerConfig) -> Result<Self, AppError> {
        config.validate()?;

        let Some(url) = config.database_url() else {
            return Ok(Self::new(config));
        };

        let store = StateStore::init(&url).await?;
        let ledger = Self::load_ledger(&store, &config).await?;
        Ok(Self::with_ledger(config, ledger, Some(store)))
    }

    fn with_ledger(config: BankerConfig, ledger: Ledger, store: Option<StateStore>) -> Self {
        let name_resets = NameResetSchedule::new(config.name_reset_delay);
        let mut session = Self {
            config,
            ledger,
            pending_amount: 0,
            custom_amount: String::new(),
            source: AccountId::Bank,
            target: AccountId::Player(1),
            feedback: None,
            name_resets,
            store,
        };
        session.reconcile_selection();
        session
    }

    async fn load_ledger(store: &StateStore, config: &BankerConfig) -> Result<Ledger, AppError> {
        let key = config.storage_key.as_str();

        let Some(stored) = store.load(key).await? else {
            info!(key, players = config.initial_players, "No saved game, starting fresh");
            return Ok(Ledger::new(config.initial_players));
        };

        let raw: Value = match serde_json::from_str(&stored.value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "Saved game is not valid JSON, starting fresh");
                return Ok(Ledger::new(config.initial_players));
            }
        };

        let sanitized = sanitize_snapshot(&raw);
        for repair in &sanitized.repairs {
            warn!(key, "Repaired saved game: {}", repair);
        }

        let ledger = Ledger::from_snapshot(sanitized.snapshot);
        info!(
            key,
            players = ledger.player_count(),
            history = ledger.history().len(),
            saved_at = ?stored.updated_at,
            "Resumed saved game"
        );
        Ok(ledger)
    }

    // ========================
    // Read access
    // ========================

    pub fn config(&self) -> &BankerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn pending_amount(&self) -> Dollars {
        self.pending_amount
    }

    pub fn custom_amount(&self) -> &str {
        &self.custom_amount
    }

    pub fn source(&self) -> AccountId {
        self.source
    }

    pub fn target(&self) -> AccountId {
        self.target
    }

    /// Last message for the table, if any.
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn name_resets(&self) -> &NameResetSchedule {
        &self.name_resets
    }

    pub fn accounts(&self) -> Vec<AccountOption> {
        self.ledger.accounts()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    // ========================
    // Players
    // ========================

    /// Change the number of seats (clamped to 2..=4). Selections and pending
    /// name resets that point at removed players are cleaned up.
    pub async fn set_player_count(&mut self, count: usize) -> Result<usize, AppError> {
        let before = self.ledger.player_count();
        let mut next = self.ledger.clone();
        let normalized = next.set_player_count(count);

        if normalized != before {
            self.commit(next).await?;
            debug!(from = before, to = normalized, "Player count changed");
        }

        let seated: Vec<PlayerId> = self.ledger.players().iter().map(|p| p.id).collect();
        self.name_resets.retain_players(&seated);
        self.reconcile_selection();
        Ok(normalized)
    }

    /// Rename a player. A blank name is kept for now and reverts to
    /// "Player N" once the reset delay passes without another edit.
    pub async fn rename_player(
        &mut self,
        id: PlayerId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut next = self.ledger.clone();
        let blank = next
            .rename_player(id, name)
            .ok_or(AppError::PlayerNotFound(id))?
            .has_blank_name();

        self.commit(next).await?;

        if blank {
            let deadline = self.name_resets.schedule(id, now);
            debug!(player = id, %deadline, "Blank name, default restore scheduled");
        } else {
            self.name_resets.cancel(id);
        }
        Ok(())
    }

    /// Fire every name reset whose deadline has passed. Returns the players
    /// whose name actually went back to the default.
    ///
    /// If the restored names cannot be saved, those resets are scheduled
    /// again from `now`.
    pub async fn run_due_name_resets(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PlayerId>, AppError> {
        let mut next = self.ledger.clone();
        let restored: Vec<PlayerId> = self
            .name_resets
            .take_due(now)
            .into_iter()
            .filter(|id| next.restore_default_name(*id))
            .collect();

        if restored.is_empty() {
            return Ok(restored);
        }

        if let Err(err) = self.commit(next).await {
            for id in &restored {
                self.name_resets.schedule(*id, now);
            }
            return Err(err);
        }

        debug!(players = ?restored, "Restored default player names");
        Ok(restored)
    }

    // ========================
    // Staging an amount
    // ========================

    /// Add a denomination (or take it away); never goes below zero.
    pub fn adjust_pending_amount(&mut self, delta: Dollars) -> Dollars {
        self.pending_amount = self.pending_amount.saturating_add(delta).max(0);
        self.feedback = None;
        self.pending_amount
    }

    pub fn set_pending_amount(&mut self, amount: Dollars) -> Dollars {
        self.pending_amount = amount.max(0);
        self.feedback = None;
        self.pending_amount
    }

    pub fn set_custom_amount(&mut self, text: impl Into<String>) {
        self.custom_amount = text.into();
    }

    /// Use the typed custom amount as the pending amount. On bad input the
    /// pending amount stays as it was.
    pub fn apply_custom_amount(&mut self) -> Result<Dollars, AppError> {
        match parse_amount(&self.custom_amount) {
            Ok(amount) if amount > 0 => Ok(self.set_pending_amount(amount)),
            _ => {
                let err = AppError::InvalidCustomAmount(self.custom_amount.clone());
                self.feedback = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn reset_amount(&mut self) {
        self.pending_amount = 0;
        self.custom_amount.clear();
        self.feedback = None;
    }

    // ========================
    // Choosing accounts
    // ========================

    pub fn select_source(&mut self, account: AccountId) -> Result<(), AppError> {
        self.ensure_known(account)?;
        self.source = account;
        Ok(())
    }

    pub fn select_target(&mut self, account: AccountId) -> Result<(), AppError> {
        self.ensure_known(account)?;
        self.target = account;
        Ok(())
    }

    /// Swap source and target. Returns false (and does nothing) if they are the same.
    pub fn swap_accounts(&mut self) -> bool {
        if self.source == self.target {
            return false;
        }
        std::mem::swap(&mut self.source, &mut self.target);
        self.feedback = None;
        true
    }

    // ========================
    // Transfers
    // ========================

    /// Move the pending amount from the selected source to the selected target.
    pub async fn apply_transfer(&mut self, now: DateTime<Utc>) -> Result<TransferReceipt, AppError> {
        self.transfer(self.source, self.target, self.pending_amount, now)
            .await
    }

    /// Move `amount` between two accounts. The outcome message is kept as feedback.
    pub async fn transfer(
        &mut self,
        source: AccountId,
        target: AccountId,
        amount: Dollars,
        now: DateTime<Utc>,
    ) -> Result<TransferReceipt, AppError> {
        let mut next = self.ledger.clone();
        let receipt = match next.transfer(source, target, amount, now) {
            Ok(receipt) => receipt,
            Err(err) => {
                debug!(%source, %target, amount, reason = %err, "Transfer refused");
                self.feedback = Some(err.to_string());
                return Err(err.into());
            }
        };

        self.commit(next).await?;
        debug!(%source, %target, amount, "Transfer applied");
        self.feedback = Some(receipt.message.clone());
        Ok(receipt)
    }

    /// Start a new game with the same number of seats.
    pub async fn reset_board(&mut self) -> Result<(), AppError> {
        let mut next = self.ledger.clone();
        next.reset();
        self.commit(next).await?;

        self.name_resets.cancel_all();
        self.pending_amount = 0;
        self.custom_amount.clear();
        self.source = AccountId::Bank;
        self.target = AccountId::Player(1);
        self.feedback = Some("Board reset.".to_string());

        info!(players = self.ledger.player_count(), "Board reset");
        Ok(())
    }

    /// The saved-game document, pretty-printed.
    pub fn export_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(&self.ledger.snapshot())?)
    }

    /// End the session: drop pending name resets, save the game one last
    /// time and release the database. The database is released even when
    /// the final save fails.
    pub async fn close(mut self) -> Result<(), AppError> {
        self.name_resets.cancel_all();
        let saved = self.save(&self.ledger).await;
        if let Some(store) = self.store.take() {
            store.close().await;
        }
        saved
    }

    // ========================
    // Internals
    // ========================

    fn ensure_known(&self, account: AccountId) -> Result<(), AppError> {
        if self.ledger.contains(account) {
            Ok(())
        } else {
            Err(crate::domain::TransferError::UnknownAccount(account).into())
        }
    }

    /// Point selections at a seated player again after seats were removed.
    fn reconcile_selection(&mut self) {
        let first_player = self.ledger.players().first().map(|p| AccountId::Player(p.id));

        if !self.ledger.contains(self.source) {
            self.source = first_player.unwrap_or(AccountId::Bank);
        }
        if !self.ledger.contains(self.target) {
            self.target = first_player.unwrap_or(AccountId::Tax);
        }
    }

    /// Save `next` and make it the current ledger. When the save fails the
    /// current ledger is kept and the error becomes the feedback.
    async fn commit(&mut self, next: Ledger) -> Result<(), AppError> {
        if let Err(err) = self.save(&next).await {
            warn!(key = %self.config.storage_key, error = %err, "Game not saved, change dropped");
            self.feedback = Some(err.to_string());
            return Err(err);
        }
        self.ledger = next;
        Ok(())
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), AppError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let json = serde_json::to_string(&ledger.snapshot())?;
        store.save(&self.config.storage_key, &json).await?;
        debug!(key = %self.config.storage_key, bytes = json.len(), "Game saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(players: usize) -> BankerSession {
        BankerSession::new(BankerConfig::in_memory().with_initial_players(players))
    }

    #[test]
    fn test_defaults() {
        let session = session(4);
        assert_eq!(session.source(), AccountId::Bank);
        assert_eq!(session.target(), AccountId::Player(1));
        assert_eq!(session.pending_amount(), 0);
        assert!(session.feedback().is_none());
        assert_eq!(session.accounts().len(), 6);
    }

    #[test]
    fn test_pending_amount_never_negative() {
        let mut session = session(2);
        assert_eq!(session.adjust_pending_amount(100), 100);
        assert_eq!(session.adjust_pending_amount(-500), 0);
        assert_eq!(session.set_pending_amount(-3), 0);
    }

    #[test]
    fn test_custom_amount() {
        let mut session = session(2);
        session.adjust_pending_amount(20);

        session.set_custom_amount("abc");
        assert!(matches!(
            session.apply_custom_amount(),
            Err(AppError::InvalidCustomAmount(_))
        ));
        assert_eq!(session.pending_amount(), 20);
        assert_eq!(session.feedback(), Some("Enter a positive custom amount."));

        session.set_custom_amount("0");
        assert!(session.apply_custom_amount().is_err());

        session.set_custom_amount("350");
        assert_eq!(session.apply_custom_amount().unwrap(), 350);
        assert!(session.feedback().is_none());

        session.reset_amount();
        assert_eq!(session.pending_amount(), 0);
        assert_eq!(session.custom_amount(), "");
    }

    #[test]
    fn test_swap_accounts() {
        let mut session = session(2);
        assert!(session.swap_accounts());
        assert_eq!(session.source(), AccountId::Player(1));
        assert_eq!(session.target(), AccountId::Bank);

        session.select_target(AccountId::Player(1)).unwrap();
        assert!(!session.swap_accounts());
    }

    #[test]
    fn test_select_unknown_player() {
        let mut session = session(2);
        assert!(session.select_source(AccountId::Player(3)).is_err());
        assert_eq!(session.source(), AccountId::Bank);
    }
}
