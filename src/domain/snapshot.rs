//! The persisted shape of a game and the defensive decoding of it.
//!
//! Stored blobs come from an earlier run, possibly an older build or a
//! hand-edited database, so decoding goes through a loose `serde_json::Value`
//! first and every field is checked and coerced on its own.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    Dollars, HISTORY_LIMIT, History, MAX_PLAYERS, MIN_PLAYERS, Player, PlayerId,
    STARTING_BALANCE, TransferRecord, truncate_name,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub players: Vec<Player>,
    pub tax_balance: Dollars,
    pub history: History,
}

/// A snapshot that is safe to load, plus notes on everything that was repaired.
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub snapshot: LedgerSnapshot,
    pub repairs: Vec<String>,
}

impl Sanitized {
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }
}

/// Turn arbitrary JSON into a valid snapshot. Never fails: anything unusable
/// falls back to the defaults of a fresh game.
pub fn sanitize_snapshot(raw: &Value) -> Sanitized {
    let mut repairs = Vec::new();

    if !raw.is_object() {
        repairs.push("stored state is not an object; starting fresh".to_string());
    }

    let players = sanitize_players(raw.get("players"), &mut repairs);
    let tax_balance = match raw.get("taxBalance") {
        None => 0,
        Some(value) => coerce_balance(value).unwrap_or_else(|| {
            repairs.push(format!("invalid tax balance {}; using 0", value));
            0
        }),
    };
    let history = sanitize_history(raw.get("history"), &mut repairs);

    Sanitized {
        snapshot: LedgerSnapshot {
            players,
            tax_balance,
            history,
        },
        repairs,
    }
}

fn sanitize_players(raw: Option<&Value>, repairs: &mut Vec<String>) -> Vec<Player> {
    let entries: &[Value] = match raw {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            repairs.push(format!("players is not a list ({}); using defaults", other));
            &[]
        }
        None => &[],
    };

    if entries.len() > MAX_PLAYERS {
        repairs.push(format!(
            "{} players stored; keeping the first {}",
            entries.len(),
            MAX_PLAYERS
        ));
    }

    let mut players: Vec<Player> = entries
        .iter()
        .take(MAX_PLAYERS)
        .enumerate()
        .map(|(index, entry)| sanitize_player((index + 1) as PlayerId, entry, repairs))
        .collect();

    if players.len() < MIN_PLAYERS {
        repairs.push(format!(
            "{} players stored; seating {} at the starting balance",
            players.len(),
            MIN_PLAYERS
        ));
        let start = players.len() + 1;
        players.extend((start..=MIN_PLAYERS).map(|id| Player::new(id as PlayerId)));
    }

    players
}

/// Ids are positional so that seats stay 1..=n with no gaps.
fn sanitize_player(id: PlayerId, entry: &Value, repairs: &mut Vec<String>) -> Player {
    let mut player = Player::new(id);

    if let Some(stored) = entry.get("id").and_then(Value::as_u64) {
        if stored != u64::from(id) {
            repairs.push(format!("player id {} renumbered to {}", stored, id));
        }
    }

    match entry.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => player.name = truncate_name(name),
        _ => repairs.push(format!("player {} has no usable name; using default", id)),
    }

    match entry.get("balance").and_then(coerce_balance) {
        Some(balance) => player.balance = balance,
        None => repairs.push(format!(
            "player {} has an invalid balance; using {}",
            id, STARTING_BALANCE
        )),
    }

    player
}

fn sanitize_history(raw: Option<&Value>, repairs: &mut Vec<String>) -> History {
    let entries: &[Value] = match raw {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            repairs.push(format!("history is not a list ({}); dropping it", other));
            &[]
        }
        None => &[],
    };

    let mut records = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match sanitize_record(index, entry) {
            Some(record) => records.push(record),
            None => repairs.push(format!("dropped malformed history entry #{}", index)),
        }
    }

    if records.len() > HISTORY_LIMIT {
        repairs.push(format!(
            "{} history entries stored; keeping the latest {}",
            records.len(),
            HISTORY_LIMIT
        ));
    }

    History::from_records(records)
}

fn sanitize_record(index: usize, entry: &Value) -> Option<TransferRecord> {
    let amount = entry
        .get("amount")
        .and_then(as_whole_number)
        .filter(|amount| *amount > 0)?;
    let source_id = non_blank_str(entry.get("sourceId"))?;
    let target_id = non_blank_str(entry.get("targetId"))?;

    let id = non_blank_str(entry.get("id")).unwrap_or_else(|| format!("restored-{}", index));
    let timestamp = entry
        .get("timestamp")
        .and_then(as_whole_number)
        .unwrap_or(0);
    let source_name = non_blank_str(entry.get("sourceName")).unwrap_or_else(|| source_id.clone());
    let target_name = non_blank_str(entry.get("targetName")).unwrap_or_else(|| target_id.clone());

    Some(TransferRecord {
        id,
        timestamp,
        amount,
        source_id,
        target_id,
        source_name,
        target_name,
    })
}

/// A non-negative whole number of dollars; fractions are floored.
fn coerce_balance(value: &Value) -> Option<Dollars> {
    let number = value.as_f64()?;
    if !number.is_finite() || number < 0.0 || number > Dollars::MAX as f64 {
        return None;
    }
    Some(value.as_i64().unwrap_or(number.floor() as Dollars))
}

fn as_whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let number = value.as_f64()?;
    (number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64)
        .then_some(number as i64)
}

fn non_blank_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_clean_snapshot_passes_through() {
        let raw = json!({
            "players": [
                {"id": 1, "name": "Ann", "balance": 1300, "color": "#ffb347"},
                {"id": 2, "name": "Bo", "balance": 1700, "color": "#5dd6c1"}
            ],
            "taxBalance": 25,
            "history": [{
                "id": "abc", "timestamp": 1700000000000_i64, "amount": 200,
                "sourceId": "player-1", "targetId": "player-2",
                "sourceName": "Ann", "targetName": "Bo"
            }]
        });

        let sanitized = sanitize_snapshot(&raw);
        assert!(sanitized.is_clean(), "{:?}", sanitized.repairs);
        assert_eq!(sanitized.snapshot.players[0].name, "Ann");
        assert_eq!(sanitized.snapshot.players[1].balance, 1700);
        assert_eq!(sanitized.snapshot.tax_balance, 25);
        assert_eq!(sanitized.snapshot.history.len(), 1);
    }

    #[test]
    fn test_zero_players_are_padded() {
        let sanitized = sanitize_snapshot(&json!({"players": [], "taxBalance": 0}));
        let players = &sanitized.snapshot.players;

        assert_eq!(players.len(), MIN_PLAYERS);
        assert!(players.iter().all(|p| p.balance == STARTING_BALANCE));
        assert!(!sanitized.is_clean());
    }

    #[test]
    fn test_seven_players_are_truncated() {
        let players: Vec<Value> = (1..=7)
            .map(|id| json!({"id": id, "name": format!("P{}", id), "balance": 100}))
            .collect();
        let sanitized = sanitize_snapshot(&json!({ "players": players }));

        assert_eq!(sanitized.snapshot.players.len(), MAX_PLAYERS);
        assert_eq!(sanitized.snapshot.players[3].name, "P4");
    }

    #[test]
    fn test_negative_and_invalid_balances() {
        let raw = json!({
            "players": [
                {"name": "Ann", "balance": -40},
                {"name": "Bo", "balance": "lots"},
                {"name": "Cy", "balance": 12.9}
            ],
            "taxBalance": -5
        });
        let snapshot = sanitize_snapshot(&raw).snapshot;

        assert_eq!(snapshot.players[0].balance, STARTING_BALANCE);
        assert_eq!(snapshot.players[1].balance, STARTING_BALANCE);
        assert_eq!(snapshot.players[2].balance, 12);
        assert_eq!(snapshot.tax_balance, 0);
        assert!(snapshot.players.iter().all(|p| p.balance >= 0));
    }

    #[test]
    fn test_missing_ids_and_names_are_fabricated() {
        let raw = json!({"players": [{"balance": 10}, {"id": 9, "name": "  ", "balance": 20}]});
        let snapshot = sanitize_snapshot(&raw).snapshot;

        assert_eq!(snapshot.players[0].id, 1);
        assert_eq!(snapshot.players[0].name, "Player 1");
        assert_eq!(snapshot.players[1].id, 2);
        assert_eq!(snapshot.players[1].name, "Player 2");
        assert_eq!(snapshot.players[1].color, "#5dd6c1");
    }

    #[test]
    fn test_malformed_history_entries_dropped() {
        let mut history = vec![
            json!("garbage"),
            json!({"amount": 0, "sourceId": "bank", "targetId": "tax"}),
            json!({"amount": 10, "sourceId": "bank"}),
            json!({"amount": 15, "sourceId": "bank", "targetId": "player-1"}),
        ];
        for _ in 0..12 {
            history.push(json!({"id": "x", "amount": 1, "sourceId": "bank", "targetId": "tax"}));
        }

        let sanitized = sanitize_snapshot(&json!({ "history": history }));
        let history = &sanitized.snapshot.history;

        assert_eq!(history.len(), HISTORY_LIMIT);
        let first = history.latest().unwrap();
        assert_eq!(first.id, "restored-3");
        assert_eq!(first.amount, 15);
        assert_eq!(first.timestamp, 0);
        assert_eq!(first.target_name, "player-1");
    }

    #[test]
    fn test_non_object_input_never_panics() {
        for raw in [json!(null), json!(42), json!("text"), json!([1, 2, 3])] {
            let snapshot = sanitize_snapshot(&raw).snapshot;
            assert_eq!(snapshot.players.len(), MIN_PLAYERS);
            assert_eq!(snapshot.tax_balance, 0);
            assert!(snapshot.history.is_empty());
        }
    }
}
