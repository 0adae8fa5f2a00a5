use crate::{id::Id, state::State};
use chrono::{DateTime, Utc};
use serde::{de, ser, Deserialize, Serialize};

/// One immutable entry of the ledger. Its identity is the hash of everything else in it, so the
/// record is sealed at construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(skip)]
    id: Id,

    /// Transaction this one was appended on top of, `Id::ROOT` for the first one
    parent: Id,

    time: DateTime<Utc>,

    /// Snapshot of every account and the whole budget after this transaction
    state: State,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    comment: String,
}

impl Transaction {
    pub fn new(
        parent: Id,
        time: DateTime<Utc>,
        state: State,
        comment: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        let mut transaction = Self {
            id: Id::ROOT,
            parent,
            time,
            state,
            comment: comment.into(),
        };
        if let Some(name) = transaction.state.budget.duplicate_name() {
            return Err(ser::Error::custom(format!("duplicate budget name `{}`", name)));
        }
        transaction.id = transaction.content_hash()?;
        Ok(transaction)
    }

    /// Decodes a stored record and derives its id from the decoded content.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let mut transaction: Transaction = serde_json::from_slice(bytes)?;
        if let Some(name) = transaction.state.budget.duplicate_name() {
            return Err(de::Error::custom(format!("duplicate budget name `{}`", name)));
        }
        transaction.id = transaction.content_hash()?;
        Ok(transaction)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn content_hash(&self) -> Result<Id, serde_json::Error> {
        Ok(Id::digest(&self.to_vec()?))
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn parent(&self) -> Id {
        self.parent
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BudgetNode;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn state() -> State {
        State {
            accounts: [("checking".to_string(), dec!(12.34))].into_iter().collect(),
            budget: BudgetNode::new("root", dec!(5)).with_child(BudgetNode::new("food", dec!(1))),
        }
    }

    #[test]
    fn test_id_survives_storage() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let transaction = Transaction::new(Id::ROOT, time, state(), "opening balance").unwrap();

        let decoded = Transaction::from_slice(&transaction.to_vec().unwrap()).unwrap();
        assert_eq!(decoded.id(), transaction.id());
        assert_eq!(decoded, transaction);
    }

    #[test]
    fn test_id_depends_on_content() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let first = Transaction::new(Id::ROOT, time, state(), "").unwrap();
        let second = Transaction::new(first.id(), time, state(), "").unwrap();
        let commented = Transaction::new(Id::ROOT, time, state(), "note").unwrap();

        assert_ne!(first.id(), second.id());
        assert_ne!(first.id(), commented.id());
        assert!(!first.id().is_root());
    }

    #[test]
    fn test_duplicate_budget_names_rejected() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut state = state();
        state.budget.children.push(BudgetNode::new("food", dec!(9)));
        assert!(Transaction::new(Id::ROOT, time, state, "").is_err());

        let stored = br#"{"parent":"0000000000000000000000000000000000000000000000000000000000000000","time":"2024-03-01T12:00:00Z","state":{"accounts":{},"budget":{"name":"root","balance":"0","children":[{"name":"food","balance":"1"},{"name":"food","balance":"5"}]}}}"#;
        let err = Transaction::from_slice(stored).unwrap_err();
        assert!(err.to_string().contains("food"));
    }
}
