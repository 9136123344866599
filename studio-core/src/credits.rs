//! Credit ledger: a persisted balance gating paid actions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::event::Listeners;
use crate::store::KeyValueStore;
use crate::{StudioError, StudioResult};

/// Storage key of the balance.
pub const CREDITS_KEY: &str = "yt_pro_studio_credits";

/// Balance granted when nothing is stored yet.
pub const STARTING_CREDITS: u64 = 10;

/// A paid action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreditAction {
    /// Generate a thumbnail image.
    Generate,
    /// Generate title suggestions.
    Title,
    /// Virality analysis.
    Analyze,
    /// AI text layout.
    AutoDesign,
}

impl CreditAction {
    /// Fixed cost of the action.
    #[must_use]
    pub const fn cost(self) -> u64 {
        match self {
            Self::Generate => 5,
            Self::Title => 1,
            Self::Analyze => 2,
            Self::AutoDesign => 3,
        }
    }
}

impl std::fmt::Display for CreditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Generate => "generate",
            Self::Title => "title",
            Self::Analyze => "analyze",
            Self::AutoDesign => "autoDesign",
        };
        f.write_str(name)
    }
}

/// Persisted credit balance.
pub struct CreditLedger {
    store: Arc<dyn KeyValueStore>,
    starting_balance: u64,
    listeners: Listeners<u64>,
}

impl CreditLedger {
    /// Create a ledger backed by `store`, starting at [`STARTING_CREDITS`].
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_starting_balance(store, STARTING_CREDITS)
    }

    /// Create a ledger with a custom balance for first use.
    #[must_use]
    pub fn with_starting_balance(store: Arc<dyn KeyValueStore>, starting_balance: u64) -> Self {
        Self {
            store,
            starting_balance,
            listeners: Listeners::new(),
        }
    }

    /// Register a listener called with the new balance after each change.
    pub fn on_change(&mut self, listener: impl Fn(&u64) + Send + Sync + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Current balance.
    ///
    /// An unreadable stored value is replaced by the starting balance.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Storage`] if the store cannot be read.
    pub fn balance(&self) -> StudioResult<u64> {
        let Some(raw) = self.store.get(CREDITS_KEY)? else {
            return Ok(self.starting_balance);
        };
        match raw.trim().parse::<u64>() {
            Ok(balance) => Ok(balance),
            Err(e) => {
                warn!(value = %raw, error = %e, "stored credit balance unreadable, resetting");
                Ok(self.starting_balance)
            }
        }
    }

    /// Cost of an action.
    #[must_use]
    pub fn cost(&self, action: CreditAction) -> u64 {
        action.cost()
    }

    /// Take `amount` from the balance. Nothing is taken when the balance is
    /// short.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::InsufficientCredits`] if `amount` exceeds the
    /// balance, or a storage error.
    pub fn deduct(&self, amount: u64) -> StudioResult<u64> {
        let balance = self.balance()?;
        if amount > balance {
            return Err(StudioError::InsufficientCredits {
                balance,
                required: amount,
            });
        }
        self.write(balance - amount)
    }

    /// Deduct the cost of `action`.
    ///
    /// # Errors
    ///
    /// Same as [`CreditLedger::deduct`].
    pub fn charge(&self, action: CreditAction) -> StudioResult<u64> {
        let remaining = self.deduct(action.cost())?;
        info!(%action, cost = action.cost(), remaining, "credits charged");
        Ok(remaining)
    }

    /// Add credits unconditionally.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the balance cannot be persisted.
    pub fn add(&self, amount: u64) -> StudioResult<u64> {
        let balance = self.balance()?.saturating_add(amount);
        info!(amount, balance, "credits added");
        self.write(balance)
    }

    fn write(&self, balance: u64) -> StudioResult<u64> {
        self.store.set(CREDITS_KEY, &balance.to_string())?;
        self.listeners.emit(&balance);
        Ok(balance)
    }
}

impl std::fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditLedger")
            .field("starting_balance", &self.starting_balance)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    fn ledger() -> (CreditLedger, MemoryStore) {
        let store = MemoryStore::new();
        (CreditLedger::new(Arc::new(store.clone())), store)
    }

    #[test]
    fn test_starting_balance_and_costs() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.balance().expect("balance"), 10);
        assert_eq!(ledger.cost(CreditAction::Generate), 5);
        assert_eq!(ledger.cost(CreditAction::Title), 1);
        assert_eq!(ledger.cost(CreditAction::Analyze), 2);
        assert_eq!(ledger.cost(CreditAction::AutoDesign), 3);
    }

    #[test]
    fn test_deduct_is_all_or_nothing() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.deduct(4).expect("deduct"), 6);
        let err = ledger.deduct(7).expect_err("short");
        assert!(matches!(
            err,
            StudioError::InsufficientCredits {
                balance: 6,
                required: 7
            }
        ));
        assert_eq!(ledger.balance().expect("balance"), 6);
    }

    #[test]
    fn test_generate_three_times() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.charge(CreditAction::Generate).expect("first"), 5);
        assert_eq!(ledger.charge(CreditAction::Generate).expect("second"), 0);
        assert!(ledger.charge(CreditAction::Generate).is_err());
        assert_eq!(ledger.balance().expect("balance"), 0);
    }

    #[test]
    fn test_add_and_listener() {
        let (mut ledger, store) = ledger();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ledger.on_change(move |balance| sink.lock().expect("lock").push(*balance));

        ledger.add(15).expect("add");
        ledger.charge(CreditAction::Title).expect("charge");
        assert_eq!(*seen.lock().expect("lock"), vec![25, 24]);
        assert_eq!(store.get(CREDITS_KEY).expect("get").as_deref(), Some("24"));
    }

    #[test]
    fn test_corrupt_value_resets() {
        let (ledger, store) = ledger();
        store.set(CREDITS_KEY, "lots").expect("set");
        assert_eq!(ledger.balance().expect("balance"), STARTING_CREDITS);
    }

    #[test]
    fn test_action_wire_names() {
        let json = serde_json::to_string(&CreditAction::AutoDesign).expect("serialize");
        assert_eq!(json, "\"autoDesign\"");
        assert_eq!(CreditAction::AutoDesign.to_string(), "autoDesign");
    }
}
