//! Account state and the periodic balance refresh

pub mod account;
pub mod refresh;
pub mod store;

pub use account::{is_healthy, parse_address, Account, InvalidAddress};
pub use refresh::{CycleReport, RefreshWorker};
pub use store::{AccountStore, StoreError, UpdateSummary};
