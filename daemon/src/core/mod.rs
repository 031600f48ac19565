mod accounts;
mod accrual;
mod audit;
mod clock;
mod commission;
mod contracts;
mod events;
mod ledger;
mod recharge;
mod vip;
mod withdrawal;

pub mod config;
pub mod error;
pub mod storage;

pub use accrual::AccrualScheduler;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use events::{AccountSubscription, EventBus};
pub use ledger::{Committed, Ledger};
