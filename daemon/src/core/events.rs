use log::{debug, warn};
use harvest_common::{event::LedgerEvent, id::AccountId};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Fan-out of the events emitted by committed atomic units
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish the events of a committed unit, in order
    pub fn emit(&self, events: Vec<LedgerEvent>) {
        for event in events {
            if log::log_enabled!(log::Level::Debug) {
                debug!("event {} for {}", event.kind(), event.account());
            }
            // no subscriber is not an error
            let _ = self.sender.send(event);
        }
    }

    /// Events concerning a single account
    pub fn subscribe(&self, account: AccountId) -> AccountSubscription {
        AccountSubscription {
            account,
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct AccountSubscription {
    account: AccountId,
    receiver: broadcast::Receiver<LedgerEvent>,
}

impl AccountSubscription {
    /// Wait for the next event of the account.
    /// Returns None once the ledger is dropped.
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.account() == self.account => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("subscription of {} lagged, {} events skipped", self.account, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered event of the account, without waiting
    pub fn try_recv(&mut self) -> Option<LedgerEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.account() == self.account => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("subscription of {} lagged, {} events skipped", self.account, skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
