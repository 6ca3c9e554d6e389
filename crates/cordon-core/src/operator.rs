//! Shared context for principal operations

use crate::ledger::Ledger;
use crate::locks::GroupLocks;
use crate::registry::AccessProxy;
use cordon_blockstore::BlockStore;
use cordon_crypto::KeyPairProvider;
use std::sync::Arc;

/// Bundles the registry, blob store, ledger and group locks.
///
/// Cloning is cheap and every clone sees the same state.
pub struct Operator<S: BlockStore> {
    registry: Arc<AccessProxy>,
    store: Arc<S>,
    ledger: Arc<Ledger>,
    locks: Arc<GroupLocks>,
    keys: Arc<dyn KeyPairProvider>,
}

impl<S: BlockStore> Operator<S> {
    /// Create a context with an empty registry and ledger
    pub fn new(store: Arc<S>, keys: Arc<dyn KeyPairProvider>) -> Self {
        Self {
            registry: Arc::new(AccessProxy::new(Arc::clone(&keys))),
            store,
            ledger: Arc::new(Ledger::new()),
            locks: Arc::new(GroupLocks::new()),
            keys,
        }
    }

    pub fn registry(&self) -> &AccessProxy {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn locks(&self) -> &GroupLocks {
        &self.locks
    }

    /// Key source used for groups, also handy for onboarding principals
    pub fn key_provider(&self) -> &dyn KeyPairProvider {
        self.keys.as_ref()
    }
}

impl<S: BlockStore> Clone for Operator<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            ledger: Arc::clone(&self.ledger),
            locks: Arc::clone(&self.locks),
            keys: Arc::clone(&self.keys),
        }
    }
}
