//! The signed-in account a wallet session works on behalf of.

use tracing::debug;

use crate::{
    error::InvalidInput,
    keys::{KeyMaterial, Label, MasterKeys, NoteKeys, Scope, derive_deposit, derive_withdrawal},
    primitives::Address,
    resolver::ResolverConfig,
};

/// Master keys, resolver settings and the connected wallet account.
///
/// Owned by the caller and passed to every flow explicitly. Rebuild it when
/// the user switches seed or wallet; nothing derived from a previous
/// account is retained here.
#[derive(Clone, Debug)]
pub struct Account {
    keys: MasterKeys,
    resolver: ResolverConfig,
    connected: Option<Address>,
}

impl Account {
    /// An account with default resolver settings and no connected wallet.
    #[must_use]
    pub fn new(keys: MasterKeys) -> Self {
        Self {
            keys,
            resolver: ResolverConfig::default(),
            connected: None,
        }
    }

    /// Derive the master keys from HD key material.
    pub fn from_material(material: &KeyMaterial) -> Result<Self, InvalidInput> {
        let keys = MasterKeys::derive(material)?;
        debug!("account opened");
        Ok(Self::new(keys))
    }

    /// Replace the resolver settings.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set or clear the connected wallet account.
    #[must_use]
    pub fn with_connected(mut self, connected: Option<Address>) -> Self {
        self.connected = connected;
        self
    }

    /// The master keys.
    #[must_use]
    pub const fn keys(&self) -> &MasterKeys {
        &self.keys
    }

    /// Resolver settings.
    #[must_use]
    pub const fn resolver(&self) -> &ResolverConfig {
        &self.resolver
    }

    /// The connected wallet account, if any.
    #[must_use]
    pub const fn connected(&self) -> Option<Address> {
        self.connected
    }

    /// Keys of this account's `index`-th deposit under `scope`.
    #[must_use]
    pub fn deposit_keys(&self, scope: Scope, index: u32) -> NoteKeys {
        derive_deposit(&self.keys, scope, index)
    }

    /// Keys of this account's `index`-th change note under `label`.
    #[must_use]
    pub fn withdrawal_keys(&self, label: Label, index: u32) -> NoteKeys {
        derive_withdrawal(&self.keys, label, index)
    }
}
