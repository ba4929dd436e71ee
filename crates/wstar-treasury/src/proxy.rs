// crates/wstar-treasury/src/proxy.rs
//
// TreasuryProxy: the stable treasury address.
//
// The proxy owns the treasury storage and forwards every treasury call to
// the logic registered at its current implementation address. Only the
// admin (the Ecliptic) may change the implementation or freeze it. Freezing
// is terminal: the implementation can never change again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wstar_core::{Address, Event, EventLog, TreasuryAdmin, WstarError};

use crate::treasury::{LogicRegistry, TreasuryLogic, TreasuryStorage};

/// Implementation pointer of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "implementation")]
pub enum ProxyState {
    Active(Address),
    Frozen(Address),
}

impl ProxyState {
    pub fn implementation(&self) -> Address {
        match self {
            ProxyState::Active(a) | ProxyState::Frozen(a) => *a,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, ProxyState::Frozen(_))
    }
}

/// Upgradeable treasury proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryProxy {
    address: Address,
    admin: Address,
    state: ProxyState,
    storage: TreasuryStorage,
}

impl TreasuryProxy {
    pub fn new(
        address: Address,
        admin: Address,
        implementation: Address,
        storage: TreasuryStorage,
    ) -> Self {
        Self {
            address,
            admin,
            state: ProxyState::Active(implementation),
            storage,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    pub fn implementation(&self) -> Address {
        self.state.implementation()
    }

    pub fn is_frozen(&self) -> bool {
        self.state.is_frozen()
    }

    pub fn storage(&self) -> &TreasuryStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut TreasuryStorage {
        &mut self.storage
    }

    /// Resolve the logic currently behind the proxy.
    ///
    /// # Errors
    /// Returns `WstarError::InvalidImplementation` if nothing is deployed at
    /// the implementation address.
    pub fn delegate(&self, registry: &LogicRegistry) -> Result<Arc<dyn TreasuryLogic>, WstarError> {
        let implementation = self.implementation();
        registry
            .get(implementation)
            .ok_or(WstarError::InvalidImplementation(implementation))
    }

    fn only_admin(&self, caller: Address, action: &str) -> Result<(), WstarError> {
        if caller != self.admin {
            return Err(WstarError::Unauthorized(format!(
                "only the proxy admin {} may {}, not {}",
                self.admin, action, caller
            )));
        }
        Ok(())
    }

    /// Point the proxy at `implementation`.
    ///
    /// # Errors
    /// - `Unauthorized` for any caller but the admin, whatever the state.
    /// - `ContractFrozen` once frozen.
    /// - `InvalidImplementation` if no logic is registered at `implementation`.
    pub fn upgrade_to(
        &mut self,
        caller: Address,
        implementation: Address,
        registry: &LogicRegistry,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_admin(caller, "upgrade")?;
        if self.is_frozen() {
            return Err(WstarError::ContractFrozen(self.address));
        }
        if !registry.contains(implementation) {
            return Err(WstarError::InvalidImplementation(implementation));
        }

        self.state = ProxyState::Active(implementation);
        log.emit(self.address, Event::Upgraded { implementation });
        tracing::info!("Treasury proxy {} upgraded to {}", self.address, implementation);
        Ok(())
    }

    /// Pin the current implementation forever. Freezing twice is a no-op.
    ///
    /// # Errors
    /// Returns `Unauthorized` for any caller but the admin.
    pub fn freeze(&mut self, caller: Address, log: &mut EventLog) -> Result<(), WstarError> {
        self.only_admin(caller, "freeze")?;
        if let ProxyState::Active(implementation) = self.state {
            self.state = ProxyState::Frozen(implementation);
            log.emit(self.address, Event::Frozen { implementation });
            tracing::info!(
                "Treasury proxy {} frozen at {}",
                self.address,
                implementation
            );
        }
        Ok(())
    }
}

/// The proxy together with the deployed logic it may be pointed at.
pub struct ProxyAdmin<'a> {
    pub proxy: &'a mut TreasuryProxy,
    pub registry: &'a LogicRegistry,
}

impl TreasuryAdmin for ProxyAdmin<'_> {
    fn upgrade_to(
        &mut self,
        caller: Address,
        implementation: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.proxy
            .upgrade_to(caller, implementation, self.registry, log)
    }

    fn freeze(&mut self, caller: Address, log: &mut EventLog) -> Result<(), WstarError> {
        self.proxy.freeze(caller, log)
    }
}
