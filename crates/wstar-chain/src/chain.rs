// crates/wstar-chain/src/chain.rs
//
// The chain: one world holding the registry, the Ecliptic, the token and the
// treasury proxy, mutated only through atomic transactions.
//
// A transaction runs against a clone of the world. On success the clone
// replaces the world and the block number advances; on failure the clone is
// dropped, so no partial effect (state or log) is ever observable. Static
// calls run the same way and always drop the clone.
//
// Deployment layout (addresses derived from the deployer's nonce):
//   nonce 0: Azimuth
//   nonce 1: Ecliptic (owner = deployer)
//   nonce 2: StandardTreasury logic
//   nonce 3: TreasuryProxy (admin = Ecliptic)
//   proxy nonce 0: WrappedStar token (owner = proxy)

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wstar_azimuth::{Azimuth, Ecliptic};
use wstar_core::{Address, EventLog, LogEntry, Point, PointReceiver, WstarError};
use wstar_treasury::{
    builtin_logic, Balance, InboundGuard, LogicRegistry, ProxyAdmin, StandardTreasury, StarToken,
    TokenMetadata, TreasuryContext, TreasuryLogic, TreasuryProxy, TreasuryStorage,
};

/// Parameters of a fresh deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Account that deploys every contract and owns the Ecliptic.
    pub deployer: Address,
    /// Metadata of the token the treasury mints.
    pub token: TokenMetadata,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            deployer: Address::from_label("deployer"),
            token: TokenMetadata::wrapped_star(),
        }
    }
}

/// Addresses of the deployed contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub deployer: Address,
    pub azimuth: Address,
    pub ecliptic: Address,
    pub treasury: Address,
    pub token: Address,
}

/// Complete persisted state of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub deployer: Address,
    pub ecliptic: Ecliptic,
    pub token: StarToken,
    pub treasury: TreasuryProxy,
    /// Deployed treasury logic: address -> version tag.
    pub implementations: BTreeMap<Address, String>,
    /// Next contract-creation nonce per deployer.
    pub nonces: BTreeMap<Address, u64>,
    /// Labels that actor names resolved to.
    #[serde(default)]
    pub labels: BTreeMap<Address, String>,
    pub log: EventLog,
}

impl WorldState {
    /// Derive the next contract address for `deployer` and bump its nonce.
    fn next_address(&mut self, deployer: Address) -> Address {
        let nonce = self.nonces.entry(deployer).or_insert(0);
        let address = Address::derive(&deployer, *nonce);
        *nonce += 1;
        address
    }

    fn deployment(&self) -> Deployment {
        Deployment {
            deployer: self.deployer,
            azimuth: self.ecliptic.azimuth().address(),
            ecliptic: self.ecliptic.address(),
            treasury: self.treasury.address(),
            token: self.token.address(),
        }
    }

    fn is_contract(&self, address: Address) -> bool {
        let d = self.deployment();
        address == d.azimuth
            || address == d.ecliptic
            || address == d.treasury
            || address == d.token
            || self.implementations.contains_key(&address)
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt<T> {
    /// Block the transaction was committed in.
    pub block: u64,
    pub value: T,
    /// Events emitted by the transaction, in order.
    pub events: Vec<LogEntry>,
}

/// Acceptance hook of contracts that do not implement one.
struct NoReceiver;

impl PointReceiver for NoReceiver {
    fn on_point_received(
        &self,
        _operator: Address,
        _from: Address,
        point: Point,
    ) -> Result<(), WstarError> {
        Err(WstarError::UnsafeTransferRejected(point))
    }
}

/// The simulated chain.
#[derive(Debug, Clone)]
pub struct Chain {
    state: WorldState,
    registry: LogicRegistry,
}

impl Chain {
    /// Deploy the registry, the Ecliptic and the treasury.
    pub fn new(config: ChainConfig) -> Self {
        let deployer = config.deployer;
        let mut log = EventLog::new();
        let mut nonces = BTreeMap::new();
        nonces.insert(deployer, 4);

        let azimuth = Address::derive(&deployer, 0);
        let ecliptic_address = Address::derive(&deployer, 1);
        let implementation = Address::derive(&deployer, 2);
        let proxy_address = Address::derive(&deployer, 3);
        let token_address = Address::derive(&proxy_address, 0);
        nonces.insert(proxy_address, 1);

        let ecliptic = Ecliptic::new(ecliptic_address, deployer, azimuth);
        let token = StarToken::new(
            token_address,
            config.token,
            proxy_address,
            0,
            Vec::new(),
            &mut log,
        );
        let treasury = TreasuryProxy::new(
            proxy_address,
            ecliptic_address,
            implementation,
            TreasuryStorage::new(azimuth, token_address),
        );

        let logic: Arc<dyn TreasuryLogic> = Arc::new(StandardTreasury::new());
        let mut implementations = BTreeMap::new();
        implementations.insert(implementation, logic.version().to_string());
        let mut registry = LogicRegistry::new();
        registry.register(implementation, logic);

        let mut labels = BTreeMap::new();
        labels.insert(deployer, "deployer".to_string());

        log.advance_block();
        tracing::info!(
            "Deployed treasury {} (token {}, ecliptic {})",
            proxy_address,
            token_address,
            ecliptic_address
        );

        Self {
            state: WorldState {
                deployer,
                ecliptic,
                token,
                treasury,
                implementations,
                nonces,
                labels,
                log,
            },
            registry,
        }
    }

    /// Rebuild a chain from a snapshot.
    ///
    /// # Errors
    /// Returns `WstarError::InvalidImplementation` if a deployed logic has a
    /// version tag this build does not know.
    pub fn from_state(state: WorldState) -> Result<Self, WstarError> {
        let mut registry = LogicRegistry::new();
        for (address, version) in &state.implementations {
            let logic = builtin_logic(version).ok_or(WstarError::InvalidImplementation(*address))?;
            registry.register(*address, logic);
        }
        Ok(Self { state, registry })
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn into_state(self) -> WorldState {
        self.state
    }

    pub fn deployment(&self) -> Deployment {
        self.state.deployment()
    }

    pub fn ecliptic(&self) -> &Ecliptic {
        &self.state.ecliptic
    }

    pub fn azimuth(&self) -> &Azimuth {
        self.state.ecliptic.azimuth()
    }

    pub fn token(&self) -> &StarToken {
        &self.state.token
    }

    pub fn treasury(&self) -> &TreasuryProxy {
        &self.state.treasury
    }

    pub fn events(&self) -> &[LogEntry] {
        self.state.log.entries()
    }

    /// Number of the block the next transaction will be committed in.
    pub fn block(&self) -> u64 {
        self.state.log.block()
    }

    /// Deployed logic `(address, version)`.
    pub fn implementations(&self) -> Vec<(Address, String)> {
        self.registry.versions()
    }

    // -----------------------------------------------------------------------
    // Actor names
    // -----------------------------------------------------------------------

    /// Resolve an actor name to an address.
    ///
    /// Accepts contract names (`treasury`, `ecliptic`, `azimuth`, `token`,
    /// `deployer`, `zero`), `0x`-prefixed hex, or any other label, which is
    /// hashed to an address and remembered for display.
    pub fn resolve(&mut self, name: &str) -> Result<Address, WstarError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WstarError::Parse("Empty actor name".to_string()));
        }
        let d = self.deployment();
        let address = match name {
            "treasury" | "proxy" => d.treasury,
            "ecliptic" => d.ecliptic,
            "azimuth" => d.azimuth,
            "token" => d.token,
            "deployer" => d.deployer,
            "zero" => Address::ZERO,
            hex if hex.starts_with("0x") => hex.parse()?,
            label => {
                let address = Address::from_label(label);
                self.state
                    .labels
                    .entry(address)
                    .or_insert_with(|| label.to_string());
                address
            }
        };
        Ok(address)
    }

    /// Human-readable name of an address.
    pub fn name_of(&self, address: Address) -> String {
        let d = self.deployment();
        if address.is_zero() {
            return "zero".to_string();
        }
        let contract = if address == d.treasury {
            Some("treasury")
        } else if address == d.ecliptic {
            Some("ecliptic")
        } else if address == d.azimuth {
            Some("azimuth")
        } else if address == d.token {
            Some("token")
        } else {
            None
        };
        match contract {
            Some(name) => name.to_string(),
            None => self
                .state
                .labels
                .get(&address)
                .cloned()
                .unwrap_or_else(|| address.short()),
        }
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Run `f` atomically on behalf of `sender`. Effects are committed only
    /// if `f` succeeds.
    ///
    /// # Errors
    /// Returns `WstarError::Unauthorized` without running `f` if `sender` is
    /// a deployed contract: contracts only act inside a transaction some
    /// account started.
    pub fn transact<T, F>(
        &mut self,
        label: &str,
        sender: Address,
        f: F,
    ) -> Result<Receipt<T>, WstarError>
    where
        F: FnOnce(&mut WorldState, &LogicRegistry) -> Result<T, WstarError>,
    {
        if self.state.is_contract(sender) {
            tracing::warn!("Rejected {}: sender {} is a contract", label, sender);
            return Err(WstarError::Unauthorized(format!(
                "{} is a contract and cannot send transactions",
                self.name_of(sender)
            )));
        }
        let mut working = self.state.clone();
        let mark = working.log.mark();
        match f(&mut working, &self.registry) {
            Ok(value) => {
                let block = working.log.block();
                let events = working.log.since(mark).to_vec();
                working.log.advance_block();
                self.state = working;
                tracing::debug!(
                    "Committed {} in block {} ({} events)",
                    label,
                    block,
                    events.len()
                );
                Ok(Receipt {
                    block,
                    value,
                    events,
                })
            }
            Err(e) => {
                tracing::warn!("Reverted {}: {}", label, e);
                Err(e)
            }
        }
    }

    /// Run `f` against a throwaway copy of the world and return its result.
    pub fn call_static<T, F>(&self, f: F) -> Result<T, WstarError>
    where
        F: FnOnce(&mut WorldState, &LogicRegistry) -> Result<T, WstarError>,
    {
        let mut scratch = self.state.clone();
        f(&mut scratch, &self.registry)
    }

    /// Register another copy of the built-in treasury logic at a fresh address.
    pub fn deploy_implementation(&mut self, deployer: Address) -> Address {
        self.deploy_logic(deployer, Arc::new(StandardTreasury::new()))
    }

    /// Register `logic` at an address derived from `deployer`'s nonce.
    pub fn deploy_logic(&mut self, deployer: Address, logic: Arc<dyn TreasuryLogic>) -> Address {
        let address = self.state.next_address(deployer);
        self.state
            .implementations
            .insert(address, logic.version().to_string());
        tracing::info!("Deployed treasury logic {} at {}", logic.version(), address);
        self.registry.register(address, logic);
        address
    }

    // -----------------------------------------------------------------------
    // Ecliptic calls
    // -----------------------------------------------------------------------

    pub fn create_galaxy(
        &mut self,
        caller: Address,
        galaxy: Point,
        target: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("create_galaxy", caller, |w, _| {
            w.ecliptic.create_galaxy(caller, galaxy, target, &mut w.log)
        })
    }

    pub fn configure_keys(
        &mut self,
        caller: Address,
        point: Point,
        encryption_key: [u8; 32],
        authentication_key: [u8; 32],
        crypto_suite_version: u32,
        discontinuous: bool,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("configure_keys", caller, |w, _| {
            w.ecliptic.configure_keys(
                caller,
                point,
                encryption_key,
                authentication_key,
                crypto_suite_version,
                discontinuous,
                &mut w.log,
            )
        })
    }

    pub fn spawn(
        &mut self,
        caller: Address,
        point: Point,
        target: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("spawn", caller, |w, _| {
            w.ecliptic.spawn(caller, point, target, &mut w.log)
        })
    }

    pub fn set_spawn_proxy(
        &mut self,
        caller: Address,
        prefix: Point,
        proxy: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("set_spawn_proxy", caller, |w, _| {
            w.ecliptic.set_spawn_proxy(caller, prefix, proxy, &mut w.log)
        })
    }

    pub fn set_transfer_proxy(
        &mut self,
        caller: Address,
        point: Point,
        proxy: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("set_transfer_proxy", caller, |w, _| {
            w.ecliptic
                .set_transfer_proxy(caller, point, proxy, &mut w.log)
        })
    }

    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("set_approval_for_all", caller, |w, _| {
            w.ecliptic
                .set_approval_for_all(caller, operator, approved, &mut w.log)
        })
    }

    pub fn transfer_point(
        &mut self,
        caller: Address,
        point: Point,
        target: Address,
        reset: bool,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("transfer_point", caller, |w, _| {
            w.ecliptic
                .transfer_point(caller, point, target, reset, &mut w.log)
        })
    }

    /// Plain ERC-721 transfer. Contracts receive the point without being asked.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        point: Point,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("transfer_from", caller, |w, _| {
            w.ecliptic.transfer_from(caller, from, to, point, &mut w.log)
        })
    }

    /// Safe transfer: a contract recipient must accept through its hook.
    pub fn safe_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        point: Point,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("safe_transfer_from", caller, |w, registry| {
            let guard = if to == w.treasury.address() {
                Some(InboundGuard::new(w.treasury.delegate(registry)?))
            } else {
                None
            };
            let receiver: Option<&dyn PointReceiver> = match &guard {
                Some(g) => Some(g as &dyn PointReceiver),
                None if w.is_contract(to) => Some(&NoReceiver as &dyn PointReceiver),
                None => None,
            };
            w.ecliptic
                .safe_transfer_from(caller, from, to, point, receiver, &mut w.log)
        })
    }

    // -----------------------------------------------------------------------
    // Treasury calls (through the proxy)
    // -----------------------------------------------------------------------

    pub fn deposit(&mut self, caller: Address, point: Point) -> Result<Receipt<()>, WstarError> {
        self.transact("deposit", caller, |w, registry| {
            with_treasury(w, registry, caller, |logic, storage, ctx| {
                logic.deposit(storage, ctx, point)
            })
        })
    }

    pub fn redeem(&mut self, caller: Address) -> Result<Receipt<Point>, WstarError> {
        self.transact("redeem", caller, |w, registry| {
            with_treasury(w, registry, caller, |logic, storage, ctx| {
                logic.redeem(storage, ctx)
            })
        })
    }

    /// The star `redeem` would return for `caller`, without redeeming it.
    pub fn redeem_preview(&self, caller: Address) -> Result<Point, WstarError> {
        self.call_static(|w, registry| {
            with_treasury(w, registry, caller, |logic, storage, ctx| {
                logic.redeem(storage, ctx)
            })
        })
    }

    pub fn asset_count(&self) -> Result<usize, WstarError> {
        let logic = self.state.treasury.delegate(&self.registry)?;
        Ok(logic.asset_count(self.state.treasury.storage()))
    }

    pub fn all_assets(&self) -> Result<Vec<Point>, WstarError> {
        let logic = self.state.treasury.delegate(&self.registry)?;
        Ok(logic.all_assets(self.state.treasury.storage()))
    }

    /// Version tag of the logic currently behind the proxy.
    pub fn treasury_version(&self) -> Result<String, WstarError> {
        Ok(self
            .state
            .treasury
            .delegate(&self.registry)?
            .version()
            .to_string())
    }

    // -----------------------------------------------------------------------
    // Treasury administration
    // -----------------------------------------------------------------------

    /// Upgrade the treasury through the Ecliptic (Ecliptic owner only).
    pub fn upgrade_treasury(
        &mut self,
        caller: Address,
        implementation: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("upgrade_treasury", caller, |w, registry| {
            let WorldState {
                ecliptic,
                treasury,
                log,
                ..
            } = w;
            let mut admin = ProxyAdmin {
                proxy: treasury,
                registry,
            };
            ecliptic.upgrade_treasury(caller, &mut admin, implementation, log)
        })
    }

    /// Freeze the treasury through the Ecliptic (Ecliptic owner only).
    pub fn freeze_treasury(&mut self, caller: Address) -> Result<Receipt<()>, WstarError> {
        self.transact("freeze_treasury", caller, |w, registry| {
            let WorldState {
                ecliptic,
                treasury,
                log,
                ..
            } = w;
            let mut admin = ProxyAdmin {
                proxy: treasury,
                registry,
            };
            ecliptic.freeze_treasury(caller, &mut admin, log)
        })
    }

    /// Call the proxy's `upgrade_to` directly. Only the Ecliptic may.
    pub fn proxy_upgrade_to(
        &mut self,
        caller: Address,
        implementation: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("proxy_upgrade_to", caller, |w, registry| {
            w.treasury
                .upgrade_to(caller, implementation, registry, &mut w.log)
        })
    }

    /// Call the proxy's `freeze` directly. Only the Ecliptic may.
    pub fn proxy_freeze(&mut self, caller: Address) -> Result<Receipt<()>, WstarError> {
        self.transact("proxy_freeze", caller, |w, _| {
            w.treasury.freeze(caller, &mut w.log)
        })
    }

    // -----------------------------------------------------------------------
    // Token calls
    // -----------------------------------------------------------------------

    pub fn token_transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Balance,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("token_transfer", caller, |w, _| {
            w.token.transfer(caller, to, amount, &mut w.log)
        })
    }

    pub fn token_approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Balance,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("token_approve", caller, |w, _| {
            w.token.approve(caller, spender, amount, &mut w.log)
        })
    }

    pub fn token_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Balance,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("token_transfer_from", caller, |w, _| {
            w.token.transfer_from(caller, from, to, amount, &mut w.log)
        })
    }

    pub fn token_send(
        &mut self,
        caller: Address,
        to: Address,
        amount: Balance,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("token_send", caller, |w, _| {
            w.token.send(caller, to, amount, &mut w.log)
        })
    }

    pub fn authorize_operator(
        &mut self,
        caller: Address,
        operator: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("authorize_operator", caller, |w, _| {
            w.token.authorize_operator(caller, operator, &mut w.log)
        })
    }

    pub fn revoke_operator(
        &mut self,
        caller: Address,
        operator: Address,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("revoke_operator", caller, |w, _| {
            w.token.revoke_operator(caller, operator, &mut w.log)
        })
    }

    pub fn operator_send(
        &mut self,
        caller: Address,
        holder: Address,
        to: Address,
        amount: Balance,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("operator_send", caller, |w, _| {
            w.token.operator_send(caller, holder, to, amount, &mut w.log)
        })
    }

    pub fn operator_burn(
        &mut self,
        caller: Address,
        holder: Address,
        amount: Balance,
    ) -> Result<Receipt<()>, WstarError> {
        self.transact("operator_burn", caller, |w, _| {
            w.token.operator_burn(caller, holder, amount, &mut w.log)
        })
    }
}

/// Delegate a treasury call through the proxy to its current logic.
fn with_treasury<T, F>(
    world: &mut WorldState,
    registry: &LogicRegistry,
    caller: Address,
    f: F,
) -> Result<T, WstarError>
where
    F: FnOnce(&dyn TreasuryLogic, &mut TreasuryStorage, &mut TreasuryContext<'_>) -> Result<T, WstarError>,
{
    let logic = world.treasury.delegate(registry)?;
    let this = world.treasury.address();
    let WorldState {
        ecliptic,
        token,
        treasury,
        log,
        ..
    } = world;
    let mut ctx = TreasuryContext {
        this,
        caller,
        ecliptic,
        token,
        log,
    };
    f(logic.as_ref(), treasury.storage_mut(), &mut ctx)
}
