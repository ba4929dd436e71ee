// crates/wstar-treasury/src/treasury.rs
//
// Treasury logic: star escrow against the WrappedStar token.
//
// A depositor hands a star to the treasury (by transfer proxy if the star is
// already spawned, by spawn proxy on the parent galaxy otherwise) and
// receives ONE_STAR of token. Any holder of ONE_STAR can redeem, receiving
// the most recently deposited star back (LIFO).
//
// The logic is stateless: all persistent state lives in `TreasuryStorage`,
// which the proxy owns and lends to whichever `TreasuryLogic` it currently
// points at.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wstar_azimuth::Ecliptic;
use wstar_core::{Address, Event, EventLog, Point, PointReceiver, PointSize, WstarError};

use crate::token::{StarToken, ONE_STAR};

/// Version tag of the built-in treasury logic.
pub const STANDARD_TREASURY_VERSION: &str = "standard-v1";

/// Escrowed stars, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetStack(Vec<Point>);

impl AssetStack {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, point: Point) {
        self.0.push(point);
    }

    /// Remove the most recently pushed star.
    pub fn pop(&mut self) -> Option<Point> {
        self.0.pop()
    }

    /// The star `pop` would return.
    pub fn peek(&self) -> Option<Point> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.0
    }
}

/// Persistent treasury state. Owned by the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryStorage {
    /// Registry the treasury escrows against.
    pub azimuth: Address,
    /// Token minted on deposit and burned on redeem.
    pub token: Address,
    pub assets: AssetStack,
}

impl TreasuryStorage {
    pub fn new(azimuth: Address, token: Address) -> Self {
        Self {
            azimuth,
            token,
            assets: AssetStack::new(),
        }
    }
}

/// Everything a treasury call may touch besides its own storage.
pub struct TreasuryContext<'a> {
    /// Address the treasury acts as (the proxy).
    pub this: Address,
    /// Account that invoked the treasury.
    pub caller: Address,
    pub ecliptic: &'a mut Ecliptic,
    pub token: &'a mut StarToken,
    pub log: &'a mut EventLog,
}

impl TreasuryContext<'_> {
    fn check_bindings(&self, storage: &TreasuryStorage) -> Result<(), WstarError> {
        if self.token.address() != storage.token {
            return Err(WstarError::InvalidState(format!(
                "Treasury is bound to token {}, got {}",
                storage.token,
                self.token.address()
            )));
        }
        if self.ecliptic.azimuth().address() != storage.azimuth {
            return Err(WstarError::InvalidState(format!(
                "Treasury is bound to azimuth {}, got {}",
                storage.azimuth,
                self.ecliptic.azimuth().address()
            )));
        }
        Ok(())
    }
}

/// A treasury implementation the proxy can delegate to.
pub trait TreasuryLogic: Send + Sync {
    /// Version tag, used to rebuild the logic after a snapshot load.
    fn version(&self) -> &str;

    /// Escrow `point` and mint ONE_STAR to the caller.
    ///
    /// # Errors
    /// - `InvalidAssetClass` if `point` is not a star.
    /// - `Unauthorized` if the caller may not hand over the point, or the
    ///   treasury lacks the transfer or spawn proxy it needs.
    fn deposit(
        &self,
        storage: &mut TreasuryStorage,
        ctx: &mut TreasuryContext<'_>,
        point: Point,
    ) -> Result<(), WstarError>;

    /// Burn ONE_STAR from the caller and return the most recently deposited star.
    ///
    /// # Errors
    /// - `NoAssets` if nothing is escrowed.
    /// - `InsufficientBalance` if the caller holds less than ONE_STAR.
    fn redeem(
        &self,
        storage: &mut TreasuryStorage,
        ctx: &mut TreasuryContext<'_>,
    ) -> Result<Point, WstarError>;

    fn asset_count(&self, storage: &TreasuryStorage) -> usize {
        storage.assets.len()
    }

    /// All escrowed stars, oldest first.
    fn all_assets(&self, storage: &TreasuryStorage) -> Vec<Point> {
        storage.assets.as_slice().to_vec()
    }

    /// Safe-transfer acceptance hook.
    fn on_point_received(
        &self,
        operator: Address,
        from: Address,
        point: Point,
    ) -> Result<(), WstarError>;
}

/// The built-in treasury logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTreasury;

impl StandardTreasury {
    pub fn new() -> Self {
        Self
    }

    /// Whether `who` may hand over a point owned by `owner`.
    fn may_act_for(ecliptic: &Ecliptic, owner: Address, who: Address) -> bool {
        owner == who || ecliptic.azimuth().is_operator(owner, who)
    }
}

impl TreasuryLogic for StandardTreasury {
    fn version(&self) -> &str {
        STANDARD_TREASURY_VERSION
    }

    fn deposit(
        &self,
        storage: &mut TreasuryStorage,
        ctx: &mut TreasuryContext<'_>,
        point: Point,
    ) -> Result<(), WstarError> {
        ctx.check_bindings(storage)?;
        if point.size() != PointSize::Star {
            return Err(WstarError::InvalidAssetClass(point, point.size()));
        }

        let azimuth = ctx.ecliptic.azimuth();
        let prefix = azimuth.get_prefix(point);
        if azimuth.is_active(point) {
            let owner = azimuth.get_owner(point);
            if !Self::may_act_for(ctx.ecliptic, owner, ctx.caller) {
                return Err(WstarError::Unauthorized(format!(
                    "{} is neither owner nor operator of star {}",
                    ctx.caller, point
                )));
            }
            ctx.ecliptic
                .transfer_point(ctx.this, point, ctx.this, true, ctx.log)?;
        } else {
            let galaxy_owner = azimuth.get_owner(prefix);
            if !Self::may_act_for(ctx.ecliptic, galaxy_owner, ctx.caller) {
                return Err(WstarError::Unauthorized(format!(
                    "{} is neither owner nor operator of galaxy {}",
                    ctx.caller, prefix
                )));
            }
            ctx.ecliptic.spawn(ctx.this, point, ctx.this, ctx.log)?;
        }

        // Custody must be ours before anything is minted
        if !ctx.ecliptic.azimuth().is_owner(point, ctx.this) {
            return Err(WstarError::InvalidState(format!(
                "Star {} did not arrive in treasury custody",
                point
            )));
        }

        storage.assets.push(point);
        ctx.token.mint(ctx.this, ctx.caller, ONE_STAR, ctx.log)?;
        ctx.log.emit(
            ctx.this,
            Event::Deposit {
                prefix,
                point,
                depositor: ctx.caller,
            },
        );

        tracing::info!(
            "Deposited star {} from {} ({} escrowed)",
            point,
            ctx.caller,
            storage.assets.len()
        );
        Ok(())
    }

    fn redeem(
        &self,
        storage: &mut TreasuryStorage,
        ctx: &mut TreasuryContext<'_>,
    ) -> Result<Point, WstarError> {
        ctx.check_bindings(storage)?;
        if storage.assets.is_empty() {
            return Err(WstarError::NoAssets);
        }
        let available = ctx.token.balance_of(ctx.caller);
        if available < ONE_STAR {
            return Err(WstarError::InsufficientBalance {
                required: ONE_STAR,
                available,
            });
        }

        let point = storage.assets.pop().ok_or(WstarError::NoAssets)?;
        ctx.token.burn(ctx.this, ctx.caller, ONE_STAR, ctx.log)?;
        ctx.ecliptic
            .transfer_point(ctx.this, point, ctx.caller, true, ctx.log)?;

        let prefix = ctx.ecliptic.azimuth().get_prefix(point);
        ctx.log.emit(
            ctx.this,
            Event::Redeem {
                prefix,
                point,
                redeemer: ctx.caller,
            },
        );

        tracing::info!(
            "Redeemed star {} to {} ({} escrowed)",
            point,
            ctx.caller,
            storage.assets.len()
        );
        Ok(point)
    }

    fn on_point_received(
        &self,
        _operator: Address,
        _from: Address,
        point: Point,
    ) -> Result<(), WstarError> {
        Err(WstarError::UnsafeTransferRejected(point))
    }
}

/// Adapts the current treasury logic to the Ecliptic's safe-transfer hook.
pub struct InboundGuard {
    logic: Arc<dyn TreasuryLogic>,
}

impl InboundGuard {
    pub fn new(logic: Arc<dyn TreasuryLogic>) -> Self {
        Self { logic }
    }
}

impl PointReceiver for InboundGuard {
    fn on_point_received(
        &self,
        operator: Address,
        from: Address,
        point: Point,
    ) -> Result<(), WstarError> {
        self.logic.on_point_received(operator, from, point)
    }
}

/// Deployed treasury implementations, by address.
#[derive(Clone, Default)]
pub struct LogicRegistry {
    implementations: BTreeMap<Address, Arc<dyn TreasuryLogic>>,
}

impl LogicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, address: Address, logic: Arc<dyn TreasuryLogic>) {
        self.implementations.insert(address, logic);
    }

    pub fn get(&self, address: Address) -> Option<Arc<dyn TreasuryLogic>> {
        self.implementations.get(&address).cloned()
    }

    pub fn contains(&self, address: Address) -> bool {
        self.implementations.contains_key(&address)
    }

    /// `(address, version)` of every registered implementation.
    pub fn versions(&self) -> Vec<(Address, String)> {
        self.implementations
            .iter()
            .map(|(a, l)| (*a, l.version().to_string()))
            .collect()
    }
}

impl std::fmt::Debug for LogicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.implementations.iter().map(|(a, l)| (a, l.version())))
            .finish()
    }
}

/// Rebuild a built-in logic from its version tag.
pub fn builtin_logic(version: &str) -> Option<Arc<dyn TreasuryLogic>> {
    match version {
        STANDARD_TREASURY_VERSION => Some(Arc::new(StandardTreasury::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenMetadata;

    const GALAXY_ZERO: Point = Point::new(0x0);
    const STAR_ZERO: Point = Point::new(0x100);
    const STAR_ONE: Point = Point::new(0x200);
    const PLANET_ZERO: Point = Point::new(0x10100);

    fn creator() -> Address {
        Address::from_label("creator")
    }

    fn mallory() -> Address {
        Address::from_label("mallory")
    }

    fn this() -> Address {
        Address::from_label("treasury-proxy")
    }

    struct Fixture {
        ecliptic: Ecliptic,
        token: StarToken,
        storage: TreasuryStorage,
        log: EventLog,
    }

    impl Fixture {
        /// Galaxy zero linked and owned by creator, star zero spawned to
        /// creator; treasury is transfer proxy of star zero and spawn proxy
        /// of galaxy zero.
        fn new() -> Self {
            let mut log = EventLog::new();
            let mut ecliptic = Ecliptic::new(
                Address::from_label("ecliptic"),
                creator(),
                Address::from_label("azimuth"),
            );
            ecliptic
                .create_galaxy(creator(), GALAXY_ZERO, creator(), &mut log)
                .unwrap();
            ecliptic
                .configure_keys(creator(), GALAXY_ZERO, [1; 32], [2; 32], 1, false, &mut log)
                .unwrap();
            ecliptic
                .spawn(creator(), STAR_ZERO, creator(), &mut log)
                .unwrap();
            ecliptic
                .set_spawn_proxy(creator(), GALAXY_ZERO, this(), &mut log)
                .unwrap();
            ecliptic
                .set_transfer_proxy(creator(), STAR_ZERO, this(), &mut log)
                .unwrap();

            let token = StarToken::new(
                Address::from_label("token"),
                TokenMetadata::wrapped_star(),
                this(),
                0,
                Vec::new(),
                &mut log,
            );
            let storage = TreasuryStorage::new(ecliptic.azimuth().address(), token.address());
            Self {
                ecliptic,
                token,
                storage,
                log,
            }
        }

        fn deposit(&mut self, caller: Address, point: Point) -> Result<(), WstarError> {
            let mut ctx = TreasuryContext {
                this: this(),
                caller,
                ecliptic: &mut self.ecliptic,
                token: &mut self.token,
                log: &mut self.log,
            };
            StandardTreasury.deposit(&mut self.storage, &mut ctx, point)
        }

        fn redeem(&mut self, caller: Address) -> Result<Point, WstarError> {
            let mut ctx = TreasuryContext {
                this: this(),
                caller,
                ecliptic: &mut self.ecliptic,
                token: &mut self.token,
                log: &mut self.log,
            };
            StandardTreasury.redeem(&mut self.storage, &mut ctx)
        }
    }

    #[test]
    fn test_asset_stack_is_lifo() {
        let mut stack = AssetStack::new();
        assert!(stack.is_empty());
        stack.push(STAR_ZERO);
        stack.push(STAR_ONE);
        assert_eq!(stack.as_slice(), &[STAR_ZERO, STAR_ONE]);
        assert_eq!(stack.peek(), Some(STAR_ONE));
        assert_eq!(stack.pop(), Some(STAR_ONE));
        assert_eq!(stack.pop(), Some(STAR_ZERO));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_deposit_spawned_star() {
        let mut fx = Fixture::new();
        fx.deposit(creator(), STAR_ZERO).unwrap();

        assert!(fx.ecliptic.azimuth().is_owner(STAR_ZERO, this()));
        assert_eq!(fx.token.balance_of(creator()), ONE_STAR);
        assert_eq!(StandardTreasury.asset_count(&fx.storage), 1);
        assert!(fx.log.contains(
            this(),
            &Event::Deposit {
                prefix: GALAXY_ZERO,
                point: STAR_ZERO,
                depositor: creator()
            }
        ));
    }

    #[test]
    fn test_deposit_unspawned_star() {
        let mut fx = Fixture::new();
        assert!(!fx.ecliptic.azimuth().is_active(STAR_ONE));
        fx.deposit(creator(), STAR_ONE).unwrap();

        assert!(fx.ecliptic.azimuth().is_owner(STAR_ONE, this()));
        assert_eq!(fx.token.balance_of(creator()), ONE_STAR);
        assert_eq!(StandardTreasury.all_assets(&fx.storage), vec![STAR_ONE]);
    }

    #[test]
    fn test_deposit_rejects_non_stars() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.deposit(creator(), GALAXY_ZERO),
            Err(WstarError::InvalidAssetClass(GALAXY_ZERO, PointSize::Galaxy))
        );
        assert_eq!(
            fx.deposit(creator(), PLANET_ZERO),
            Err(WstarError::InvalidAssetClass(PLANET_ZERO, PointSize::Planet))
        );
        assert_eq!(fx.token.total_supply(), 0);
        assert!(fx.storage.assets.is_empty());
    }

    #[test]
    fn test_deposit_rejects_non_owner() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.deposit(mallory(), STAR_ZERO),
            Err(WstarError::Unauthorized(_))
        ));
        assert!(matches!(
            fx.deposit(mallory(), STAR_ONE),
            Err(WstarError::Unauthorized(_))
        ));
        assert_eq!(fx.token.total_supply(), 0);
    }

    #[test]
    fn test_deposit_by_operator() {
        let mut fx = Fixture::new();
        let operator = Address::from_label("operator");
        fx.ecliptic
            .set_approval_for_all(creator(), operator, true, &mut fx.log)
            .unwrap();
        fx.deposit(operator, STAR_ZERO).unwrap();
        assert_eq!(fx.token.balance_of(operator), ONE_STAR);
        assert_eq!(fx.token.balance_of(creator()), 0);
    }

    #[test]
    fn test_deposit_requires_transfer_proxy() {
        let mut fx = Fixture::new();
        fx.ecliptic
            .set_transfer_proxy(creator(), STAR_ZERO, Address::ZERO, &mut fx.log)
            .unwrap();
        assert!(matches!(
            fx.deposit(creator(), STAR_ZERO),
            Err(WstarError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_redeem_lifo() {
        let mut fx = Fixture::new();
        fx.deposit(creator(), STAR_ZERO).unwrap();
        fx.deposit(creator(), STAR_ONE).unwrap();
        assert_eq!(fx.token.balance_of(creator()), 2 * ONE_STAR);

        assert_eq!(fx.redeem(creator()).unwrap(), STAR_ONE);
        assert_eq!(fx.storage.assets.len(), 1);
        assert!(fx.ecliptic.azimuth().is_owner(STAR_ONE, creator()));
        assert!(fx.log.contains(
            this(),
            &Event::Redeem {
                prefix: GALAXY_ZERO,
                point: STAR_ONE,
                redeemer: creator()
            }
        ));

        assert_eq!(fx.redeem(creator()).unwrap(), STAR_ZERO);
        assert!(fx.storage.assets.is_empty());
        assert_eq!(fx.token.balance_of(creator()), 0);
        assert_eq!(fx.token.total_supply(), 0);
    }

    #[test]
    fn test_redeem_errors() {
        let mut fx = Fixture::new();
        assert_eq!(fx.redeem(creator()), Err(WstarError::NoAssets));

        fx.deposit(creator(), STAR_ZERO).unwrap();
        assert_eq!(
            fx.redeem(mallory()),
            Err(WstarError::InsufficientBalance {
                required: ONE_STAR,
                available: 0
            })
        );
    }

    #[test]
    fn test_wrong_token_binding() {
        let mut fx = Fixture::new();
        fx.storage.token = Address::from_label("other-token");
        assert!(matches!(
            fx.deposit(creator(), STAR_ZERO),
            Err(WstarError::InvalidState(_))
        ));
    }

    #[test]
    fn test_inbound_guard_rejects() {
        let guard = InboundGuard::new(Arc::new(StandardTreasury));
        assert_eq!(
            guard.on_point_received(creator(), creator(), STAR_ZERO),
            Err(WstarError::UnsafeTransferRejected(STAR_ZERO))
        );
    }

    #[test]
    fn test_logic_registry() {
        let mut registry = LogicRegistry::new();
        let addr = Address::from_label("impl");
        assert!(registry.get(addr).is_none());
        registry.register(addr, Arc::new(StandardTreasury));
        assert!(registry.contains(addr));
        assert_eq!(
            registry.versions(),
            vec![(addr, STANDARD_TREASURY_VERSION.to_string())]
        );
        assert!(builtin_logic(STANDARD_TREASURY_VERSION).is_some());
        assert!(builtin_logic("unknown").is_none());
    }
}
