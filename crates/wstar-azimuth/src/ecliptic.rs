// crates/wstar-azimuth/src/ecliptic.rs
//
// Ecliptic: the controller that owns the Azimuth registry.
//
// Every registry mutation goes through here with an explicit `caller`, the
// way a contract sees `msg.sender`. Rules:
//   - create_galaxy: controller owner only; galaxy must be unowned.
//   - spawn: prefix must be active, linked, one size class up, and below its
//     spawn limit; caller must be the prefix owner or its spawn proxy.
//   - transfer: caller must be the owner, the transfer proxy, or an operator
//     of the owner. Transfers always clear the transfer proxy; a reset
//     transfer also clears keys and the spawn proxy and breaks continuity.
//   - safe transfer: plain transfer followed by the receiver hook when the
//     recipient is a contract.
//
// The controller also fronts the treasury proxy's admin functions.

use serde::{Deserialize, Serialize};

use wstar_core::{
    Address, Event, EventLog, Point, PointReceiver, PointSize, TreasuryAdmin, WstarError,
};

use crate::azimuth::Azimuth;

/// Maximum number of stars a galaxy may spawn.
pub const GALAXY_SPAWN_LIMIT: u32 = 255;

/// Maximum number of planets a star may spawn.
pub const STAR_SPAWN_LIMIT: u32 = 65_535;

/// The Ecliptic controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ecliptic {
    address: Address,
    /// Governance account allowed to create galaxies and administer the treasury.
    owner: Address,
    azimuth: Azimuth,
}

impl Ecliptic {
    /// Create a controller at `address` owned by `owner`, taking ownership of
    /// a fresh registry deployed at `azimuth_address`.
    pub fn new(address: Address, owner: Address, azimuth_address: Address) -> Self {
        Self {
            address,
            owner,
            azimuth: Azimuth::new(azimuth_address, address),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Read-only view of the registry.
    pub fn azimuth(&self) -> &Azimuth {
        &self.azimuth
    }

    /// Spawn limit of a prefix, by size class.
    pub fn get_spawn_limit(&self, prefix: Point) -> u32 {
        match prefix.size() {
            PointSize::Galaxy => GALAXY_SPAWN_LIMIT,
            PointSize::Star => STAR_SPAWN_LIMIT,
            PointSize::Planet => 0,
        }
    }

    fn only_owner(&self, caller: Address, action: &str) -> Result<(), WstarError> {
        if caller != self.owner {
            return Err(WstarError::Unauthorized(format!(
                "{} may only be called by the Ecliptic owner {}, not {}",
                action, self.owner, caller
            )));
        }
        Ok(())
    }

    /// Owner of `point` or an operator of that owner.
    fn is_owner_or_operator(&self, point: Point, caller: Address) -> bool {
        let owner = self.azimuth.get_owner(point);
        owner == caller || self.azimuth.is_operator(owner, caller)
    }

    // -----------------------------------------------------------------------
    // Point issuance
    // -----------------------------------------------------------------------

    /// Grant a new galaxy to `target`.
    ///
    /// If `target` is the caller the galaxy is assigned directly; otherwise
    /// the caller holds it with `target` as transfer proxy.
    pub fn create_galaxy(
        &mut self,
        caller: Address,
        galaxy: Point,
        target: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_owner(caller, "createGalaxy")?;
        if galaxy.size() != PointSize::Galaxy {
            return Err(WstarError::InvalidState(format!(
                "Point {} is a {}, not a galaxy",
                galaxy,
                galaxy.size()
            )));
        }
        if !self.azimuth.is_owner(galaxy, Address::ZERO) || self.azimuth.is_active(galaxy) {
            return Err(WstarError::InvalidState(format!(
                "Galaxy {} has already been created",
                galaxy
            )));
        }

        let holder = if target == caller { target } else { caller };
        self.do_spawn(galaxy, holder, target, log)
    }

    /// Spawn `point` under its prefix.
    pub fn spawn(
        &mut self,
        caller: Address,
        point: Point,
        target: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if target.is_zero() {
            return Err(WstarError::InvalidState(
                "Cannot spawn to the zero address".to_string(),
            ));
        }
        if !self.azimuth.is_owner(point, Address::ZERO) || self.azimuth.is_active(point) {
            return Err(WstarError::InvalidState(format!(
                "Point {} has already been spawned",
                point
            )));
        }

        let prefix = self.azimuth.get_prefix(point);
        if prefix.size().child() != Some(point.size()) {
            return Err(WstarError::InvalidState(format!(
                "Point {} cannot be spawned: its prefix {} is not one size class above it",
                point, prefix
            )));
        }
        if !self.azimuth.is_active(prefix) || !self.azimuth.has_been_linked(prefix) {
            return Err(WstarError::InvalidState(format!(
                "Prefix {} must be active and linked before spawning",
                prefix
            )));
        }
        let limit = self.get_spawn_limit(prefix);
        if self.azimuth.get_spawn_count(prefix) >= limit {
            return Err(WstarError::InvalidState(format!(
                "Prefix {} has reached its spawn limit of {}",
                prefix, limit
            )));
        }
        if !self.azimuth.can_spawn_as(prefix, caller) {
            return Err(WstarError::Unauthorized(format!(
                "{} is neither owner nor spawn proxy of {}",
                caller, prefix
            )));
        }

        let holder = if target == caller {
            target
        } else {
            self.azimuth.get_owner(prefix)
        };
        self.do_spawn(point, holder, target, log)
    }

    /// Activate `point` into `holder`. If `holder` differs from `target`,
    /// `target` becomes the transfer proxy so it can claim the point.
    fn do_spawn(
        &mut self,
        point: Point,
        holder: Address,
        target: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.azimuth.activate_point(point, log)?;
        self.azimuth.set_owner(point, holder, log);
        log.emit(
            self.address,
            Event::PointTransfer {
                from: Address::ZERO,
                to: holder,
                point,
            },
        );

        if holder != target {
            self.azimuth.set_transfer_proxy(point, target, log);
            log.emit(
                self.address,
                Event::PointApproval {
                    owner: holder,
                    approved: target,
                    point,
                },
            );
        }

        tracing::debug!("Spawned point {} to {}", point, holder);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Proxies, operators, keys
    // -----------------------------------------------------------------------

    pub fn set_spawn_proxy(
        &mut self,
        caller: Address,
        prefix: Point,
        proxy: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if !self.azimuth.is_active(prefix) {
            return Err(WstarError::InvalidState(format!(
                "Point {} is not active",
                prefix
            )));
        }
        if !self.is_owner_or_operator(prefix, caller) {
            return Err(WstarError::Unauthorized(format!(
                "{} may not set the spawn proxy of {}",
                caller, prefix
            )));
        }
        self.azimuth.set_spawn_proxy(prefix, proxy, log);
        Ok(())
    }

    pub fn set_transfer_proxy(
        &mut self,
        caller: Address,
        point: Point,
        proxy: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if !self.is_owner_or_operator(point, caller) {
            return Err(WstarError::Unauthorized(format!(
                "{} may not set the transfer proxy of {}",
                caller, point
            )));
        }
        let owner = self.azimuth.get_owner(point);
        self.azimuth.set_transfer_proxy(point, proxy, log);
        log.emit(
            self.address,
            Event::PointApproval {
                owner,
                approved: proxy,
                point,
            },
        );
        Ok(())
    }

    /// Allow or disallow `operator` to act on all of the caller's points.
    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if operator == caller {
            return Err(WstarError::InvalidState(
                "Cannot set approval for self".to_string(),
            ));
        }
        self.azimuth.set_operator(caller, operator, approved);
        log.emit(
            self.address,
            Event::ApprovalForAll {
                owner: caller,
                operator,
                approved,
            },
        );
        Ok(())
    }

    /// Configure networking keys. The first configuration links the point.
    #[allow(clippy::too_many_arguments)]
    pub fn configure_keys(
        &mut self,
        caller: Address,
        point: Point,
        encryption_key: [u8; 32],
        authentication_key: [u8; 32],
        crypto_suite_version: u32,
        discontinuous: bool,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if !self.azimuth.is_active(point) {
            return Err(WstarError::InvalidState(format!(
                "Point {} is not active",
                point
            )));
        }
        if !self.is_owner_or_operator(point, caller) {
            return Err(WstarError::Unauthorized(format!(
                "{} may not configure keys of {}",
                caller, point
            )));
        }
        if discontinuous {
            self.azimuth.increment_continuity_number(point, log);
        }
        self.azimuth.set_keys(
            point,
            encryption_key,
            authentication_key,
            crypto_suite_version,
            log,
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Transfer `point` to `target`.
    pub fn transfer_point(
        &mut self,
        caller: Address,
        point: Point,
        target: Address,
        reset: bool,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if target.is_zero() {
            return Err(WstarError::InvalidState(
                "Cannot transfer to the zero address".to_string(),
            ));
        }
        let old_owner = self.azimuth.get_owner(point);
        if !self.azimuth.can_transfer(point, caller)
            && !self.azimuth.is_operator(old_owner, caller)
        {
            return Err(WstarError::Unauthorized(format!(
                "{} may not transfer point {}",
                caller, point
            )));
        }

        if !self.azimuth.is_active(point) {
            self.azimuth.activate_point(point, log)?;
        }
        if old_owner != target {
            self.azimuth.set_owner(point, target, log);
            log.emit(
                self.address,
                Event::PointTransfer {
                    from: old_owner,
                    to: target,
                    point,
                },
            );
        }

        if reset {
            if !self.azimuth.get_keys(point).is_blank() {
                self.azimuth
                    .set_keys(point, [0u8; 32], [0u8; 32], 0, log);
                self.azimuth.increment_continuity_number(point, log);
            }
            self.azimuth.set_spawn_proxy(point, Address::ZERO, log);
        }
        self.azimuth.set_transfer_proxy(point, Address::ZERO, log);

        tracing::debug!("Transferred point {} from {} to {}", point, old_owner, target);
        Ok(())
    }

    /// ERC-721 style transfer: `from` must be the current owner. Resets the point.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        point: Point,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        let owner = self.azimuth.get_owner(point);
        if owner != from {
            return Err(WstarError::Unauthorized(format!(
                "{} does not own point {} (owner is {})",
                from, point, owner
            )));
        }
        self.transfer_point(caller, point, to, true, log)
    }

    /// Transfer followed by the recipient's acceptance hook.
    ///
    /// `receiver` is the recipient's hook when `to` is a contract, `None`
    /// for plain accounts. A contract recipient without a hook is passed as
    /// `Some` of a hook that rejects.
    pub fn safe_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        point: Point,
        receiver: Option<&dyn PointReceiver>,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.transfer_from(caller, from, to, point, log)?;
        if let Some(hook) = receiver {
            hook.on_point_received(caller, from, point)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Treasury administration
    // -----------------------------------------------------------------------

    /// Upgrade the treasury proxy. Owner only; the proxy sees the Ecliptic as caller.
    pub fn upgrade_treasury(
        &self,
        caller: Address,
        treasury: &mut dyn TreasuryAdmin,
        implementation: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_owner(caller, "upgradeTreasury")?;
        treasury.upgrade_to(self.address, implementation, log)
    }

    /// Freeze the treasury proxy. Owner only; the proxy sees the Ecliptic as caller.
    pub fn freeze_treasury(
        &self,
        caller: Address,
        treasury: &mut dyn TreasuryAdmin,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_owner(caller, "freezeTreasury")?;
        treasury.freeze(self.address, log)
    }
}
