// crates/wstar-azimuth/src/azimuth.rs
//
// Azimuth: the point ownership registry.
//
// Tracks, per point: owner, activation, networking keys, continuity, spawn
// and transfer proxies, and the list of children spawned under it. Also
// tracks operators (owner -> set of addresses allowed to act for all of the
// owner's points).
//
// Points never written to are owned by the zero address and inactive. Write
// methods are only reachable through the `Ecliptic` that owns this registry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use wstar_core::{Address, Event, EventLog, Point, PointSize, WstarError};

/// Networking keys of a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointKeys {
    pub encryption_key: [u8; 32],
    pub authentication_key: [u8; 32],
    pub crypto_suite_version: u32,
    /// Incremented on every key change. Non-zero means the point has been linked.
    pub key_revision_number: u32,
}

impl PointKeys {
    /// Whether both keys are unset.
    pub fn is_blank(&self) -> bool {
        self.encryption_key == [0u8; 32] && self.authentication_key == [0u8; 32]
    }
}

/// Registry state for a single point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub owner: Address,
    pub active: bool,
    pub keys: PointKeys,
    pub continuity_number: u32,
    pub spawn_proxy: Address,
    pub transfer_proxy: Address,
    /// Children spawned under this point, in spawn order.
    pub spawned: Vec<Point>,
}

/// The Azimuth registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Azimuth {
    address: Address,
    /// Contract allowed to mutate the registry (the Ecliptic).
    owner: Address,
    points: BTreeMap<Point, PointRecord>,
    operators: BTreeMap<Address, BTreeSet<Address>>,
}

impl Azimuth {
    /// Create an empty registry at `address`, mutable only by `owner`.
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            points: BTreeMap::new(),
            operators: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The controller contract that owns this registry.
    pub fn owner(&self) -> Address {
        self.owner
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Full record of a point (default record if never written).
    pub fn record(&self, point: Point) -> PointRecord {
        self.points.get(&point).cloned().unwrap_or_default()
    }

    pub fn get_owner(&self, point: Point) -> Address {
        self.points
            .get(&point)
            .map(|r| r.owner)
            .unwrap_or(Address::ZERO)
    }

    pub fn is_owner(&self, point: Point, who: Address) -> bool {
        self.get_owner(point) == who
    }

    pub fn is_active(&self, point: Point) -> bool {
        self.points.get(&point).map(|r| r.active).unwrap_or(false)
    }

    pub fn get_prefix(&self, point: Point) -> Point {
        point.prefix()
    }

    pub fn get_point_size(&self, point: Point) -> PointSize {
        point.size()
    }

    pub fn get_keys(&self, point: Point) -> PointKeys {
        self.points.get(&point).map(|r| r.keys).unwrap_or_default()
    }

    pub fn get_key_revision_number(&self, point: Point) -> u32 {
        self.get_keys(point).key_revision_number
    }

    /// Whether the point has ever had keys configured.
    pub fn has_been_linked(&self, point: Point) -> bool {
        self.get_key_revision_number(point) > 0
    }

    pub fn get_continuity_number(&self, point: Point) -> u32 {
        self.points
            .get(&point)
            .map(|r| r.continuity_number)
            .unwrap_or(0)
    }

    pub fn get_spawned(&self, prefix: Point) -> Vec<Point> {
        self.points
            .get(&prefix)
            .map(|r| r.spawned.clone())
            .unwrap_or_default()
    }

    pub fn get_spawn_count(&self, prefix: Point) -> u32 {
        self.points
            .get(&prefix)
            .map(|r| r.spawned.len() as u32)
            .unwrap_or(0)
    }

    pub fn get_spawn_proxy(&self, point: Point) -> Address {
        self.points
            .get(&point)
            .map(|r| r.spawn_proxy)
            .unwrap_or(Address::ZERO)
    }

    pub fn is_spawn_proxy(&self, prefix: Point, who: Address) -> bool {
        self.get_spawn_proxy(prefix) == who
    }

    /// Owner or spawn proxy of `prefix`.
    pub fn can_spawn_as(&self, prefix: Point, who: Address) -> bool {
        self.is_owner(prefix, who) || self.is_spawn_proxy(prefix, who)
    }

    pub fn get_transfer_proxy(&self, point: Point) -> Address {
        self.points
            .get(&point)
            .map(|r| r.transfer_proxy)
            .unwrap_or(Address::ZERO)
    }

    pub fn is_transfer_proxy(&self, point: Point, who: Address) -> bool {
        self.get_transfer_proxy(point) == who
    }

    /// Owner or transfer proxy of `point`. Operators are checked by the Ecliptic.
    pub fn can_transfer(&self, point: Point, who: Address) -> bool {
        self.is_owner(point, who) || self.is_transfer_proxy(point, who)
    }

    /// Whether `operator` may act on all of `owner`'s points.
    pub fn is_operator(&self, owner: Address, operator: Address) -> bool {
        self.operators
            .get(&owner)
            .map(|ops| ops.contains(&operator))
            .unwrap_or(false)
    }

    /// All points currently owned by `owner`.
    pub fn owned_points(&self, owner: Address) -> Vec<Point> {
        self.points
            .iter()
            .filter(|(_, r)| r.owner == owner)
            .map(|(p, _)| *p)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Writes (Ecliptic only)
    // -----------------------------------------------------------------------

    /// Mark a point as active and register it with its prefix.
    ///
    /// # Errors
    /// Returns `WstarError::InvalidState` if the point is already active.
    pub fn activate_point(&mut self, point: Point, log: &mut EventLog) -> Result<(), WstarError> {
        if self.is_active(point) {
            return Err(WstarError::InvalidState(format!(
                "Point {} is already active",
                point
            )));
        }

        self.points.entry(point).or_default().active = true;
        log.emit(self.address, Event::Activated { point });

        let prefix = point.prefix();
        if prefix != point {
            self.points.entry(prefix).or_default().spawned.push(point);
            log.emit(
                self.address,
                Event::Spawned {
                    prefix,
                    child: point,
                },
            );
        }
        Ok(())
    }

    pub fn set_owner(&mut self, point: Point, owner: Address, log: &mut EventLog) {
        let record = self.points.entry(point).or_default();
        if record.owner == owner {
            return;
        }
        record.owner = owner;
        log.emit(self.address, Event::OwnerChanged { point, owner });
    }

    pub fn set_spawn_proxy(&mut self, point: Point, proxy: Address, log: &mut EventLog) {
        let record = self.points.entry(point).or_default();
        if record.spawn_proxy == proxy {
            return;
        }
        record.spawn_proxy = proxy;
        log.emit(
            self.address,
            Event::ChangedSpawnProxy {
                point,
                spawn_proxy: proxy,
            },
        );
    }

    pub fn set_transfer_proxy(&mut self, point: Point, proxy: Address, log: &mut EventLog) {
        let record = self.points.entry(point).or_default();
        if record.transfer_proxy == proxy {
            return;
        }
        record.transfer_proxy = proxy;
        log.emit(
            self.address,
            Event::ChangedTransferProxy {
                point,
                transfer_proxy: proxy,
            },
        );
    }

    pub fn set_operator(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.entry(owner).or_default().insert(operator);
        } else if let Some(ops) = self.operators.get_mut(&owner) {
            ops.remove(&operator);
            if ops.is_empty() {
                self.operators.remove(&owner);
            }
        }
    }

    /// Replace the networking keys of a point. No-op if they are unchanged.
    pub fn set_keys(
        &mut self,
        point: Point,
        encryption_key: [u8; 32],
        authentication_key: [u8; 32],
        crypto_suite_version: u32,
        log: &mut EventLog,
    ) {
        let record = self.points.entry(point).or_default();
        let keys = &mut record.keys;
        if keys.encryption_key == encryption_key
            && keys.authentication_key == authentication_key
            && keys.crypto_suite_version == crypto_suite_version
        {
            return;
        }

        keys.encryption_key = encryption_key;
        keys.authentication_key = authentication_key;
        keys.crypto_suite_version = crypto_suite_version;
        keys.key_revision_number += 1;

        log.emit(
            self.address,
            Event::ChangedKeys {
                point,
                encryption_key,
                authentication_key,
                crypto_suite_version,
                key_revision_number: keys.key_revision_number,
            },
        );
    }

    pub fn increment_continuity_number(&mut self, point: Point, log: &mut EventLog) {
        let record = self.points.entry(point).or_default();
        record.continuity_number += 1;
        log.emit(
            self.address,
            Event::BrokeContinuity {
                point,
                number: record.continuity_number,
            },
        );
    }
}
