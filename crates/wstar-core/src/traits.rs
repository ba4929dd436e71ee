// crates/wstar-core/src/traits.rs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::address::Address;
use crate::error::WstarError;
use crate::events::EventLog;
use crate::point::Point;

/// Hook invoked by a safe point transfer into a contract.
///
/// Implemented by the treasury's inbound-transfer guard. Returning an error
/// aborts the transfer that triggered the hook.
pub trait PointReceiver {
    fn on_point_received(
        &self,
        operator: Address,
        from: Address,
        point: Point,
    ) -> Result<(), WstarError>;
}

/// Administrative surface of an upgradeable treasury.
///
/// Implemented by the treasury proxy; driven by the Ecliptic controller,
/// which passes its own address as `caller`.
pub trait TreasuryAdmin {
    /// Point the proxy at a new implementation.
    fn upgrade_to(
        &mut self,
        caller: Address,
        implementation: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError>;

    /// Permanently pin the current implementation.
    fn freeze(&mut self, caller: Address, log: &mut EventLog) -> Result<(), WstarError>;
}

/// Trait for persisting whole-world snapshots.
///
/// Implemented by wstar-chain (JSON file backend).
#[async_trait]
pub trait SnapshotStore<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Load the stored snapshot, or `None` if nothing has been saved yet.
    async fn load(&self) -> Result<Option<T>, WstarError>;

    /// Persist a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &T) -> Result<(), WstarError>;
}
