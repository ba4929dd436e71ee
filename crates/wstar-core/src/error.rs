use thiserror::Error;

use crate::address::Address;
use crate::point::{Point, PointSize};

/// Error types for the WrappedStar treasury and its collaborators.
///
/// Every error aborts the operation that raised it; no partial effects
/// survive a failed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WstarError {
    /// A non-star point was offered for deposit.
    #[error("Invalid asset class: point {0} is a {1}, only stars can be deposited")]
    InvalidAssetClass(Point, PointSize),

    /// Caller lacks ownership, operator, proxy, or admin rights.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Redeem was attempted while the treasury holds no stars.
    #[error("No assets: the treasury holds no stars")]
    NoAssets,

    /// Redeem or burn below the required amount.
    #[error("Insufficient balance: required {required} but only {available} available")]
    InsufficientBalance { required: u128, available: u128 },

    /// ERC-20 `transferFrom` beyond the approved allowance.
    #[error("Insufficient allowance: required {required} but only {available} approved")]
    InsufficientAllowance { required: u128, available: u128 },

    /// Upgrade attempted after the proxy was frozen.
    #[error("Contract frozen: implementation {0} can no longer be changed")]
    ContractFrozen(Address),

    /// Safe transfer of a point into a contract that refuses it.
    #[error("Unsafe transfer rejected: point {0} must be deposited, not sent")]
    UnsafeTransferRejected(Point),

    /// Upgrade target is not a deployed treasury implementation.
    #[error("Invalid implementation: {0} is not a deployed treasury implementation")]
    InvalidImplementation(Address),

    /// Registry or token rule violation (e.g. spawning an active point).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed address, point, or amount.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration or scenario file error.
    #[error("Config error: {0}")]
    Config(String),
}

impl WstarError {
    /// Stable snake_case name of the error variant.
    ///
    /// Scenario files refer to expected failures by this name.
    pub fn kind(&self) -> &'static str {
        match self {
            WstarError::InvalidAssetClass(..) => "invalid_asset_class",
            WstarError::Unauthorized(_) => "unauthorized",
            WstarError::NoAssets => "no_assets",
            WstarError::InsufficientBalance { .. } => "insufficient_balance",
            WstarError::InsufficientAllowance { .. } => "insufficient_allowance",
            WstarError::ContractFrozen(_) => "contract_frozen",
            WstarError::UnsafeTransferRejected(_) => "unsafe_transfer_rejected",
            WstarError::InvalidImplementation(_) => "invalid_implementation",
            WstarError::InvalidState(_) => "invalid_state",
            WstarError::NotFound(_) => "not_found",
            WstarError::Parse(_) => "parse",
            WstarError::Serialization(_) => "serialization",
            WstarError::Storage(_) => "storage",
            WstarError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for WstarError {
    fn from(e: serde_json::Error) -> Self {
        WstarError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for WstarError {
    fn from(e: toml::de::Error) -> Self {
        WstarError::Config(e.to_string())
    }
}

impl From<std::io::Error> for WstarError {
    fn from(e: std::io::Error) -> Self {
        WstarError::Storage(e.to_string())
    }
}
