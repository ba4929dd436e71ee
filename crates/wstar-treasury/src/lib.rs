// crates/wstar-treasury/src/lib.rs
//
// wstar-treasury: Star escrow for the WrappedStar token.
//
// Modules:
//   - token: WrappedStar fungible token (mint/burn reserved to the treasury)
//   - treasury: Deposit/redeem logic and the asset stack
//   - proxy: Upgradeable, freezable treasury proxy holding the storage

pub mod proxy;
pub mod token;
pub mod treasury;

pub use proxy::{ProxyAdmin, ProxyState, TreasuryProxy};
pub use token::{
    parse_amount, Balance, StarToken, Stars, TokenFlavor, TokenMetadata, DECIMALS, ONE_STAR,
};
pub use treasury::{
    builtin_logic, AssetStack, InboundGuard, LogicRegistry, StandardTreasury, TreasuryContext,
    TreasuryLogic, TreasuryStorage, STANDARD_TREASURY_VERSION,
};
