// crates/wstar-treasury/src/token.rs
//
// WrappedStar token: the fungible claim on escrowed stars.
//
// The token has 18 decimals; one escrowed star backs exactly ONE_STAR base
// units (10^18). All internal accounting uses base units (u128) so no
// floating point ever touches a balance.
//
// Mint and burn are reserved to the token owner (the treasury). Holders
// transfer freely (ERC-20), and may authorize operators that send or burn on
// their behalf (ERC-777). The legacy `StarToken` preset additionally emits
// `Sent` on every move.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use wstar_core::{Address, Event, EventLog, WstarError};

/// Number of decimal places of the token.
pub const DECIMALS: u8 = 18;

/// Base units per whole token: 10^18.
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Token minted per deposited star and burned per redeemed star.
pub const ONE_STAR: Balance = UNITS_PER_TOKEN;

/// Balance in base units.
pub type Balance = u128;

/// Token amount for display, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stars {
    pub units: Balance,
}

impl Stars {
    pub fn from_units(units: Balance) -> Self {
        Self { units }
    }

    /// Whole number of stars this amount can redeem.
    pub fn whole(&self) -> u128 {
        self.units / ONE_STAR
    }

    pub fn zero() -> Self {
        Self { units: 0 }
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.units / UNITS_PER_TOKEN;
        let frac = self.units % UNITS_PER_TOKEN;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            // Up to 18 decimal places, trimming trailing zeros
            let frac_str = format!("{:018}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{}", whole, trimmed)
        }
    }
}

/// Parse a decimal token amount ("1", "0.5", "2.000000000000000001") into base units.
///
/// # Errors
/// Returns `WstarError::Parse` for malformed input, more than 18 decimals,
/// or overflow.
pub fn parse_amount(input: &str) -> Result<Balance, WstarError> {
    let trimmed = input.trim();
    let err = |why: &str| WstarError::Parse(format!("Invalid amount {:?}: {}", input, why));

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(err("empty"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(err("expected a decimal number"));
    }
    if frac.len() > DECIMALS as usize {
        return Err(err("too many decimal places"));
    }

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| err("overflow"))?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
        padded.parse::<u128>().map_err(|_| err("overflow"))?
    };

    whole_units
        .checked_mul(UNITS_PER_TOKEN)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(|| err("overflow"))
}

/// Token interface flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFlavor {
    /// ERC-20 moves: only `Transfer` is emitted.
    Erc20,
    /// ERC-777 moves: `Sent` accompanies every `Transfer`.
    Erc777,
}

/// Static token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub granularity: Balance,
    pub flavor: TokenFlavor,
}

impl TokenMetadata {
    /// The token minted by the treasury.
    pub fn wrapped_star() -> Self {
        Self {
            name: "WrappedStar".to_string(),
            symbol: "WSTR".to_string(),
            decimals: DECIMALS,
            granularity: 1,
            flavor: TokenFlavor::Erc20,
        }
    }

    /// The earlier standalone ERC-777 token.
    pub fn star_token() -> Self {
        Self {
            name: "StarToken".to_string(),
            symbol: "STAR".to_string(),
            decimals: DECIMALS,
            granularity: 1,
            flavor: TokenFlavor::Erc777,
        }
    }
}

/// Fungible token ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarToken {
    address: Address,
    metadata: TokenMetadata,
    /// The only account allowed to mint and burn.
    owner: Address,
    total_supply: Balance,
    balances: BTreeMap<Address, Balance>,
    /// owner -> spender -> remaining allowance.
    allowances: BTreeMap<Address, BTreeMap<Address, Balance>>,
    /// holder -> operators explicitly authorized by the holder.
    operators: BTreeMap<Address, BTreeSet<Address>>,
    /// Operators for every holder unless individually revoked.
    default_operators: BTreeSet<Address>,
    /// holder -> default operators the holder has revoked.
    revoked_defaults: BTreeMap<Address, BTreeSet<Address>>,
}

impl StarToken {
    /// Deploy a token at `address` owned by `owner`.
    ///
    /// A non-zero `initial_supply` is minted to the owner.
    pub fn new(
        address: Address,
        metadata: TokenMetadata,
        owner: Address,
        initial_supply: Balance,
        default_operators: Vec<Address>,
        log: &mut EventLog,
    ) -> Self {
        let mut token = Self {
            address,
            metadata,
            owner,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            operators: BTreeMap::new(),
            default_operators: default_operators.into_iter().collect(),
            revoked_defaults: BTreeMap::new(),
        };
        if initial_supply > 0 && !owner.is_zero() {
            token.mint_unchecked(owner, owner, initial_supply, log);
        }
        token
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn granularity(&self) -> Balance {
        self.metadata.granularity
    }

    pub fn total_supply(&self) -> Balance {
        self.total_supply
    }

    pub fn balance_of(&self, holder: Address) -> Balance {
        self.balances.get(&holder).copied().unwrap_or(0)
    }

    /// All non-zero balances.
    pub fn holders(&self) -> impl Iterator<Item = (Address, Balance)> + '_ {
        self.balances.iter().map(|(a, b)| (*a, *b))
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Balance {
        self.allowances
            .get(&owner)
            .and_then(|m| m.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn default_operators(&self) -> Vec<Address> {
        self.default_operators.iter().copied().collect()
    }

    /// Whether `operator` may send or burn on behalf of `holder`.
    pub fn is_operator_for(&self, operator: Address, holder: Address) -> bool {
        if operator == holder {
            return true;
        }
        if self.default_operators.contains(&operator) {
            return !self
                .revoked_defaults
                .get(&holder)
                .map(|r| r.contains(&operator))
                .unwrap_or(false);
        }
        self.operators
            .get(&holder)
            .map(|ops| ops.contains(&operator))
            .unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Owner-only supply changes
    // -----------------------------------------------------------------------

    fn only_owner(&self, caller: Address, action: &str) -> Result<(), WstarError> {
        if caller != self.owner {
            return Err(WstarError::Unauthorized(format!(
                "only the token owner {} may {}, not {}",
                self.owner, action, caller
            )));
        }
        Ok(())
    }

    fn check_granularity(&self, amount: Balance) -> Result<(), WstarError> {
        if amount % self.metadata.granularity != 0 {
            return Err(WstarError::InvalidState(format!(
                "Amount {} is not a multiple of the granularity {}",
                amount, self.metadata.granularity
            )));
        }
        Ok(())
    }

    /// Mint `amount` to `to`. Owner only.
    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_owner(caller, "mint")?;
        if to.is_zero() {
            return Err(WstarError::InvalidState(
                "Cannot mint to the zero address".to_string(),
            ));
        }
        self.check_granularity(amount)?;
        self.total_supply.checked_add(amount).ok_or_else(|| {
            WstarError::InvalidState("Total supply overflow".to_string())
        })?;
        self.mint_unchecked(caller, to, amount, log);
        Ok(())
    }

    fn mint_unchecked(&mut self, operator: Address, to: Address, amount: Balance, log: &mut EventLog) {
        self.total_supply += amount;
        *self.balances.entry(to).or_insert(0) += amount;
        log.emit(
            self.address,
            Event::Minted {
                operator,
                to,
                amount,
            },
        );
        log.emit(
            self.address,
            Event::Transfer {
                from: Address::ZERO,
                to,
                value: amount,
            },
        );
    }

    /// Burn `amount` from `from`. Owner only.
    pub fn burn(
        &mut self,
        caller: Address,
        from: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_owner(caller, "burn")?;
        self.burn_internal(caller, from, amount, log)
    }

    fn burn_internal(
        &mut self,
        operator: Address,
        from: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.check_granularity(amount)?;
        let available = self.balance_of(from);
        if available < amount {
            return Err(WstarError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        self.set_balance(from, available - amount);
        self.total_supply -= amount;
        log.emit(
            self.address,
            Event::Burned {
                operator,
                from,
                amount,
            },
        );
        log.emit(
            self.address,
            Event::Transfer {
                from,
                to: Address::ZERO,
                value: amount,
            },
        );
        Ok(())
    }

    fn set_balance(&mut self, holder: Address, balance: Balance) {
        if balance == 0 {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }

    // -----------------------------------------------------------------------
    // Holder transfers (ERC-20)
    // -----------------------------------------------------------------------

    fn move_tokens(
        &mut self,
        operator: Address,
        from: Address,
        to: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if from.is_zero() {
            return Err(WstarError::InvalidState(
                "Cannot transfer from the zero address".to_string(),
            ));
        }
        if to.is_zero() {
            return Err(WstarError::InvalidState(
                "Cannot transfer to the zero address".to_string(),
            ));
        }
        self.check_granularity(amount)?;
        let available = self.balance_of(from);
        if available < amount {
            return Err(WstarError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        self.set_balance(from, available - amount);
        let to_balance = self.balance_of(to);
        self.set_balance(to, to_balance + amount);

        if self.metadata.flavor == TokenFlavor::Erc777 {
            log.emit(
                self.address,
                Event::Sent {
                    operator,
                    from,
                    to,
                    amount,
                },
            );
        }
        log.emit(
            self.address,
            Event::Transfer {
                from,
                to,
                value: amount,
            },
        );
        Ok(())
    }

    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.move_tokens(caller, caller, to, amount, log)
    }

    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if spender.is_zero() {
            return Err(WstarError::InvalidState(
                "Cannot approve the zero address".to_string(),
            ));
        }
        self.allowances
            .entry(caller)
            .or_default()
            .insert(spender, amount);
        log.emit(
            self.address,
            Event::Approval {
                owner: caller,
                spender,
                value: amount,
            },
        );
        Ok(())
    }

    /// Spend an allowance granted by `from` to the caller.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        let allowed = self.allowance(from, caller);
        if allowed < amount {
            return Err(WstarError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        self.move_tokens(caller, from, to, amount, log)?;
        self.allowances
            .entry(from)
            .or_default()
            .insert(caller, allowed - amount);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Operators (ERC-777)
    // -----------------------------------------------------------------------

    /// ERC-777 send: a transfer that always reports the operator.
    pub fn send(
        &mut self,
        caller: Address,
        to: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.move_tokens(caller, caller, to, amount, log)
    }

    pub fn authorize_operator(
        &mut self,
        caller: Address,
        operator: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if operator == caller {
            return Err(WstarError::InvalidState(
                "Cannot authorize self as operator".to_string(),
            ));
        }
        if self.default_operators.contains(&operator) {
            if let Some(revoked) = self.revoked_defaults.get_mut(&caller) {
                revoked.remove(&operator);
            }
        } else {
            self.operators.entry(caller).or_default().insert(operator);
        }
        log.emit(
            self.address,
            Event::AuthorizedOperator {
                operator,
                holder: caller,
            },
        );
        Ok(())
    }

    pub fn revoke_operator(
        &mut self,
        caller: Address,
        operator: Address,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        if operator == caller {
            return Err(WstarError::InvalidState(
                "Cannot revoke self as operator".to_string(),
            ));
        }
        if self.default_operators.contains(&operator) {
            self.revoked_defaults
                .entry(caller)
                .or_default()
                .insert(operator);
        } else if let Some(ops) = self.operators.get_mut(&caller) {
            ops.remove(&operator);
        }
        log.emit(
            self.address,
            Event::RevokedOperator {
                operator,
                holder: caller,
            },
        );
        Ok(())
    }

    fn only_operator(&self, caller: Address, holder: Address) -> Result<(), WstarError> {
        if !self.is_operator_for(caller, holder) {
            return Err(WstarError::Unauthorized(format!(
                "{} is not an operator for {}",
                caller, holder
            )));
        }
        Ok(())
    }

    pub fn operator_send(
        &mut self,
        caller: Address,
        holder: Address,
        to: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_operator(caller, holder)?;
        self.move_tokens(caller, holder, to, amount, log)
    }

    pub fn operator_burn(
        &mut self,
        caller: Address,
        holder: Address,
        amount: Balance,
        log: &mut EventLog,
    ) -> Result<(), WstarError> {
        self.only_operator(caller, holder)?;
        self.burn_internal(caller, holder, amount, log)
    }
}
