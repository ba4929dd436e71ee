// crates/wstar-core/src/events.rs
//
// Event log shared by every contract in the simulated chain.
//
// Each contract appends `LogEntry` values tagged with its own address as the
// emitter. The chain hands out a `mark()` before running a transaction and
// uses `since(mark)` to build the receipt; reverted transactions never reach
// the committed log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::point::Point;

/// Events emitted by the registry, the controller, the token, and the treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    // -- Treasury --
    Deposit {
        prefix: Point,
        point: Point,
        depositor: Address,
    },
    Redeem {
        prefix: Point,
        point: Point,
        redeemer: Address,
    },

    // -- Token (ERC-20 / ERC-777) --
    Transfer {
        from: Address,
        to: Address,
        value: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: u128,
    },
    Minted {
        operator: Address,
        to: Address,
        amount: u128,
    },
    Burned {
        operator: Address,
        from: Address,
        amount: u128,
    },
    Sent {
        operator: Address,
        from: Address,
        to: Address,
        amount: u128,
    },
    AuthorizedOperator {
        operator: Address,
        holder: Address,
    },
    RevokedOperator {
        operator: Address,
        holder: Address,
    },

    // -- Ecliptic (ERC-721 view of points) --
    PointTransfer {
        from: Address,
        to: Address,
        point: Point,
    },
    PointApproval {
        owner: Address,
        approved: Address,
        point: Point,
    },
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },

    // -- Azimuth --
    Activated {
        point: Point,
    },
    Spawned {
        prefix: Point,
        child: Point,
    },
    OwnerChanged {
        point: Point,
        owner: Address,
    },
    ChangedSpawnProxy {
        point: Point,
        spawn_proxy: Address,
    },
    ChangedTransferProxy {
        point: Point,
        transfer_proxy: Address,
    },
    ChangedKeys {
        point: Point,
        encryption_key: [u8; 32],
        authentication_key: [u8; 32],
        crypto_suite_version: u32,
        key_revision_number: u32,
    },
    BrokeContinuity {
        point: Point,
        number: u32,
    },

    // -- TreasuryProxy --
    Upgraded {
        implementation: Address,
    },
    Frozen {
        implementation: Address,
    },
}

impl Event {
    /// Event name as it would appear in a contract ABI.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Deposit { .. } => "Deposit",
            Event::Redeem { .. } => "Redeem",
            Event::Transfer { .. } | Event::PointTransfer { .. } => "Transfer",
            Event::Approval { .. } | Event::PointApproval { .. } => "Approval",
            Event::Minted { .. } => "Minted",
            Event::Burned { .. } => "Burned",
            Event::Sent { .. } => "Sent",
            Event::AuthorizedOperator { .. } => "AuthorizedOperator",
            Event::RevokedOperator { .. } => "RevokedOperator",
            Event::ApprovalForAll { .. } => "ApprovalForAll",
            Event::Activated { .. } => "Activated",
            Event::Spawned { .. } => "Spawned",
            Event::OwnerChanged { .. } => "OwnerChanged",
            Event::ChangedSpawnProxy { .. } => "ChangedSpawnProxy",
            Event::ChangedTransferProxy { .. } => "ChangedTransferProxy",
            Event::ChangedKeys { .. } => "ChangedKeys",
            Event::BrokeContinuity { .. } => "BrokeContinuity",
            Event::Upgraded { .. } => "Upgraded",
            Event::Frozen { .. } => "Frozen",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Deposit {
                prefix,
                point,
                depositor,
            } => write!(f, "Deposit({}, {}, {})", prefix, point, depositor),
            Event::Redeem {
                prefix,
                point,
                redeemer,
            } => write!(f, "Redeem({}, {}, {})", prefix, point, redeemer),
            Event::Transfer { from, to, value } => {
                write!(f, "Transfer({}, {}, {})", from, to, value)
            }
            Event::Approval {
                owner,
                spender,
                value,
            } => write!(f, "Approval({}, {}, {})", owner, spender, value),
            Event::Minted {
                operator,
                to,
                amount,
            } => write!(f, "Minted({}, {}, {})", operator, to, amount),
            Event::Burned {
                operator,
                from,
                amount,
            } => write!(f, "Burned({}, {}, {})", operator, from, amount),
            Event::Sent {
                operator,
                from,
                to,
                amount,
            } => write!(f, "Sent({}, {}, {}, {})", operator, from, to, amount),
            Event::AuthorizedOperator { operator, holder } => {
                write!(f, "AuthorizedOperator({}, {})", operator, holder)
            }
            Event::RevokedOperator { operator, holder } => {
                write!(f, "RevokedOperator({}, {})", operator, holder)
            }
            Event::PointTransfer { from, to, point } => {
                write!(f, "Transfer({}, {}, {})", from, to, point)
            }
            Event::PointApproval {
                owner,
                approved,
                point,
            } => write!(f, "Approval({}, {}, {})", owner, approved, point),
            Event::ApprovalForAll {
                owner,
                operator,
                approved,
            } => write!(f, "ApprovalForAll({}, {}, {})", owner, operator, approved),
            Event::Activated { point } => write!(f, "Activated({})", point),
            Event::Spawned { prefix, child } => write!(f, "Spawned({}, {})", prefix, child),
            Event::OwnerChanged { point, owner } => {
                write!(f, "OwnerChanged({}, {})", point, owner)
            }
            Event::ChangedSpawnProxy { point, spawn_proxy } => {
                write!(f, "ChangedSpawnProxy({}, {})", point, spawn_proxy)
            }
            Event::ChangedTransferProxy {
                point,
                transfer_proxy,
            } => write!(f, "ChangedTransferProxy({}, {})", point, transfer_proxy),
            Event::ChangedKeys {
                point,
                crypto_suite_version,
                key_revision_number,
                ..
            } => write!(
                f,
                "ChangedKeys({}, suite {}, revision {})",
                point, crypto_suite_version, key_revision_number
            ),
            Event::BrokeContinuity { point, number } => {
                write!(f, "BrokeContinuity({}, {})", point, number)
            }
            Event::Upgraded { implementation } => write!(f, "Upgraded({})", implementation),
            Event::Frozen { implementation } => write!(f, "Frozen({})", implementation),
        }
    }
}

/// A single log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Block (transaction sequence number) that produced the event.
    pub block: u64,
    /// Contract that emitted the event.
    pub emitter: Address,
    pub event: Event,
}

/// Append-only event log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    /// Block number assigned to events emitted from now on.
    block: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event emitted by `emitter` in the current block.
    pub fn emit(&mut self, emitter: Address, event: Event) {
        self.entries.push(LogEntry {
            block: self.block,
            emitter,
            event,
        });
    }

    /// Position marker for slicing out the events of one transaction.
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Events appended after `mark`.
    pub fn since(&self, mark: usize) -> &[LogEntry] {
        self.entries.get(mark..).unwrap_or(&[])
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The block that the next emitted event will belong to.
    pub fn block(&self) -> u64 {
        self.block
    }

    /// Close the current block. Called once per committed transaction.
    pub fn advance_block(&mut self) {
        self.block += 1;
    }

    /// Whether any entry from `emitter` matches `event`.
    pub fn contains(&self, emitter: Address, event: &Event) -> bool {
        self.entries
            .iter()
            .any(|e| e.emitter == emitter && e.event == *event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> Address {
        Address::from_label("creator")
    }

    #[test]
    fn test_emit_and_slice() {
        let mut log = EventLog::new();
        let treasury = Address::from_label("treasury");
        log.emit(treasury, Event::Activated { point: Point(0) });

        let mark = log.mark();
        log.emit(
            treasury,
            Event::Deposit {
                prefix: Point(0),
                point: Point(0x100),
                depositor: creator(),
            },
        );

        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.since(mark).len(), 1);
        assert_eq!(log.since(mark)[0].event.name(), "Deposit");
        assert!(log.since(99).is_empty());
    }

    #[test]
    fn test_block_numbers() {
        let mut log = EventLog::new();
        log.emit(Address::ZERO, Event::Activated { point: Point(1) });
        log.advance_block();
        log.emit(Address::ZERO, Event::Activated { point: Point(2) });

        assert_eq!(log.entries()[0].block, 0);
        assert_eq!(log.entries()[1].block, 1);
        assert_eq!(log.block(), 1);
    }

    #[test]
    fn test_contains_checks_emitter() {
        let mut log = EventLog::new();
        let token = Address::from_label("token");
        let event = Event::Transfer {
            from: Address::ZERO,
            to: creator(),
            value: 5,
        };
        log.emit(token, event.clone());

        assert!(log.contains(token, &event));
        assert!(!log.contains(creator(), &event));
    }

    #[test]
    fn test_display() {
        let event = Event::Redeem {
            prefix: Point(0),
            point: Point(0x200),
            redeemer: Address::ZERO,
        };
        assert_eq!(
            event.to_string(),
            format!("Redeem(0, 512, {})", Address::ZERO)
        );
    }

    #[test]
    fn test_large_values_survive_json() {
        let event = Event::Transfer {
            from: Address::ZERO,
            to: creator(),
            value: u128::MAX,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
