//! Node Flags
//!
//! Every node carries a single small bitset. The low bits describe what the
//! node is (`MUTABLE`, `WATCHING`), the rest describe where it currently is in
//! a propagation or validation pass.
//!
//! | Flag             | Set by                          | Cleared by                   |
//! | ---------------- | ------------------------------- | ---------------------------- |
//! | `MUTABLE`        | factory (signals), first eval   | never                        |
//! | `WATCHING`       | factory (effects)               | host while an effect queued  |
//! | `RECURSED_CHECK` | host, for the tracking pass     | host, at the end of the pass |
//! | `RECURSED`       | `propagate`                     | `propagate`, next tracking   |
//! | `DIRTY`          | signal writes, shallow passes   | `update`                     |
//! | `PENDING`        | `propagate`                     | `check_dirty`, `update`      |

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub, SubAssign};

/// Bitset of node state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    /// No flag set. A freshly created computed starts here.
    pub const NONE: Flags = Flags(0);

    /// The node holds a value that other nodes can read.
    pub const MUTABLE: Flags = Flags(1 << 0);

    /// The node must be notified when it is invalidated (effects).
    pub const WATCHING: Flags = Flags(1 << 1);

    /// The node is currently collecting its dependencies.
    pub const RECURSED_CHECK: Flags = Flags(1 << 2);

    /// The node was reached while collecting its dependencies.
    pub const RECURSED: Flags = Flags(1 << 3);

    /// The cached value is definitely stale.
    pub const DIRTY: Flags = Flags(1 << 4);

    /// Some upstream node changed; validity not yet known.
    pub const PENDING: Flags = Flags(1 << 5);

    const NAMES: [(Flags, &'static str); 6] = [
        (Flags::MUTABLE, "MUTABLE"),
        (Flags::WATCHING, "WATCHING"),
        (Flags::RECURSED_CHECK, "RECURSED_CHECK"),
        (Flags::RECURSED, "RECURSED"),
        (Flags::DIRTY, "DIRTY"),
        (Flags::PENDING, "PENDING"),
    ];

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build flags from raw bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b11_1111)
    }

    /// True when no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every flag of `other` is set.
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when at least one flag of `other` is set.
    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    /// Names of the set flags, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Flags;

    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

impl BitAndAssign for Flags {
    fn bitand_assign(&mut self, rhs: Flags) {
        self.0 &= rhs.0;
    }
}

impl Sub for Flags {
    type Output = Flags;

    fn sub(self, rhs: Flags) -> Flags {
        Flags(self.0 & !rhs.0)
    }
}

impl SubAssign for Flags {
    fn sub_assign(&mut self, rhs: Flags) {
        self.0 &= !rhs.0;
    }
}

impl Not for Flags {
    type Output = Flags;

    fn not(self) -> Flags {
        Flags::from_bits_truncate(!self.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for name in self.names() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}
