//! # Signatures
//!
//! A signature is a 64-bit set of component types, one bit per registered
//! type. Entities carry one describing what they hold; systems carry one
//! describing what they require.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Maximum number of component types a world can register.
pub const MAX_COMPONENTS: usize = 64;

/// Bit position assigned to a component type by the registry.
pub type ComponentBit = usize;

/// Fixed-width bitset of component types.
///
/// Plain value type: copy it, compare it, combine it.
///
/// # Example
///
/// ```rust
/// use strata_core::Signature;
///
/// let required = Signature::EMPTY.with(0).with(1);
/// let held = Signature::EMPTY.with(0).with(1).with(4);
/// assert!(held.contains(required));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u64);

impl Signature {
    /// The signature with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Creates a signature from its raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Sets a bit.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= MAX_COMPONENTS`.
    #[inline]
    pub fn set(&mut self, bit: ComponentBit) {
        self.0 |= Self::mask(bit);
    }

    /// Clears a bit.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= MAX_COMPONENTS`.
    #[inline]
    pub fn reset(&mut self, bit: ComponentBit) {
        self.0 &= !Self::mask(bit);
    }

    /// Returns a copy with `bit` set.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= MAX_COMPONENTS`.
    #[inline]
    #[must_use]
    pub fn with(mut self, bit: ComponentBit) -> Self {
        self.set(bit);
        self
    }

    /// Returns a copy with `bit` cleared.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= MAX_COMPONENTS`.
    #[inline]
    #[must_use]
    pub fn without(mut self, bit: ComponentBit) -> Self {
        self.reset(bit);
        self
    }

    /// Checks whether `bit` is set. Out-of-range bits are never set.
    #[inline]
    #[must_use]
    pub const fn test(self, bit: ComponentBit) -> bool {
        bit < MAX_COMPONENTS && (self.0 >> bit) & 1 == 1
    }

    /// Checks whether every bit of `required` is also set here.
    ///
    /// This is the membership test: `(self & required) == required`.
    #[inline]
    #[must_use]
    pub const fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// True if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of bits set.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the set bits in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentBit> {
        let mut remaining = self.0;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let bit = remaining.trailing_zeros() as ComponentBit;
            remaining &= remaining - 1;
            Some(bit)
        })
    }

    #[inline]
    fn mask(bit: ComponentBit) -> u64 {
        assert!(
            bit < MAX_COMPONENTS,
            "signature bit {bit} out of range (max {MAX_COMPONENTS})"
        );
        1u64 << bit
    }
}

impl BitAnd for Signature {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Signature {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for Signature {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Signature {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Not for Signature {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Highest bit first, like `std::bitset`.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:064b}", self.0)
    }
}
