//! Coin amount value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Number of decimal places a coin amount carries.
pub const COIN_DECIMALS: u32 = 2;

/// Represents an amount of coins.
///
/// Internally stored as atomic units (hundredths of a coin) for precision.
/// Avoids floating-point errors when balances and fees are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// Amount in atomic units (1 coin = 100 atomic units)
    atomic: i64,
}

impl Amount {
    /// One coin in atomic units.
    pub const ATOMIC_PER_COIN: i64 = 10_i64.pow(COIN_DECIMALS);

    /// Creates an Amount from a coin value, rounding to the nearest atomic unit.
    pub fn from_coins(coins: f64) -> Self {
        let atomic = (coins * Self::ATOMIC_PER_COIN as f64).round() as i64;
        Self { atomic }
    }

    /// Creates an Amount from atomic units.
    pub const fn from_atomic(atomic: i64) -> Self {
        Self { atomic }
    }

    /// Creates a zero Amount.
    pub const fn zero() -> Self {
        Self { atomic: 0 }
    }

    /// Parses a user-entered decimal string such as `"12.5"`.
    ///
    /// The value is taken exactly: at most `COIN_DECIMALS` significant
    /// fractional digits, no exponents, no rounding. Returns `None` for
    /// anything else, including values that do not fit.
    /// Sign is preserved; callers decide whether zero or negative is acceptable.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        // Trailing zeros past the last atomic digit do not change the value
        let places = COIN_DECIMALS as usize;
        let (kept, excess) = fraction.split_at(fraction.len().min(places));
        if excess.bytes().any(|b| b != b'0') {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut fractional: i64 = if kept.is_empty() { 0 } else { kept.parse().ok()? };
        for _ in kept.len()..places {
            fractional *= 10;
        }

        let atomic = whole
            .checked_mul(Self::ATOMIC_PER_COIN)?
            .checked_add(fractional)?;
        Some(Self {
            atomic: if negative { -atomic } else { atomic },
        })
    }

    /// Returns the amount in coins as a float.
    pub fn as_coins(&self) -> f64 {
        self.atomic as f64 / Self::ATOMIC_PER_COIN as f64
    }

    /// Returns the amount in atomic units.
    pub fn as_atomic(&self) -> i64 {
        self.atomic
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.atomic == 0
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.atomic > 0
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            atomic: self.atomic.saturating_add(other.atomic),
        }
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        self.atomic = self.atomic.saturating_add(other.atomic);
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            atomic: self.atomic.saturating_sub(other.atomic),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Coins as float, the unit wallet front ends display
        serializer.serialize_f64(self.as_coins())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let coins = f64::deserialize(deserializer)?;
        Ok(Amount::from_coins(coins))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.atomic < 0 { "-" } else { "" };
        let abs = self.atomic.unsigned_abs();
        let per_coin = Self::ATOMIC_PER_COIN.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / per_coin,
            abs % per_coin,
            width = COIN_DECIMALS as usize
        )
    }
}
