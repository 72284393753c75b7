use core::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Fixed-point ratio with `BP_PRECISION` decimals, `BP` being 100%.
///
/// Pool configuration, loan-to-value and liquidation bonus travel to the
/// contract as the raw units of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(u64);

impl Ratio {
    pub const ZERO: Ratio = Ratio(0);
    pub const ONE: Ratio = Ratio(BP);

    pub const fn from_raw_units(raw: u64) -> Self {
        Ratio(raw)
    }

    /// `from_percent(4)` is 4%. Saturates at `u64::MAX` raw units.
    pub const fn from_percent(percent: u64) -> Self {
        Ratio(percent.saturating_mul(BP / 100))
    }

    pub const fn into_raw_units(self) -> u64 {
        self.0
    }

    pub fn to_biguint(self) -> BigUint {
        BigUint::from(self.0)
    }

    pub fn is_within_unit(self) -> bool {
        self.0 <= BP
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / BP,
            self.0 % BP,
            width = BP_PRECISION as usize
        )
    }
}

/// Interest rate model and liquidation threshold of a new liquidity pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub r_base: Ratio,
    pub r_slope1: Ratio,
    pub r_slope2: Ratio,
    pub u_optimal: Ratio,
    pub reserve_factor: Ratio,
    pub liquidation_threshold: Ratio,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            r_base: Ratio::from_raw_units(DEFAULT_R_BASE),
            r_slope1: Ratio::from_raw_units(DEFAULT_R_SLOPE1),
            r_slope2: Ratio::from_raw_units(DEFAULT_R_SLOPE2),
            u_optimal: Ratio::from_raw_units(DEFAULT_U_OPTIMAL),
            reserve_factor: Ratio::from_raw_units(DEFAULT_RESERVE_FACTOR),
            liquidation_threshold: Ratio::from_raw_units(DEFAULT_LIQUIDATION_THRESHOLD),
        }
    }
}

/// `units` whole tokens expressed in the smallest denomination.
pub fn token_amount(units: u64, decimals: u32) -> BigUint {
    BigUint::from(units) * BigUint::from(10u32).pow(decimals)
}
