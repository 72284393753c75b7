/// Fixture holding the lending pool (router) address.
pub const LENDING_ADDRESS_FIXTURE: &str = "lendingAddr";
/// Fixture holding the price aggregator address.
pub const PRICE_AGGREGATOR_FIXTURE: &str = "priceAggregatorAddress";

/// 100% in the fixed-point representation used by the lending protocol.
pub const BP: u64 = 1_000_000_000;
pub const BP_PRECISION: u32 = 9;

pub const LENDING_POOL_ABI_PATH: &str = "output/lending-pool.abi.json";
pub const LIQUIDITY_POOL_ABI_PATH: &str = "output/liquidity-pool.abi.json";

pub const LENDING_POOL_ABI_NAME: &str = "LendingPool";
pub const LIQUIDITY_POOL_ABI_NAME: &str = "LiquidityPool";

pub const DEFAULT_STATE_FILE: &str = "state.toml";
pub const DEFAULT_GATEWAY_URI: &str = "http://localhost:8085";

pub const DEFAULT_CALL_GAS_LIMIT: u64 = 60_000_000;
pub const DEFAULT_ISSUE_GAS_LIMIT: u64 = 100_000_000;
pub const DEFAULT_TRANSFER_GAS_LIMIT: u64 = 5_000_000;

/// 0.05 EGLD, the ESDT issuance fee.
pub const ESDT_ISSUE_COST: u64 = 50_000_000_000_000_000;

pub const ISSUED_TOKEN_DECIMALS: u32 = 18;
/// Whole units minted when a test token is issued.
pub const ISSUED_TOKEN_SUPPLY_UNITS: u64 = 1_000;
/// Whole units sent to each recipient by the airdrop helper.
pub const AIRDROP_UNITS: u64 = 500;

// Risk literals, raw units of `BP`.
pub const DEFAULT_R_BASE: u64 = 0;
pub const DEFAULT_R_SLOPE1: u64 = 40_000_000;
pub const DEFAULT_R_SLOPE2: u64 = 1_000_000_000;
pub const DEFAULT_U_OPTIMAL: u64 = 800_000_000;
pub const DEFAULT_RESERVE_FACTOR: u64 = 100_000_000;
pub const DEFAULT_LIQUIDATION_THRESHOLD: u64 = 700_000_000;
pub const DEFAULT_LOAN_TO_VALUE: u64 = 500_000_000;
pub const DEFAULT_LIQUIDATION_BONUS: u64 = 40_000_000;

pub const LEND_TOKEN_PREFIX: &str = "L";
pub const BORROW_TOKEN_PREFIX: &str = "B";
