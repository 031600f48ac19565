// 2 decimals numbers
pub const COIN_DECIMALS: u8 = 2;
// 100 to represent 1 full unit of the platform currency
pub const COIN_VALUE: u64 = 10u64.pow(COIN_DECIMALS as u32);

// Rates are expressed in basis points (100 = 1%, 10000 = 100%)
pub const BASIS_POINTS: u64 = 10_000;

// Referral rules
// The inviter chain is captured once at registration and holds at most 4 ancestors (A..D)
pub const INVITER_CHAIN_LEVELS: usize = 4;
// Level A: 10%, Level B: 5%, Level C: 3%, Level D: 2%
pub const DEFAULT_COMMISSION_RATIOS: [u16; INVITER_CHAIN_LEVELS] = [1000, 500, 300, 200];

// Withdrawal rules
// 6% fee taken from every withdrawal, the user receives the remaining 94%
pub const WITHDRAWAL_FEE_BPS: u16 = 600;
// Inclusive bounds of a single withdrawal request
pub const MIN_WITHDRAWAL_AMOUNT: u64 = 300 * COIN_VALUE;
pub const MAX_WITHDRAWAL_AMOUNT: u64 = 40_000 * COIN_VALUE;

// Integrity audit
// Commission rewards only count for 95% of their value when reconciling credits
pub const AUDIT_REWARD_HAIRCUT_BPS: u16 = 9500;

// VIP rules
pub const MAX_VIP_LEVEL: u8 = 7;
// Salary can be claimed once per period
pub const DEFAULT_VIP_SALARY_INTERVAL_DAYS: u64 = 30;

// Time
pub const SECONDS_PER_DAY: u64 = 86_400;

// Version of the ledger, set by the build script
pub const VERSION: &str = env!("BUILD_VERSION");
