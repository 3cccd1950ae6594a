//! Hardfork-conditional parameters. One interpreter, one opcode table;
//! behaviour that changed across forks is read out of here rather than
//! forking the dispatch loop itself (see `crate::interpreter`).
use std::cmp::PartialOrd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hardfork {
    Frontier,
    TangerineWhistle, // EIP-150: 63/64 call-gas rule
    SpuriousDragon,   // EIP-160/161: EXP gas bump, empty-account pruning
    Byzantium,        // REVERT, STATICCALL
    Constantinople,   // EIP-1283 SSTORE metering, CREATE2, SHL/SHR/SAR
    Istanbul,         // EIP-2200 SSTORE metering, EIP-2028 calldata gas
    Berlin,           // EIP-2929/2930 access lists, cold/warm gas
    London,           // EIP-1559 base fee
    Shanghai,         // EIP-3855 PUSH0, EIP-4895 withdrawals
    Cancun,           // EIP-4844 blobs, EIP-1153 transient storage
}

impl Hardfork {
    pub fn is_at_least(self, other: Hardfork) -> bool {
        self >= other
    }
}

/// SSTORE metering regime selector (spec's three rule sets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SstoreRules {
    /// Frontier through Constantinople-minus-one: flat gas by original/current
    /// value, no sentry check, no EIP-1283 refund asymmetry.
    Legacy,
    /// Constantinople (EIP-1283): dirty-slot discount, asymmetric refunds.
    Eip1283,
    /// Istanbul onward (EIP-2200): EIP-1283 semantics plus the 2300-gas
    /// sentry that blocks SSTORE inside a call forwarded less than that.
    Eip2200,
}

/// EIP-2929 (Berlin): first touch of an address or storage slot in a
/// transaction is "cold" and costs this; every later touch of the same
/// address/slot is "warm" and costs `WARM_ACCESS_COST`.
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2_600;
pub const COLD_SLOAD_COST: u64 = 2_100;
pub const WARM_ACCESS_COST: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct GasSchedule {
    /// Flat SLOAD cost pre-Berlin. From Berlin onward SLOAD instead charges
    /// `COLD_SLOAD_COST`/`WARM_ACCESS_COST` depending on prior access within
    /// the transaction (see `apply_access_list_gas`), and this field is unused.
    pub sload_gas: u64,
    pub sstore_set_gas: u64,
    pub sstore_reset_gas: u64,
    pub sstore_clear_refund: u64,
    pub sstore_rules: SstoreRules,
    pub call_value_transfer_gas: u64,
    pub call_new_account_gas: u64,
    pub call_stipend: u64,
    /// EIP-150's 63/64 rule only applies from Tangerine Whistle onward.
    pub apply_call_gas_cap: bool,
    pub exp_byte_gas: u64,
    /// EIP-2929's cold/warm split applies to SLOAD, BALANCE, EXTCODESIZE,
    /// EXTCODEHASH, EXTCODECOPY and the CALL family from Berlin onward;
    /// before Berlin these opcodes charge their flat pre-Berlin cost instead.
    pub apply_access_list_gas: bool,
}

impl GasSchedule {
    pub fn for_hardfork(fork: Hardfork) -> Self {
        let sstore_rules = if fork.is_at_least(Hardfork::Istanbul) {
            SstoreRules::Eip2200
        } else if fork.is_at_least(Hardfork::Constantinople) {
            SstoreRules::Eip1283
        } else {
            SstoreRules::Legacy
        };

        GasSchedule {
            sload_gas: 800,
            sstore_set_gas: 20_000,
            sstore_reset_gas: 5_000,
            sstore_clear_refund: if fork.is_at_least(Hardfork::Istanbul) {
                15_000
            } else {
                15_000
            },
            sstore_rules,
            call_value_transfer_gas: 9_000,
            call_new_account_gas: 25_000,
            call_stipend: 2_300,
            apply_call_gas_cap: fork.is_at_least(Hardfork::TangerineWhistle),
            exp_byte_gas: if fork.is_at_least(Hardfork::SpuriousDragon) {
                50
            } else {
                10
            },
            apply_access_list_gas: fork.is_at_least(Hardfork::Berlin),
        }
    }
}

/// Istanbul's EIP-2200 sentry: SSTORE is forbidden whenever the gas
/// forwarded into the current frame is at or below the stipend.
pub const SSTORE_SENTRY_GAS: u64 = 2_300;
