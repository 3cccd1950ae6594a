//! External Environment Interface: everything an opcode handler needs from
//! outside its own call frame (account/storage reads and writes, nested
//! call/create dispatch, logs, self-destruct). Handlers never touch
//! `WorldStateTrie` directly so the interpreter core stays free of the
//! call/create sub-protocol's own bookkeeping.
use crate::errors::EvmError;
use ethereum_types::{Address, H256, U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

pub struct CallParams {
    pub kind: CallKind,
    pub caller: Address,
    pub address: Address,
    /// Address whose code actually runs (differs from `address` for
    /// CALLCODE/DELEGATECALL, which execute the callee's code against the
    /// caller's own storage).
    pub code_address: Address,
    pub value: U256,
    pub input: Vec<u8>,
    pub gas: u64,
    pub is_static: bool,
}

pub struct CreateParams {
    pub caller: Address,
    pub value: U256,
    pub init_code: Vec<u8>,
    pub gas: u64,
    pub salt: Option<U256>, // Some => CREATE2
}

pub struct CallOutcome {
    pub success: bool,
    pub gas_left: u64,
    pub return_data: Vec<u8>,
}

pub struct CreateOutcome {
    pub success: bool,
    pub gas_left: u64,
    pub address: Option<Address>,
    pub return_data: Vec<u8>,
}

/// Implemented by the transaction executor (`crate::vm`), which owns the
/// `WorldStateTrie` and the substate (self-destruct set, touched accounts,
/// logs) a call frame mutates.
pub trait Eei {
    fn balance(&self, address: &Address) -> U256;
    fn code(&self, address: &Address) -> Vec<u8>;
    fn code_hash(&self, address: &Address) -> H256;
    fn code_size(&self, address: &Address) -> usize;
    fn account_exists(&self, address: &Address) -> bool;

    fn storage_load(&self, address: &Address, key: U256) -> U256;
    fn storage_store(&mut self, address: &Address, key: U256, value: U256) -> Result<(), EvmError>;
    /// The slot's value as of the start of the *transaction*, not the start
    /// of this call frame — EIP-2200's `original` input, unaffected by any
    /// write this or an earlier frame in the same transaction already made.
    /// Takes `&mut self`: the first call for a given slot snapshots its
    /// then-current value and caches it for the rest of the transaction.
    fn original_storage_load(&mut self, address: &Address, key: U256) -> U256;

    /// EIP-2929: records this address as touched and reports whether it was
    /// already warm from an earlier access in the same transaction (or the
    /// tx's access list). The caller is billed `COLD_ACCOUNT_ACCESS_COST` or
    /// `WARM_ACCESS_COST` accordingly.
    fn mark_address_warm(&mut self, address: &Address) -> bool;
    /// Same as `mark_address_warm`, scoped to one storage slot.
    fn mark_storage_warm(&mut self, address: &Address, key: U256) -> bool;

    fn block_hash(&self, number: U256) -> H256;

    fn log(&mut self, address: Address, topics: Vec<H256>, data: Vec<u8>);
    fn self_destruct(&mut self, address: Address, beneficiary: Address);

    fn call(&mut self, params: CallParams) -> Result<CallOutcome, EvmError>;
    fn create(&mut self, params: CreateParams) -> Result<CreateOutcome, EvmError>;
}
