use crate::gas::GasMeter;
use crate::hardfork::{GasSchedule, Hardfork};
use crate::jumpdest::Code;
use crate::memory::Memory;
use crate::stack::Stack;
use ethereum_types::{Address, H256, U256};

/// Transaction- and block-scoped values a running call frame can read but
/// never mutates (CALLER/ORIGIN/COINBASE/etc.).
#[derive(Debug, Clone)]
pub struct Environment {
    pub address: Address,
    pub caller: Address,
    pub origin: Address,
    pub call_value: U256,
    pub call_data: Vec<u8>,
    pub gas_price: U256,

    pub block_number: u64,
    pub block_timestamp: u64,
    pub block_coinbase: Address,
    pub block_gas_limit: u64,
    pub block_base_fee: U256,
    pub block_prev_randao: H256,
    pub chain_id: u64,
    /// Per EIP-7516, computed once per block from the header's excess blob
    /// gas rather than re-derived per `BLOBBASEFEE`.
    pub block_blob_base_fee: U256,
    /// Versioned hashes of the enclosing transaction's blobs (EIP-4844),
    /// indexed by `BLOBHASH`.
    pub blob_hashes: Vec<H256>,
}

/// Created at `runCode`, discarded when the frame halts/reverts/traps —
/// nothing here outlives a single call.
pub struct RunState<'a> {
    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,
    pub gas: GasMeter,
    pub code: &'a Code,
    pub env: &'a Environment,
    pub hardfork: Hardfork,
    pub gas_schedule: GasSchedule,
    pub depth: usize,
    pub is_static: bool,
    pub return_data: Vec<u8>,
    pub output: Vec<u8>,
}

impl<'a> RunState<'a> {
    pub fn new(
        code: &'a Code,
        env: &'a Environment,
        gas_limit: u64,
        hardfork: Hardfork,
        depth: usize,
        is_static: bool,
    ) -> Self {
        Self {
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas: GasMeter::new(gas_limit),
            code,
            env,
            hardfork,
            gas_schedule: GasSchedule::for_hardfork(hardfork),
            depth,
            is_static,
            return_data: Vec::new(),
            output: Vec::new(),
        }
    }
}

/// What a handler asks the dispatch loop to do next.
pub enum ControlFlow {
    Continue,
    Jump(usize),
    Halt,
    Return(Vec<u8>),
    Revert(Vec<u8>),
}

/// Emitted on every opcode dispatch when a subscriber is installed (see
/// `Interpreter::with_step_hook`); synchronous, matching this crate's
/// ambient-logging convention rather than an async event-subscription API.
pub struct StepEvent<'a> {
    pub pc: usize,
    pub opcode: u8,
    pub gas_remaining: u64,
    pub depth: usize,
    pub stack: &'a Stack,
}
