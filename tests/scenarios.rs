//! End-to-end scenarios straight off the component spec's testable-properties
//! list: small bytecode sequences run through the real interpreter and
//! checked against their exact gas/stack/trap outcome.
use ethereum_types::{Address, H256, U256};
use evm_engine::block::{hash_ommers, Block, BlockHeader};
use evm_engine::blockchain::Blockchain;
use evm_engine::eei::{CallOutcome, CallParams, CreateOutcome, CreateParams, Eei};
use evm_engine::errors::{BlockValidationError, EvmError};
use evm_engine::hardfork::Hardfork;
use evm_engine::interpreter::opcodes::{ADD, JUMP, JUMPDEST, MSTORE, PUSH1, SSTORE, STOP};
use evm_engine::interpreter::state::Environment;
use evm_engine::interpreter::{Interpreter, InterpreterStatus};
use evm_engine::jumpdest::Code;

struct NoopEei;

impl Eei for NoopEei {
    fn balance(&self, _address: &Address) -> U256 {
        U256::zero()
    }
    fn code(&self, _address: &Address) -> Vec<u8> {
        vec![]
    }
    fn code_hash(&self, _address: &Address) -> H256 {
        H256::zero()
    }
    fn code_size(&self, _address: &Address) -> usize {
        0
    }
    fn account_exists(&self, _address: &Address) -> bool {
        false
    }
    fn storage_load(&self, _address: &Address, _key: U256) -> U256 {
        U256::zero()
    }
    fn storage_store(&mut self, _address: &Address, _key: U256, _value: U256) -> Result<(), EvmError> {
        Ok(())
    }
    fn original_storage_load(&mut self, _address: &Address, _key: U256) -> U256 {
        U256::zero()
    }
    fn mark_address_warm(&mut self, _address: &Address) -> bool {
        false
    }
    fn mark_storage_warm(&mut self, _address: &Address, _key: U256) -> bool {
        false
    }
    fn block_hash(&self, _number: U256) -> H256 {
        H256::zero()
    }
    fn log(&mut self, _address: Address, _topics: Vec<H256>, _data: Vec<u8>) {}
    fn self_destruct(&mut self, _address: Address, _beneficiary: Address) {}
    fn call(&mut self, _params: CallParams) -> Result<CallOutcome, EvmError> {
        unreachable!("scenarios below never issue a CALL")
    }
    fn create(&mut self, _params: CreateParams) -> Result<CreateOutcome, EvmError> {
        unreachable!("scenarios below never issue a CREATE")
    }
}

fn env() -> Environment {
    Environment {
        address: Address::zero(),
        caller: Address::zero(),
        origin: Address::zero(),
        call_value: U256::zero(),
        call_data: vec![],
        gas_price: U256::zero(),
        block_number: 1,
        block_timestamp: 1,
        block_coinbase: Address::zero(),
        block_gas_limit: 30_000_000,
        block_base_fee: U256::one(),
        block_prev_randao: H256::zero(),
        chain_id: 1,
        block_blob_base_fee: U256::one(),
        blob_hashes: vec![],
    }
}

/// Scenario 1: `PUSH1 3, PUSH1 5, ADD, STOP` halts with gasUsed = 9, stack
/// top = 8, no return data.
#[test]
fn push_push_add_stop_charges_nine_gas_and_leaves_eight_on_the_stack() {
    let code = Code::analyze(vec![PUSH1, 0x03, PUSH1, 0x05, ADD, STOP]);
    let environment = env();
    let mut interpreter = Interpreter::new(&code, &environment, 0xffff, Hardfork::Cancun, 0, false);
    let mut eei = NoopEei;

    let status = interpreter.run(&mut eei);
    assert_eq!(status, InterpreterStatus::Halted);
    assert!(interpreter.state.output.is_empty());
    assert_eq!(interpreter.state.stack.pop().unwrap(), U256::from(8));
    assert_eq!(0xffffu64 - interpreter.state.gas.remaining(), 9);
}

/// Scenario 2: `PUSH1 0, PUSH1 0, MSTORE, STOP` writes one word at offset 0
/// and charges the memory-expansion cost exactly once.
#[test]
fn mstore_at_offset_zero_expands_memory_by_one_word() {
    let code = Code::analyze(vec![PUSH1, 0x00, PUSH1, 0x00, MSTORE, STOP]);
    let environment = env();
    let mut interpreter = Interpreter::new(&code, &environment, 0xffff, Hardfork::Cancun, 0, false);
    let mut eei = NoopEei;

    let status = interpreter.run(&mut eei);
    assert_eq!(status, InterpreterStatus::Halted);
    assert_eq!(interpreter.state.memory.word_count(), 1);
    assert_eq!(interpreter.state.memory.as_slice().len(), 32);
}

/// Scenario 3: a `PUSH2 0x00ff` immediate whose second byte lands on 0xff
/// means the `0x5b` sitting there is data, not a `JUMPDEST` — `JUMP` to it
/// traps even though the raw byte matches the opcode.
#[test]
fn jump_into_a_push_immediate_is_rejected_even_if_the_byte_is_0x5b() {
    let mut code_bytes = vec![0x00; 256];
    code_bytes[0] = PUSH1;
    code_bytes[1] = 0xff;
    code_bytes[2] = JUMP;
    code_bytes[0xfd] = 0x61; // PUSH2
    code_bytes[0xfe] = 0x00;
    code_bytes[0xff] = JUMPDEST; // immediate data byte, not a real JUMPDEST
    let code = Code::analyze(code_bytes);
    let environment = env();
    let mut interpreter = Interpreter::new(&code, &environment, 0xffff, Hardfork::Cancun, 0, false);
    let mut eei = NoopEei;

    let status = interpreter.run(&mut eei);
    assert_eq!(status, InterpreterStatus::Trapped(EvmError::InvalidJump));
}

/// Same layout minus the covering `PUSH2`: position 0xff is a genuine
/// `JUMPDEST` and the jump succeeds.
#[test]
fn jump_to_a_genuine_jumpdest_succeeds() {
    let mut code_bytes = vec![0x00; 256];
    code_bytes[0] = PUSH1;
    code_bytes[1] = 0xff;
    code_bytes[2] = JUMP;
    code_bytes[0xff] = JUMPDEST;
    code_bytes.push(STOP);
    let code = Code::analyze(code_bytes);
    let environment = env();
    let mut interpreter = Interpreter::new(&code, &environment, 0xffff, Hardfork::Cancun, 0, false);
    let mut eei = NoopEei;

    let status = interpreter.run(&mut eei);
    assert_eq!(status, InterpreterStatus::Halted);
}

/// Scenario 4: `SSTORE` at exactly the EIP-2200 sentry gas traps
/// `OUT_OF_GAS` before any storage metering runs.
#[test]
fn sstore_at_exactly_sentry_gas_traps_before_metering() {
    let code = Code::analyze(vec![PUSH1, 0x01, PUSH1, 0x00, SSTORE]);
    let environment = env();
    // Leave exactly `SSTORE_SENTRY_GAS` remaining once SSTORE itself runs: the
    // two PUSH1s ahead of it cost 3 gas each.
    let gas_limit = evm_engine::hardfork::SSTORE_SENTRY_GAS + 6;
    let mut interpreter = Interpreter::new(&code, &environment, gas_limit, Hardfork::Cancun, 0, false);
    let mut eei = NoopEei;

    let status = interpreter.run(&mut eei);
    assert_eq!(status, InterpreterStatus::Trapped(EvmError::OutOfGas));
}

/// Scenario 5: a block with two identical uncle hashes fails validation with
/// a duplicate-uncle error.
#[test]
fn block_with_two_identical_uncles_is_rejected() {
    let chain = Blockchain::new();

    let mut uncle = BlockHeader::default();
    uncle.number = 1;

    let mut block = Block::default();
    block.header.number = 2;
    block.ommers = vec![uncle.clone(), uncle];
    block.header.ommers_hash = hash_ommers(&block.ommers);

    let errors = chain.validate(&block);
    assert!(errors
        .iter()
        .any(|e| matches!(e, BlockValidationError::DuplicateOmmer)));
}

/// Scenario 6: an empty-transaction block's `transactions_root` is the
/// well-known empty-trie hash, and validates as such.
#[test]
fn empty_transaction_block_hashes_to_the_empty_trie_root() {
    let block = Block::default();
    assert_eq!(
        block.header.transactions_root,
        evm_engine::common::constants::hashes::EMPTY_TRIE_HASH
    );
}
