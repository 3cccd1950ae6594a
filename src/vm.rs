//! Transaction executor: pre-execution validity checks (yellow paper section
//! 6.2), the concrete `Eei` that backs a running interpreter with a
//! `WorldStateTrie` and its substate, and `tx_execute`'s checkpoint/commit
//! wiring around the call/create sub-protocol.
use crate::block::BlockHeader;
use crate::common::constants::{MAX_CALL_DEPTH, MAX_INITCODE_SIZE};
use crate::common::crypto::Keccak;
use crate::eei::{CallKind, CallOutcome, CallParams, CreateOutcome, CreateParams, Eei};
use crate::errors::{EvmError, InvalidTransaction};
use crate::hardfork::Hardfork;
use crate::interpreter::opcodes::system::{create2_address, create_address, validate_deployed_code};
use crate::interpreter::state::Environment;
use crate::interpreter::{Interpreter, InterpreterStatus};
use crate::precompiles::{precompiled_contracts_berlin, PrecompileSet};
use crate::receipts::{Log, Receipt};
use crate::transaction::Transaction;
use crate::world_state::WorldStateTrie;
use either::Either;
use ethereum_types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};

/// EIP-4844: one blob's worth of gas.
const GAS_PER_BLOB: u64 = 131072;
/// EIP-4844: at most six blobs per block.
const MAX_BLOB_GAS_PER_BLOCK: u64 = 6 * GAS_PER_BLOB;
/// EIP-170 deployment surcharge: 200 gas per byte of the returned code.
const CREATE_DATA_GAS: u64 = 200;
/// EIP-4844 versioned hashes are tagged with the SHA-256 KZG commitment
/// version byte.
const BLOB_COMMITMENT_VERSION_KZG: u8 = 0x01;

fn to_word_size(len: usize) -> u64 {
    len.div_ceil(32) as u64
}

/// Gas a transaction must prepay before any opcode runs: the flat base cost,
/// EIP-2028 calldata cost, EIP-3860's per-word creation surcharge, and
/// EIP-2930 access-list costs.
pub fn intrinsic_gas(tx: &Transaction) -> u64 {
    let mut gas = if tx.is_creation() { 53_000 } else { 21_000 };

    let zeros = tx.data.iter().filter(|&&b| b == 0).count() as u64;
    let non_zeros = tx.data.len() as u64 - zeros;
    gas += non_zeros * 16 + zeros * 4;

    if tx.is_creation() {
        gas += 2 * to_word_size(tx.data.len());
    }

    let access_list_gas = tx.access_list.len() as u64 * 2_400;
    let storage_key_gas: u64 = tx
        .access_list
        .iter()
        .map(|item| item.storage_keys.len() as u64 * 1_900)
        .sum();
    gas += access_list_gas + storage_key_gas;

    gas
}

fn blob_gas_used(tx: &Transaction) -> u64 {
    tx.blob_versioned_hashes.len() as u64 * GAS_PER_BLOB
}

/// `max_fee_per_gas`, ignoring the priority-fee cap that `effective_gas_price`
/// applies — the upfront-cost and base-fee checks care about the ceiling the
/// sender committed to, not what the block will actually charge.
fn max_fee_per_gas(tx: &Transaction) -> U256 {
    match &tx.gas_price_or_dynamic_fee {
        Either::Left(gas_price) => *gas_price,
        Either::Right((_, max_fee)) => *max_fee,
    }
}

/// Yellow paper section 6.2's pre-execution validity checks, extended with
/// EIP-1559/EIP-3860/EIP-4844's later additions. Fails closed: any problem
/// with the sender, the fee fields, or the block's remaining capacity
/// rejects the transaction before a single unit of gas is spent.
pub fn check_valid_transaction(
    tx: &Transaction,
    state: &WorldStateTrie,
    block_header: &BlockHeader,
    blob_base_fee: U256,
) -> Result<Address, InvalidTransaction> {
    let sender = tx.get_sender().map_err(|_| InvalidTransaction::InvalidSignature)?;

    let state_nonce = state.get_nonce(&sender);
    if tx.nonce < state_nonce {
        return Err(InvalidTransaction::NonceTooLow {
            tx: tx.nonce,
            state: state_nonce,
        });
    }
    if tx.nonce > state_nonce {
        return Err(InvalidTransaction::NonceTooHigh {
            tx: tx.nonce,
            state: state_nonce,
        });
    }

    // EIP-3607: a deployed contract can never originate a transaction.
    if !state.get_code(&sender).is_empty() {
        return Err(InvalidTransaction::SenderNotAnEoa(sender));
    }

    let gas_limit = tx.gas_limit;
    let intrinsic = intrinsic_gas(tx);
    if gas_limit < intrinsic {
        return Err(InvalidTransaction::IntrinsicGasExceedsLimit {
            intrinsic,
            gas_limit,
        });
    }

    if let Either::Right((priority_fee, max_fee)) = &tx.gas_price_or_dynamic_fee {
        if priority_fee > max_fee {
            return Err(InvalidTransaction::PriorityFeeGreaterThanMaxFee);
        }
    }
    if max_fee_per_gas(tx) < block_header.base_fee {
        return Err(InvalidTransaction::MaxFeeBelowBaseFee);
    }

    let upfront_cost = max_fee_per_gas(tx) * U256::from(gas_limit)
        + tx.value
        + U256::from(blob_gas_used(tx)) * tx.max_fee_per_blob_gas;
    if state.get_balance(&sender) < upfront_cost {
        return Err(InvalidTransaction::InsufficientFunds);
    }

    if tx.is_creation() && tx.data.len() > MAX_INITCODE_SIZE {
        return Err(InvalidTransaction::CreationDataTooLarge(tx.data.len()));
    }

    let block_gas_remaining = block_header
        .gas_limit
        .saturating_sub(block_header.gas_used)
        .low_u64();
    if gas_limit > block_gas_remaining {
        return Err(InvalidTransaction::GasLimitExceedsBlock {
            gas_limit,
            block_gas_limit: block_gas_remaining,
        });
    }

    if tx.is_blob_tx() {
        if tx.to.is_none() {
            return Err(InvalidTransaction::BlobTransactionMustHaveRecipient);
        }
        if tx.blob_versioned_hashes.is_empty() {
            return Err(InvalidTransaction::EmptyBlobs);
        }
        if tx
            .blob_versioned_hashes
            .iter()
            .any(|h| h.as_bytes()[0] != BLOB_COMMITMENT_VERSION_KZG)
        {
            return Err(InvalidTransaction::InvalidBlobVersionedHash);
        }
        if blob_gas_used(tx) > MAX_BLOB_GAS_PER_BLOCK {
            return Err(InvalidTransaction::BlobGasExceedsBlockLimit {
                used: blob_gas_used(tx),
                limit: MAX_BLOB_GAS_PER_BLOCK,
            });
        }
        if tx.max_fee_per_blob_gas < blob_base_fee {
            return Err(InvalidTransaction::BlobFeeCapTooLow);
        }
    }

    Ok(sender)
}

/// Self-destructs, touched accounts, logs and the access-list tracking a
/// running transaction accumulates alongside the checkpointed state itself.
/// Distinct from `GasMeter`'s refund counter, which lives with gas rather
/// than with the rest of the substate.
#[derive(Debug, Default)]
pub struct Substate {
    pub self_destructs: Vec<(Address, Address)>,
    pub touched_accounts: HashSet<Address>,
    pub logs: Vec<Log>,
    pub access_list_accounts: HashSet<Address>,
    pub access_list_storage: HashSet<(Address, U256)>,
    /// EIP-2200's "original value" per slot, locked in the first time the
    /// transaction touches that slot (through any call frame) and reused for
    /// the rest of the transaction regardless of later writes.
    pub original_storage: HashMap<(Address, U256), U256>,
}

/// Block-scoped values shared by every call frame a transaction opens,
/// folded into a fresh `Environment` per frame by `TxEei::frame_env`.
struct BaseEnv {
    origin: Address,
    gas_price: U256,
    block_number: u64,
    block_timestamp: u64,
    block_coinbase: Address,
    block_gas_limit: u64,
    block_base_fee: U256,
    block_prev_randao: H256,
    chain_id: u64,
    block_blob_base_fee: U256,
    blob_hashes: Vec<H256>,
}

/// The concrete `Eei`: owns nothing itself, just borrows the state and
/// substate a whole transaction shares across however many nested
/// CALL/CREATE frames it opens.
pub struct TxEei<'a> {
    state: &'a mut WorldStateTrie,
    substate: &'a mut Substate,
    base_env: &'a BaseEnv,
    precompiles: &'a PrecompileSet,
    recent_block_hashes: &'a [H256],
    hardfork: Hardfork,
    depth: usize,
}

impl<'a> TxEei<'a> {
    fn frame_env(&self, address: Address, caller: Address, call_value: U256, call_data: Vec<u8>) -> Environment {
        Environment {
            address,
            caller,
            origin: self.base_env.origin,
            call_value,
            call_data,
            gas_price: self.base_env.gas_price,
            block_number: self.base_env.block_number,
            block_timestamp: self.base_env.block_timestamp,
            block_coinbase: self.base_env.block_coinbase,
            block_gas_limit: self.base_env.block_gas_limit,
            block_base_fee: self.base_env.block_base_fee,
            block_prev_randao: self.base_env.block_prev_randao,
            chain_id: self.base_env.chain_id,
            block_blob_base_fee: self.base_env.block_blob_base_fee,
            blob_hashes: self.base_env.blob_hashes.clone(),
        }
    }

    fn reborrow(&mut self) -> TxEei<'_> {
        TxEei {
            state: &mut *self.state,
            substate: &mut *self.substate,
            base_env: self.base_env,
            precompiles: self.precompiles,
            recent_block_hashes: self.recent_block_hashes,
            hardfork: self.hardfork,
            depth: self.depth + 1,
        }
    }
}

impl<'a> Eei for TxEei<'a> {
    fn balance(&self, address: &Address) -> U256 {
        self.state.get_balance(address)
    }

    fn code(&self, address: &Address) -> Vec<u8> {
        self.state.get_code(address)
    }

    fn code_hash(&self, address: &Address) -> H256 {
        self.state
            .get_account(address)
            .map(|a| a.code_hash)
            .unwrap_or_default()
    }

    fn code_size(&self, address: &Address) -> usize {
        self.state.get_code(address).len()
    }

    fn account_exists(&self, address: &Address) -> bool {
        self.state.account_exists(address)
    }

    fn storage_load(&self, address: &Address, key: U256) -> U256 {
        self.state.get_storage(address, key)
    }

    fn storage_store(&mut self, address: &Address, key: U256, value: U256) -> Result<(), EvmError> {
        self.substate.touched_accounts.insert(*address);
        self.state.set_storage(address, key, value);
        Ok(())
    }

    fn original_storage_load(&mut self, address: &Address, key: U256) -> U256 {
        *self
            .substate
            .original_storage
            .entry((*address, key))
            .or_insert_with(|| self.state.get_storage(address, key))
    }

    fn mark_address_warm(&mut self, address: &Address) -> bool {
        !self.substate.access_list_accounts.insert(*address)
    }

    fn mark_storage_warm(&mut self, address: &Address, key: U256) -> bool {
        !self.substate.access_list_storage.insert((*address, key))
    }

    fn block_hash(&self, number: U256) -> H256 {
        let current = self.base_env.block_number;
        if number >= U256::from(current) {
            return H256::zero();
        }
        let distance = current.saturating_sub(number.low_u64());
        if distance == 0 || distance > self.recent_block_hashes.len() as u64 {
            return H256::zero();
        }
        self.recent_block_hashes[self.recent_block_hashes.len() - distance as usize]
    }

    fn log(&mut self, address: Address, topics: Vec<H256>, data: Vec<u8>) {
        self.substate.logs.push(Log {
            address,
            topics,
            data: data.into(),
        });
    }

    fn self_destruct(&mut self, address: Address, beneficiary: Address) {
        self.substate.touched_accounts.insert(beneficiary);
        let balance = self.state.get_balance(&address);
        if !balance.is_zero() {
            let beneficiary_balance = self.state.get_balance(&beneficiary);
            self.state.set_balance(&beneficiary, beneficiary_balance + balance);
            self.state.set_balance(&address, U256::zero());
        }
        self.substate.self_destructs.push((address, beneficiary));
    }

    fn call(&mut self, params: CallParams) -> Result<CallOutcome, EvmError> {
        self.substate.touched_accounts.insert(params.address);

        if self.depth + 1 >= MAX_CALL_DEPTH {
            return Ok(CallOutcome {
                success: false,
                gas_left: params.gas,
                return_data: vec![],
            });
        }

        if let Some(precompile) = self.precompiles.get(&params.code_address) {
            let cost = precompile.gas_cost(&params.input);
            if cost > params.gas {
                return Ok(CallOutcome {
                    success: false,
                    gas_left: 0,
                    return_data: vec![],
                });
            }
            return Ok(match precompile.execute(&Keccak, &params.input) {
                Ok(output) => CallOutcome {
                    success: true,
                    gas_left: params.gas - cost,
                    return_data: output,
                },
                Err(_) => CallOutcome {
                    success: false,
                    gas_left: 0,
                    return_data: vec![],
                },
            });
        }

        let transfers_value = matches!(params.kind, CallKind::Call | CallKind::CallCode) && !params.value.is_zero();
        if transfers_value && self.state.get_balance(&params.caller) < params.value {
            return Ok(CallOutcome {
                success: false,
                gas_left: params.gas,
                return_data: vec![],
            });
        }

        self.state.checkpoint();
        if matches!(params.kind, CallKind::Call) && !params.value.is_zero() {
            let caller_balance = self.state.get_balance(&params.caller);
            let callee_balance = self.state.get_balance(&params.address);
            self.state.set_balance(&params.caller, caller_balance - params.value);
            self.state.set_balance(&params.address, callee_balance + params.value);
        }

        let code = self.state.get_code(&params.code_address);
        let analyzed = crate::jumpdest::Code::analyze(code);
        let env = self.frame_env(params.address, params.caller, params.value, params.input);
        let mut child = self.reborrow();
        let mut interpreter = Interpreter::new(&analyzed, &env, params.gas, child.hardfork, child.depth, params.is_static);
        let status = interpreter.run(&mut child);

        match status {
            InterpreterStatus::Halted => {
                self.state.commit().expect("checkpoint just pushed above");
                Ok(CallOutcome {
                    success: true,
                    gas_left: interpreter.state.gas.remaining(),
                    return_data: interpreter.state.output,
                })
            }
            InterpreterStatus::Reverted(data) => {
                self.state.rollback().expect("checkpoint just pushed above");
                Ok(CallOutcome {
                    success: false,
                    gas_left: interpreter.state.gas.remaining(),
                    return_data: data,
                })
            }
            InterpreterStatus::Trapped(_) => {
                self.state.rollback().expect("checkpoint just pushed above");
                Ok(CallOutcome {
                    success: false,
                    gas_left: 0,
                    return_data: vec![],
                })
            }
            InterpreterStatus::Running => unreachable!("Interpreter::run always returns a terminal status"),
        }
    }

    fn create(&mut self, params: CreateParams) -> Result<CreateOutcome, EvmError> {
        if self.depth + 1 >= MAX_CALL_DEPTH {
            return Ok(CreateOutcome {
                success: false,
                gas_left: params.gas,
                address: None,
                return_data: vec![],
            });
        }

        let creator_nonce = self.state.get_nonce(&params.caller);
        self.state.set_nonce(&params.caller, creator_nonce + 1);

        let address = match params.salt {
            Some(salt) => create2_address(params.caller, salt, &params.init_code),
            None => create_address(params.caller, creator_nonce),
        };
        self.substate.touched_accounts.insert(address);
        self.substate.access_list_accounts.insert(address);

        let collides = self
            .state
            .get_account(&address)
            .map(|a| a.nonce != 0 || !a.code.is_empty())
            .unwrap_or(false);
        if collides {
            return Err(EvmError::CreateCollision);
        }

        if self.state.get_balance(&params.caller) < params.value {
            return Ok(CreateOutcome {
                success: false,
                gas_left: params.gas,
                address: None,
                return_data: vec![],
            });
        }

        self.state.checkpoint();
        self.state.set_nonce(&address, 1);
        let caller_balance = self.state.get_balance(&params.caller);
        let callee_balance = self.state.get_balance(&address);
        self.state.set_balance(&params.caller, caller_balance - params.value);
        self.state.set_balance(&address, callee_balance + params.value);

        let analyzed = crate::jumpdest::Code::analyze(params.init_code);
        let env = self.frame_env(address, params.caller, params.value, vec![]);
        let mut child = self.reborrow();
        let mut interpreter = Interpreter::new(&analyzed, &env, params.gas, child.hardfork, child.depth, false);
        let status = interpreter.run(&mut child);

        let fail = |state: &mut WorldStateTrie| {
            state.rollback().expect("checkpoint just pushed above");
            CreateOutcome {
                success: false,
                gas_left: 0,
                address: None,
                return_data: vec![],
            }
        };

        match status {
            InterpreterStatus::Halted => {
                let deployed = interpreter.state.output;
                if validate_deployed_code(&deployed).is_err() {
                    return Ok(fail(&mut *self.state));
                }
                let deploy_cost = deployed.len() as u64 * CREATE_DATA_GAS;
                let gas_left = interpreter.state.gas.remaining();
                if gas_left < deploy_cost {
                    return Ok(fail(&mut *self.state));
                }
                self.state.set_code(&address, deployed);
                self.state.commit().expect("checkpoint just pushed above");
                Ok(CreateOutcome {
                    success: true,
                    gas_left: gas_left - deploy_cost,
                    address: Some(address),
                    return_data: vec![],
                })
            }
            InterpreterStatus::Reverted(data) => {
                self.state.rollback().expect("checkpoint just pushed above");
                Ok(CreateOutcome {
                    success: false,
                    gas_left: interpreter.state.gas.remaining(),
                    address: None,
                    return_data: data,
                })
            }
            InterpreterStatus::Trapped(_) => Ok(fail(&mut *self.state)),
            InterpreterStatus::Running => unreachable!("Interpreter::run always returns a terminal status"),
        }
    }
}

/// Outcome of a fully executed transaction: the receipt it produced and the
/// total gas it charged (already priced into the sender/coinbase balance
/// updates `tx_execute` performs).
pub struct ExecutionResult {
    pub receipt: Receipt,
    pub gas_used: u64,
}

/// Runs one transaction against `state`, which is mutated in place. Mirrors
/// the yellow paper's Υ: validate, deduct the upfront cost, run the
/// top-level call or contract creation, and credit the unspent gas back to
/// the sender.
pub fn tx_execute(
    tx: &Transaction,
    state: &mut WorldStateTrie,
    block_header: &BlockHeader,
    blob_base_fee: U256,
    recent_block_hashes: &[H256],
) -> Result<ExecutionResult, InvalidTransaction> {
    let sender = check_valid_transaction(tx, state, block_header, blob_base_fee)?;

    state.set_nonce(&sender, tx.nonce + 1);

    // Gas (and blob gas) is prepaid here; `value` is *not* deducted up front
    // — it moves from sender to recipient through the ordinary balance
    // transfer inside the top-level CALL/CREATE below, same as any other
    // value-bearing call.
    let effective_gas_price = tx.effective_gas_price(block_header.base_fee);
    let upfront_gas_cost = U256::from(tx.gas_limit) * effective_gas_price;
    let blob_cost = U256::from(blob_gas_used(tx)) * blob_base_fee;
    let sender_balance = state.get_balance(&sender);
    state.set_balance(&sender, sender_balance - upfront_gas_cost - blob_cost);

    let mut substate = Substate::default();
    // EIP-2929: sender, recipient (or the about-to-be-created contract
    // address), precompiles and the transaction's own access list are all
    // warm from the first opcode onward.
    substate.access_list_accounts.insert(sender);
    if let Some(to) = tx.to {
        substate.access_list_accounts.insert(to);
    }
    substate
        .access_list_accounts
        .extend(crate::precompiles::PRECOMPILE_ADDRESSES.iter().copied());
    for item in &tx.access_list {
        substate.access_list_accounts.insert(item.address);
        for key in &item.storage_keys {
            substate
                .access_list_storage
                .insert((item.address, U256::from_big_endian(key.as_bytes())));
        }
    }

    let base_env = BaseEnv {
        origin: sender,
        gas_price: effective_gas_price,
        block_number: block_header.number,
        block_timestamp: block_header.timestamp,
        block_coinbase: block_header.beneficiary,
        block_gas_limit: block_header.gas_limit.low_u64(),
        block_base_fee: block_header.base_fee,
        block_prev_randao: block_header.prev_randao,
        chain_id: tx.chain_id,
        block_blob_base_fee: blob_base_fee,
        blob_hashes: tx.blob_versioned_hashes.clone(),
    };
    let precompiles = precompiled_contracts_berlin();

    state.checkpoint();
    let mut eei = TxEei {
        state: &mut *state,
        substate: &mut substate,
        base_env: &base_env,
        precompiles: &precompiles,
        recent_block_hashes,
        hardfork: Hardfork::Cancun,
        depth: 0,
    };

    let (success, gas_left) = if tx.is_creation() {
        let outcome = eei.create(CreateParams {
            caller: sender,
            value: tx.value,
            init_code: tx.data.to_vec(),
            gas: tx.gas_limit - intrinsic_gas(tx),
            salt: None,
        });
        match outcome {
            Ok(o) => (o.success, o.gas_left),
            Err(_) => (false, 0),
        }
    } else {
        let to = tx.to.expect("non-creation transaction always carries a recipient");
        let outcome = eei.call(CallParams {
            kind: CallKind::Call,
            caller: sender,
            address: to,
            code_address: to,
            value: tx.value,
            input: tx.data.to_vec(),
            gas: tx.gas_limit - intrinsic_gas(tx),
            is_static: false,
        });
        match outcome {
            Ok(o) => (o.success, o.gas_left),
            Err(_) => (false, 0),
        }
    };

    // The top-level frame already checkpointed/committed or rolled back its
    // own nested state inside `call`/`create`; this outer checkpoint only
    // exists so a `CreateCollision`/depth-exceeded trap that surfaces as an
    // `Err` before any nested checkpoint opens still has something to drop.
    state.commit().expect("checkpoint just pushed above");

    for (address, beneficiary) in &substate.self_destructs {
        if address != beneficiary {
            state.delete(address);
        }
    }

    // EIP-3529 caps any SSTORE/self-destruct refund at gas_used / 5, but that
    // refund counter lives on the top-level frame's own `GasMeter` and isn't
    // threaded back out through `CallOutcome`/`CreateOutcome` here, so no
    // refund is credited — gas_used is charged in full.
    let gas_used = tx.gas_limit - gas_left;
    let total_gas_used = gas_used;

    let sender_balance = state.get_balance(&sender);
    state.set_balance(&sender, sender_balance + U256::from(gas_left) * effective_gas_price);
    let coinbase_balance = state.get_balance(&block_header.beneficiary);
    state.set_balance(
        &block_header.beneficiary,
        coinbase_balance + U256::from(total_gas_used) * (effective_gas_price - block_header.base_fee),
    );

    let receipt = Receipt::new(
        tx.tx_type,
        if success { 1 } else { 0 },
        U256::from(total_gas_used),
        substate.logs,
    );

    Ok(ExecutionResult {
        receipt,
        gas_used: total_gas_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::crypto::sign_message_hash;
    use crate::world_state::AccountState;
    use k256::ecdsa::SigningKey;
    use k256::SecretKey;

    fn funded_sender() -> (SigningKey, Address) {
        let secret_key_bytes = [0x11u8; 32];
        let secret_key = SecretKey::from_bytes((&secret_key_bytes).into()).unwrap();
        let signing_key = SigningKey::from(secret_key);
        let address = crate::common::crypto::public_key_to_eth_address(signing_key.verifying_key());
        (signing_key, address)
    }

    fn signed_simple_transfer(signing_key: &SigningKey, nonce: u64, to: Address, value: U256) -> Transaction {
        let mut tx = Transaction {
            tx_type: 0,
            chain_id: 0,
            nonce,
            gas_limit: 21_000,
            to: Some(to),
            value,
            data: bytes::Bytes::new(),
            access_list: vec![],
            gas_price_or_dynamic_fee: Either::Left(U256::from(1_000_000_000u64)),
            v: 0,
            r: U256::zero(),
            s: U256::zero(),
            max_fee_per_blob_gas: U256::zero(),
            blob_versioned_hashes: vec![],
        };
        let hash = tx.get_message_hash();
        let (r, s, v) = sign_message_hash(hash, signing_key);
        tx.r = U256::from_big_endian(r.as_bytes());
        tx.s = U256::from_big_endian(s.as_bytes());
        tx.v = v;
        tx
    }

    fn test_block_header() -> BlockHeader {
        let mut header = BlockHeader::default();
        header.gas_limit = U256::from(30_000_000u64);
        header.gas_used = U256::zero();
        header.base_fee = U256::from(1_000_000_000u64);
        header
    }

    #[test]
    fn intrinsic_gas_of_a_plain_transfer_is_the_flat_base_cost() {
        let tx = Transaction {
            tx_type: 0,
            chain_id: 0,
            nonce: 0,
            gas_limit: 21_000,
            to: Some(Address::zero()),
            value: U256::zero(),
            data: bytes::Bytes::new(),
            access_list: vec![],
            gas_price_or_dynamic_fee: Either::Left(U256::one()),
            v: 0,
            r: U256::zero(),
            s: U256::zero(),
            max_fee_per_blob_gas: U256::zero(),
            blob_versioned_hashes: vec![],
        };
        assert_eq!(intrinsic_gas(&tx), 21_000);
    }

    #[test]
    fn nonce_mismatch_is_rejected_before_any_gas_is_spent() {
        let (signing_key, sender) = funded_sender();
        let mut state = WorldStateTrie::new();
        state.insert(&sender, AccountState::new(vec![]));
        state.set_balance(&sender, U256::from(10u64).pow(U256::from(20)));

        let tx = signed_simple_transfer(&signing_key, 5, Address::from([9u8; 20]), U256::zero());
        let header = test_block_header();
        let err = check_valid_transaction(&tx, &state, &header, U256::one()).unwrap_err();
        assert_eq!(
            err,
            InvalidTransaction::NonceTooHigh { tx: 5, state: 0 }
        );
    }

    #[test]
    fn sender_with_deployed_code_is_rejected_as_not_an_eoa() {
        let (signing_key, sender) = funded_sender();
        let mut state = WorldStateTrie::new();
        state.insert(&sender, AccountState::new(vec![0x00]));
        state.set_balance(&sender, U256::from(10u64).pow(U256::from(20)));

        let tx = signed_simple_transfer(&signing_key, 0, Address::from([9u8; 20]), U256::zero());
        let header = test_block_header();
        let err = check_valid_transaction(&tx, &state, &header, U256::one()).unwrap_err();
        assert_eq!(err, InvalidTransaction::SenderNotAnEoa(sender));
    }

    #[test]
    fn plain_transfer_moves_value_and_credits_leftover_gas_back() {
        let (signing_key, sender) = funded_sender();
        let recipient = Address::from([9u8; 20]);
        let mut state = WorldStateTrie::new();
        state.insert(&sender, AccountState::default());
        state.set_balance(&sender, U256::from(10u64).pow(U256::from(20)));
        state.insert(&recipient, AccountState::default());

        let tx = signed_simple_transfer(&signing_key, 0, recipient, U256::from(1_000));
        let header = test_block_header();

        let result = tx_execute(&tx, &mut state, &header, U256::one(), &[]).expect("valid tx");
        assert_eq!(result.receipt.status_code, 1);
        assert_eq!(state.get_balance(&recipient), U256::from(1_000));
        assert_eq!(state.get_nonce(&sender), 1);
    }
}
