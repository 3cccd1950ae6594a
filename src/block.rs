//! Block header/body and the structural checks that sit above the
//! interpreter: transactions-trie reconstruction, uncles hash, and uncle
//! eligibility against a `Blockchain` view.
use crate::common::constants::hashes;
use crate::errors::BlockValidationError;
use crate::receipts::{hash_receipts, merge_bloom, Receipt};
use crate::transaction::{hash_transactions, Transaction};
use crate::withdraws::{hash_withdrawals, Withdrawal};
use crate::world_state::WorldStateTrie;
use ethereum_types::{Address, H256, U256};
use rlp::{Encodable, RlpStream};
use sha3::{Digest, Keccak256};

type Result<T> = std::result::Result<T, BlockValidationError>;

const TARGET_BLOB_GAS_PER_BLOCK: u64 = 393216;
const MIN_BASE_FEE_PER_BLOB_GAS: u64 = 1;
const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3338477;
const MAX_UNCLE_GENERATION: u64 = 6;
const MAX_UNCLES_PER_BLOCK: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub parent_hash: H256,
    pub ommers_hash: H256, // keccak256(rlp(ommers.map(raw))), EMPTY_LIST_HASH if none
    pub beneficiary: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: [u8; 256], // 2048 bits
    pub difficulty: U256,      // always 0 post-Merge
    pub number: u64,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: u64,
    pub extra_data: Vec<u8>,
    pub prev_randao: H256, // mix_hash post-Merge
    pub nonce: u64,        // always 0 post-Merge
    pub base_fee: U256,
    pub withdrawals_root: H256,
    pub excess_blob_gas: U256,
    pub blob_gas_used: U256,
}

pub struct Block {
    pub header: BlockHeader,

    // block body
    pub transactions: Vec<Transaction>,
    pub receipts: Vec<Receipt>,
    pub withdrawals: Vec<Withdrawal>,
    pub ommers: Vec<BlockHeader>,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            parent_hash: H256::zero(),
            ommers_hash: hashes::EMPTY_LIST_HASH,
            beneficiary: Address::zero(),
            state_root: H256::zero(),
            transactions_root: hashes::EMPTY_TRIE_HASH,
            receipts_root: hashes::EMPTY_TRIE_HASH,
            logs_bloom: [0u8; 256],
            difficulty: U256::zero(),
            number: 0,
            gas_limit: U256::zero(),
            gas_used: U256::zero(),
            timestamp: 0,
            extra_data: vec![],
            prev_randao: H256::zero(),
            nonce: 0,
            base_fee: U256::zero(),
            withdrawals_root: hashes::EMPTY_TRIE_HASH,
            excess_blob_gas: U256::zero(),
            blob_gas_used: U256::zero(),
        }
    }
}

impl Default for Block {
    fn default() -> Self {
        Self {
            header: BlockHeader::default(),
            transactions: vec![],
            receipts: vec![],
            withdrawals: vec![],
            ommers: vec![],
        }
    }
}

fn fake_exponential(factor: U256, numerator: U256, denominator: U256) -> U256 {
    let mut i = U256::one();
    let mut output = U256::zero();
    let mut numerator_accum = factor * denominator;
    while numerator_accum > U256::zero() {
        output += numerator_accum;
        numerator_accum = (numerator_accum * numerator) / (denominator * i);
        i += U256::one();
    }
    output / denominator
}

/// `header.excess_blob_gas = calc_excess_blob_gas(parent)`, EIP-4844.
pub fn calc_excess_blob_gas(parent: &BlockHeader) -> U256 {
    let total = parent.excess_blob_gas + parent.blob_gas_used;
    if total < U256::from(TARGET_BLOB_GAS_PER_BLOCK) {
        U256::zero()
    } else {
        total - U256::from(TARGET_BLOB_GAS_PER_BLOCK)
    }
}

/// keccak256(rlp(ommers.map(raw))) — `EMPTY_LIST_HASH` when there are none.
pub fn hash_ommers(ommers: &[BlockHeader]) -> H256 {
    let mut stream = RlpStream::new_list(ommers.len());
    for uncle in ommers {
        stream.append(uncle);
    }
    H256::from_slice(&Keccak256::digest(stream.out()))
}

impl BlockHeader {
    pub fn hash(&self) -> H256 {
        H256::from_slice(&Keccak256::digest(rlp::encode(self)))
    }
}

impl Block {
    pub fn get_base_fee_per_blob_gas(&self) -> U256 {
        fake_exponential(
            U256::from(MIN_BASE_FEE_PER_BLOB_GAS),
            self.header.excess_blob_gas,
            U256::from(BLOB_BASE_FEE_UPDATE_FRACTION),
        )
    }

    /// Checks invariants that only the executor which produced this block's
    /// state can verify: trie roots and bloom match the body that was
    /// actually run.
    pub fn holistic_validity_check(&self, state: &WorldStateTrie) -> Result<()> {
        if self.header.state_root != state.root_hash() {
            return Err(BlockValidationError::StateRootMismatch);
        }
        if self.header.ommers_hash != hash_ommers(&self.ommers) {
            return Err(BlockValidationError::OmmersHashMismatch);
        }
        if self.header.transactions_root != hash_transactions(&self.transactions) {
            return Err(BlockValidationError::TransactionsRootMismatch);
        }
        if self.header.receipts_root != hash_receipts(&self.receipts) {
            return Err(BlockValidationError::ReceiptsRootMismatch);
        }
        if self.header.withdrawals_root != hash_withdrawals(&self.withdrawals) {
            return Err(BlockValidationError::WithdrawalsRootMismatch);
        }
        if self.header.logs_bloom != merge_bloom(&self.receipts) {
            return Err(BlockValidationError::LogsBloomMismatch);
        }
        Ok(())
    }

    /// Checks invariants verifiable from the header alone against its parent
    /// (difficulty/PoW are skipped post-Merge, per this crate's Cancun-only
    /// scope — `difficulty`/`nonce` are asserted zero instead).
    pub fn header_validity_check(&self, parent: &Block) -> Result<()> {
        if self.header.parent_hash != parent.header.hash() {
            return Err(BlockValidationError::ParentHashMismatch);
        }
        if self.header.number != parent.header.number + 1 {
            return Err(BlockValidationError::NumberMismatch);
        }
        if self.header.gas_used > self.header.gas_limit {
            return Err(BlockValidationError::GasUsedExceedsLimit);
        }
        if self.header.gas_limit.is_zero() {
            return Err(BlockValidationError::HeaderFieldInvalid("gas_limit is zero".into()));
        }
        if self.header.timestamp <= parent.header.timestamp {
            return Err(BlockValidationError::HeaderFieldInvalid("timestamp must increase".into()));
        }
        if self.header.base_fee.is_zero() {
            return Err(BlockValidationError::HeaderFieldInvalid("base_fee is zero".into()));
        }
        if self.header.difficulty != U256::zero() || self.header.nonce != 0 {
            return Err(BlockValidationError::HeaderFieldInvalid(
                "difficulty and nonce must be zero post-Merge".into(),
            ));
        }
        Ok(())
    }

    pub fn hash(&self) -> H256 {
        self.header.hash()
    }

    /// Step 1-2 of block structural validation: uncle count/distinctness and
    /// the uncles-hash check. Genesis has no parent to check uncles against
    /// and is accepted trivially.
    pub fn validate_uncles_shape(&self) -> Result<()> {
        if self.header.number == 0 {
            return Ok(());
        }
        if self.ommers.len() > MAX_UNCLES_PER_BLOCK {
            return Err(BlockValidationError::TooManyOmmers);
        }
        let mut seen = std::collections::HashSet::new();
        for uncle in &self.ommers {
            if !seen.insert(uncle.hash()) {
                return Err(BlockValidationError::DuplicateOmmer);
            }
        }
        if self.header.ommers_hash != hash_ommers(&self.ommers) {
            return Err(BlockValidationError::OmmersHashMismatch);
        }
        Ok(())
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
        self.header.transactions_root = hash_transactions(&self.transactions);
    }

    pub fn add_transactions(&mut self, txs: Vec<Transaction>) {
        self.transactions.extend(txs);
        self.header.transactions_root = hash_transactions(&self.transactions);
    }

    pub fn add_receipts(&mut self, receipts: Vec<Receipt>) {
        self.receipts.extend(receipts);
        self.header.receipts_root = hash_receipts(&self.receipts);
        self.header.logs_bloom = merge_bloom(&self.receipts);
    }

    pub fn add_withdrawals(&mut self, withdrawals: Vec<Withdrawal>) {
        self.withdrawals.extend(withdrawals);
        self.header.withdrawals_root = hash_withdrawals(&self.withdrawals);
    }

    pub fn add_ommers(&mut self, ommers: Vec<BlockHeader>) {
        self.ommers.extend(ommers);
        self.header.ommers_hash = hash_ommers(&self.ommers);
    }
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(18);
        s.append(&self.parent_hash);
        s.append(&self.ommers_hash);
        s.append(&self.beneficiary);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.logs_bloom.as_ref());
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data);
        s.append(&self.prev_randao);
        s.append(&self.nonce);
        s.append(&self.base_fee);
        s.append(&self.withdrawals_root);
        s.append(&self.excess_blob_gas);
    }
}

impl Encodable for Block {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.header);

        s.begin_list(self.transactions.len());
        for tx in &self.transactions {
            let bytes = tx.serialization();
            s.append_raw(&bytes, 1);
        }

        s.begin_list(self.ommers.len());
        for uncle in &self.ommers {
            s.append(uncle);
        }

        s.begin_list(self.withdrawals.len());
        for w in &self.withdrawals {
            s.append(w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> Block {
        let mut block = Block::default();
        block.header.base_fee = U256::from(1_000_000_000u64);
        block.header.gas_limit = U256::from(30_000_000u64);
        block
    }

    #[test]
    fn empty_block_hashes_to_the_well_known_empty_trie_and_list_roots() {
        let block = Block::default();
        assert_eq!(block.header.transactions_root, hashes::EMPTY_TRIE_HASH);
        assert_eq!(block.header.ommers_hash, hashes::EMPTY_LIST_HASH);
        assert_eq!(hash_ommers(&[]), hashes::EMPTY_LIST_HASH);
    }

    #[test]
    fn genesis_block_accepts_uncles_trivially_even_with_a_bad_hash() {
        let mut block = genesis();
        block.header.ommers_hash = H256::from_low_u64_be(0xdead);
        assert!(block.validate_uncles_shape().is_ok());
    }

    #[test]
    fn more_than_two_uncles_is_rejected() {
        let mut block = genesis();
        block.header.number = 1;
        let mut uncle = BlockHeader::default();
        uncle.number = 1;
        block.ommers = vec![uncle.clone(), uncle.clone(), uncle];
        assert!(block.validate_uncles_shape().is_err());
    }

    #[test]
    fn duplicate_uncle_hashes_are_rejected() {
        let mut block = genesis();
        block.header.number = 1;
        let uncle = BlockHeader::default();
        block.ommers = vec![uncle.clone(), uncle];
        assert!(block.validate_uncles_shape().is_err());
    }

    #[test]
    fn header_validity_check_rejects_a_stale_timestamp() {
        let parent = genesis();
        let mut child = genesis();
        child.header.number = 1;
        child.header.parent_hash = parent.header.hash();
        child.header.timestamp = parent.header.timestamp;
        assert!(child.header_validity_check(&parent).is_err());
    }
}
