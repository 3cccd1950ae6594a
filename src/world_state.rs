use crate::common::trie::{MyTrie, TrieCodec};
use anyhow::Result;
use ethereum_types::{Address, H256, U256};
use rlp::{Encodable, RlpStream};
use sha3::{Digest, Keccak256};

pub type StorageTrie = MyTrie<U256, U256, StorageCodec>;

#[derive(Debug, Clone)]
enum JournalEntry {
    BalanceChange {
        address: Address,
        old_value: U256,
    },
    NonceChange {
        address: Address,
        old_value: u64,
    },
    StorageChange {
        address: Address,
        key: U256,
        old_value: Option<U256>,
    },
    CodeChange {
        address: Address,
        old_code: Vec<u8>,
        old_code_hash: H256,
    },
    AccountCreated {
        address: Address,
    },
    AccountDeleted {
        address: Address,
        old_account: AccountState,
    },
}

/// The world state account, sigma(a) in yellow-paper notation.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: H256,
    pub code_hash: H256,

    // Not part of the RLP-encoded account; kept alongside it so the state
    // trie doubles as a code/storage store without a separate DB.
    pub code: Vec<u8>,
    pub storage: StorageTrie,
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            storage_root: H256::zero(),
            code_hash: H256::zero(),
            code: vec![],
            storage: StorageTrie::default(),
        }
    }
}

impl Encodable for AccountState {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.nonce);
        s.append(&self.balance);
        s.append(&self.storage_root);
        s.append(&self.code_hash);
    }
}

impl AccountState {
    pub fn update_storage_root(&mut self) {
        self.storage_root = self.storage.root_hash();
    }

    pub fn update_code_hash(&mut self) {
        self.code_hash = H256::from_slice(&Keccak256::digest(&self.code));
    }

    pub fn new(code: Vec<u8>) -> Self {
        let mut account = Self::default();
        account.code = code;
        account.update_code_hash();
        account
    }

    /// EIP-161 "empty account" predicate: nonce 0, balance 0, no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StorageCodec;
impl TrieCodec<U256, U256> for StorageCodec {
    fn encode_key(key: &U256) -> Vec<u8> {
        key.to_big_endian().to_vec()
    }
    fn encode_value(value: &U256) -> Vec<u8> {
        // Zero normalizes to the empty string so the storage trie agrees
        // with geth/EIP-1283 about a cleared slot's consensus encoding.
        if value.is_zero() {
            vec![]
        } else {
            rlp::encode(value).to_vec()
        }
    }
    fn decode_key(encoded: &[u8]) -> U256 {
        U256::from_big_endian(encoded)
    }
    fn decode_value(encoded: &[u8]) -> U256 {
        if encoded.is_empty() {
            U256::zero()
        } else {
            rlp::decode(encoded).expect("invalid storage value rlp")
        }
    }
}

struct StateCodec;
impl TrieCodec<Address, AccountState> for StateCodec {
    fn encode_key(key: &Address) -> Vec<u8> {
        key.as_bytes().to_vec()
    }
    fn encode_value(value: &AccountState) -> Vec<u8> {
        rlp::encode(value).to_vec()
    }
    fn decode_key(encoded: &[u8]) -> Address {
        Address::from_slice(encoded)
    }
    fn decode_value(encoded: &[u8]) -> AccountState {
        rlp::decode(encoded).expect("invalid account state rlp")
    }
}

/// Account trie plus a nesting stack of journals, so a CALL started inside
/// another CALL's checkpoint can be rolled back independently of its
/// parent's still-open checkpoint.
pub struct WorldStateTrie {
    inner: MyTrie<Address, AccountState, StateCodec>,
    checkpoints: Vec<Vec<JournalEntry>>,
}

impl Default for WorldStateTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldStateTrie {
    pub fn new() -> Self {
        Self {
            inner: MyTrie::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Push a new, independent checkpoint. Call/create frames each open one
    /// on entry and either `commit` (success) or `rollback` (revert/trap) it
    /// on exit; nesting depth tracks call depth.
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(Vec::new());
    }

    /// Undo every change recorded since the most recent `checkpoint()`,
    /// deepest first, then drop that checkpoint.
    pub fn rollback(&mut self) -> Result<()> {
        let journal = self
            .checkpoints
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no checkpoint to rollback to"))?;
        for entry in journal.iter().rev() {
            self.revert_journal_entry(entry);
        }
        Ok(())
    }

    /// Drop the most recent checkpoint's journal without undoing anything.
    /// If a parent checkpoint is still open, its entries are merged into it
    /// so an outer rollback still undoes the committed child's changes.
    pub fn commit(&mut self) -> Result<()> {
        let journal = self
            .checkpoints
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no checkpoint to commit"))?;
        if let Some(parent) = self.checkpoints.last_mut() {
            parent.extend(journal);
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    fn push_journal(&mut self, entry: JournalEntry) {
        if let Some(journal) = self.checkpoints.last_mut() {
            journal.push(entry);
        }
    }

    fn revert_journal_entry(&mut self, entry: &JournalEntry) {
        match entry {
            JournalEntry::BalanceChange { address, old_value } => {
                if let Some(mut account) = self.inner.get(address) {
                    account.balance = *old_value;
                    self.inner.insert(address, &account);
                }
            }
            JournalEntry::NonceChange { address, old_value } => {
                if let Some(mut account) = self.inner.get(address) {
                    account.nonce = *old_value;
                    self.inner.insert(address, &account);
                }
            }
            JournalEntry::StorageChange {
                address,
                key,
                old_value,
            } => {
                if let Some(mut account) = self.inner.get(address) {
                    match old_value {
                        Some(value) => account.storage.insert(key, value),
                        None => account.storage.delete(key),
                    }
                    account.update_storage_root();
                    self.inner.insert(address, &account);
                }
            }
            JournalEntry::CodeChange {
                address,
                old_code,
                old_code_hash,
            } => {
                if let Some(mut account) = self.inner.get(address) {
                    account.code = old_code.clone();
                    account.code_hash = *old_code_hash;
                    self.inner.insert(address, &account);
                }
            }
            JournalEntry::AccountCreated { address } => {
                self.inner.delete(address);
            }
            JournalEntry::AccountDeleted {
                address,
                old_account,
            } => {
                self.inner.insert(address, old_account);
            }
        }
    }

    pub fn insert(&mut self, address: &Address, account: AccountState) {
        match self.inner.get_ref(address) {
            None => self.push_journal(JournalEntry::AccountCreated { address: *address }),
            Some(old_account) => self.push_journal(JournalEntry::AccountDeleted {
                address: *address,
                old_account,
            }),
        }
        self.inner.insert(address, &account);
    }

    pub fn set_nonce(&mut self, address: &Address, nonce: u64) {
        let mut account = self.inner.get(address).unwrap_or_default();
        let old_nonce = account.nonce;
        if old_nonce != nonce {
            self.push_journal(JournalEntry::NonceChange {
                address: *address,
                old_value: old_nonce,
            });
            account.nonce = nonce;
            self.inner.insert(address, &account);
        }
    }

    pub fn set_balance(&mut self, address: &Address, balance: U256) {
        let mut account = self.inner.get(address).unwrap_or_default();
        let old_balance = account.balance;
        if old_balance != balance {
            self.push_journal(JournalEntry::BalanceChange {
                address: *address,
                old_value: old_balance,
            });
            account.balance = balance;
            self.inner.insert(address, &account);
        }
    }

    pub fn set_storage(&mut self, address: &Address, key: U256, value: U256) {
        let mut account = self.inner.get(address).unwrap_or_default();
        let old_value = account.storage.get_ref(&key);
        if old_value != Some(value) {
            self.push_journal(JournalEntry::StorageChange {
                address: *address,
                key,
                old_value,
            });
            account.storage.insert(&key, &value);
            account.update_storage_root();
            self.inner.insert(address, &account);
        }
    }

    pub fn set_code(&mut self, address: &Address, code: Vec<u8>) {
        let mut account = self.inner.get(address).unwrap_or_default();
        let old_code = account.code.clone();
        let old_code_hash = account.code_hash;
        if old_code != code {
            self.push_journal(JournalEntry::CodeChange {
                address: *address,
                old_code,
                old_code_hash,
            });
            account.code = code;
            account.update_code_hash();
            self.inner.insert(address, &account);
        }
    }

    pub fn delete(&mut self, address: &Address) {
        if let Some(old_account) = self.inner.get(address) {
            self.push_journal(JournalEntry::AccountDeleted {
                address: *address,
                old_account,
            });
            self.inner.delete(address);
        }
    }

    pub fn get_account(&self, address: &Address) -> Option<AccountState> {
        self.inner.get_ref(address)
    }

    pub fn get_nonce(&self, address: &Address) -> u64 {
        self.inner.get_ref(address).map(|a| a.nonce).unwrap_or(0)
    }

    pub fn get_balance(&self, address: &Address) -> U256 {
        self.inner
            .get_ref(address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub fn get_code(&self, address: &Address) -> Vec<u8> {
        self.inner.get_ref(address).map(|a| a.code).unwrap_or_default()
    }

    pub fn get_storage(&self, address: &Address, key: U256) -> U256 {
        self.inner
            .get_ref(address)
            .and_then(|a| a.storage.get_ref(&key))
            .unwrap_or_default()
    }

    pub fn root_hash(&self) -> H256 {
        self.inner.root_hash()
    }

    pub fn account_exists(&self, address: &Address) -> bool {
        self.inner.get_ref(address).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_undoes_balance_and_storage_changes() {
        let mut state = WorldStateTrie::new();
        let addr = Address::from([1u8; 20]);
        state.insert(&addr, AccountState::default());

        state.checkpoint();
        state.set_balance(&addr, U256::from(100));
        state.set_storage(&addr, U256::from(1), U256::from(42));
        assert_eq!(state.get_balance(&addr), U256::from(100));
        assert_eq!(state.get_storage(&addr, U256::from(1)), U256::from(42));

        state.rollback().unwrap();
        assert_eq!(state.get_balance(&addr), U256::zero());
        assert_eq!(state.get_storage(&addr, U256::from(1)), U256::zero());
    }

    #[test]
    fn nested_checkpoints_can_roll_back_independently() {
        let mut state = WorldStateTrie::new();
        let addr = Address::from([2u8; 20]);
        state.insert(&addr, AccountState::default());

        state.checkpoint(); // outer
        state.set_balance(&addr, U256::from(10));

        state.checkpoint(); // inner
        state.set_balance(&addr, U256::from(20));
        state.rollback().unwrap(); // undo inner only
        assert_eq!(state.get_balance(&addr), U256::from(10));

        state.commit().unwrap(); // commit outer
        assert_eq!(state.get_balance(&addr), U256::from(10));
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn zero_value_storage_normalizes_to_empty_encoding() {
        assert_eq!(StorageCodec::encode_value(&U256::zero()), Vec::<u8>::new());
        assert_eq!(
            StorageCodec::decode_value(&[]),
            U256::zero()
        );
    }
}
