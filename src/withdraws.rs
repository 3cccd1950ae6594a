use crate::common::trie::{MyTrie, TrieCodec};
use ethereum_types::{Address, H256, U64};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// EIP-4895 validator withdrawal, pulled out of the beacon chain and
/// credited to `recipient` with no execution-layer transaction involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub global_index: U64,
    pub validator_index: U64,
    pub recipient: Address,
    pub amount: U64, // Gwei
}

impl Encodable for Withdrawal {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.global_index);
        s.append(&self.validator_index);
        s.append(&self.recipient);
        s.append(&self.amount);
    }
}

impl Decodable for Withdrawal {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() || rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            global_index: rlp.val_at(0)?,
            validator_index: rlp.val_at(1)?,
            recipient: rlp.val_at(2)?,
            amount: rlp.val_at(3)?,
        })
    }
}

pub struct WithdrawalTrieCodec;
pub type WithdrawalTrie = MyTrie<usize, Withdrawal, WithdrawalTrieCodec>;

impl TrieCodec<usize, Withdrawal> for WithdrawalTrieCodec {
    fn encode_key(key: &usize) -> Vec<u8> {
        rlp::encode(&(*key as u64)).to_vec()
    }

    fn encode_value(value: &Withdrawal) -> Vec<u8> {
        rlp::encode(value).to_vec()
    }

    fn decode_key(encoded: &[u8]) -> usize {
        rlp::decode::<u64>(encoded).expect("invalid withdrawal key rlp") as usize
    }

    fn decode_value(encoded: &[u8]) -> Withdrawal {
        rlp::decode(encoded).expect("invalid withdrawal value rlp")
    }
}

pub fn hash_withdrawals(withdrawals: &[Withdrawal]) -> H256 {
    let mut trie = WithdrawalTrie::new();
    for (i, w) in withdrawals.iter().enumerate() {
        trie.insert(&i, w);
    }
    trie.root_hash()
}
