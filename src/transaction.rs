use crate::common::crypto::recover_address_from_signature;
use crate::common::trie::{MyTrie, TrieCodec};
use bytes::Bytes;
use either::Either;
use ethereum_types::{Address, H256, U256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use sha3::{Digest, Keccak256};

fn decode_to(rlp: &Rlp, idx: usize) -> Result<Option<Address>, DecoderError> {
    let bytes: Bytes = rlp.val_at(idx)?;
    if bytes.is_empty() {
        Ok(None)
    } else if bytes.len() == 20 {
        Ok(Some(Address::from_slice(&bytes)))
    } else {
        Err(DecoderError::Custom("Invalid 'to' length"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<H256>,
}

impl Encodable for AccessListItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.begin_list(self.storage_keys.len());
        for key in &self.storage_keys {
            s.append(key);
        }
    }
}

impl Decodable for AccessListItem {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() || rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(AccessListItem {
            address: rlp.val_at(0)?,
            storage_keys: rlp.list_at(1)?,
        })
    }
}

/// EIP-2930 (type 1, `gas_price_or_dynamic_fee: Left`), EIP-1559 (type 2,
/// `Right`) and EIP-4844 (type 3, carries the blob fields below) in one
/// struct. Legacy (untyped, pre-2930) transactions are represented as
/// type 0 with an empty access list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub tx_type: u8,
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: Vec<AccessListItem>,
    pub gas_price_or_dynamic_fee: Either<U256, (U256, U256)>,
    pub v: u8,
    pub r: U256,
    pub s: U256,

    // EIP-4844 blob fields; only meaningful when `tx_type == 3`.
    pub max_fee_per_blob_gas: U256,
    pub blob_versioned_hashes: Vec<H256>,
}

impl Transaction {
    pub fn get_sender(&self) -> anyhow::Result<Address> {
        recover_address_from_signature(self.get_message_hash(), self.r, self.s, self.v)
    }

    pub fn get_message_hash(&self) -> H256 {
        H256::from_slice(&Keccak256::digest(self.serialization()))
    }

    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }

    pub fn is_blob_tx(&self) -> bool {
        self.tx_type == 0x03
    }

    /// min(max_priority_fee + base_fee, max_fee), per EIP-1559. Legacy and
    /// EIP-2930 transactions carry a single `gas_price` that plays both
    /// roles.
    pub fn effective_gas_price(&self, base_fee: U256) -> U256 {
        let (max_priority_fee_per_gas, max_fee_per_gas) = match &self.gas_price_or_dynamic_fee {
            Either::Left(gas_price) => (*gas_price, *gas_price),
            Either::Right((max_priority_fee, max_fee)) => (*max_priority_fee, *max_fee),
        };
        std::cmp::min(max_priority_fee_per_gas + base_fee, max_fee_per_gas)
    }

    /// `Tx = type_byte || RLP(payload)` per EIP-2718. Legacy transactions
    /// (`tx_type == 0`) have no type byte.
    pub fn serialization(&self) -> Vec<u8> {
        let payload = rlp::encode(self);
        if self.tx_type == 0 {
            payload.to_vec()
        } else {
            let mut out = vec![self.tx_type];
            out.extend_from_slice(&payload);
            out
        }
    }

    pub fn deserialization(bytes: &[u8]) -> Result<Self, DecoderError> {
        if bytes.is_empty() {
            return Err(DecoderError::RlpIsTooShort);
        }
        let (tx_type, payload) = match bytes[0] {
            0x01 | 0x02 | 0x03 => (bytes[0], &bytes[1..]),
            _ => (0u8, bytes),
        };
        let rlp = Rlp::new(payload);

        let tx = match tx_type {
            0 => {
                if !rlp.is_list() || rlp.item_count()? != 9 {
                    return Err(DecoderError::RlpIncorrectListLen);
                }
                Transaction {
                    tx_type: 0,
                    chain_id: 0,
                    nonce: rlp.val_at(0)?,
                    gas_price_or_dynamic_fee: Either::Left(rlp.val_at(1)?),
                    gas_limit: rlp.val_at(2)?,
                    to: decode_to(&rlp, 3)?,
                    value: rlp.val_at(4)?,
                    data: rlp.val_at(5)?,
                    access_list: vec![],
                    v: rlp.val_at(6)?,
                    r: rlp.val_at(7)?,
                    s: rlp.val_at(8)?,
                    max_fee_per_blob_gas: U256::zero(),
                    blob_versioned_hashes: vec![],
                }
            }
            0x01 => {
                // [chainId, nonce, gasPrice, gasLimit, to, value, data, accessList, v, r, s]
                if !rlp.is_list() || rlp.item_count()? != 11 {
                    return Err(DecoderError::RlpIncorrectListLen);
                }
                Transaction {
                    tx_type: 0x01,
                    chain_id: rlp.val_at(0)?,
                    nonce: rlp.val_at(1)?,
                    gas_price_or_dynamic_fee: Either::Left(rlp.val_at(2)?),
                    gas_limit: rlp.val_at(3)?,
                    to: decode_to(&rlp, 4)?,
                    value: rlp.val_at(5)?,
                    data: rlp.val_at(6)?,
                    access_list: rlp.list_at(7)?,
                    v: rlp.val_at(8)?,
                    r: rlp.val_at(9)?,
                    s: rlp.val_at(10)?,
                    max_fee_per_blob_gas: U256::zero(),
                    blob_versioned_hashes: vec![],
                }
            }
            0x02 => {
                // [chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data, accessList, v, r, s]
                if !rlp.is_list() || rlp.item_count()? != 12 {
                    return Err(DecoderError::RlpIncorrectListLen);
                }
                Transaction {
                    tx_type: 0x02,
                    chain_id: rlp.val_at(0)?,
                    nonce: rlp.val_at(1)?,
                    gas_price_or_dynamic_fee: Either::Right((rlp.val_at(2)?, rlp.val_at(3)?)),
                    gas_limit: rlp.val_at(4)?,
                    to: decode_to(&rlp, 5)?,
                    value: rlp.val_at(6)?,
                    data: rlp.val_at(7)?,
                    access_list: rlp.list_at(8)?,
                    v: rlp.val_at(9)?,
                    r: rlp.val_at(10)?,
                    s: rlp.val_at(11)?,
                    max_fee_per_blob_gas: U256::zero(),
                    blob_versioned_hashes: vec![],
                }
            }
            0x03 => {
                // [chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value,
                //  data, accessList, maxFeePerBlobGas, blobVersionedHashes, v, r, s]
                if !rlp.is_list() || rlp.item_count()? != 14 {
                    return Err(DecoderError::RlpIncorrectListLen);
                }
                Transaction {
                    tx_type: 0x03,
                    chain_id: rlp.val_at(0)?,
                    nonce: rlp.val_at(1)?,
                    gas_price_or_dynamic_fee: Either::Right((rlp.val_at(2)?, rlp.val_at(3)?)),
                    gas_limit: rlp.val_at(4)?,
                    to: decode_to(&rlp, 5)?,
                    value: rlp.val_at(6)?,
                    data: rlp.val_at(7)?,
                    access_list: rlp.list_at(8)?,
                    max_fee_per_blob_gas: rlp.val_at(9)?,
                    blob_versioned_hashes: rlp.list_at(10)?,
                    v: rlp.val_at(11)?,
                    r: rlp.val_at(12)?,
                    s: rlp.val_at(13)?,
                }
            }
            _ => return Err(DecoderError::Custom("unsupported transaction type")),
        };

        Ok(tx)
    }
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        let append_to = |s: &mut RlpStream, to: &Option<Address>| {
            if let Some(to) = to {
                s.append(to);
            } else {
                s.append(&Bytes::new());
            }
        };
        let append_access_list = |s: &mut RlpStream, list: &[AccessListItem]| {
            s.begin_list(list.len());
            for a in list {
                s.append(a);
            }
        };

        match self.tx_type {
            0 => {
                s.begin_list(9);
                s.append(&self.nonce);
                match &self.gas_price_or_dynamic_fee {
                    Either::Left(gas_price) => {
                        s.append(gas_price);
                    }
                    Either::Right(_) => panic!("legacy transaction must use gas_price"),
                }
                s.append(&self.gas_limit);
                append_to(s, &self.to);
                s.append(&self.value);
                s.append(&self.data);
                s.append(&self.v);
                s.append(&self.r);
                s.append(&self.s);
            }
            0x01 => {
                s.begin_list(11);
                s.append(&self.chain_id);
                s.append(&self.nonce);
                match &self.gas_price_or_dynamic_fee {
                    Either::Left(gas_price) => {
                        s.append(gas_price);
                    }
                    Either::Right(_) => panic!("type 1 transaction must use gas_price"),
                }
                s.append(&self.gas_limit);
                append_to(s, &self.to);
                s.append(&self.value);
                s.append(&self.data);
                append_access_list(s, &self.access_list);
                s.append(&self.v);
                s.append(&self.r);
                s.append(&self.s);
            }
            0x02 => {
                s.begin_list(12);
                s.append(&self.chain_id);
                s.append(&self.nonce);
                match &self.gas_price_or_dynamic_fee {
                    Either::Left(_) => panic!("type 2 transaction must use dynamic fee"),
                    Either::Right((max_priority_fee, max_fee)) => {
                        s.append(max_priority_fee);
                        s.append(max_fee);
                    }
                }
                s.append(&self.gas_limit);
                append_to(s, &self.to);
                s.append(&self.value);
                s.append(&self.data);
                append_access_list(s, &self.access_list);
                s.append(&self.v);
                s.append(&self.r);
                s.append(&self.s);
            }
            0x03 => {
                s.begin_list(14);
                s.append(&self.chain_id);
                s.append(&self.nonce);
                match &self.gas_price_or_dynamic_fee {
                    Either::Left(_) => panic!("type 3 transaction must use dynamic fee"),
                    Either::Right((max_priority_fee, max_fee)) => {
                        s.append(max_priority_fee);
                        s.append(max_fee);
                    }
                }
                s.append(&self.gas_limit);
                append_to(s, &self.to);
                s.append(&self.value);
                s.append(&self.data);
                append_access_list(s, &self.access_list);
                s.append(&self.max_fee_per_blob_gas);
                s.begin_list(self.blob_versioned_hashes.len());
                for h in &self.blob_versioned_hashes {
                    s.append(h);
                }
                s.append(&self.v);
                s.append(&self.r);
                s.append(&self.s);
            }
            _ => panic!("unsupported transaction type"),
        }
    }
}

pub struct TransactionTrieCodec;
pub type TransactionTrie = MyTrie<usize, Transaction, TransactionTrieCodec>;

impl TrieCodec<usize, Transaction> for TransactionTrieCodec {
    fn encode_key(key: &usize) -> Vec<u8> {
        rlp::encode(&(*key as u64)).to_vec()
    }

    fn decode_key(encoded: &[u8]) -> usize {
        Rlp::new(encoded).as_val::<u64>().expect("invalid key rlp") as usize
    }

    fn encode_value(value: &Transaction) -> Vec<u8> {
        value.serialization()
    }

    fn decode_value(encoded: &[u8]) -> Transaction {
        Transaction::deserialization(encoded).expect("invalid value rlp")
    }
}

pub fn hash_transactions(transactions: &[Transaction]) -> H256 {
    let mut trie = TransactionTrie::new();
    for (i, tx) in transactions.iter().enumerate() {
        trie.insert(&i, tx);
    }
    trie.root_hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::serde_helper as sh;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Deserialize, Clone)]
    struct AccessListItemHelper {
        #[serde(deserialize_with = "sh::de_addr")]
        address: Address,
        #[serde(rename = "storageKeys", deserialize_with = "sh::de_vec_h256")]
        storage_keys: Vec<H256>,
    }

    impl From<AccessListItemHelper> for AccessListItem {
        fn from(h: AccessListItemHelper) -> Self {
            Self {
                address: h.address,
                storage_keys: h.storage_keys,
            }
        }
    }

    #[derive(Deserialize)]
    struct TxHelper {
        #[serde(rename = "maxPriorityFeePerGas", default)]
        max_priority_fee_per_gas: Option<u64>,
        #[serde(rename = "maxFeePerGas", default)]
        max_fee_per_gas: Option<u64>,
        #[serde(rename = "gasPrice", default)]
        gas_price: Option<u64>,
        #[serde(rename = "chainId")]
        chain_id: u64,
        nonce: u64,
        #[serde(rename = "gasLimit")]
        gas_limit: u64,
        #[serde(deserialize_with = "sh::de_addr")]
        to: Address,
        #[serde(deserialize_with = "sh::de_u256")]
        value: U256,
        #[serde(deserialize_with = "sh::de_bytes")]
        data: Bytes,
        #[serde(rename = "accessList", default)]
        access_list: Vec<AccessListItemHelper>,
        v: u8,
        #[serde(deserialize_with = "sh::de_u256")]
        r: U256,
        #[serde(deserialize_with = "sh::de_u256")]
        s: U256,
    }

    fn transaction_from_helper(h: TxHelper) -> Transaction {
        let (tx_type, gas_price_or_dynamic_fee) =
            if h.max_priority_fee_per_gas.is_some() || h.max_fee_per_gas.is_some() {
                let max_priority_fee_per_gas =
                    h.max_priority_fee_per_gas.map(U256::from).unwrap_or_default();
                let max_fee_per_gas = h.max_fee_per_gas.map(U256::from).unwrap_or_default();
                (
                    0x02u8,
                    Either::Right((max_priority_fee_per_gas, max_fee_per_gas)),
                )
            } else {
                let gas_price = h.gas_price.map(U256::from).unwrap_or_default();
                (0x01u8, Either::Left(gas_price))
            };

        Transaction {
            tx_type,
            chain_id: h.chain_id,
            nonce: h.nonce,
            gas_price_or_dynamic_fee,
            gas_limit: h.gas_limit,
            to: Some(h.to),
            value: h.value,
            data: h.data,
            access_list: h.access_list.into_iter().map(Into::into).collect(),
            v: h.v,
            r: h.r,
            s: h.s,
            max_fee_per_blob_gas: U256::zero(),
            blob_versioned_hashes: vec![],
        }
    }

    fn get_tx_serialization(json_str: &str) -> Vec<u8> {
        let v: Value = serde_json::from_str(json_str).expect("valid json");
        let hex_str = v["signed"].as_str().expect("signed field present");
        hex::decode(hex_str.trim_start_matches("0x")).expect("valid hex")
    }

    fn get_tx(file_content: &str) -> Transaction {
        let json_value: Value = serde_json::from_str(file_content).expect("valid json");
        let tx_helper: TxHelper =
            serde_json::from_value(json_value["transaction"].clone()).expect("valid tx json");
        transaction_from_helper(tx_helper)
    }

    const ACCESS_LIST_FIXTURE: &str = r#"{
        "transaction": {
            "chainId": 1,
            "nonce": 0,
            "gasPrice": 1000000000,
            "gasLimit": 100000,
            "to": "0x2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d",
            "value": "0x0",
            "data": "0x",
            "accessList": [
                {
                    "address": "0x2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d",
                    "storageKeys": [
                        "0x0000000000000000000000000000000000000000000000000000000000000003"
                    ]
                }
            ],
            "v": 1,
            "r": "0x1",
            "s": "0x2"
        }
    }"#;

    #[test]
    fn type1_transaction_round_trips_through_rlp_serialization() {
        let benchmark = get_tx(ACCESS_LIST_FIXTURE);
        let encoding = benchmark.serialization();
        let deserialized =
            Transaction::deserialization(&encoding).expect("deserialization should succeed");

        assert_eq!(benchmark, deserialized);
        assert_eq!(deserialized.serialization(), encoding);
    }
}
