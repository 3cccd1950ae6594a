//! Merkle-Patricia trie: hex-prefix encoded leaf/extension/branch nodes,
//! root hash via recursive RLP + keccak256 per node (inline when the node's
//! RLP encoding is under 32 bytes, hashed otherwise), matching the yellow
//! paper's trie composition function `c`.
use ethereum_types::H256;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};
use std::marker::PhantomData;

use crate::common::constants::hashes;

/// Encodes/decodes a typed key-value pair into the raw bytes the trie
/// stores. Kept separate from the trie itself so callers (world state,
/// transaction trie, receipt trie, withdrawal trie) can each pick their own
/// RLP shape without duplicating trie logic.
pub trait TrieCodec<K, V> {
    fn encode_key(key: &K) -> Vec<u8>;
    fn encode_value(value: &V) -> Vec<u8>;
    fn decode_key(encoded: &[u8]) -> K;
    fn decode_value(encoded: &[u8]) -> V;
}

#[derive(Debug, Clone)]
struct LeafNode {
    key_nibbles: Vec<u8>,
    value: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ExtensionNode {
    key_nibbles: Vec<u8>,
    child: Box<TrieNodeType>,
}

#[derive(Debug, Clone)]
struct BranchNode {
    children: [Option<Box<TrieNodeType>>; 16],
    value: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
enum TrieNodeType {
    Leaf(LeafNode),
    Extension(ExtensionNode),
    Branch(BranchNode),
}

trait TrieNodeEncodable {
    fn rlp_append(&self, s: &mut RlpStream);
}

impl TrieNodeType {
    fn hash(&self) -> H256 {
        let mut rlp_stream = RlpStream::new();
        self.rlp_append(&mut rlp_stream);
        let encoded = rlp_stream.out();

        H256::from_slice(&Keccak256::digest(encoded))
    }

    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            TrieNodeType::Leaf(node) => node.rlp_append(s),
            TrieNodeType::Extension(node) => node.rlp_append(s),
            TrieNodeType::Branch(node) => node.rlp_append(s),
        }
    }
}

fn get_prefix(key: &[u8], is_leaf: bool) -> u8 {
    let flag = if is_leaf { 2 } else { 0 };

    if key.len() % 2 == 1 {
        ((flag + 1) << 4) | key[0]
    } else {
        flag << 4
    }
}

fn hex_prefix_encode(key: &[u8], is_leaf: bool) -> Vec<u8> {
    let mut encoded = Vec::new();
    encoded.push(get_prefix(key, is_leaf));

    let start = if key.len() % 2 == 1 { 1 } else { 0 };
    for i in (start..key.len()).step_by(2) {
        encoded.push((key[i] << 4) | key[i + 1]);
    }

    encoded
}

impl TrieNodeEncodable for LeafNode {
    fn rlp_append(&self, s: &mut RlpStream) {
        let path = hex_prefix_encode(&self.key_nibbles, true);
        s.begin_list(2);
        s.append(&path);
        s.append(&self.value);
    }
}

impl TrieNodeEncodable for ExtensionNode {
    fn rlp_append(&self, s: &mut RlpStream) {
        let path = hex_prefix_encode(&self.key_nibbles, false);

        let mut child_stream = RlpStream::new();
        self.child.rlp_append(&mut child_stream);
        let child_rlp = child_stream.out();

        s.begin_list(2);
        s.append(&path);

        if child_rlp.len() < 32 {
            s.append_raw(&child_rlp, 1);
        } else {
            let hash = H256::from_slice(&Keccak256::digest(child_rlp));
            s.append(&hash.as_bytes());
        }
    }
}

impl TrieNodeEncodable for BranchNode {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(17);

        for child in &self.children {
            if let Some(child_node) = child {
                let mut child_stream = RlpStream::new();
                child_node.rlp_append(&mut child_stream);
                let encoded = child_stream.out();
                if encoded.len() < 32 {
                    s.append_raw(&encoded, 1);
                } else {
                    let hash = H256::from_slice(&Keccak256::digest(encoded));
                    s.append(&hash.as_bytes());
                }
            } else {
                s.append_empty_data();
            }
        }

        match &self.value {
            Some(v) => {
                s.append(v);
            }
            None => {
                s.append_empty_data();
            }
        }
    }
}

fn bytes_to_nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    nibbles
}

fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn insert_at(node: TrieNodeType, nibbles: &[u8], value: Vec<u8>) -> TrieNodeType {
    match node {
        TrieNodeType::Leaf(leaf) => {
            let common_prefix = shared_prefix_len(&leaf.key_nibbles, nibbles);
            if common_prefix == leaf.key_nibbles.len() && common_prefix == nibbles.len() {
                return TrieNodeType::Leaf(LeafNode {
                    key_nibbles: nibbles.to_vec(),
                    value,
                });
            }

            let mut new_branch = BranchNode {
                children: Default::default(),
                value: None,
            };

            let suffix_old = &leaf.key_nibbles[common_prefix..];
            if suffix_old.is_empty() {
                new_branch.value = Some(leaf.value.clone());
            } else {
                new_branch.children[suffix_old[0] as usize] = Some(Box::new(TrieNodeType::Leaf(
                    LeafNode {
                        key_nibbles: suffix_old[1..].to_vec(),
                        value: leaf.value.clone(),
                    },
                )));
            }

            let suffix_new = &nibbles[common_prefix..];
            if suffix_new.is_empty() {
                new_branch.value = Some(value);
            } else {
                new_branch.children[suffix_new[0] as usize] = Some(Box::new(TrieNodeType::Leaf(
                    LeafNode {
                        key_nibbles: suffix_new[1..].to_vec(),
                        value,
                    },
                )));
            }

            if common_prefix == 0 {
                TrieNodeType::Branch(new_branch)
            } else {
                TrieNodeType::Extension(ExtensionNode {
                    key_nibbles: leaf.key_nibbles[0..common_prefix].to_vec(),
                    child: Box::new(TrieNodeType::Branch(new_branch)),
                })
            }
        }

        TrieNodeType::Extension(extension) => {
            let common_prefix = shared_prefix_len(&extension.key_nibbles, nibbles);
            if common_prefix == extension.key_nibbles.len() {
                let child = insert_at(*extension.child, &nibbles[common_prefix..], value);
                return TrieNodeType::Extension(ExtensionNode {
                    key_nibbles: extension.key_nibbles,
                    child: Box::new(child),
                });
            }

            let mut new_branch = BranchNode {
                children: Default::default(),
                value: None,
            };

            let suffix_old = &extension.key_nibbles[common_prefix..];
            if suffix_old.len() == 1 {
                new_branch.children[suffix_old[0] as usize] = Some(extension.child);
            } else {
                new_branch.children[suffix_old[0] as usize] =
                    Some(Box::new(TrieNodeType::Extension(ExtensionNode {
                        key_nibbles: suffix_old[1..].to_vec(),
                        child: extension.child,
                    })));
            }

            let suffix_new = &nibbles[common_prefix..];
            if suffix_new.is_empty() {
                new_branch.value = Some(value);
            } else {
                new_branch.children[suffix_new[0] as usize] = Some(Box::new(TrieNodeType::Leaf(
                    LeafNode {
                        key_nibbles: suffix_new[1..].to_vec(),
                        value,
                    },
                )));
            }

            if common_prefix == 0 {
                TrieNodeType::Branch(new_branch)
            } else {
                TrieNodeType::Extension(ExtensionNode {
                    key_nibbles: extension.key_nibbles[0..common_prefix].to_vec(),
                    child: Box::new(TrieNodeType::Branch(new_branch)),
                })
            }
        }

        TrieNodeType::Branch(mut branch) => {
            if nibbles.is_empty() {
                branch.value = Some(value);
                return TrieNodeType::Branch(branch);
            }

            let child_index = nibbles[0] as usize;
            if let Some(child_node) = branch.children[child_index].take() {
                let new_child = insert_at(*child_node, &nibbles[1..], value);
                branch.children[child_index] = Some(Box::new(new_child));
            } else {
                branch.children[child_index] = Some(Box::new(TrieNodeType::Leaf(LeafNode {
                    key_nibbles: nibbles[1..].to_vec(),
                    value,
                })));
            }

            TrieNodeType::Branch(branch)
        }
    }
}

fn delete_at(node: TrieNodeType, nibbles: &[u8]) -> Option<TrieNodeType> {
    match node {
        TrieNodeType::Leaf(ref leaf) => {
            if leaf.key_nibbles == nibbles {
                None
            } else {
                Some(node)
            }
        }

        TrieNodeType::Extension(extension) => {
            if nibbles.len() >= extension.key_nibbles.len()
                && nibbles[0..extension.key_nibbles.len()] == extension.key_nibbles[..]
            {
                let child_node =
                    delete_at(*extension.child, &nibbles[extension.key_nibbles.len()..]);
                match child_node {
                    Some(TrieNodeType::Leaf(child)) => {
                        let mut key_nibbles = extension.key_nibbles.clone();
                        key_nibbles.extend(child.key_nibbles);
                        Some(TrieNodeType::Leaf(LeafNode {
                            key_nibbles,
                            value: child.value,
                        }))
                    }
                    Some(TrieNodeType::Extension(child)) => {
                        let mut key_nibbles = extension.key_nibbles.clone();
                        key_nibbles.extend(child.key_nibbles);
                        Some(TrieNodeType::Extension(ExtensionNode {
                            key_nibbles,
                            child: child.child,
                        }))
                    }
                    Some(TrieNodeType::Branch(branch)) => {
                        Some(TrieNodeType::Extension(ExtensionNode {
                            key_nibbles: extension.key_nibbles,
                            child: Box::new(TrieNodeType::Branch(branch)),
                        }))
                    }
                    None => None,
                }
            } else {
                Some(TrieNodeType::Extension(extension))
            }
        }

        TrieNodeType::Branch(mut branch) => {
            if nibbles.is_empty() {
                branch.value = None;
            } else {
                let child_index = nibbles[0] as usize;
                if let Some(child) = branch.children[child_index].take() {
                    branch.children[child_index] = delete_at(*child, &nibbles[1..]).map(Box::new);
                }
            }

            let n_children = branch.children.iter().filter(|c| c.is_some()).count();

            if branch.value.is_some() {
                return if n_children == 0 {
                    Some(TrieNodeType::Leaf(LeafNode {
                        key_nibbles: vec![],
                        value: branch.value.unwrap(),
                    }))
                } else {
                    Some(TrieNodeType::Branch(branch))
                };
            }

            if n_children == 0 {
                return None;
            }
            if n_children > 1 {
                return Some(TrieNodeType::Branch(branch));
            }

            let only_index = branch.children.iter().position(|c| c.is_some()).unwrap();
            let only_child = *branch.children[only_index].take().unwrap();
            let mut key_nibbles = vec![only_index as u8];
            match only_child {
                TrieNodeType::Leaf(leaf) => {
                    key_nibbles.extend(leaf.key_nibbles);
                    Some(TrieNodeType::Leaf(LeafNode {
                        key_nibbles,
                        value: leaf.value,
                    }))
                }
                TrieNodeType::Extension(extension) => {
                    key_nibbles.extend(extension.key_nibbles);
                    Some(TrieNodeType::Extension(ExtensionNode {
                        key_nibbles,
                        child: extension.child,
                    }))
                }
                TrieNodeType::Branch(branch) => Some(TrieNodeType::Branch(branch)),
            }
        }
    }
}

/// A typed Merkle-Patricia trie over raw byte keys/values, with the
/// key/value codec supplied by `C`.
#[derive(Debug, Clone, Default)]
pub struct MyTrie<K, V, C> {
    root: Option<TrieNodeType>,
    _phantom: PhantomData<(K, V, C)>,
}

impl<K, V, C> MyTrie<K, V, C>
where
    C: TrieCodec<K, V>,
{
    pub fn new() -> Self {
        Self {
            root: None,
            _phantom: PhantomData,
        }
    }

    pub fn insert(&mut self, key: &K, value: &V) {
        let nibbles = bytes_to_nibbles(&C::encode_key(key));
        let encoded_value = C::encode_value(value);
        self.root = Some(match self.root.take() {
            Some(node) => insert_at(node, &nibbles, encoded_value),
            None => TrieNodeType::Leaf(LeafNode {
                key_nibbles: nibbles,
                value: encoded_value,
            }),
        });
    }

    pub fn delete(&mut self, key: &K) {
        let nibbles = bytes_to_nibbles(&C::encode_key(key));
        if let Some(node) = self.root.take() {
            self.root = delete_at(node, &nibbles);
        }
    }

    fn find(&self, nibbles: &[u8]) -> Option<&[u8]> {
        fn walk<'a>(node: &'a TrieNodeType, nibbles: &[u8]) -> Option<&'a [u8]> {
            match node {
                TrieNodeType::Leaf(leaf) => {
                    if leaf.key_nibbles == nibbles {
                        Some(&leaf.value)
                    } else {
                        None
                    }
                }
                TrieNodeType::Extension(extension) => {
                    if nibbles.len() >= extension.key_nibbles.len()
                        && nibbles[..extension.key_nibbles.len()] == extension.key_nibbles[..]
                    {
                        walk(&extension.child, &nibbles[extension.key_nibbles.len()..])
                    } else {
                        None
                    }
                }
                TrieNodeType::Branch(branch) => {
                    if nibbles.is_empty() {
                        branch.value.as_deref()
                    } else {
                        branch.children[nibbles[0] as usize]
                            .as_deref()
                            .and_then(|child| walk(child, &nibbles[1..]))
                    }
                }
            }
        }

        self.root.as_ref().and_then(|node| walk(node, nibbles))
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_ref(key)
    }

    pub fn get_ref(&self, key: &K) -> Option<V> {
        let nibbles = bytes_to_nibbles(&C::encode_key(key));
        self.find(&nibbles).map(C::decode_value)
    }

    pub fn root_hash(&self) -> H256 {
        match &self.root {
            Some(node) => node.hash(),
            None => hashes::EMPTY_TRIE_HASH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BytesCodec;
    impl TrieCodec<Vec<u8>, Vec<u8>> for BytesCodec {
        fn encode_key(key: &Vec<u8>) -> Vec<u8> {
            key.clone()
        }
        fn encode_value(value: &Vec<u8>) -> Vec<u8> {
            value.clone()
        }
        fn decode_key(encoded: &[u8]) -> Vec<u8> {
            encoded.to_vec()
        }
        fn decode_value(encoded: &[u8]) -> Vec<u8> {
            encoded.to_vec()
        }
    }

    #[test]
    fn empty_trie_has_well_known_root() {
        let trie: MyTrie<Vec<u8>, Vec<u8>, BytesCodec> = MyTrie::new();
        assert_eq!(trie.root_hash(), hashes::EMPTY_TRIE_HASH);
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut trie: MyTrie<Vec<u8>, Vec<u8>, BytesCodec> = MyTrie::new();
        let key = vec![1, 2, 3];
        let value = vec![4, 5, 6];
        trie.insert(&key, &value);
        assert_eq!(trie.get(&key), Some(value));
        assert_ne!(trie.root_hash(), hashes::EMPTY_TRIE_HASH);
    }

    #[test]
    fn delete_restores_empty_root() {
        let mut trie: MyTrie<Vec<u8>, Vec<u8>, BytesCodec> = MyTrie::new();
        let key = vec![0xab];
        trie.insert(&key, &vec![1]);
        trie.delete(&key);
        assert_eq!(trie.get(&key), None);
        assert_eq!(trie.root_hash(), hashes::EMPTY_TRIE_HASH);
    }

    #[test]
    fn branching_keys_share_a_trie() {
        let mut trie: MyTrie<Vec<u8>, Vec<u8>, BytesCodec> = MyTrie::new();
        trie.insert(&vec![0x12, 0x34], &vec![1]);
        trie.insert(&vec![0x12, 0x56], &vec![2]);
        trie.insert(&vec![0xab], &vec![3]);
        assert_eq!(trie.get(&vec![0x12, 0x34]), Some(vec![1]));
        assert_eq!(trie.get(&vec![0x12, 0x56]), Some(vec![2]));
        assert_eq!(trie.get(&vec![0xab]), Some(vec![3]));
        assert_eq!(trie.get(&vec![0xff]), None);
    }
}
