pub mod hashes {
    use ethereum_types::H256;
    use hex_literal::hex;

    /// keccak256(rlp([]))
    pub const EMPTY_LIST_HASH: H256 = H256(hex!(
        "1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
    ));
    /// keccak256(rlp(""))
    pub const EMPTY_TRIE_HASH: H256 = H256(hex!(
        "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
    ));
}

/// 1024 call-frame depth limit (yellow paper section 9.4.5).
pub const MAX_CALL_DEPTH: usize = 1024;
/// Max stack size (yellow paper appendix H).
pub const MAX_STACK_SIZE: usize = 1024;
/// EIP-170 contract code size limit.
pub const MAX_CODE_SIZE: usize = 24576;
/// EIP-3860 initcode size limit.
pub const MAX_INITCODE_SIZE: usize = 2 * MAX_CODE_SIZE;
