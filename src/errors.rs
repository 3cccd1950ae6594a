use thiserror::Error;

/// Exceptional halts that abort the current call frame and burn all its
/// remaining gas. Distinct from `REVERT`, which is a controlled stop that
/// returns unused gas to the caller (modeled as `InterpreterStatus::Reverted`
/// in `crate::interpreter`, not as one of these).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EvmError {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("invalid jump destination")]
    InvalidJump,
    #[error("opcode not permitted in a static call")]
    StaticCallViolation,
    #[error("undefined opcode")]
    InvalidOpcode,
    #[error("out of gas")]
    OutOfGas,
    #[error("call depth exceeded 1024")]
    CallDepthExceeded,
    #[error("contract creation collided with an existing account")]
    CreateCollision,
    #[error("initcode exceeds the EIP-3860 size limit")]
    InitcodeSizeLimit,
    #[error("deployed code exceeds the EIP-170 size limit")]
    CodeSizeLimit,
    #[error("deployed code begins with the EOF magic byte 0xEF")]
    InvalidCodeStartingByte,
    #[error("insufficient balance for value transfer")]
    InsufficientBalance,
    #[error("nonce overflow")]
    NonceOverflow,
    #[error("precompile execution failed")]
    PrecompileError,
}

/// Pre-execution transaction validity failures (yellow paper section 6.2).
/// Kept distinct from `EvmError`: these reject a transaction before any gas
/// is spent, rather than aborting a running call frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransaction {
    #[error("nonce too low: tx={tx} state={state}")]
    NonceTooLow { tx: u64, state: u64 },
    #[error("nonce too high: tx={tx} state={state}")]
    NonceTooHigh { tx: u64, state: u64 },
    #[error("sender {0:?} has deployed code (EIP-3607)")]
    SenderNotAnEoa(ethereum_types::Address),
    #[error("sender balance cannot cover gas_limit * gas_price + value")]
    InsufficientFunds,
    #[error("gas_limit {gas_limit} exceeds block gas_limit {block_gas_limit}")]
    GasLimitExceedsBlock { gas_limit: u64, block_gas_limit: u64 },
    #[error("intrinsic gas {intrinsic} exceeds tx gas_limit {gas_limit}")]
    IntrinsicGasExceedsLimit { intrinsic: u64, gas_limit: u64 },
    #[error("max_priority_fee_per_gas exceeds max_fee_per_gas")]
    PriorityFeeGreaterThanMaxFee,
    #[error("max_fee_per_gas is below the block base fee")]
    MaxFeeBelowBaseFee,
    #[error("blob transaction must specify `to`")]
    BlobTransactionMustHaveRecipient,
    #[error("blob transaction carries no blob hashes")]
    EmptyBlobs,
    #[error("blob gas {used} exceeds the per-block limit {limit}")]
    BlobGasExceedsBlockLimit { used: u64, limit: u64 },
    #[error("blob_versioned_hash has an unsupported version byte")]
    InvalidBlobVersionedHash,
    #[error("max_fee_per_blob_gas is below the block's blob base fee")]
    BlobFeeCapTooLow,
    #[error("invalid sender signature")]
    InvalidSignature,
    #[error("init code length {0} exceeds the EIP-3860 limit")]
    CreationDataTooLarge(usize),
}

/// Block structural validation failures, collected per spec so a caller can
/// see every mismatch rather than only the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockValidationError {
    #[error("state_root does not match the post-state trie root")]
    StateRootMismatch,
    #[error("ommers_hash does not match keccak256(rlp(ommers))")]
    OmmersHashMismatch,
    #[error("block has more than two ommers")]
    TooManyOmmers,
    #[error("duplicate ommer in the same block")]
    DuplicateOmmer,
    #[error("ommer is not a valid ancestor-sibling within 6 generations")]
    IneligibleOmmer,
    #[error("transactions_root does not match the reconstructed tx trie")]
    TransactionsRootMismatch,
    #[error("receipts_root does not match the reconstructed receipt trie")]
    ReceiptsRootMismatch,
    #[error("withdrawals_root does not match the reconstructed withdrawal trie")]
    WithdrawalsRootMismatch,
    #[error("logs_bloom does not match the merged receipt blooms")]
    LogsBloomMismatch,
    #[error("parent_hash does not match the parent block's hash")]
    ParentHashMismatch,
    #[error("block number is not parent.number + 1")]
    NumberMismatch,
    #[error("gas_used exceeds gas_limit")]
    GasUsedExceedsLimit,
    #[error("header field invalid: {0}")]
    HeaderFieldInvalid(String),
    #[error("transaction {index} is invalid: {source}")]
    InvalidTransaction {
        index: usize,
        source: InvalidTransaction,
    },
}
