//! Opcode byte constants, the per-opcode `Operation` descriptor, and the
//! dense 256-entry dispatch table built from it.
pub mod arithmetic;
pub mod bitwise;
pub mod environment;
pub mod log;
pub mod stack_memory_storage;
pub mod system;

use crate::eei::Eei;
use crate::errors::EvmError;
use crate::interpreter::state::{ControlFlow, RunState};
use once_cell::sync::Lazy;

pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0a;
pub const SIGNEXTEND: u8 = 0x0b;

pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1a;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const SAR: u8 = 0x1d;

pub const KECCAK256: u8 = 0x20;

pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const ORIGIN: u8 = 0x32;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const GASPRICE: u8 = 0x3a;
pub const EXTCODESIZE: u8 = 0x3b;
pub const EXTCODECOPY: u8 = 0x3c;
pub const RETURNDATASIZE: u8 = 0x3d;
pub const RETURNDATACOPY: u8 = 0x3e;
pub const EXTCODEHASH: u8 = 0x3f;

pub const BLOCKHASH: u8 = 0x40;
pub const COINBASE: u8 = 0x41;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const PREVRANDAO: u8 = 0x44;
pub const GASLIMIT: u8 = 0x45;
pub const CHAINID: u8 = 0x46;
pub const SELFBALANCE: u8 = 0x47;
pub const BASEFEE: u8 = 0x48;
pub const BLOBHASH: u8 = 0x49;
pub const BLOBBASEFEE: u8 = 0x4a;

pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
pub const BEGINSUB: u8 = 0x5c;
pub const MCOPY: u8 = 0x5e;
pub const PUSH0: u8 = 0x5f;

pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;

pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;

pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

pub type Handler = fn(&mut RunState, &mut dyn Eei) -> Result<ControlFlow, EvmError>;

pub struct Operation {
    pub opcode: u8,
    pub name: &'static str,
    pub execute: Handler,
    pub constant_gas: u64,
    pub min_stack: usize,
    pub max_stack: usize,
}

impl Operation {
    const fn new(
        opcode: u8,
        name: &'static str,
        execute: Handler,
        constant_gas: u64,
        min_stack: usize,
        max_stack: usize,
    ) -> Self {
        Operation {
            opcode,
            name,
            execute,
            constant_gas,
            min_stack,
            max_stack,
        }
    }
}

/// Adapts a handler that needs no external state to the uniform `Handler`
/// signature the dispatch loop calls every opcode through.
macro_rules! pure_handler {
    ($name:ident, $inner:path) => {
        fn $name(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
            $inner(s)
        }
    };
}

pure_handler!(exec_add, arithmetic::op_add);
pure_handler!(exec_mul, arithmetic::op_mul);
pure_handler!(exec_sub, arithmetic::op_sub);
pure_handler!(exec_div, arithmetic::op_div);
pure_handler!(exec_sdiv, arithmetic::op_sdiv);
pure_handler!(exec_mod, arithmetic::op_mod);
pure_handler!(exec_smod, arithmetic::op_smod);
pure_handler!(exec_addmod, arithmetic::op_addmod);
pure_handler!(exec_mulmod, arithmetic::op_mulmod);
pure_handler!(exec_exp, arithmetic::op_exp);
pure_handler!(exec_signextend, arithmetic::op_signextend);

pure_handler!(exec_lt, bitwise::op_lt);
pure_handler!(exec_gt, bitwise::op_gt);
pure_handler!(exec_slt, bitwise::op_slt);
pure_handler!(exec_sgt, bitwise::op_sgt);
pure_handler!(exec_eq, bitwise::op_eq);
pure_handler!(exec_iszero, bitwise::op_iszero);
pure_handler!(exec_and, bitwise::op_and);
pure_handler!(exec_or, bitwise::op_or);
pure_handler!(exec_xor, bitwise::op_xor);
pure_handler!(exec_not, bitwise::op_not);
pure_handler!(exec_byte, bitwise::op_byte);
pure_handler!(exec_shl, bitwise::op_shl);
pure_handler!(exec_shr, bitwise::op_shr);
pure_handler!(exec_sar, bitwise::op_sar);
pure_handler!(exec_keccak256, bitwise::op_keccak256);

pure_handler!(exec_pop, stack_memory_storage::op_pop);
pure_handler!(exec_mload, stack_memory_storage::op_mload);
pure_handler!(exec_mstore, stack_memory_storage::op_mstore);
pure_handler!(exec_mstore8, stack_memory_storage::op_mstore8);
pure_handler!(exec_msize, stack_memory_storage::op_msize);
pure_handler!(exec_pc, stack_memory_storage::op_pc);
pure_handler!(exec_gas, stack_memory_storage::op_gas);
pure_handler!(exec_jumpdest, stack_memory_storage::op_jumpdest);
pure_handler!(exec_jump, stack_memory_storage::op_jump);
pure_handler!(exec_jumpi, stack_memory_storage::op_jumpi);
pure_handler!(exec_push0, stack_memory_storage::op_push0);
pure_handler!(exec_mcopy, stack_memory_storage::op_mcopy);

fn exec_sload(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    stack_memory_storage::op_sload(s, eei)
}

fn exec_sstore(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let key = s.stack.peek(0)?;
    let original = eei.original_storage_load(&s.env.address, key);
    stack_memory_storage::op_sstore(s, eei, original)
}

macro_rules! push_n {
    ($name:ident, $n:expr) => {
        fn $name(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
            stack_memory_storage::make_push($n)(s)
        }
    };
}

push_n!(exec_push1, 1);
push_n!(exec_push2, 2);
push_n!(exec_push3, 3);
push_n!(exec_push4, 4);
push_n!(exec_push5, 5);
push_n!(exec_push6, 6);
push_n!(exec_push7, 7);
push_n!(exec_push8, 8);
push_n!(exec_push9, 9);
push_n!(exec_push10, 10);
push_n!(exec_push11, 11);
push_n!(exec_push12, 12);
push_n!(exec_push13, 13);
push_n!(exec_push14, 14);
push_n!(exec_push15, 15);
push_n!(exec_push16, 16);
push_n!(exec_push17, 17);
push_n!(exec_push18, 18);
push_n!(exec_push19, 19);
push_n!(exec_push20, 20);
push_n!(exec_push21, 21);
push_n!(exec_push22, 22);
push_n!(exec_push23, 23);
push_n!(exec_push24, 24);
push_n!(exec_push25, 25);
push_n!(exec_push26, 26);
push_n!(exec_push27, 27);
push_n!(exec_push28, 28);
push_n!(exec_push29, 29);
push_n!(exec_push30, 30);
push_n!(exec_push31, 31);
push_n!(exec_push32, 32);

macro_rules! dup_n {
    ($name:ident, $n:expr) => {
        fn $name(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
            stack_memory_storage::make_dup($n)(s)
        }
    };
}

dup_n!(exec_dup1, 1);
dup_n!(exec_dup2, 2);
dup_n!(exec_dup3, 3);
dup_n!(exec_dup4, 4);
dup_n!(exec_dup5, 5);
dup_n!(exec_dup6, 6);
dup_n!(exec_dup7, 7);
dup_n!(exec_dup8, 8);
dup_n!(exec_dup9, 9);
dup_n!(exec_dup10, 10);
dup_n!(exec_dup11, 11);
dup_n!(exec_dup12, 12);
dup_n!(exec_dup13, 13);
dup_n!(exec_dup14, 14);
dup_n!(exec_dup15, 15);
dup_n!(exec_dup16, 16);

macro_rules! swap_n {
    ($name:ident, $n:expr) => {
        fn $name(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
            stack_memory_storage::make_swap($n)(s)
        }
    };
}

swap_n!(exec_swap1, 1);
swap_n!(exec_swap2, 2);
swap_n!(exec_swap3, 3);
swap_n!(exec_swap4, 4);
swap_n!(exec_swap5, 5);
swap_n!(exec_swap6, 6);
swap_n!(exec_swap7, 7);
swap_n!(exec_swap8, 8);
swap_n!(exec_swap9, 9);
swap_n!(exec_swap10, 10);
swap_n!(exec_swap11, 11);
swap_n!(exec_swap12, 12);
swap_n!(exec_swap13, 13);
swap_n!(exec_swap14, 14);
swap_n!(exec_swap15, 15);
swap_n!(exec_swap16, 16);

fn exec_stop(_s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    Ok(ControlFlow::Halt)
}

fn exec_invalid(_s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    Err(EvmError::InvalidOpcode)
}

static JUMP_TABLE_ENTRIES: &[Operation] = &[
    Operation::new(STOP, "STOP", exec_stop, 0, 0, 1024),
    Operation::new(ADD, "ADD", exec_add, 3, 2, 1024),
    Operation::new(MUL, "MUL", exec_mul, 5, 2, 1024),
    Operation::new(SUB, "SUB", exec_sub, 3, 2, 1024),
    Operation::new(DIV, "DIV", exec_div, 5, 2, 1024),
    Operation::new(SDIV, "SDIV", exec_sdiv, 5, 2, 1024),
    Operation::new(MOD, "MOD", exec_mod, 5, 2, 1024),
    Operation::new(SMOD, "SMOD", exec_smod, 5, 2, 1024),
    Operation::new(ADDMOD, "ADDMOD", exec_addmod, 8, 3, 1024),
    Operation::new(MULMOD, "MULMOD", exec_mulmod, 8, 3, 1024),
    Operation::new(EXP, "EXP", exec_exp, 10, 2, 1024),
    Operation::new(SIGNEXTEND, "SIGNEXTEND", exec_signextend, 5, 2, 1024),
    Operation::new(LT, "LT", exec_lt, 3, 2, 1024),
    Operation::new(GT, "GT", exec_gt, 3, 2, 1024),
    Operation::new(SLT, "SLT", exec_slt, 3, 2, 1024),
    Operation::new(SGT, "SGT", exec_sgt, 3, 2, 1024),
    Operation::new(EQ, "EQ", exec_eq, 3, 2, 1024),
    Operation::new(ISZERO, "ISZERO", exec_iszero, 3, 1, 1024),
    Operation::new(AND, "AND", exec_and, 3, 2, 1024),
    Operation::new(OR, "OR", exec_or, 3, 2, 1024),
    Operation::new(XOR, "XOR", exec_xor, 3, 2, 1024),
    Operation::new(NOT, "NOT", exec_not, 3, 1, 1024),
    Operation::new(BYTE, "BYTE", exec_byte, 3, 2, 1024),
    Operation::new(SHL, "SHL", exec_shl, 3, 2, 1024),
    Operation::new(SHR, "SHR", exec_shr, 3, 2, 1024),
    Operation::new(SAR, "SAR", exec_sar, 3, 2, 1024),
    Operation::new(KECCAK256, "KECCAK256", exec_keccak256, 30, 2, 1024),
    Operation::new(ADDRESS, "ADDRESS", environment::exec_address, 2, 0, 1024),
    Operation::new(BALANCE, "BALANCE", environment::exec_balance, 0, 1, 1024),
    Operation::new(ORIGIN, "ORIGIN", environment::exec_origin, 2, 0, 1024),
    Operation::new(CALLER, "CALLER", environment::exec_caller, 2, 0, 1024),
    Operation::new(CALLVALUE, "CALLVALUE", environment::exec_callvalue, 2, 0, 1024),
    Operation::new(CALLDATALOAD, "CALLDATALOAD", environment::exec_calldataload, 3, 1, 1024),
    Operation::new(CALLDATASIZE, "CALLDATASIZE", environment::exec_calldatasize, 2, 0, 1024),
    Operation::new(CALLDATACOPY, "CALLDATACOPY", environment::exec_calldatacopy, 3, 3, 1024),
    Operation::new(CODESIZE, "CODESIZE", environment::exec_codesize, 2, 0, 1024),
    Operation::new(CODECOPY, "CODECOPY", environment::exec_codecopy, 3, 3, 1024),
    Operation::new(GASPRICE, "GASPRICE", environment::exec_gasprice, 2, 0, 1024),
    Operation::new(EXTCODESIZE, "EXTCODESIZE", environment::exec_extcodesize, 0, 1, 1024),
    Operation::new(EXTCODECOPY, "EXTCODECOPY", environment::exec_extcodecopy, 0, 4, 1024),
    Operation::new(RETURNDATASIZE, "RETURNDATASIZE", environment::exec_returndatasize, 2, 0, 1024),
    Operation::new(RETURNDATACOPY, "RETURNDATACOPY", environment::exec_returndatacopy, 3, 3, 1024),
    Operation::new(EXTCODEHASH, "EXTCODEHASH", environment::exec_extcodehash, 0, 1, 1024),
    Operation::new(BLOCKHASH, "BLOCKHASH", environment::exec_blockhash, 20, 1, 1024),
    Operation::new(COINBASE, "COINBASE", environment::exec_coinbase, 2, 0, 1024),
    Operation::new(TIMESTAMP, "TIMESTAMP", environment::exec_timestamp, 2, 0, 1024),
    Operation::new(NUMBER, "NUMBER", environment::exec_number, 2, 0, 1024),
    Operation::new(PREVRANDAO, "PREVRANDAO", environment::exec_prevrandao, 2, 0, 1024),
    Operation::new(GASLIMIT, "GASLIMIT", environment::exec_gaslimit, 2, 0, 1024),
    Operation::new(CHAINID, "CHAINID", environment::exec_chainid, 2, 0, 1024),
    Operation::new(SELFBALANCE, "SELFBALANCE", environment::exec_selfbalance, 5, 0, 1024),
    Operation::new(BASEFEE, "BASEFEE", environment::exec_basefee, 2, 0, 1024),
    Operation::new(BLOBHASH, "BLOBHASH", environment::exec_blobhash, 3, 1, 1024),
    Operation::new(BLOBBASEFEE, "BLOBBASEFEE", environment::exec_blobbasefee, 2, 0, 1024),
    Operation::new(POP, "POP", exec_pop, 2, 1, 1024),
    Operation::new(MLOAD, "MLOAD", exec_mload, 3, 1, 1024),
    Operation::new(MSTORE, "MSTORE", exec_mstore, 3, 2, 1024),
    Operation::new(MSTORE8, "MSTORE8", exec_mstore8, 3, 2, 1024),
    Operation::new(SLOAD, "SLOAD", exec_sload, 0, 1, 1024),
    Operation::new(SSTORE, "SSTORE", exec_sstore, 0, 2, 1024),
    Operation::new(JUMP, "JUMP", exec_jump, 8, 1, 1024),
    Operation::new(JUMPI, "JUMPI", exec_jumpi, 10, 2, 1024),
    Operation::new(PC, "PC", exec_pc, 2, 0, 1024),
    Operation::new(MSIZE, "MSIZE", exec_msize, 2, 0, 1024),
    Operation::new(GAS, "GAS", exec_gas, 2, 0, 1024),
    Operation::new(JUMPDEST, "JUMPDEST", exec_jumpdest, 1, 0, 1024),
    Operation::new(MCOPY, "MCOPY", exec_mcopy, 3, 3, 1024),
    Operation::new(PUSH0, "PUSH0", exec_push0, 2, 0, 1024),
    Operation::new(PUSH1, "PUSH1", exec_push1, 3, 0, 1023),
    Operation::new(0x61, "PUSH2", exec_push2, 3, 0, 1023),
    Operation::new(0x62, "PUSH3", exec_push3, 3, 0, 1023),
    Operation::new(0x63, "PUSH4", exec_push4, 3, 0, 1023),
    Operation::new(0x64, "PUSH5", exec_push5, 3, 0, 1023),
    Operation::new(0x65, "PUSH6", exec_push6, 3, 0, 1023),
    Operation::new(0x66, "PUSH7", exec_push7, 3, 0, 1023),
    Operation::new(0x67, "PUSH8", exec_push8, 3, 0, 1023),
    Operation::new(0x68, "PUSH9", exec_push9, 3, 0, 1023),
    Operation::new(0x69, "PUSH10", exec_push10, 3, 0, 1023),
    Operation::new(0x6a, "PUSH11", exec_push11, 3, 0, 1023),
    Operation::new(0x6b, "PUSH12", exec_push12, 3, 0, 1023),
    Operation::new(0x6c, "PUSH13", exec_push13, 3, 0, 1023),
    Operation::new(0x6d, "PUSH14", exec_push14, 3, 0, 1023),
    Operation::new(0x6e, "PUSH15", exec_push15, 3, 0, 1023),
    Operation::new(0x6f, "PUSH16", exec_push16, 3, 0, 1023),
    Operation::new(0x70, "PUSH17", exec_push17, 3, 0, 1023),
    Operation::new(0x71, "PUSH18", exec_push18, 3, 0, 1023),
    Operation::new(0x72, "PUSH19", exec_push19, 3, 0, 1023),
    Operation::new(0x73, "PUSH20", exec_push20, 3, 0, 1023),
    Operation::new(0x74, "PUSH21", exec_push21, 3, 0, 1023),
    Operation::new(0x75, "PUSH22", exec_push22, 3, 0, 1023),
    Operation::new(0x76, "PUSH23", exec_push23, 3, 0, 1023),
    Operation::new(0x77, "PUSH24", exec_push24, 3, 0, 1023),
    Operation::new(0x78, "PUSH25", exec_push25, 3, 0, 1023),
    Operation::new(0x79, "PUSH26", exec_push26, 3, 0, 1023),
    Operation::new(0x7a, "PUSH27", exec_push27, 3, 0, 1023),
    Operation::new(0x7b, "PUSH28", exec_push28, 3, 0, 1023),
    Operation::new(0x7c, "PUSH29", exec_push29, 3, 0, 1023),
    Operation::new(0x7d, "PUSH30", exec_push30, 3, 0, 1023),
    Operation::new(0x7e, "PUSH31", exec_push31, 3, 0, 1023),
    Operation::new(PUSH32, "PUSH32", exec_push32, 3, 0, 1023),
    Operation::new(DUP1, "DUP1", exec_dup1, 3, 1, 1023),
    Operation::new(0x81, "DUP2", exec_dup2, 3, 2, 1023),
    Operation::new(0x82, "DUP3", exec_dup3, 3, 3, 1023),
    Operation::new(0x83, "DUP4", exec_dup4, 3, 4, 1023),
    Operation::new(0x84, "DUP5", exec_dup5, 3, 5, 1023),
    Operation::new(0x85, "DUP6", exec_dup6, 3, 6, 1023),
    Operation::new(0x86, "DUP7", exec_dup7, 3, 7, 1023),
    Operation::new(0x87, "DUP8", exec_dup8, 3, 8, 1023),
    Operation::new(0x88, "DUP9", exec_dup9, 3, 9, 1023),
    Operation::new(0x89, "DUP10", exec_dup10, 3, 10, 1023),
    Operation::new(0x8a, "DUP11", exec_dup11, 3, 11, 1023),
    Operation::new(0x8b, "DUP12", exec_dup12, 3, 12, 1023),
    Operation::new(0x8c, "DUP13", exec_dup13, 3, 13, 1023),
    Operation::new(0x8d, "DUP14", exec_dup14, 3, 14, 1023),
    Operation::new(0x8e, "DUP15", exec_dup15, 3, 15, 1023),
    Operation::new(DUP16, "DUP16", exec_dup16, 3, 16, 1023),
    Operation::new(SWAP1, "SWAP1", exec_swap1, 3, 2, 1024),
    Operation::new(0x91, "SWAP2", exec_swap2, 3, 3, 1024),
    Operation::new(0x92, "SWAP3", exec_swap3, 3, 4, 1024),
    Operation::new(0x93, "SWAP4", exec_swap4, 3, 5, 1024),
    Operation::new(0x94, "SWAP5", exec_swap5, 3, 6, 1024),
    Operation::new(0x95, "SWAP6", exec_swap6, 3, 7, 1024),
    Operation::new(0x96, "SWAP7", exec_swap7, 3, 8, 1024),
    Operation::new(0x97, "SWAP8", exec_swap8, 3, 9, 1024),
    Operation::new(0x98, "SWAP9", exec_swap9, 3, 10, 1024),
    Operation::new(0x99, "SWAP10", exec_swap10, 3, 11, 1024),
    Operation::new(0x9a, "SWAP11", exec_swap11, 3, 12, 1024),
    Operation::new(0x9b, "SWAP12", exec_swap12, 3, 13, 1024),
    Operation::new(0x9c, "SWAP13", exec_swap13, 3, 14, 1024),
    Operation::new(0x9d, "SWAP14", exec_swap14, 3, 15, 1024),
    Operation::new(0x9e, "SWAP15", exec_swap15, 3, 16, 1024),
    Operation::new(SWAP16, "SWAP16", exec_swap16, 3, 17, 1024),
    Operation::new(LOG0, "LOG0", log::exec_log0, 375, 2, 1024),
    Operation::new(0xa1, "LOG1", log::exec_log1, 750, 3, 1024),
    Operation::new(0xa2, "LOG2", log::exec_log2, 1125, 4, 1024),
    Operation::new(0xa3, "LOG3", log::exec_log3, 1500, 5, 1024),
    Operation::new(LOG4, "LOG4", log::exec_log4, 1875, 6, 1024),
    Operation::new(CREATE, "CREATE", system::exec_create, 32000, 3, 1024),
    Operation::new(CALL, "CALL", system::exec_call, 0, 7, 1024),
    Operation::new(CALLCODE, "CALLCODE", system::exec_callcode, 0, 7, 1024),
    Operation::new(RETURN, "RETURN", system::exec_return, 0, 2, 1024),
    Operation::new(DELEGATECALL, "DELEGATECALL", system::exec_delegatecall, 0, 6, 1024),
    Operation::new(CREATE2, "CREATE2", system::exec_create2, 32000, 4, 1024),
    Operation::new(STATICCALL, "STATICCALL", system::exec_staticcall, 0, 6, 1024),
    Operation::new(REVERT, "REVERT", system::exec_revert, 0, 2, 1024),
    Operation::new(INVALID, "INVALID", exec_invalid, 0, 0, 1024),
    Operation::new(SELFDESTRUCT, "SELFDESTRUCT", system::exec_selfdestruct, 5000, 1, 1024),
];

pub static JUMP_TABLE: Lazy<[Option<&'static Operation>; 256]> = Lazy::new(|| {
    let mut table: [Option<&'static Operation>; 256] = [None; 256];
    for op in JUMP_TABLE_ENTRIES {
        table[op.opcode as usize] = Some(op);
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_is_reachable_at_its_own_opcode_byte() {
        for op in JUMP_TABLE_ENTRIES {
            assert_eq!(JUMP_TABLE[op.opcode as usize].unwrap().opcode, op.opcode);
        }
    }

    #[test]
    fn undefined_opcode_is_absent_from_the_table() {
        assert!(JUMP_TABLE[0x0c].is_none());
    }
}
