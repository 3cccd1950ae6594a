//! Valid-jump-destination analysis: a single linear pass over the bytecode
//! that records every byte offset holding a genuine JUMPDEST/BEGINSUB
//! opcode, skipping over PUSH immediate data so a PUSH argument that
//! happens to equal 0x5b is never mistaken for one.
use crate::interpreter::opcodes::{BEGINSUB, JUMPDEST, PUSH1, PUSH32};

#[derive(Debug, Clone)]
pub struct Code {
    bytes: Vec<u8>,
    valid_jumps: Vec<bool>,
    valid_jump_subs: Vec<bool>,
}

impl Code {
    pub fn analyze(bytes: Vec<u8>) -> Self {
        let mut valid_jumps = vec![false; bytes.len()];
        let mut valid_jump_subs = vec![false; bytes.len()];

        let mut pc = 0usize;
        while pc < bytes.len() {
            let op = bytes[pc];
            match op {
                JUMPDEST => {
                    valid_jumps[pc] = true;
                    pc += 1;
                }
                BEGINSUB => {
                    valid_jump_subs[pc] = true;
                    pc += 1;
                }
                PUSH1..=PUSH32 => {
                    let push_len = (op - PUSH1 + 1) as usize;
                    pc += 1 + push_len;
                }
                _ => {
                    pc += 1;
                }
            }
        }

        Self {
            bytes,
            valid_jumps,
            valid_jump_subs,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_valid_jump_dest(&self, pc: usize) -> bool {
        self.valid_jumps.get(pc).copied().unwrap_or(false)
    }

    pub fn is_valid_jump_sub(&self, pc: usize) -> bool {
        self.valid_jump_subs.get(pc).copied().unwrap_or(false)
    }

    pub fn opcode_at(&self, pc: usize) -> Option<u8> {
        self.bytes.get(pc).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_byte_inside_a_push_argument_is_not_valid() {
        // PUSH1 0x5b: the 0x5b is data, not a JUMPDEST opcode.
        let code = Code::analyze(vec![PUSH1, JUMPDEST, 0x00]);
        assert!(!code.is_valid_jump_dest(1));
    }

    #[test]
    fn a_genuine_jumpdest_is_recognized() {
        let code = Code::analyze(vec![0x00, JUMPDEST, 0x00]);
        assert!(code.is_valid_jump_dest(1));
        assert!(!code.is_valid_jump_dest(0));
    }

    #[test]
    fn push32_skips_the_full_32_byte_immediate() {
        let mut bytes = vec![PUSH32];
        bytes.extend([0u8; 32]);
        bytes.push(JUMPDEST);
        let code = Code::analyze(bytes);
        assert!(code.is_valid_jump_dest(33));
        assert!(!code.is_valid_jump_dest(1));
    }
}
