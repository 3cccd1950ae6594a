//! Fetch-decode-execute for a single opcode: stack-bound precheck, constant
//! gas charge, handler invocation, `pc` advance.
use crate::eei::Eei;
use crate::errors::EvmError;
use crate::interpreter::opcodes::JUMP_TABLE;
use crate::interpreter::state::{ControlFlow, RunState};

pub enum StepOutcome {
    Continue,
    Halt,
    Return(Vec<u8>),
    Revert(Vec<u8>),
}

/// Runs exactly one opcode at `state.pc` and reports what happened. Does not
/// itself advance `pc` past a non-jump opcode's width of one byte — the
/// caller does that, since `pc` advancement is the one piece of bookkeeping
/// every `ControlFlow` variant shares.
pub fn step(state: &mut RunState, eei: &mut dyn Eei) -> Result<StepOutcome, EvmError> {
    let opcode = state.code.opcode_at(state.pc).unwrap_or(crate::interpreter::opcodes::STOP);
    let operation = JUMP_TABLE[opcode as usize].ok_or(EvmError::InvalidOpcode)?;

    let stack_len = state.stack.len();
    if stack_len < operation.min_stack {
        return Err(EvmError::StackUnderflow);
    }
    if stack_len > operation.max_stack {
        return Err(EvmError::StackOverflow);
    }

    state.gas.consume(operation.constant_gas)?;

    match (operation.execute)(state, eei)? {
        ControlFlow::Continue => {
            state.pc += 1;
            Ok(StepOutcome::Continue)
        }
        ControlFlow::Jump(dest) => {
            state.pc = dest;
            Ok(StepOutcome::Continue)
        }
        ControlFlow::Halt => Ok(StepOutcome::Halt),
        ControlFlow::Return(data) => Ok(StepOutcome::Return(data)),
        ControlFlow::Revert(data) => Ok(StepOutcome::Revert(data)),
    }
}
