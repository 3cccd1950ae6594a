//! The interpreter: owns a `RunState` for one call frame and drives it to
//! completion through `dispatch::step`.
pub mod dispatch;
pub mod opcodes;
pub mod state;

use crate::eei::Eei;
use crate::errors::EvmError;
use crate::hardfork::Hardfork;
use crate::jumpdest::Code;
use dispatch::{step, StepOutcome};
use state::{Environment, RunState, StepEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterStatus {
    Running,
    Halted,
    Reverted(Vec<u8>),
    Trapped(EvmError),
}

pub struct Interpreter<'a> {
    pub state: RunState<'a>,
    pub status: InterpreterStatus,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        code: &'a Code,
        env: &'a Environment,
        gas_limit: u64,
        hardfork: Hardfork,
        depth: usize,
        is_static: bool,
    ) -> Self {
        Self {
            state: RunState::new(code, env, gas_limit, hardfork, depth, is_static),
            status: InterpreterStatus::Running,
        }
    }

    /// Runs to completion with no step observer.
    pub fn run(&mut self, eei: &mut dyn Eei) -> InterpreterStatus {
        self.run_with_hook(eei, &mut |_event| {})
    }

    /// Runs to completion, invoking `hook` once per executed opcode. The hook
    /// is synchronous (see `StepEvent`'s doc comment) — no pub/sub machinery.
    pub fn run_with_hook(
        &mut self,
        eei: &mut dyn Eei,
        hook: &mut dyn FnMut(&StepEvent),
    ) -> InterpreterStatus {
        loop {
            let event = StepEvent {
                pc: self.state.pc,
                opcode: self.state.code.opcode_at(self.state.pc).unwrap_or(0),
                gas_remaining: self.state.gas.remaining(),
                depth: self.state.depth,
                stack: &self.state.stack,
            };
            hook(&event);
            tracing::trace!(pc = event.pc, opcode = event.opcode, gas = event.gas_remaining, "step");

            match step(&mut self.state, eei) {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::Halt) => {
                    self.status = InterpreterStatus::Halted;
                    return self.status.clone();
                }
                Ok(StepOutcome::Return(data)) => {
                    self.state.output = data;
                    self.status = InterpreterStatus::Halted;
                    return self.status.clone();
                }
                Ok(StepOutcome::Revert(data)) => {
                    tracing::debug!(pc = event.pc, "REVERT");
                    self.status = InterpreterStatus::Reverted(data);
                    return self.status.clone();
                }
                Err(trap) => {
                    tracing::warn!(pc = event.pc, opcode = event.opcode, %trap, "trap");
                    self.status = InterpreterStatus::Trapped(trap);
                    return self.status.clone();
                }
            }
        }
    }
}
