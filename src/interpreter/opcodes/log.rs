use crate::eei::Eei;
use crate::errors::EvmError;
use crate::interpreter::state::{ControlFlow, RunState};
use ethereum_types::H256;

fn do_log(s: &mut RunState, eei: &mut dyn Eei, topic_count: usize) -> Result<ControlFlow, EvmError> {
    if s.is_static {
        return Err(EvmError::StaticCallViolation);
    }
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        let mut bytes = [0u8; 32];
        s.stack.pop()?.to_big_endian(&mut bytes);
        topics.push(H256::from(bytes));
    }

    if let Some(words) = crate::memory::Memory::required_size(offset, len) {
        s.gas.charge_memory_expansion((words / 32) as u64)?;
    }
    let word_count = len.div_ceil(32) as u64;
    s.gas.consume(word_count * 8 + topic_count as u64 * 375)?;

    let data = s.memory.read(offset, len);
    eei.log(s.env.address, topics, data);
    Ok(ControlFlow::Continue)
}

pub fn exec_log0(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_log(s, eei, 0)
}

pub fn exec_log1(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_log(s, eei, 1)
}

pub fn exec_log2(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_log(s, eei, 2)
}

pub fn exec_log3(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_log(s, eei, 3)
}

pub fn exec_log4(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_log(s, eei, 4)
}
