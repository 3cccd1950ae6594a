use bytes::BytesMut;
use ethereum_types::U256;

/// Word-billed, zero-extending linear memory. Growth cost is charged by the
/// gas meter based on `cost_to_extend`; `Memory` itself only tracks bytes.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    buf: BytesMut,
}

fn to_word_count(len: usize) -> usize {
    len.div_ceil(32)
}

impl Memory {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn word_count(&self) -> usize {
        to_word_count(self.buf.len())
    }

    /// Bytes needed to cover `[offset, offset+len)`, rounded up to the next
    /// word, or `None` on overflow (treated as an out-of-gas trap upstream).
    pub fn required_size(offset: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return Some(0);
        }
        let end = offset.checked_add(len)?;
        Some(to_word_count(end) * 32)
    }

    fn ensure_capacity(&mut self, size: usize) {
        if size > self.buf.len() {
            self.buf.resize(size, 0);
        }
    }

    /// Grow memory to cover `[offset, offset+len)` and return the new total
    /// size in bytes. Callers charge gas for this *before* calling, using
    /// `required_size` against the pre-extension `len()`.
    pub fn extend(&mut self, offset: usize, len: usize) {
        if let Some(size) = Self::required_size(offset, len) {
            self.ensure_capacity(size);
        }
    }

    pub fn read(&mut self, offset: usize, len: usize) -> Vec<u8> {
        self.extend(offset, len);
        self.buf[offset..offset + len].to_vec()
    }

    pub fn read_word(&mut self, offset: usize) -> U256 {
        U256::from_big_endian(&self.read(offset, 32))
    }

    pub fn write(&mut self, offset: usize, data: &[u8]) {
        self.extend(offset, data.len());
        self.buf[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn write_word(&mut self, offset: usize, value: U256) {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self.write(offset, &bytes);
    }

    pub fn write_byte(&mut self, offset: usize, value: u8) {
        self.extend(offset, 1);
        self.buf[offset] = value;
    }

    /// MCOPY/CODECOPY-style copy that tolerates overlap (`copy_within`
    /// handles forward/backward overlap correctly since Rust 1.37).
    pub fn copy_within(&mut self, dest: usize, src: usize, len: usize) {
        let needed = dest.max(src) + len;
        self.extend(0, needed);
        self.buf.copy_within(src..src + len, dest);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_rounds_up_to_a_full_word() {
        let mut mem = Memory::new();
        mem.extend(0, 1);
        assert_eq!(mem.len(), 32);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut mem = Memory::new();
        mem.write(0, &[1, 2, 3]);
        assert_eq!(mem.read(0, 3), vec![1, 2, 3]);
    }

    #[test]
    fn reading_past_written_bytes_is_zero_filled() {
        let mut mem = Memory::new();
        mem.write(0, &[0xff]);
        assert_eq!(mem.read(0, 32)[1], 0);
    }

    #[test]
    fn required_size_is_monotonic_in_offset_and_len() {
        assert_eq!(Memory::required_size(0, 0), Some(0));
        assert_eq!(Memory::required_size(0, 1), Some(32));
        assert_eq!(Memory::required_size(31, 1), Some(32));
        assert_eq!(Memory::required_size(32, 1), Some(64));
    }
}
