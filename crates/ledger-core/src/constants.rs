pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_BITS: u32 = (HASH_SIZE * BYTE) as u32;
pub const POW_TARGET_BITS: u32 = 16;
/// Nonces tried between two progress reports / cancellation checks.
pub const PROGRESS_INTERVAL: u64 = 100_000;
