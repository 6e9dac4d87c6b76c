#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_PORT: u16 = 6464;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const MAX_CONNECTIONS: usize = 1024;
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB
pub const DEFAULT_TTL_MS: u64 = 60_000; // 60 s
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000; // 1 s
