use bytes::Bytes;
use tokio::time::Instant;

/// Entrada no cache: valor + prazo de expiração.
///
/// Toda entrada tem prazo; regravar a chave substitui a entrada inteira
/// e com ela o prazo.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Bytes,
    pub expires_at: Instant,
}

impl Entry {
    pub fn new(value: Bytes, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
