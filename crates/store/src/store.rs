use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::entry::Entry;

/// Item no BTreeSet de expiração: (instante, chave).
/// Ordenado por instante para purga eficiente.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct ExpiryEntry(Instant, String);

/// Estado compartilhado entre todas as conexões.
struct SharedState {
    data: DashMap<String, Entry>,
    expiry: Mutex<BTreeSet<ExpiryEntry>>,
    notify_expiry: Notify,
    ttl: Duration,
}

/// Handle para o cache TTL in-memory.
///
/// O prazo é uma duração fixa, reiniciado a cada escrita — nunca na
/// leitura. Uma chave lida com frequência mas nunca regravada expira no
/// prazo original.
#[derive(Clone)]
pub struct Store {
    shared: Arc<SharedState>,
}

impl Store {
    /// Cria o store com o tempo de vida fixo de cada entrada.
    pub fn new(ttl: Duration) -> Self {
        let store = Store {
            shared: Arc::new(SharedState {
                data: DashMap::new(),
                expiry: Mutex::new(BTreeSet::new()),
                notify_expiry: Notify::new(),
                ttl,
            }),
        };

        // Spawn background task para purgar keys expiradas
        let shared = store.shared.clone();
        tokio::spawn(async move {
            purge_expired_keys(shared).await;
        });

        store
    }

    /// Grava a chave, substituindo qualquer entrada anterior.
    ///
    /// O prazo é recalculado a partir de agora; o deadline antigo que
    /// ficou na fila de expiração é descartado quando disparar, porque a
    /// entrada atual ainda não terá expirado.
    pub fn write(&self, key: String, value: Bytes) {
        let expires_at = Instant::now() + self.shared.ttl;
        self.shared.data.insert(key.clone(), Entry::new(value, expires_at));

        let shared = self.shared.clone();
        tokio::spawn(async move {
            let mut expiry = shared.expiry.lock().await;
            expiry.insert(ExpiryEntry(expires_at, key));
            drop(expiry);
            shared.notify_expiry.notify_one();
        });
    }

    /// Lê o valor atual; não altera o prazo de expiração.
    pub fn read(&self, key: &str) -> Option<Bytes> {
        let entry = self.shared.data.get(key)?;
        if entry.is_expired() {
            drop(entry);
            self.shared.data.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Remove e retorna o valor numa única operação atômica.
    ///
    /// Nenhum observador concorrente vê a entrada entre a checagem e a
    /// remoção: o remove do DashMap é a checagem.
    pub fn take(&self, key: &str) -> Option<Bytes> {
        let (_, entry) = self.shared.data.remove(key)?;
        if entry.is_expired() {
            return None;
        }
        Some(entry.value)
    }

    /// Número de entradas presentes (expiradas ainda não purgadas contam).
    pub fn len(&self) -> usize {
        self.shared.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.data.is_empty()
    }
}

/// Background task que purga chaves expiradas.
async fn purge_expired_keys(shared: Arc<SharedState>) {
    loop {
        let next_expiry = {
            let expiry = shared.expiry.lock().await;
            expiry.iter().next().map(|e| e.0)
        };

        match next_expiry {
            Some(when) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(when) => {}
                    _ = shared.notify_expiry.notified() => { continue; }
                }
            }
            None => {
                shared.notify_expiry.notified().await;
                continue;
            }
        }

        // Purgar todos os deadlines vencidos
        let now = Instant::now();
        let mut expiry = shared.expiry.lock().await;
        let mut due = Vec::new();

        for item in expiry.iter() {
            if item.0 <= now {
                due.push(item.clone());
            } else {
                break; // BTreeSet é ordenado, os próximos são todos futuros
            }
        }

        for item in &due {
            expiry.remove(item);
            // Só remove se realmente expirou (a chave pode ter sido regravada)
            if let Some(e) = shared.data.get(&item.1)
                && e.is_expired()
            {
                drop(e);
                shared.data.remove(&item.1);
                debug!("chave expirada removida: {}", item.1);
            }
        }
    }
}
