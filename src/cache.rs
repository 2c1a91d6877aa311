//! Ticketed response caches.
//!
//! Every lazily-loaded panel memoizes by its query key instead of a
//! loaded-once flag, and every fetch draws a ticket before awaiting so a slow
//! stale response can never overwrite a fresher one.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

struct Entrada<T> {
    ticket: Ticket,
    valor: T,
}

/// Per-concern cache keyed by query parameters.
pub struct TicketedCache<T> {
    entradas: Mutex<LruCache<String, Entrada<T>>>,
    reloj: AtomicU64,
}

impl<T: Clone> TicketedCache<T> {
    pub fn new(capacidad: usize) -> Arc<Self> {
        let capacidad = NonZeroUsize::new(capacidad.max(1)).expect("capacity above zero");
        Arc::new(Self {
            entradas: Mutex::new(LruCache::new(capacidad)),
            reloj: AtomicU64::new(0),
        })
    }

    pub fn get(&self, clave: &str) -> Option<T> {
        self.entradas
            .lock()
            .get(clave)
            .map(|entrada| entrada.valor.clone())
    }

    /// Draw a ticket before starting the fetch this value will come from.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.reloj.fetch_add(1, Ordering::Relaxed))
    }

    /// Applies the response unless a newer ticket already landed for the same
    /// key. Returns whether the value was stored.
    pub fn aplicar(&self, clave: &str, ticket: Ticket, valor: T) -> bool {
        let mut entradas = self.entradas.lock();
        if let Some(existente) = entradas.peek(clave) {
            if existente.ticket > ticket {
                return false;
            }
        }
        entradas.put(clave.to_string(), Entrada { ticket, valor });
        true
    }

    /// Cached value, or run the fetch and memoize its result. The fetch is
    /// only started on a cache miss; errors are never cached.
    pub async fn obtener<F, Fut, E>(&self, clave: &str, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(valor) = self.get(clave) {
            return Ok(valor);
        }
        let ticket = self.ticket();
        let valor = fetch().await?;
        self.aplicar(clave, ticket, valor.clone());
        Ok(valor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ticket_never_clobbers_fresh_value() {
        let cache: Arc<TicketedCache<&str>> = TicketedCache::new(4);
        let lento = cache.ticket();
        let rapido = cache.ticket();

        assert!(cache.aplicar("clave", rapido, "fresco"));
        assert!(!cache.aplicar("clave", lento, "rancio"));
        assert_eq!(cache.get("clave"), Some("fresco"));
    }

    #[test]
    fn keys_are_independent() {
        let cache: Arc<TicketedCache<u32>> = TicketedCache::new(4);
        let t1 = cache.ticket();
        let t2 = cache.ticket();
        cache.aplicar("a", t1, 1);
        cache.aplicar("b", t2, 2);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), None);
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let cache: Arc<TicketedCache<u32>> = TicketedCache::new(2);
        for (clave, valor) in [("a", 1), ("b", 2), ("c", 3)] {
            let ticket = cache.ticket();
            cache.aplicar(clave, ticket, valor);
        }
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[tokio::test]
    async fn obtener_fetches_once_per_key() {
        use std::sync::atomic::AtomicUsize;

        let cache: Arc<TicketedCache<u32>> = TicketedCache::new(4);
        let llamadas = AtomicUsize::new(0);
        for _ in 0..3 {
            let valor: Result<u32, ()> = cache
                .obtener("clave", || async {
                    llamadas.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(valor, Ok(7));
        }
        assert_eq!(llamadas.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn obtener_does_not_cache_errors() {
        let cache: Arc<TicketedCache<u32>> = TicketedCache::new(4);
        let fallo: Result<u32, &str> = cache.obtener("clave", || async { Err("sin red") }).await;
        assert_eq!(fallo, Err("sin red"));
        let exito: Result<u32, &str> = cache.obtener("clave", || async { Ok(9) }).await;
        assert_eq!(exito, Ok(9));
    }
}
