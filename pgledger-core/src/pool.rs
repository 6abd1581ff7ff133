//! Fixed-size pool of client handles
//!
//! # Design
//!
//! - N handles are opened eagerly; any failure aborts construction
//! - Idle handles sit in a bounded queue of capacity N
//! - Borrowing takes the receive side behind a fair async mutex, so waiters
//!   are served in arrival order and block until a handle comes back
//! - The borrow guard pushes its handle back on drop, on success, on error
//!   and on cancellation alike
//! - Broken handles are returned as-is; nothing reconnects them

use std::ops::{Deref, DerefMut};

use tokio::sync::{mpsc, Mutex};

use crate::error::{PoolError, StoreError, StoreResult};
use crate::store::{ClientHandle, Connector};

/// Fixed-size set of [`ClientHandle`]s with borrow/return semantics.
pub struct Pool<C> {
    size: usize,
    idle_tx: mpsc::Sender<C>,
    idle_rx: Mutex<mpsc::Receiver<C>>,
    closing: Mutex<()>,
}

impl<C: ClientHandle> Pool<C> {
    /// Build a pool around already-open handles.
    pub fn from_clients(clients: Vec<C>) -> Result<Self, PoolError> {
        let size = clients.len();
        if size == 0 {
            return Err(PoolError::ZeroSize);
        }

        let (idle_tx, idle_rx) = mpsc::channel(size);
        for client in clients {
            // Capacity equals the number of handles, so this cannot fill up
            if idle_tx.try_send(client).is_err() {
                unreachable!("idle queue sized to hold every handle");
            }
        }

        Ok(Self {
            size,
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            closing: Mutex::new(()),
        })
    }

    /// Open `size` handles through `connector`.
    ///
    /// If any connection fails, the handles opened so far are closed and
    /// no pool is returned.
    pub async fn connect<K>(connector: &K, size: usize) -> Result<Self, PoolError>
    where
        K: Connector<Client = C>,
    {
        if size == 0 {
            return Err(PoolError::ZeroSize);
        }

        let mut clients = Vec::with_capacity(size);
        for index in 0..size {
            match connector.connect().await {
                Ok(client) => {
                    tracing::debug!(index, "new client");
                    clients.push(client);
                }
                Err(source) => {
                    for mut opened in clients {
                        if let Err(e) = opened.close().await {
                            tracing::warn!(error = %e, "failed to close handle after aborted pool construction");
                        }
                    }
                    return Err(PoolError::Connect { index, source });
                }
            }
        }

        Self::from_clients(clients)
    }

    /// Borrow a handle, waiting until one is returned if all are checked out.
    ///
    /// There is no timeout; wrap the call if bounded waiting is needed.
    pub async fn acquire(&self) -> StoreResult<PooledClient<C>> {
        let client = {
            let mut idle = self.idle_rx.lock().await;
            idle.recv().await.ok_or(StoreError::Closed)?
        };

        Ok(PooledClient {
            client: Some(client),
            home: self.idle_tx.clone(),
        })
    }

    /// Number of handles owned by the pool
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of handles currently idle
    pub fn available(&self) -> usize {
        self.size - self.idle_tx.capacity()
    }

    /// Close every handle, waiting for borrowed ones to come back first.
    ///
    /// Closed handles stay in the pool; later operations on them fail with
    /// [`StoreError::Closed`] or the backend's equivalent. Returns the first
    /// close error after attempting all handles.
    ///
    /// Concurrent calls run one after another; each gathers the full set.
    pub async fn close_all(&self) -> StoreResult<()> {
        let _closing = self.closing.lock().await;
        let mut borrowed = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            borrowed.push(self.acquire().await?);
        }

        let mut first_error = None;
        for (index, client) in borrowed.iter_mut().enumerate() {
            if let Err(e) = client.close().await {
                tracing::warn!(index, error = %e, "failed to close handle");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// A borrowed handle. Dereferences to the handle and returns it to the pool on drop.
pub struct PooledClient<C> {
    client: Option<C>,
    home: mpsc::Sender<C>,
}

impl<C> Deref for PooledClient<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.client
            .as_ref()
            .unwrap_or_else(|| unreachable!("handle is only taken on drop"))
    }
}

impl<C> DerefMut for PooledClient<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client
            .as_mut()
            .unwrap_or_else(|| unreachable!("handle is only taken on drop"))
    }
}

impl<C> Drop for PooledClient<C> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            // Fails only when the pool itself is gone, in which case the handle is dropped
            let _ = self.home.try_send(client);
        }
    }
}
