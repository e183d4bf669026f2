//! Randomized CRUD workload driver
//!
//! Each iteration picks one of four actions and dispatches the RPC as a
//! background task that reconciles the tracked key set against the
//! response. ALREADY_EXISTS on create and NOT_FOUND on retrieve/update are
//! authoritative answers about a key, so they prune the local view and the
//! loop keeps going. Any other failure aborts the run with the error it hit.

use crate::common::{payload, Config, Error, Result};
use crate::proto::key_value_client::KeyValueClient;
use crate::proto::{CreateRequest, DeleteRequest, RetrieveRequest, UpdateRequest};
use crate::workload::KnownKeys;
use bytes::Bytes;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tonic::transport::Channel;
use tonic::Code;

/// Drives randomized create/retrieve/update/delete traffic against a
/// key-value service.
pub struct WorkloadDriver {
    client: KeyValueClient<Channel>,
    config: Config,
    keys: Arc<Mutex<KnownKeys>>,
    rpc_count: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
}

impl WorkloadDriver {
    /// Connect to the configured target.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let client = KeyValueClient::connect(config.target.clone()).await?;
        Ok(Self::new(client, config))
    }

    /// Build a driver on an existing client.
    pub fn new(client: KeyValueClient<Channel>, config: Config) -> Self {
        Self {
            client,
            config,
            keys: Arc::new(Mutex::new(KnownKeys::new())),
            rpc_count: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of RPCs dispatched so far. Skipped iterations never count.
    pub fn rpc_count(&self) -> u64 {
        self.rpc_count.load(Ordering::Relaxed)
    }

    /// Total request payload bytes dispatched so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Number of keys currently believed to exist server-side.
    pub fn tracked_keys(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    /// Issue randomized traffic until `stop` is set.
    ///
    /// Dispatch is non-blocking: calls from different iterations are
    /// concurrently in flight, capped at `max_in_flight`. The first fatal
    /// outcome from any call aborts the run. On stop, in-flight calls are
    /// left to finish in the background.
    pub async fn run(&self, stop: Arc<AtomicBool>) -> Result<()> {
        tracing::info!("driving workload against {}", self.config.target);

        let mut inflight: JoinSet<Result<()>> = JoinSet::new();

        while !stop.load(Ordering::Relaxed) {
            // Surface failures from completed calls before issuing more work.
            while let Some(done) = inflight.try_join_next() {
                reap(done)?;
            }
            if inflight.len() >= self.config.max_in_flight {
                // At capacity: wait for any one call to finish.
                if let Some(done) = inflight.join_next().await {
                    reap(done)?;
                }
                continue;
            }

            let action: u8 = rand::thread_rng().gen_range(0..4);
            let client = self.client.clone();
            let keys = Arc::clone(&self.keys);

            if action == 0 {
                let key = self.fresh_key();
                let value = payload::random_bytes(self.config.mean_value_size);
                self.note_dispatch(key.len() + value.len());
                inflight.spawn(Self::do_create(client, keys, key, value));
                continue;
            }

            // Nothing to act on until a create has landed.
            let key = {
                let keys = self.keys.lock().unwrap();
                if keys.is_empty() {
                    continue;
                }
                keys.pick_random(&mut rand::thread_rng())?
            };

            match action {
                1 => {
                    self.note_dispatch(key.len());
                    inflight.spawn(Self::do_retrieve(client, keys, key));
                }
                2 => {
                    let value = payload::random_bytes(self.config.mean_value_size);
                    self.note_dispatch(key.len() + value.len());
                    inflight.spawn(Self::do_update(client, keys, key, value));
                }
                _ => {
                    self.note_dispatch(key.len());
                    inflight.spawn(Self::do_delete(client, keys, key));
                }
            }
        }

        // Cooperative stop: leave in-flight calls to complete on their own.
        inflight.detach_all();
        tracing::debug!("workload loop stopped after {} rpcs", self.rpc_count());
        Ok(())
    }

    /// Generate a key not currently tracked.
    ///
    /// Uniqueness is best-effort against the local view only; a server-side
    /// collision still comes back as ALREADY_EXISTS and is absorbed.
    fn fresh_key(&self) -> Bytes {
        let keys = self.keys.lock().unwrap();
        loop {
            let key = payload::random_bytes(self.config.mean_key_size);
            if !keys.contains(&key) {
                return key;
            }
        }
    }

    fn note_dispatch(&self, payload_len: usize) {
        self.rpc_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(payload_len as u64, Ordering::Relaxed);
    }

    async fn do_create(
        mut client: KeyValueClient<Channel>,
        keys: Arc<Mutex<KnownKeys>>,
        key: Bytes,
        value: Bytes,
    ) -> Result<()> {
        let req = CreateRequest {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        match client.create(req).await {
            Ok(_) => {
                keys.lock().unwrap().add(key);
                Ok(())
            }
            Err(status) if status.code() == Code::AlreadyExists => {
                tracing::debug!("key {} already existed, dropping it", key_preview(&key));
                keys.lock().unwrap().remove(&key);
                Ok(())
            }
            Err(status) => Err(Error::Grpc(status)),
        }
    }

    async fn do_retrieve(
        mut client: KeyValueClient<Channel>,
        keys: Arc<Mutex<KnownKeys>>,
        key: Bytes,
    ) -> Result<()> {
        let req = RetrieveRequest { key: key.to_vec() };
        match client.retrieve(req).await {
            Ok(resp) => {
                if resp.into_inner().value.is_empty() {
                    return Err(Error::InvalidResponse(
                        "retrieve returned an empty value".into(),
                    ));
                }
                Ok(())
            }
            Err(status) if status.code() == Code::NotFound => {
                tracing::debug!("key {} not found, dropping it", key_preview(&key));
                keys.lock().unwrap().remove(&key);
                Ok(())
            }
            Err(status) => Err(Error::Grpc(status)),
        }
    }

    async fn do_update(
        mut client: KeyValueClient<Channel>,
        keys: Arc<Mutex<KnownKeys>>,
        key: Bytes,
        value: Bytes,
    ) -> Result<()> {
        let req = UpdateRequest {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        match client.update(req).await {
            Ok(_) => Ok(()),
            Err(status) if status.code() == Code::NotFound => {
                tracing::debug!("key {} not found, dropping it", key_preview(&key));
                keys.lock().unwrap().remove(&key);
                Ok(())
            }
            Err(status) => Err(Error::Grpc(status)),
        }
    }

    async fn do_delete(
        mut client: KeyValueClient<Channel>,
        keys: Arc<Mutex<KnownKeys>>,
        key: Bytes,
    ) -> Result<()> {
        let req = DeleteRequest { key: key.to_vec() };
        match client.delete(req).await {
            Ok(_) => {
                keys.lock().unwrap().remove(&key);
                Ok(())
            }
            Err(status) => Err(Error::Grpc(status)),
        }
    }
}

/// Unwrap a finished call task. A panicked task is as fatal as a bad status.
fn reap(done: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match done {
        Ok(res) => res,
        Err(e) => Err(Error::Internal(format!("call task failed: {}", e))),
    }
}

/// Short hex preview of a key for log lines.
fn key_preview(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(8)])
}
