//! In-memory reference key-value service
//!
//! Implements the four-method CRUD surface the workload driver expects,
//! with the status-code contract the driver reconciles against:
//! ALREADY_EXISTS on duplicate create, NOT_FOUND on missing retrieve or
//! update, and idempotent delete. Used by the `serve` subcommand and by
//! tests that need a live endpoint.

use crate::common::Result;
use crate::proto::key_value_server::{KeyValue, KeyValueServer};
use crate::proto::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, RetrieveRequest,
    RetrieveResponse, UpdateRequest, UpdateResponse,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

/// KvService holds the whole store in memory behind a mutex.
#[derive(Debug, Default)]
pub struct KvService {
    store: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl KvService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts this service into a gRPC server instance.
    pub fn into_server(self) -> KeyValueServer<Self> {
        KeyValueServer::new(self)
    }
}

#[tonic::async_trait]
impl KeyValue for KvService {
    async fn create(
        &self,
        req: Request<CreateRequest>,
    ) -> std::result::Result<Response<CreateResponse>, Status> {
        let req = req.into_inner();
        let mut store = self.store.lock().unwrap();
        if store.contains_key(&req.key) {
            return Err(Status::already_exists("key already exists"));
        }
        store.insert(req.key, req.value);
        Ok(Response::new(CreateResponse {}))
    }

    async fn retrieve(
        &self,
        req: Request<RetrieveRequest>,
    ) -> std::result::Result<Response<RetrieveResponse>, Status> {
        let req = req.into_inner();
        let store = self.store.lock().unwrap();
        match store.get(&req.key) {
            Some(value) => Ok(Response::new(RetrieveResponse {
                value: value.clone(),
            })),
            None => Err(Status::not_found("key not found")),
        }
    }

    async fn update(
        &self,
        req: Request<UpdateRequest>,
    ) -> std::result::Result<Response<UpdateResponse>, Status> {
        let req = req.into_inner();
        let mut store = self.store.lock().unwrap();
        match store.get_mut(&req.key) {
            Some(slot) => {
                *slot = req.value;
                Ok(Response::new(UpdateResponse {}))
            }
            None => Err(Status::not_found("key not found")),
        }
    }

    async fn delete(
        &self,
        req: Request<DeleteRequest>,
    ) -> std::result::Result<Response<DeleteResponse>, Status> {
        let req = req.into_inner();
        let mut store = self.store.lock().unwrap();
        // Delete is idempotent: removing an absent key still succeeds.
        store.remove(&req.key);
        Ok(Response::new(DeleteResponse {}))
    }
}

/// Serve the reference service on `addr` until the process exits.
pub async fn serve(addr: SocketAddr) -> Result<()> {
    tracing::info!("Starting reference key-value service");
    tracing::info!("  gRPC API: {}", addr);

    tonic::transport::Server::builder()
        .add_service(KvService::new().into_server())
        .serve(addr)
        .await?;

    Ok(())
}

/// Bind `addr` (port 0 picks an ephemeral port), spawn the reference
/// service in the background, and return the bound address.
pub async fn spawn(addr: SocketAddr) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    tokio::spawn(async move {
        let res = tonic::transport::Server::builder()
            .add_service(KvService::new().into_server())
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await;
        if let Err(e) = res {
            tracing::error!("reference service error: {}", e);
        }
    });

    Ok(local_addr)
}
