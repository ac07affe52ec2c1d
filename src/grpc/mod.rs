//! gRPC transport for the blacklist service.
//!
//! Requires the `grpc` feature. Uses tonic for the server and prost for
//! message serialization (standard protobuf wire format, no `.proto` file).
//!
//! ## RPCs (`blacklist.v1.Blacklist`)
//!
//! - `GetById`, `Save`, `UpsertRestriction`, `DeleteRestriction`, `Delete`: unary.
//! - `GetByFilter`: unary request, streamed results.
//! - `GetBatch`, `SaveBatch`, `UpsertRestrictionBatch`,
//!   `DeleteRestrictionBatch`, `DeleteBatch`: bidirectional streams driven
//!   by the batch coordinator, one response per input item.
//!
//! ## Example
//!
//! ```ignore
//! use blacklist_store::{grpc, Config, InMemoryItemStore};
//!
//! let config = Config::default();
//! let service = grpc::BlacklistService::from_config(InMemoryItemStore::new(), &config);
//! grpc::serve(service, "127.0.0.1:50051".parse()?).await?;
//! ```

mod convert;
mod messages;
mod service;

use std::future::Future;
use std::net::SocketAddr;

use tonic::{Code, Status};
use tracing::info;

use crate::error::BlacklistError;
use crate::store::ItemStore;

pub use messages::{
    BetweenQueryDto, DeleteRestrictionRequest, Empty, FilterRequest, GetRequest, IdBatch,
    ProductDto, QueryDto, RecordBatch, RecordDto, RestrictionDto, UpsertRestrictionRequest,
};
pub use service::BlacklistService;

// ---------------------------------------------------------------------------
// Generated service trait + server/client
// ---------------------------------------------------------------------------

include!(concat!(env!("OUT_DIR"), "/blacklist.v1.Blacklist.rs"));

pub use blacklist_client::BlacklistClient;
pub use blacklist_server::{Blacklist, BlacklistServer};

impl From<BlacklistError> for Status {
    fn from(err: BlacklistError) -> Self {
        let code = match &err {
            BlacklistError::NotFound(_) | BlacklistError::RestrictionNotFound { .. } => {
                Code::NotFound
            }
            BlacklistError::BatchTooLarge { .. }
            | BlacklistError::UnsupportedOperator(_)
            | BlacklistError::InvalidCursor(_)
            | BlacklistError::InvalidRequest(_) => Code::InvalidArgument,
            BlacklistError::DuplicateRestriction { .. } => Code::AlreadyExists,
            BlacklistError::MalformedItem(_) => Code::DataLoss,
            BlacklistError::StoreUnavailable(_) => Code::Unavailable,
            BlacklistError::ExhaustedRetries { .. } => Code::ResourceExhausted,
            BlacklistError::LockPoisoned(_) => Code::Internal,
            BlacklistError::Config(_) => Code::FailedPrecondition,
        };
        Status::new(code, err.to_string())
    }
}

/// Wrap a handler in the generated tonic server, ready to add to a router.
pub fn blacklist_server<S: ItemStore + Clone + 'static>(
    service: BlacklistService<S>,
) -> BlacklistServer<BlacklistService<S>> {
    BlacklistServer::new(service)
}

/// Bind and serve at `addr` until the process stops.
pub async fn serve<S: ItemStore + Clone + 'static>(
    service: BlacklistService<S>,
    addr: SocketAddr,
) -> Result<(), tonic::transport::Error> {
    info!(%addr, "serving blacklist gRPC");
    tonic::transport::Server::builder()
        .add_service(blacklist_server(service))
        .serve(addr)
        .await
}

/// Bind and serve at `addr` until `shutdown` resolves.
pub async fn serve_with_shutdown<S, F>(
    service: BlacklistService<S>,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    S: ItemStore + Clone + 'static,
    F: Future<Output = ()>,
{
    info!(%addr, "serving blacklist gRPC");
    tonic::transport::Server::builder()
        .add_service(blacklist_server(service))
        .serve_with_shutdown(addr, shutdown)
        .await
}
