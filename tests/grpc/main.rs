//! gRPC transport integration tests.
//!
//! Starts a tonic server on port 0 and exercises it with the generated client.

#![cfg(feature = "grpc")]

mod support;
mod unary;
mod streaming;
