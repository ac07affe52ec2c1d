//! Repository integration tests against the in-memory store.

mod support;
mod entries;
mod restrictions;
mod batches;
