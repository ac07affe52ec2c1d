//! Batch stream coordination.
//!
//! Streaming calls deliver *units*: a list of items (an envelope carrying
//! many, or a single request carrying one). The coordinator normalizes them
//! through one [`Accumulator`], hands each bounded batch to a flush function
//! and forwards one response per input item, in arrival order, through a
//! bounded channel.
//!
//! A stream moves `Open -> Draining -> Closed`. Whatever is still buffered
//! when the input ends is flushed before the stream closes. The first error
//! aborts the stream; responses already sent stay sent.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BlacklistError, Result};

/// How incoming units are grouped into batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Each unit is one batch. Units over the ceiling are rejected.
    #[default]
    Envelope,
    /// Items are buffered across units and flushed whenever the buffer
    /// reaches the ceiling.
    Accumulate,
}

impl ChunkPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkPolicy::Envelope => "envelope",
            ChunkPolicy::Accumulate => "accumulate",
        }
    }
}

impl fmt::Display for ChunkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkPolicy {
    type Err = BlacklistError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "envelope" => Ok(ChunkPolicy::Envelope),
            "accumulate" => Ok(ChunkPolicy::Accumulate),
            other => Err(BlacklistError::Config(format!(
                "unknown chunking policy '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle of one coordinated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Receiving units.
    Open,
    /// Input ended; flushing what is left.
    Draining,
    Closed,
}

/// Groups items into batches of at most `ceiling`.
#[derive(Debug)]
pub struct Accumulator<T> {
    buffer: Vec<T>,
    ceiling: usize,
    policy: ChunkPolicy,
}

impl<T> Accumulator<T> {
    pub fn new(ceiling: usize, policy: ChunkPolicy) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            buffer: Vec::with_capacity(ceiling),
            ceiling,
            policy,
        }
    }

    /// Take one unit and return the batches that are ready to flush.
    pub fn push(&mut self, unit: Vec<T>) -> Result<Vec<Vec<T>>> {
        match self.policy {
            ChunkPolicy::Envelope => {
                if unit.len() > self.ceiling {
                    return Err(BlacklistError::BatchTooLarge {
                        limit: self.ceiling,
                        actual: unit.len(),
                    });
                }
                if unit.is_empty() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![unit])
                }
            }
            ChunkPolicy::Accumulate => {
                let mut ready = Vec::new();
                for item in unit {
                    self.buffer.push(item);
                    if self.buffer.len() == self.ceiling {
                        ready.push(std::mem::replace(
                            &mut self.buffer,
                            Vec::with_capacity(self.ceiling),
                        ));
                    }
                }
                Ok(ready)
            }
        }
    }

    /// Whatever is still buffered, if anything.
    pub fn finish(&mut self) -> Option<Vec<T>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Outcome of flushing one batch: the responses for items that were applied,
/// in input order, and the error that stopped the batch, if any.
///
/// Items applied before a failure are still answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flushed<O, E> {
    pub outputs: Vec<O>,
    pub error: Option<E>,
}

impl<O, E> Flushed<O, E> {
    pub fn ok(outputs: Vec<O>) -> Self {
        Self {
            outputs,
            error: None,
        }
    }

    pub fn partial(outputs: Vec<O>, error: E) -> Self {
        Self {
            outputs,
            error: Some(error),
        }
    }
}

impl<O, E> From<std::result::Result<Vec<O>, E>> for Flushed<O, E> {
    fn from(result: std::result::Result<Vec<O>, E>) -> Self {
        match result {
            Ok(outputs) => Self::ok(outputs),
            Err(error) => Self::partial(Vec::new(), error),
        }
    }
}

/// What happened on one coordinated stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamReport {
    pub batches: usize,
    pub responses: usize,
    /// Stopped early on an error or because the receiver went away.
    pub aborted: bool,
}

/// Drives streamed requests through bounded batches.
#[derive(Debug, Clone, Copy)]
pub struct BatchCoordinator {
    ceiling: usize,
    policy: ChunkPolicy,
}

impl BatchCoordinator {
    pub fn new(ceiling: usize, policy: ChunkPolicy) -> Self {
        Self {
            ceiling: ceiling.max(1),
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.batch_size, config.chunking)
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Consume `incoming` until it ends or fails, sending responses to `sink`.
    ///
    /// `flush` must return one output per applied item, in input order,
    /// followed by the error that stopped it, if any.
    pub async fn run<I, T, O, E, F, Fut>(
        &self,
        incoming: I,
        mut flush: F,
        sink: mpsc::Sender<std::result::Result<O, E>>,
    ) -> StreamReport
    where
        I: Stream<Item = std::result::Result<Vec<T>, E>>,
        E: From<BlacklistError>,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Flushed<O, E>>,
    {
        let mut incoming = Box::pin(incoming);
        let mut accumulator = Accumulator::new(self.ceiling, self.policy);
        let mut report = StreamReport::default();
        let mut state = StreamState::Open;
        debug!(?state, ceiling = self.ceiling, policy = %self.policy, "batch stream");

        while let Some(unit) = incoming.next().await {
            let ready = match unit {
                Ok(unit) => accumulator.push(unit).map_err(E::from),
                Err(err) => Err(err),
            };
            let ready = match ready {
                Ok(ready) => ready,
                Err(err) => {
                    warn!("batch stream aborted while receiving");
                    let _ = sink.send(Err(err)).await;
                    report.aborted = true;
                    return report;
                }
            };
            for batch in ready {
                if !dispatch(&mut flush, batch, &sink, &mut report).await {
                    return report;
                }
            }
        }

        state = StreamState::Draining;
        if let Some(rest) = accumulator.finish() {
            debug!(?state, count = rest.len(), "flushing remaining items");
            if !dispatch(&mut flush, rest, &sink, &mut report).await {
                return report;
            }
        }

        state = StreamState::Closed;
        info!(
            ?state,
            batches = report.batches,
            responses = report.responses,
            "batch stream finished"
        );
        report
    }

    /// Run on a background task and return the response stream.
    pub fn spawn<I, T, O, E, F, Fut>(
        &self,
        incoming: I,
        flush: F,
    ) -> ReceiverStream<std::result::Result<O, E>>
    where
        I: Stream<Item = std::result::Result<Vec<T>, E>> + Send + 'static,
        T: Send + 'static,
        O: Send + 'static,
        E: From<BlacklistError> + Send + 'static,
        F: FnMut(Vec<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Flushed<O, E>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.ceiling);
        let coordinator = *self;
        tokio::spawn(async move {
            coordinator.run(incoming, flush, tx).await;
        });
        ReceiverStream::new(rx)
    }
}

/// Flush one batch and forward its responses. `false` ends the stream.
async fn dispatch<T, O, E, F, Fut>(
    flush: &mut F,
    batch: Vec<T>,
    sink: &mpsc::Sender<std::result::Result<O, E>>,
    report: &mut StreamReport,
) -> bool
where
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Flushed<O, E>>,
{
    debug!(count = batch.len(), "flushing batch");
    report.batches += 1;
    let flushed = flush(batch).await;
    for output in flushed.outputs {
        if sink.send(Ok(output)).await.is_err() {
            debug!("response receiver dropped");
            report.aborted = true;
            return false;
        }
        report.responses += 1;
    }
    match flushed.error {
        None => true,
        Some(err) => {
            warn!(answered = report.responses, "batch stream aborted by flush failure");
            let _ = sink.send(Err(err)).await;
            report.aborted = true;
            false
        }
    }
}
