//! Worker boundary: typed messages and a stateful worker
//!
//! A UI or transport layer hands raw buffers to a background worker with
//! `encode` and `decode` requests and receives fragments or the rebuilt
//! blob back. Messages are serde enums tagged by `command` with camelCase
//! fields, so they map one-to-one onto JSON like
//! `{"command":"encode","buffer":[..],"blockSize":{"originalBlocks":4,"extraBlocks":1}}`.
//!
//! Decoding is a session: fragments arrive one message at a time, each
//! prefixed with a framing marker byte, in any order. `blockId` places the
//! fragment in its slot, one message (normally the last) carries the file
//! size, and recombination runs once all `totalBlocks` slots are filled.

use crate::codec::Codec;
use crate::constants::{FRAGMENT_MARKER, MAX_FRAGMENTS};
use crate::error::CodingError;
use crate::geometry::CodingParams;
use crate::recombiner::Recombiner;
use crate::splitter::Splitter;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Size information sent with one fragment of a decode session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeSize {
    /// Length of the original blob
    pub file_size: usize,

    /// Parameters the blob was split with
    #[serde(flatten)]
    pub params: CodingParams,
}

/// Messages sent to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Request {
    /// Split `buffer` into fragments
    #[serde(rename_all = "camelCase")]
    Encode {
        /// Blob to split
        buffer: Bytes,
        /// `(k, t)`
        block_size: CodingParams,
    },

    /// Deliver one fragment of a decode session
    #[serde(rename_all = "camelCase")]
    Decode {
        /// 1-based fragment number
        block_id: u32,
        /// Fragments in the session
        total_blocks: u32,
        /// Marker byte followed by the fragment
        buffer: Bytes,
        /// Present on one message of the session, normally the last
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<DecodeSize>,
    },
}

/// Messages emitted by the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Response {
    /// One fragment of an encode request
    #[serde(rename_all = "camelCase")]
    EncodeReturn {
        /// 1-based fragment number
        block_id: u32,
        /// `n`
        total_blocks: u32,
        /// Fragment bytes
        buffer: Bytes,
    },

    /// The rebuilt blob
    #[serde(rename_all = "camelCase")]
    DecodeReturn {
        /// Blob truncated to the file size
        buffer: Bytes,
    },
}

/// Prefix a fragment with the framing marker expected by decode requests
pub fn frame_fragment(fragment: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(fragment.len() + 1);
    buf.put_u8(FRAGMENT_MARKER);
    buf.put_slice(fragment);
    buf.freeze()
}

/// Stateful request handler
///
/// Buffers fragments between decode messages. Malformed messages are
/// rejected without touching the session; once every slot is filled the
/// session is emptied, whether or not recombination succeeds.
#[derive(Debug)]
pub struct ErasureWorker<'c, 'f> {
    codec: &'c Codec<'f>,
    session: Option<DecodeSession>,
}

#[derive(Debug)]
struct DecodeSession {
    slots: Vec<Option<Bytes>>,
    filled: usize,
    size: Option<DecodeSize>,
}

impl DecodeSession {
    fn new(total: usize) -> Self {
        Self {
            slots: vec![None; total],
            filled: 0,
            size: None,
        }
    }

    fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }
}

impl<'c, 'f> ErasureWorker<'c, 'f> {
    /// Create a worker using `codec`
    pub fn new(codec: &'c Codec<'f>) -> Self {
        Self {
            codec,
            session: None,
        }
    }

    /// Fragments buffered for the current decode session
    pub fn pending(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.filled)
    }

    /// Drop the current decode session, if any
    pub fn reset(&mut self) {
        self.session = None;
    }

    /// Handle one request, returning the responses it produces
    pub fn handle(&mut self, request: Request) -> Result<Vec<Response>, CodingError> {
        match request {
            Request::Encode { buffer, block_size } => self.encode(&buffer, block_size),
            Request::Decode {
                block_id,
                total_blocks,
                buffer,
                size,
            } => self.decode(block_id, total_blocks, buffer, size),
        }
    }

    fn encode(&self, buffer: &[u8], params: CodingParams) -> Result<Vec<Response>, CodingError> {
        #[cfg(feature = "logging")]
        debug!("Encode request: {} bytes, {:?}", buffer.len(), params);

        let fragments = Splitter::new(self.codec, params)?.split(buffer)?;
        let total = fragments.len() as u32;
        Ok(fragments
            .into_iter()
            .enumerate()
            .map(|(i, buffer)| Response::EncodeReturn {
                block_id: i as u32 + 1,
                total_blocks: total,
                buffer,
            })
            .collect())
    }

    fn decode(
        &mut self,
        block_id: u32,
        total_blocks: u32,
        buffer: Bytes,
        size: Option<DecodeSize>,
    ) -> Result<Vec<Response>, CodingError> {
        match buffer.first() {
            None => {
                return Err(CodingError::InvalidMessage(format!(
                    "fragment {} has no framing marker",
                    block_id
                )))
            }
            #[cfg(feature = "logging")]
            Some(&marker) if marker != FRAGMENT_MARKER => {
                warn!("Fragment {} has unexpected marker {:#04x}", block_id, marker);
            }
            Some(_) => {}
        }

        let total = total_blocks as usize;
        if total == 0 || total > MAX_FRAGMENTS {
            return Err(CodingError::InvalidMessage(format!(
                "totalBlocks {} outside 1..={}",
                total_blocks, MAX_FRAGMENTS
            )));
        }
        if block_id == 0 || block_id > total_blocks {
            return Err(CodingError::InvalidMessage(format!(
                "blockId {} outside 1..={}",
                block_id, total_blocks
            )));
        }
        if let Some(session) = &self.session {
            if session.slots.len() != total {
                return Err(CodingError::InvalidMessage(format!(
                    "totalBlocks {} does not match the open session of {}",
                    total_blocks,
                    session.slots.len()
                )));
            }
            if session.slots[block_id as usize - 1].is_some() {
                return Err(CodingError::InvalidMessage(format!(
                    "duplicate fragment {}",
                    block_id
                )));
            }
        }

        let session = self
            .session
            .get_or_insert_with(|| DecodeSession::new(total));
        session.slots[block_id as usize - 1] = Some(buffer.slice(1..));
        session.filled += 1;
        if size.is_some() {
            session.size = size;
        }

        #[cfg(feature = "logging")]
        debug!(
            "Decode request: fragment {}/{} ({} buffered)",
            block_id, total_blocks, session.filled
        );

        if !session.is_complete() {
            return Ok(Vec::new());
        }

        let Some(DecodeSession { slots, size, .. }) = self.session.take() else {
            return Ok(Vec::new());
        };
        let size = size.ok_or_else(|| {
            CodingError::InvalidMessage(format!(
                "session of {} fragments carried no size",
                total_blocks
            ))
        })?;
        let fragments: Vec<Bytes> = slots.into_iter().flatten().collect();
        let buffer = Recombiner::new(self.codec, size.params)?.recombine(&fragments, size.file_size)?;
        Ok(vec![Response::DecodeReturn { buffer }])
    }
}

/// An [`ErasureWorker`] running on its own thread
///
/// Requests go in through [`WorkerHandle::send`]; every response (or error)
/// comes back through [`WorkerHandle::recv`] in order. Dropping the handle
/// closes the request channel and joins the thread after it finishes any
/// request already in flight.
pub struct WorkerHandle {
    requests: Option<Sender<Request>>,
    responses: Receiver<Result<Response, CodingError>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Start a worker thread over the process-wide codec
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (resp_tx, resp_rx) = mpsc::channel();

        let thread = thread::spawn(move || {
            let mut worker = ErasureWorker::new(Codec::shared());
            for request in req_rx {
                let sent = match worker.handle(request) {
                    Ok(responses) => responses.into_iter().try_for_each(|r| resp_tx.send(Ok(r))),
                    Err(e) => {
                        #[cfg(feature = "logging")]
                        warn!("Worker request failed: {}", e);
                        resp_tx.send(Err(e))
                    }
                };
                if sent.is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(req_tx),
            responses: resp_rx,
            thread: Some(thread),
        }
    }

    /// Queue a request
    pub fn send(&self, request: Request) -> Result<(), CodingError> {
        self.requests
            .as_ref()
            .ok_or_else(|| CodingError::InvalidMessage("worker closed".into()))?
            .send(request)
            .map_err(|_| CodingError::InvalidMessage("worker stopped".into()))
    }

    /// Block until the next response, or `None` once the worker has exited
    pub fn recv(&self) -> Option<Result<Response, CodingError>> {
        self.responses.recv().ok()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
