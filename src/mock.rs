//! Scriptable in-memory stream for exercising the channel
//!
//! [`MockStream`] plays back a script of read steps and accepts writes
//! under configurable limits. The paired [`MockHandle`] keeps a view of
//! what the stream saw after the stream itself has been moved into a
//! channel.

use std::collections::VecDeque;
use std::io::{self, ErrorKind};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// One scripted response to a read call
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Deliver these bytes; anything that does not fit the caller's
    /// buffer is held for the next read
    Data(Vec<u8>),
    /// Report end of stream
    Close,
    /// Fail the read with an error of this kind
    Error(ErrorKind),
    /// Never complete; the stream stays open and silent
    Stall,
}

#[derive(Debug, Default)]
struct Recorded {
    written: Vec<u8>,
    write_calls: usize,
    read_requests: Vec<usize>,
    shut_down: bool,
}

/// Builder for [`MockStream`]
#[derive(Debug, Default)]
pub struct MockBuilder {
    reads: VecDeque<ReadStep>,
    max_write: Option<usize>,
    fail_write_after: Option<(usize, ErrorKind)>,
    zero_writes: bool,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one read that delivers `data`
    pub fn read(mut self, data: &[u8]) -> Self {
        self.reads.push_back(ReadStep::Data(data.to_vec()));
        self
    }

    /// Queues `data` split into consecutive fragments of the given sizes
    ///
    /// Sizes are cycled until the data runs out; zero sizes are skipped.
    /// Without any non-zero size the data is queued as a single read.
    pub fn read_fragments(mut self, data: &[u8], sizes: &[usize]) -> Self {
        if sizes.iter().all(|&s| s == 0) {
            return self.read(data);
        }
        let mut offset = 0;
        for size in sizes.iter().copied().filter(|&s| s > 0).cycle() {
            if offset >= data.len() {
                break;
            }
            let end = data.len().min(offset + size);
            self.reads.push_back(ReadStep::Data(data[offset..end].to_vec()));
            offset = end;
        }
        self
    }

    pub fn close(mut self) -> Self {
        self.reads.push_back(ReadStep::Close);
        self
    }

    pub fn read_error(mut self, kind: ErrorKind) -> Self {
        self.reads.push_back(ReadStep::Error(kind));
        self
    }

    pub fn stall(mut self) -> Self {
        self.reads.push_back(ReadStep::Stall);
        self
    }

    /// Caps the number of bytes accepted by each write call
    pub fn max_write(mut self, limit: usize) -> Self {
        self.max_write = Some(limit);
        self
    }

    /// Fails every write once `after` bytes have been accepted
    pub fn fail_write_after(mut self, after: usize, kind: ErrorKind) -> Self {
        self.fail_write_after = Some((after, kind));
        self
    }

    /// Makes every write report zero bytes accepted
    pub fn zero_writes(mut self) -> Self {
        self.zero_writes = true;
        self
    }

    pub fn build(self) -> (MockStream, MockHandle) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let stream = MockStream {
            reads: self.reads,
            max_write: self.max_write,
            fail_write_after: self.fail_write_after,
            zero_writes: self.zero_writes,
            recorded: recorded.clone(),
        };
        (stream, MockHandle { recorded })
    }
}

/// In-memory stream that follows a read script and records writes
#[derive(Debug)]
pub struct MockStream {
    reads: VecDeque<ReadStep>,
    max_write: Option<usize>,
    fail_write_after: Option<(usize, ErrorKind)>,
    zero_writes: bool,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockStream {
    pub fn builder() -> MockBuilder {
        MockBuilder::new()
    }
}

/// Observes a [`MockStream`] after it has been handed off
#[derive(Debug)]
pub struct MockHandle {
    recorded: Arc<Mutex<Recorded>>,
}

impl MockHandle {
    /// Every byte accepted by writes, in order
    pub fn written(&self) -> Vec<u8> {
        lock(&self.recorded).written.clone()
    }

    /// Number of write calls, including failed and zero-length ones
    pub fn write_calls(&self) -> usize {
        lock(&self.recorded).write_calls
    }

    /// Buffer space offered by each read call, in order
    pub fn read_requests(&self) -> Vec<usize> {
        lock(&self.recorded).read_requests.clone()
    }

    pub fn read_calls(&self) -> usize {
        lock(&self.recorded).read_requests.len()
    }

    /// Whether the stream saw a shutdown
    pub fn is_shut_down(&self) -> bool {
        lock(&self.recorded).shut_down
    }

    /// Whether the stream itself has been dropped
    pub fn is_released(&self) -> bool {
        Arc::strong_count(&self.recorded) == 1
    }
}

fn lock(recorded: &Mutex<Recorded>) -> MutexGuard<'_, Recorded> {
    recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AsyncRead for MockStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        lock(&this.recorded).read_requests.push(buf.remaining());

        match this.reads.pop_front() {
            Some(ReadStep::Data(mut data)) => {
                let n = data.len().min(buf.remaining());
                buf.put_slice(&data[..n]);
                if n < data.len() {
                    this.reads.push_front(ReadStep::Data(data.split_off(n)));
                }
                Poll::Ready(Ok(()))
            }
            Some(ReadStep::Error(kind)) => {
                Poll::Ready(Err(io::Error::new(kind, "scripted read error")))
            }
            Some(ReadStep::Stall) => {
                this.reads.push_front(ReadStep::Stall);
                Poll::Pending
            }
            Some(ReadStep::Close) | None => Poll::Ready(Ok(())),
        }
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let mut recorded = lock(&this.recorded);
        recorded.write_calls += 1;

        if let Some((after, kind)) = this.fail_write_after {
            if recorded.written.len() >= after {
                return Poll::Ready(Err(io::Error::new(kind, "scripted write error")));
            }
        }
        if this.zero_writes {
            return Poll::Ready(Ok(0));
        }

        let mut n = this.max_write.map_or(buf.len(), |limit| limit.min(buf.len()));
        if let Some((after, _)) = this.fail_write_after {
            n = n.min(after - recorded.written.len());
        }
        recorded.written.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        lock(&self.recorded).shut_down = true;
        Poll::Ready(Ok(()))
    }
}
