//! Scatter writer (C8): performs partial-progress vectored writes of
//! `[headers, file-body]`, rearming on backpressure.

use std::io::{self, IoSlice, Write};

/// Outcome of a single vectored write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Some, but not all, bytes were sent; call again once writable.
    Progress,
    /// The kernel's send buffer is full; re-arm for write-readiness.
    WouldBlock,
    /// Every byte of both regions has been sent.
    Complete,
    /// An unrecoverable error; the connection should be closed.
    Failed,
}

/// Tracks how much of a two-region response (fixed header bytes, then a
/// memory-mapped file body) has been retired.
///
/// Each invocation recomputes the remaining slices from the running counts
/// rather than mutating `iov_base`/`iov_len` in place (§9 open question (d));
/// this sidesteps the reference implementation's dubious
/// `bytes_have_send - m_write_idx` arithmetic entirely.
#[derive(Debug, Default)]
pub struct ResponseSend {
    header_sent: usize,
    body_sent: usize,
}

impl ResponseSend {
    pub fn new() -> Self {
        ResponseSend::default()
    }

    /// Attempts one vectored write of whatever remains of `header` and
    /// `body`, advancing internal progress counters.
    pub fn write_once<W: Write>(&mut self, sock: &mut W, header: &[u8], body: &[u8]) -> WriteOutcome {
        let header_remaining = &header[self.header_sent.min(header.len())..];
        let body_remaining = &body[self.body_sent.min(body.len())..];

        if header_remaining.is_empty() && body_remaining.is_empty() {
            return WriteOutcome::Complete;
        }

        let iov = [IoSlice::new(header_remaining), IoSlice::new(body_remaining)];
        match sock.write_vectored(&iov) {
            Ok(0) => WriteOutcome::Failed,
            Ok(mut n) => {
                let take_header = n.min(header_remaining.len());
                self.header_sent += take_header;
                n -= take_header;
                self.body_sent += n;

                if self.header_sent >= header.len() && self.body_sent >= body.len() {
                    WriteOutcome::Complete
                } else {
                    WriteOutcome::Progress
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => WriteOutcome::WouldBlock,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => WriteOutcome::Progress,
            Err(_) => WriteOutcome::Failed,
        }
    }
}
