use std::{
    collections::VecDeque,
    io,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll, Waker},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// In-memory device: answers every query line (ending in `?`) with the next
/// canned response, records what was written and stays silent once the
/// canned responses are used up.
pub struct FakeBuffer {
    responses: VecDeque<Vec<u8>>,
    readable: VecDeque<u8>,
    scanned: usize,
    written: Arc<Mutex<Vec<u8>>>,
    reader: Option<Waker>,
}

impl FakeBuffer {
    /// One response per query, each terminated by CR LF.
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            responses: lines
                .iter()
                .map(|l| format!("{}\r\n", l).into_bytes())
                .collect(),
            readable: VecDeque::new(),
            scanned: 0,
            written: Arc::default(),
            reader: None,
        }
    }

    /// Handle to the bytes written so far, usable after the buffer was moved.
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }

    fn answer_queries(&mut self) {
        let written = self.written.lock().unwrap();
        while let Some(n) = written[self.scanned..].iter().position(|b| *b == b'\n') {
            let line = String::from_utf8_lossy(&written[self.scanned..self.scanned + n]);
            if line.trim_end().ends_with('?') {
                if let Some(response) = self.responses.pop_front() {
                    self.readable.extend(response);
                }
            }
            self.scanned += n + 1;
        }
    }
}

/// Lines written to a [`FakeBuffer`], without terminators.
pub fn written_lines(written: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    let bytes = written.lock().unwrap();
    String::from_utf8_lossy(&bytes)
        .split("\r\n")
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

impl AsyncRead for FakeBuffer {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.readable.is_empty() {
            // A silent device; only a timeout or the next query gets the caller out of here.
            self.reader = Some(cx.waker().clone());
            return Poll::Pending;
        }
        let n = buf.remaining().min(self.readable.len());
        let chunk: Vec<u8> = self.readable.drain(..n).collect();
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for FakeBuffer {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written.lock().unwrap().extend_from_slice(buf);
        self.answer_queries();
        if !self.readable.is_empty() {
            if let Some(waker) = self.reader.take() {
                waker.wake();
            }
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
