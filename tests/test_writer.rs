//! Transmission over sockets that accept fewer bytes than offered.

use beacon::config::Limits;
use beacon::http::response::{FileStream, Response};
use beacon::http::writer::{Progress, ResponseWriter};
use std::io::{self, Seek, SeekFrom, Write};

/// Accepts at most `per_write` bytes per call and, when `stall_every` is set,
/// reports `WouldBlock` on every n-th call.
struct TrickleSocket {
    received: Vec<u8>,
    per_write: usize,
    stall_every: Option<usize>,
    calls: usize,
}

impl TrickleSocket {
    fn new(per_write: usize) -> Self {
        Self {
            received: Vec::new(),
            per_write,
            stall_every: None,
            calls: 0,
        }
    }

    fn stalling(per_write: usize, every: usize) -> Self {
        Self {
            stall_every: Some(every),
            ..Self::new(per_write)
        }
    }
}

impl Write for TrickleSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.calls += 1;
        if let Some(every) = self.stall_every {
            if self.calls % every == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
        }
        let n = buf.len().min(self.per_write);
        self.received.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Rejects every write.
struct BrokenSocket;

impl Write for BrokenSocket {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn file_of(len: usize) -> (std::fs::File, Vec<u8>) {
    let contents: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&contents).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    (file, contents)
}

fn split_head(bytes: &[u8]) -> (&[u8], &[u8]) {
    let end = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("head terminator")
        + 4;
    bytes.split_at(end)
}

#[test]
fn buffered_response_survives_one_byte_writes() {
    let mut socket = TrickleSocket::new(1);
    let mut writer = ResponseWriter::new(Response::ok("pong"), &Limits::default()).unwrap();

    assert_eq!(writer.write_to(&mut socket).unwrap(), Progress::Complete);
    assert_eq!(
        socket.received,
        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\npong".to_vec()
    );
    assert_eq!(writer.bytes_sent(), 4);
}

#[test]
fn buffered_response_resumes_after_would_block() {
    let mut socket = TrickleSocket::stalling(3, 4);
    let mut writer = ResponseWriter::new(Response::ok("hello world"), &Limits::default()).unwrap();

    let mut wakes = 0;
    while writer.write_to(&mut socket).unwrap() == Progress::Pending {
        wakes += 1;
        assert!(wakes < 100, "transmission never completed");
    }

    assert!(wakes > 0);
    let (head, body) = split_head(&socket.received);
    assert_eq!(head, b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\n");
    assert_eq!(body, b"hello world");
}

#[test]
fn streamed_file_is_sent_in_bounded_chunks_with_one_head() {
    let limits = Limits::default();
    let (file, contents) = file_of(5000);
    let mut writer =
        ResponseWriter::new(Response::file(FileStream::new(file, 5000)), &limits).unwrap();
    let mut socket = TrickleSocket::new(1);

    assert!(writer.is_streaming());
    assert!(!writer.head_written());

    let mut wakes = 0;
    let mut last_sent = 0;
    loop {
        let progress = writer.write_to(&mut socket).unwrap();
        wakes += 1;

        let sent = writer.bytes_sent();
        assert!(sent >= last_sent);
        assert!(sent - last_sent <= limits.chunk_size as u64);
        assert!(sent <= 5000);
        assert!(writer.head_written());
        last_sent = sent;

        if progress == Progress::Complete {
            break;
        }
    }

    assert_eq!(wakes, 5); // ceil(5000 / 1024)
    assert_eq!(writer.bytes_sent(), 5000);

    let (head, body) = split_head(&socket.received);
    assert_eq!(head, b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\n");
    assert_eq!(body, &contents[..]);
    assert_eq!(
        socket
            .received
            .windows(8)
            .filter(|w| *w == b"HTTP/1.1")
            .count(),
        1
    );
}

#[test]
fn streamed_file_resumes_partial_chunks_after_would_block() {
    let limits = Limits {
        chunk_size: 100,
        ..Limits::default()
    };
    let (file, contents) = file_of(2500);
    let mut writer =
        ResponseWriter::new(Response::file(FileStream::new(file, 2500)), &limits).unwrap();
    let mut socket = TrickleSocket::stalling(7, 5);

    let mut wakes = 0;
    while writer.write_to(&mut socket).unwrap() == Progress::Pending {
        wakes += 1;
        assert!(wakes < 10_000, "transmission never completed");
    }

    let (_, body) = split_head(&socket.received);
    assert_eq!(body, &contents[..]);
    assert_eq!(writer.bytes_sent(), 2500);
}

#[test]
fn file_shorter_than_announced_is_an_error() {
    let (file, _) = file_of(1500);
    let limits = Limits::default();
    let mut writer =
        ResponseWriter::new(Response::file(FileStream::new(file, 3000)), &limits).unwrap();
    let mut socket = TrickleSocket::new(usize::MAX);

    assert_eq!(writer.write_to(&mut socket).unwrap(), Progress::Pending);
    assert_eq!(writer.write_to(&mut socket).unwrap(), Progress::Pending);
    let err = writer.write_to(&mut socket).unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    assert_eq!(writer.bytes_sent(), 1500);
}

#[test]
fn write_error_abandons_response() {
    let mut writer = ResponseWriter::new(Response::ok("pong"), &Limits::default()).unwrap();
    let err = writer.write_to(&mut BrokenSocket).unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(writer.bytes_sent(), 0);
}

#[test]
fn oversized_head_is_rejected() {
    let limits = Limits {
        max_header: 8,
        ..Limits::default()
    };
    assert!(ResponseWriter::new(Response::ok("pong"), &limits).is_err());
}
