//! Shared utilities for pump integration tests (raw HTTP servers, pipe readers).
//!
//! wiremock covers well-formed responses. The servers here cover what it
//! cannot: bodies that never end and bodies cut off mid-transfer.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound on how long a trickle connection keeps sending.
const TRICKLE_LIFETIME: Duration = Duration::from_secs(60);

/// Starts a server on 127.0.0.1 that hands each connection to `handler`
/// after consuming the request head.
pub fn spawn_server<F>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("test server address");
    let handler = Arc::new(handler);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                let mut stream = stream;
                if read_request_head(&mut stream) {
                    handler(stream);
                }
            });
        }
    });

    addr
}

/// Serves a chunked 200 response that sends 64 bytes every 10ms until the
/// client goes away.
pub fn spawn_trickle_server() -> SocketAddr {
    spawn_server(|mut stream| {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: video/mp2t\r\nTransfer-Encoding: chunked\r\n\r\n";
        if stream.write_all(head.as_bytes()).is_err() {
            return;
        }
        let started = Instant::now();
        let payload = [0x47_u8; 64];
        while started.elapsed() < TRICKLE_LIFETIME {
            let chunk = [&b"40\r\n"[..], &payload[..], &b"\r\n"[..]].concat();
            if stream.write_all(&chunk).and_then(|()| stream.flush()).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
    })
}

/// Serves a 200 response that announces `declared_len` bytes but sends only
/// `body` before closing the connection.
pub fn spawn_truncating_server(body: &'static [u8], declared_len: usize) -> SocketAddr {
    spawn_server(move |mut stream| {
        let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {declared_len}\r\n\r\n");
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(body);
        let _ = stream.flush();
        // Dropping the stream closes the connection mid-body.
    })
}

/// Returns an address on which nothing is listening.
pub fn closed_port_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    addr
}

/// Reads the pipe to end-of-data.
pub fn read_all(mut reader: impl Read) -> Vec<u8> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).expect("read conduit");
    data
}

/// Reads the pipe to end-of-data on a helper thread, giving up after `limit`.
///
/// `None` means end-of-data was not reached in time.
pub fn read_all_within<R>(reader: R, limit: Duration) -> Option<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(read_all(reader));
    });
    rx.recv_timeout(limit).ok()
}

/// Reads exactly `len` bytes from the pipe.
pub fn read_exact_bytes(reader: &mut impl Read, len: usize) -> Vec<u8> {
    let mut data = vec![0_u8; len];
    reader.read_exact(&mut data).expect("read from conduit");
    data
}

/// Polls `condition` every 20ms until it holds or `limit` passes.
pub fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < limit {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

fn read_request_head(stream: &mut TcpStream) -> bool {
    let Ok(clone) = stream.try_clone() else {
        return false;
    };
    let mut reader = BufReader::new(clone);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return false,
            Ok(_) if line == "\r\n" => return true,
            Ok(_) => {}
        }
    }
}
