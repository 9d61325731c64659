//! Demonstration TCP server binary.
//!
//! Thin, intentionally unhardened wiring of `tinykv`'s core over a real
//! socket (`SPEC_FULL.md` §4.12): one OS thread per accepted connection,
//! a `Mutex<Store>` shared across them, and a background sweep thread that
//! drains `timers::IdleTimer` and closes connections that have gone quiet.
//! None of the invariant-bearing logic lives here — it is all in the
//! library crate. This binary owns the only blocking I/O in the repository.

use std::collections::HashMap as StdHashMap;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;

use tinykv::buffer::Buffer;
use tinykv::config::{DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_PORT, IDLE_SWEEP_INTERVAL_MS};
use tinykv::protocol;
use tinykv::store::Store;
use tinykv::timefn;
use tinykv::timers::IdleTimer;

/// In-memory key-value server speaking the tinykv framed protocol over TCP.
#[derive(Parser, Debug)]
#[command(name = "kv-server", version)]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Milliseconds of inactivity after which an idle connection is closed.
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_MS)]
    idle_timeout_ms: u64,
}

/// Shared state reachable from every connection thread and the sweeper.
struct Shared {
    store: Mutex<Store>,
    idle_timer: Mutex<IdleTimer>,
    connections: Mutex<StdHashMap<u64, TcpStream>>,
    next_conn_id: AtomicU64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let listener = match TcpListener::bind(("127.0.0.1", cli.port)) {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind port {}: {e}", cli.port);
            std::process::exit(1);
        }
    };
    log::info!("tinykv listening on {}", listener.local_addr().unwrap());

    let shared = Arc::new(Shared {
        store: Mutex::new(Store::new()),
        idle_timer: Mutex::new(IdleTimer::new(cli.idle_timeout_ms)),
        connections: Mutex::new(StdHashMap::new()),
        next_conn_id: AtomicU64::new(1),
    });

    spawn_idle_sweeper(Arc::clone(&shared));

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("failed to accept connection: {e}");
                continue;
            }
        };
        let shared = Arc::clone(&shared);
        thread::spawn(move || handle_connection(stream, shared));
    }
}

/// Periodically drains `idle_timer` and shuts down any connection whose
/// socket is still registered, per `SPEC_FULL.md` §4.9's FIFO-by-expiry
/// eviction policy.
fn spawn_idle_sweeper(shared: Arc<Shared>) {
    thread::spawn(move || loop {
        thread::sleep(Duration::from_millis(IDLE_SWEEP_INTERVAL_MS));
        let expired = shared.idle_timer.lock().unwrap().expire(timefn::now_ms());
        if expired.is_empty() {
            continue;
        }
        let mut conns = shared.connections.lock().unwrap();
        for conn_id in expired {
            if let Some(stream) = conns.remove(&conn_id) {
                log::debug!("closing idle connection {conn_id}");
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    });
}

fn handle_connection(stream: TcpStream, shared: Arc<Shared>) {
    let conn_id = shared.next_conn_id.fetch_add(1, Ordering::Relaxed);
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    log::info!("connection {conn_id} from {peer} opened");

    let mut idle_handle = shared
        .idle_timer
        .lock()
        .unwrap()
        .register(conn_id, timefn::now_ms());
    shared
        .connections
        .lock()
        .unwrap()
        .insert(conn_id, stream.try_clone().expect("clone stream for registry"));

    if let Err(e) = connection_loop(stream, &shared, conn_id, &mut idle_handle) {
        log::debug!("connection {conn_id} closed: {e}");
    }

    shared.idle_timer.lock().unwrap().remove(idle_handle);
    shared.connections.lock().unwrap().remove(&conn_id);
    log::info!("connection {conn_id} from {peer} closed");
}

fn connection_loop(
    mut stream: TcpStream,
    shared: &Arc<Shared>,
    conn_id: u64,
    idle_handle: &mut tinykv::timers::ConnHandle,
) -> std::io::Result<()> {
    let mut inbox = Buffer::new();
    let mut read_buf = [0u8; 64 * 1024];

    loop {
        while let Some((req, consumed)) =
            unmarshal_or_close(inbox.data(), conn_id)?
        {
            inbox.consume(consumed);

            let response = shared.store.lock().unwrap().execute(&req.args);

            let mut outbox = Buffer::new();
            if protocol::marshal_response(&response, &mut outbox).is_err() {
                log::warn!("connection {conn_id}: response exceeded the frame limit, dropping");
                continue;
            }
            stream.write_all(outbox.data())?;

            *idle_handle = shared
                .idle_timer
                .lock()
                .unwrap()
                .mark_active(*idle_handle, timefn::now_ms());
        }

        let n = stream.read(&mut read_buf)?;
        if n == 0 {
            return Ok(()); // peer closed the connection
        }
        inbox.append(&read_buf[..n]);
    }
}

/// Thin wrapper translating a malformed frame into a connection close rather
/// than propagating `CodecError` up through `std::io::Result`: the
/// demonstration binary does not attempt to resynchronize a stream after a
/// length-prefix violation.
fn unmarshal_or_close(
    data: &[u8],
    conn_id: u64,
) -> std::io::Result<Option<(protocol::Request, usize)>> {
    match protocol::unmarshal_request(data) {
        Ok(frame) => Ok(frame),
        Err(e) => {
            log::warn!("connection {conn_id}: {e}, closing");
            Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        }
    }
}
