//! End-to-end test driving the real `kv-server` binary over an actual TCP
//! socket: spawn the process, connect, send framed commands, and assert on
//! the framed responses. This is the only place in the test suite that
//! exercises the demonstration binary (`src/bin/kv_server.rs`) rather than
//! the library directly.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use tinykv::buffer::Buffer;
use tinykv::protocol::{marshal_request, unmarshal_response, Request, Response};

struct ServerProcess {
    child: Child,
    port: u16,
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_server(port: u16) -> ServerProcess {
    let exe = env!("CARGO_BIN_EXE_kv-server");
    let child = Command::new(exe)
        .args(["--port", &port.to_string(), "--idle-timeout-ms", "200"])
        .spawn()
        .expect("spawn kv-server");
    ServerProcess { child, port }
}

fn connect_with_retry(port: u16) -> TcpStream {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match TcpStream::connect(("127.0.0.1", port)) {
            Ok(stream) => return stream,
            Err(e) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(20));
                let _ = e;
            }
            Err(e) => panic!("could not connect to kv-server on port {port}: {e}"),
        }
    }
}

fn send_command(stream: &mut TcpStream, args: &[&str]) -> Response {
    let req = Request {
        args: args.iter().map(|s| s.as_bytes().to_vec()).collect(),
    };
    let mut wire = Buffer::new();
    marshal_request(&req, &mut wire).unwrap();
    stream.write_all(wire.data()).unwrap();

    let mut inbox = Buffer::new();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some((resp, _)) = unmarshal_response(inbox.data()).unwrap() {
            return resp;
        }
        let n = stream.read(&mut chunk).expect("read response");
        assert!(n > 0, "server closed the connection before replying");
        inbox.append(&chunk[..n]);
    }
}

#[test]
fn get_set_del_round_trip_over_a_real_socket() {
    let server = spawn_server(17_878);
    let mut stream = connect_with_retry(server.port);

    assert_eq!(send_command(&mut stream, &["get", "a"]), Response::Nil);
    assert_eq!(send_command(&mut stream, &["set", "a", "1"]), Response::Nil);
    assert_eq!(
        send_command(&mut stream, &["get", "a"]),
        Response::Str(b"1".to_vec())
    );
    assert_eq!(send_command(&mut stream, &["del", "a"]), Response::Int(1));
    assert_eq!(send_command(&mut stream, &["get", "a"]), Response::Nil);
}

#[test]
fn sorted_set_commands_work_over_a_real_socket() {
    let server = spawn_server(17_879);
    let mut stream = connect_with_retry(server.port);

    assert_eq!(
        send_command(&mut stream, &["zadd", "z", "1.0", "a"]),
        Response::Int(1)
    );
    assert_eq!(
        send_command(&mut stream, &["zadd", "z", "2.0", "b"]),
        Response::Int(1)
    );
    assert_eq!(
        send_command(&mut stream, &["zscore", "z", "b"]),
        Response::Dbl(2.0)
    );
    assert_eq!(
        send_command(&mut stream, &["zrank", "z", "b"]),
        Response::Int(1)
    );
    assert_eq!(send_command(&mut stream, &["zrem", "z", "a"]), Response::Int(1));
}

#[test]
fn two_concurrent_clients_observe_a_shared_store() {
    let server = spawn_server(17_880);
    let mut writer = connect_with_retry(server.port);
    let mut reader = connect_with_retry(server.port);

    assert_eq!(
        send_command(&mut writer, &["set", "shared", "x"]),
        Response::Nil
    );
    assert_eq!(
        send_command(&mut reader, &["get", "shared"]),
        Response::Str(b"x".to_vec())
    );
}

#[test]
fn an_unknown_command_gets_an_err_response_not_a_dropped_connection() {
    let server = spawn_server(17_881);
    let mut stream = connect_with_retry(server.port);

    let resp = send_command(&mut stream, &["frobnicate", "x"]);
    assert!(matches!(resp, Response::Err { .. }));
    // The connection should still be usable afterwards.
    assert_eq!(send_command(&mut stream, &["get", "x"]), Response::Nil);
}
