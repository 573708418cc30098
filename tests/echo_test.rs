//! End-to-end client/server tests over loopback UDP

use bytes::Bytes;
use std::time::Duration;
use tokio::time::timeout;
use udpmux::{frame, Addr, Client, MuxConfig, Server, Session};

fn any_local() -> Addr {
    Addr::new("127.0.0.1", 0)
}

/// Handler that parses the application frame and replies with the same
/// payload under command+1
fn frame_echo(session: &Session, payload: Bytes) {
    if let Ok((command, body)) = frame::decode(&payload) {
        let mut buf = [0u8; 1400];
        if let Ok(reply) = frame::encode(&mut buf, command + 1, body) {
            let _ = session.send(Bytes::copy_from_slice(reply));
        }
    }
}

#[tokio::test]
async fn test_framed_request_response() {
    let server = Server::bind(&any_local(), MuxConfig::default(), frame_echo)
        .await
        .expect("server bind");
    let client = Client::bind(&any_local(), MuxConfig::default())
        .await
        .expect("client bind");

    let session = client.connect(0x2001, &server.local_addr());

    // 6-byte header + 5-byte payload
    let mut buf = [0u8; 64];
    let packet = frame::encode(&mut buf, 0x1300, b"hello").expect("encode");
    assert_eq!(packet.len(), 11);
    session.send(Bytes::copy_from_slice(packet)).expect("send");

    let reply = timeout(Duration::from_secs(5), session.recv())
        .await
        .expect("reply within deadline")
        .expect("session open");

    let (command, payload) = frame::decode(&reply).expect("decode reply");
    assert_eq!(command, 0x1301);
    assert_eq!(payload, b"hello");

    client.stop();
    server.stop().await;
}

#[tokio::test]
async fn test_multiple_messages_one_session() {
    let server = Server::bind(&any_local(), MuxConfig::default(), frame_echo)
        .await
        .expect("server bind");
    let client = Client::bind(&any_local(), MuxConfig::default())
        .await
        .expect("client bind");

    let session = client.connect(0x2002, &server.local_addr());

    for i in 0u16..5 {
        let body = format!("message-{i}");
        let mut buf = [0u8; 128];
        let packet = frame::encode(&mut buf, 0x1300 + i, body.as_bytes()).expect("encode");
        session.send(Bytes::copy_from_slice(packet)).expect("send");

        let reply = timeout(Duration::from_secs(5), session.recv())
            .await
            .expect("reply within deadline")
            .expect("session open");

        let (command, payload) = frame::decode(&reply).expect("decode");
        assert_eq!(command, 0x1301 + i);
        assert_eq!(payload, body.as_bytes());
    }

    client.stop();
    server.stop().await;
}

#[tokio::test]
async fn test_two_conversations_share_one_socket() {
    let server = Server::bind(&any_local(), MuxConfig::default(), frame_echo)
        .await
        .expect("server bind");
    let client = Client::bind(&any_local(), MuxConfig::default())
        .await
        .expect("client bind");

    let first = client.connect(0x3001, &server.local_addr());
    let second = client.connect(0x3002, &server.local_addr());

    let mut buf = [0u8; 64];
    let packet = frame::encode(&mut buf, 0x1300, b"one").expect("encode").to_vec();
    first.send(Bytes::from(packet)).expect("send");

    let packet = frame::encode(&mut buf, 0x1310, b"two").expect("encode").to_vec();
    second.send(Bytes::from(packet)).expect("send");

    let reply = timeout(Duration::from_secs(5), first.recv())
        .await
        .expect("first reply")
        .expect("session open");
    let (command, payload) = frame::decode(&reply).expect("decode");
    assert_eq!((command, payload), (0x1301, &b"one"[..]));

    let reply = timeout(Duration::from_secs(5), second.recv())
        .await
        .expect("second reply")
        .expect("session open");
    let (command, payload) = frame::decode(&reply).expect("decode");
    assert_eq!((command, payload), (0x1311, &b"two"[..]));

    // Both conversations landed as distinct sessions on the server
    assert_eq!(server.session_count(), 2);

    client.stop();
    server.stop().await;
}

#[tokio::test]
async fn test_server_stop_cancels_session_tasks() {
    let server = Server::bind(&any_local(), MuxConfig::default(), frame_echo)
        .await
        .expect("server bind");
    let client = Client::bind(&any_local(), MuxConfig::default())
        .await
        .expect("client bind");

    let session = client.connect(0x4001, &server.local_addr());
    let mut buf = [0u8; 64];
    let packet = frame::encode(&mut buf, 0x1300, b"ping").expect("encode");
    session.send(Bytes::copy_from_slice(packet)).expect("send");

    // Wait until the round trip proves the server session task is running
    let _ = timeout(Duration::from_secs(5), session.recv()).await;

    // stop() must drain the per-session tasks without hanging
    timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop completes");

    client.stop();
}
