//! Core-only integration tests — no tokio dependency

use bytes::Bytes;
use udpmux_core::{current_timestamp, EngineConfig, ReliabilityEngine};

/// Send all output packets from one engine into another engine's input.
fn transfer(src: &mut ReliabilityEngine, dst: &mut ReliabilityEngine) {
    for packet in src.drain_output() {
        let _ = dst.input(packet);
    }
}

#[test]
fn test_basic_send_recv() {
    let config = EngineConfig::default();
    let mut client = ReliabilityEngine::new(1, config.clone());
    let mut server = ReliabilityEngine::new(1, config);

    client.send(Bytes::from("hello")).unwrap();

    // Transfer packets: client → server
    transfer(&mut client, &mut server);

    let msg = server.recv().unwrap().expect("should receive data");
    assert_eq!(msg, Bytes::from("hello"));

    // Transfer ACKs back: server → client
    server.flush().unwrap();
    transfer(&mut server, &mut client);
}

#[test]
fn test_large_message_fragmentation() {
    let config = EngineConfig::default();
    let mut client = ReliabilityEngine::new(3, config.clone());
    let mut server = ReliabilityEngine::new(3, config);

    // Larger than one MSS (1400 - 24 = 1376 bytes), so it fragments
    let data = vec![0xABu8; 4000];
    client.send(Bytes::from(data.clone())).unwrap();

    transfer(&mut client, &mut server);

    let msg = server.recv().unwrap().expect("should receive large message");
    assert_eq!(msg.len(), 4000);
    assert_eq!(&msg[..], &data[..]);
}

#[test]
fn test_conv_mismatch() {
    let config = EngineConfig::default();
    let mut client = ReliabilityEngine::new(100, config.clone());
    let mut server = ReliabilityEngine::new(999, config); // different conv

    client.send(Bytes::from("mismatch")).unwrap();

    // Transfer packets — server has a different conv, should reject them
    transfer(&mut client, &mut server);

    let msg = server.recv().unwrap();
    assert!(
        msg.is_none(),
        "server should not receive data with mismatched conv"
    );
}

#[test]
fn test_retransmission_on_loss() {
    let config = EngineConfig::default();
    let mut client = ReliabilityEngine::new(7, config.clone());
    let mut server = ReliabilityEngine::new(7, config);

    let t0 = current_timestamp();
    client.update(t0).unwrap();
    server.update(t0).unwrap();

    client.send(Bytes::from("lost once")).unwrap();

    // Drop the first transmission on the floor
    let lost = client.drain_output();
    assert!(!lost.is_empty());

    // Well past the initial 200ms RTO: the timer fires and the segment
    // goes out again
    client.update(t0 + 300).unwrap();
    transfer(&mut client, &mut server);

    let msg = server.recv().unwrap().expect("retransmitted data arrives");
    assert_eq!(msg, Bytes::from("lost once"));
    assert!(client.stats().retransmissions >= 1);

    // Ack flows back and clears the in-flight buffer
    server.update(t0 + 310).unwrap();
    transfer(&mut server, &mut client);
    client.update(t0 + 320).unwrap();
    assert_eq!(client.stats().snd_buf_size, 0);
}

#[test]
fn test_check_deadline() {
    let config = EngineConfig::default();
    let interval = config.profile.interval;
    let mut engine = ReliabilityEngine::new(9, config);

    let t0 = current_timestamp();

    // Before the first update the engine wants attention immediately
    assert_eq!(engine.check(t0), t0);

    engine.update(t0).unwrap();

    // Idle engine: next deadline is the next flush tick
    assert_eq!(engine.check(t0 + 2), t0 + interval);

    // A deadline in the past means "call update now"
    assert_eq!(engine.check(t0 + interval), t0 + interval);
}

#[test]
fn test_stats() {
    let config = EngineConfig::default();
    let mut client = ReliabilityEngine::new(2, config.clone());
    let mut server = ReliabilityEngine::new(2, config);

    client.send(Bytes::from("stats test")).unwrap();
    transfer(&mut client, &mut server);

    let _ = server.recv().unwrap();
    server.flush().unwrap();
    transfer(&mut server, &mut client);

    let stats = client.stats();
    assert!(stats.bytes_sent > 0);
    assert!(stats.packets_sent > 0);

    let stats = server.stats();
    assert!(stats.bytes_received > 0);
    assert!(stats.packets_received > 0);
}

#[test]
fn test_out_of_order_delivery() {
    let config = EngineConfig::default();
    let mut client = ReliabilityEngine::new(5, config.clone());
    let mut server = ReliabilityEngine::new(5, config);

    client.send(Bytes::from("first")).unwrap();
    client.send(Bytes::from("second")).unwrap();

    // Deliver the two packets in reverse order
    let mut packets = client.drain_output();
    packets.reverse();
    for packet in packets {
        let _ = server.input(packet);
    }

    // The engine reorders: messages come out in send order
    assert_eq!(server.recv().unwrap().unwrap(), Bytes::from("first"));
    assert_eq!(server.recv().unwrap().unwrap(), Bytes::from("second"));
}
