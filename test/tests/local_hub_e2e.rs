/// End-to-end: several sessions talking through the in-process LocalHub
use log::info;

use peerlink_peer::{
    shared::{ConnectionStatus, InboundPacket, Packet, PacketReliability},
    transport::local::{LinkConditionerConfig, LocalHub},
    DisconnectReason, SessionConfig,
};
use peerlink_test::{
    collect_packets, exchange_events, exchange_events_n_times, local_session, member, peer,
    ScriptedMembership, TEST_NAMESPACE,
};

fn config() -> SessionConfig {
    SessionConfig::with_namespace(TEST_NAMESPACE)
}

#[test]
fn two_peers_connect_and_exchange_ordered_packets() {
    let hub = LocalHub::new();
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(&hub, "bob", config());
    let (a, b) = (peer("alice"), peer("bob"));

    assert!(alice.connect(&b));
    let events = exchange_events(&mut [&mut alice, &mut bob]);
    assert_eq!(events[0].connected, vec![b.clone()]);
    assert_eq!(events[1].connected, vec![a.clone()]);

    let received = collect_packets(&mut bob);
    for index in 0..50u8 {
        assert!(alice.send(&b, &[index], 1, PacketReliability::ReliableOrdered));
    }
    bob.tick();

    let received = received.lock();
    let order: Vec<u8> = received.iter().map(|packet| packet.payload()[0]).collect();
    assert_eq!(order, (0..50u8).collect::<Vec<_>>());
    assert!(received.iter().all(|packet| packet.sender() == Some(&a)));
    assert_eq!(alice.lookup(&b).map(|record| record.bytes_sent), Some(50));
    assert_eq!(bob.lookup(&a).map(|record| record.bytes_received), Some(50));
}

#[test]
fn packets_sent_while_connecting_arrive_once_accepted() {
    let hub = LocalHub::new();
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(
        &hub,
        "bob",
        SessionConfig {
            auto_accept: false,
            ..config()
        },
    );
    let (a, b) = (peer("alice"), peer("bob"));
    let received = collect_packets(&mut bob);

    alice.connect(&b);
    assert!(alice.send(&b, b"early", 0, PacketReliability::ReliableOrdered));
    let events = exchange_events(&mut [&mut alice, &mut bob]);
    assert_eq!(events[1].requests, vec![a.clone()]);
    assert_eq!(alice.status(&b), ConnectionStatus::Connecting);

    bob.accept(Some(&a));
    let events = exchange_events_n_times(&mut [&mut alice, &mut bob], 1);
    assert_eq!(events[0].connected, vec![b.clone()]);
    assert_eq!(events[1].connected, vec![a]);

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].payload(), b"early");
}

#[test]
fn rejected_request_fails_the_requester() {
    let hub = LocalHub::new();
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(
        &hub,
        "bob",
        SessionConfig {
            auto_accept: false,
            ..config()
        },
    );
    let (a, b) = (peer("alice"), peer("bob"));

    alice.connect(&b);
    exchange_events(&mut [&mut alice, &mut bob]);
    bob.reject(&a);
    let events = exchange_events(&mut [&mut alice, &mut bob]);

    assert_eq!(events[0].disconnect_reasons(&b), vec![DisconnectReason::Failed]);
    assert_eq!(alice.status(&b), ConnectionStatus::Failed);
    assert!(bob.snapshot().is_empty());
}

#[test]
fn lossy_link_keeps_reliable_ordered_traffic_intact() {
    let hub = LocalHub::with_conditioner(LinkConditionerConfig::new(0.5, 0.5, 40));
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(
        &hub,
        "bob",
        SessionConfig {
            inbound_capacity: 4096,
            ..config()
        },
    );
    let b = peer("bob");
    alice.connect(&b);
    exchange_events(&mut [&mut alice, &mut bob]);
    assert_eq!(alice.lookup(&b).and_then(|record| record.round_trip_estimate_ms), Some(40));

    let received = collect_packets(&mut bob);
    for index in 0..200u16 {
        let bytes = index.to_be_bytes();
        alice.send(&b, &bytes, 0, PacketReliability::ReliableOrdered);
        alice.send(&b, &bytes, 1, PacketReliability::UnreliableUnordered);
        alice.send(&b, &bytes, 1, PacketReliability::ReliableUnordered);
    }
    bob.receive();
    bob.drain(usize::MAX);

    let received = received.lock();
    let of_tier = |tier: PacketReliability| -> Vec<u16> {
        received
            .iter()
            .filter(|packet| packet.reliability() == tier)
            .map(|packet| u16::from_be_bytes([packet.payload()[0], packet.payload()[1]]))
            .collect()
    };

    assert_eq!(
        of_tier(PacketReliability::ReliableOrdered),
        (0..200u16).collect::<Vec<_>>()
    );
    let mut unordered = of_tier(PacketReliability::ReliableUnordered);
    unordered.sort();
    assert_eq!(unordered, (0..200u16).collect::<Vec<_>>());
    let unreliable = of_tier(PacketReliability::UnreliableUnordered);
    info!("{} of 200 unreliable packets survived", unreliable.len());
    assert!(unreliable.len() <= 200);
}

#[test]
fn relay_links_are_refused_when_relays_are_off() {
    let hub = LocalHub::new();
    let mut alice = local_session(
        &hub,
        "alice",
        SessionConfig {
            allow_relay: false,
            ..config()
        },
    );
    let mut bob = local_session(&hub, "bob", config());
    let (a, b) = (peer("alice"), peer("bob"));
    hub.force_relay(&a, &b);

    alice.connect(&b);
    let events = exchange_events(&mut [&mut alice, &mut bob]);
    assert_eq!(events[0].disconnect_reasons(&b), vec![DisconnectReason::RelayRefused]);
    assert!(events[0].connected.is_empty());

    // bob allows relays, so it saw the link come up before alice closed it
    assert_eq!(events[1].connected, vec![a.clone()]);
    assert_eq!(events[1].disconnect_reasons(&a), vec![DisconnectReason::Closed]);
    assert!(!hub.is_linked(&a, &b));
    assert_eq!(alice.status(&b), ConnectionStatus::Failed);
}

#[test]
fn severed_link_closes_both_sides() {
    let hub = LocalHub::new();
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(&hub, "bob", config());
    let (a, b) = (peer("alice"), peer("bob"));
    alice.connect(&b);
    exchange_events(&mut [&mut alice, &mut bob]);

    hub.sever(&a, &b);
    let events = exchange_events(&mut [&mut alice, &mut bob]);

    assert_eq!(events[0].disconnect_reasons(&b), vec![DisconnectReason::Closed]);
    assert_eq!(events[1].disconnect_reasons(&a), vec![DisconnectReason::Closed]);
    assert_eq!(alice.peer_count(), 0);
    assert_eq!(bob.peer_count(), 0);
    assert!(!alice.send(&b, &[1], 0, PacketReliability::ReliableOrdered));
}

#[test]
fn dropped_session_closes_its_links() {
    let hub = LocalHub::new();
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(&hub, "bob", config());
    let b = peer("bob");
    alice.connect(&b);
    exchange_events(&mut [&mut alice, &mut bob]);

    drop(bob);
    let events = exchange_events(&mut [&mut alice]);

    assert_eq!(events[0].disconnect_reasons(&b), vec![DisconnectReason::Closed]);
    assert_eq!(hub.endpoint_count(), 1);
}

#[test]
fn traffic_from_another_namespace_is_ignored() {
    let hub = LocalHub::new();
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(&hub, "bob", config());
    let (a, b) = (peer("alice"), peer("bob"));
    alice.connect(&b);
    exchange_events(&mut [&mut alice, &mut bob]);

    hub.inject(
        &a,
        InboundPacket {
            namespace: "OtherGame".to_string(),
            packet: Packet::incoming(b, vec![1u8], 0, PacketReliability::ReliableOrdered),
        },
    );
    alice.receive();

    assert_eq!(alice.queued_packets(), 0);
    assert_eq!(alice.diagnostics().foreign_packets, 1);
}

#[test]
fn roster_builds_a_full_mesh() {
    let hub = LocalHub::new();
    let ids = ["alice", "bob", "carol"];
    let group = ScriptedMembership::with_roster(ids.iter().map(|id| member(id)).collect());
    let mut alice = local_session(&hub, "alice", config());
    let mut bob = local_session(&hub, "bob", config());
    let mut carol = local_session(&hub, "carol", config());

    alice.sync_membership(&group);
    bob.sync_membership(&group);
    carol.sync_membership(&group);
    exchange_events_n_times(&mut [&mut alice, &mut bob, &mut carol], 2);

    assert_eq!(alice.peer_count(), 2);
    assert_eq!(bob.peer_count(), 2);
    assert_eq!(carol.peer_count(), 2);

    let at_bob = collect_packets(&mut bob);
    let at_carol = collect_packets(&mut carol);
    let report = alice.broadcast(b"state", 0, PacketReliability::ReliableOrdered);
    assert_eq!(report.delivered, 2);
    exchange_events_n_times(&mut [&mut alice, &mut bob, &mut carol], 1);

    assert_eq!(at_bob.lock().len(), 1);
    assert_eq!(at_carol.lock().len(), 1);
}
