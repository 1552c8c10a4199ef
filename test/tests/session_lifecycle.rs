/// Connection lifecycle as seen through a session: handshakes, stale
/// notifications, relay policy, explicit teardown.
use peerlink_peer::{
    shared::{
        ConnectionStatus, FixedIdentity, LinkPath, MembershipEvent, PeerId, TransportError,
        TransportEvent,
    },
    ConfigError, DisconnectReason, PeerLinkError, PeerSession, SessionConfig,
};
use peerlink_test::{
    assert_status, connected_peer, init_logger, member, peer, recording_session, session_with,
    PumpedEvents, RecordingTransport, TransportCall, TEST_NAMESPACE,
};

fn config() -> SessionConfig {
    SessionConfig::with_namespace(TEST_NAMESPACE)
}

#[test]
fn new_session_binds_and_accepts_everyone() {
    let session = recording_session("self");

    assert_eq!(
        session.transport().calls(),
        &[
            TransportCall::Bind {
                namespace: TEST_NAMESPACE.to_string(),
                allow_relay: true,
            },
            TransportCall::AcceptConnection(None),
        ]
    );
    assert_eq!(session.self_id(), &peer("self"));
    assert_eq!(session.peer_count(), 0);
}

#[test]
fn session_requires_a_logged_in_identity() {
    init_logger();
    let result = PeerSession::new(config(), &FixedIdentity::logged_out(), RecordingTransport::new());

    assert!(matches!(result, Err(ConfigError::MissingIdentity)));
}

#[test]
fn invalid_config_never_reaches_the_transport() {
    init_logger();
    let bad = SessionConfig::with_namespace("has space");
    let result = PeerSession::new(bad, &FixedIdentity::new("self"), RecordingTransport::new());

    assert!(matches!(result, Err(ConfigError::InvalidNamespace { .. })));
}

#[test]
fn bind_failure_is_a_config_error() {
    init_logger();
    let transport = RecordingTransport::failing_bind(TransportError::AlreadyBound {
        namespace: "Other".to_string(),
    });
    let result = PeerSession::new(config(), &FixedIdentity::new("self"), transport);

    assert!(matches!(
        result,
        Err(ConfigError::Bind(TransportError::AlreadyBound { .. }))
    ));
}

#[test]
fn connect_establish_close_then_stale_establish() {
    let mut session = recording_session("self");
    let p = peer("p");

    assert!(session.connect(&p));
    assert_status!(session, p, ConnectionStatus::Connecting);

    session.transport_mut().establish(&p, LinkPath::Direct);
    let events = PumpedEvents::from_events(session.receive());
    assert_eq!(events.connected, vec![p.clone()]);
    assert!(session.is_connected_to(&p));

    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionClosed(p.clone()));
    let events = PumpedEvents::from_events(session.receive());
    assert_eq!(events.disconnect_reasons(&p), vec![DisconnectReason::Closed]);

    session.transport_mut().establish(&p, LinkPath::Direct);
    let events = PumpedEvents::from_events(session.receive());
    assert!(events.is_empty());
    assert!(session.lookup(&p).is_none());
    assert_status!(session, p, ConnectionStatus::Disconnected);
    assert_eq!(session.diagnostics().stale_events, 1);
}

#[test]
fn duplicate_connect_reaches_the_transport_once() {
    let mut session = recording_session("self");
    let p = peer("p");

    assert!(session.connect(&p));
    assert!(session.connect(&p));
    session.transport_mut().establish(&p, LinkPath::Direct);
    session.receive();
    assert!(session.connect(&p));

    assert_eq!(session.transport().requests(), vec![p]);
    assert_eq!(session.snapshot().len(), 1);
}

#[test]
fn connecting_to_self_or_nobody_is_refused() {
    let mut session = recording_session("self");

    assert!(!session.connect(&peer("self")));
    assert!(!session.connect(&PeerId::invalid()));
    assert!(session.transport().requests().is_empty());
    assert!(session.snapshot().is_empty());
}

#[test]
fn unreachable_peer_leaves_a_failed_record() {
    let mut session = recording_session("self");
    let p = peer("p");
    session.transport_mut().set_unreachable(&p);

    assert!(!session.connect(&p));
    assert_status!(session, p, ConnectionStatus::Failed);
    assert_eq!(session.diagnostics().transport_failures, 1);

    // a failed record is replaced, so the transport is asked again
    assert!(!session.connect(&p));
    assert_eq!(session.transport().requests().len(), 2);
}

#[test]
fn failed_handshake_is_reported_once() {
    let mut session = recording_session("self");
    let p = peer("p");
    session.connect(&p);

    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionFailed(p.clone()));
    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionClosed(p.clone()));
    let events = PumpedEvents::from_events(session.receive());

    assert_eq!(events.disconnect_reasons(&p), vec![DisconnectReason::Failed]);
    assert!(session.lookup(&p).is_none());
}

#[test]
fn relayed_link_is_refused_when_relays_are_off() {
    let mut session = session_with(
        "self",
        SessionConfig {
            allow_relay: false,
            ..config()
        },
    );
    let p = peer("p");
    session.connect(&p);

    session.transport_mut().establish(&p, LinkPath::Relay);
    let events = PumpedEvents::from_events(session.receive());

    assert!(events.connected.is_empty());
    assert_eq!(events.disconnect_reasons(&p), vec![DisconnectReason::RelayRefused]);
    assert_eq!(session.transport().closes(), vec![p.clone()]);
    assert_status!(session, p, ConnectionStatus::Failed);
}

#[test]
fn relayed_link_is_kept_by_default() {
    let mut session = recording_session("self");
    let p = peer("p");
    session.connect(&p);

    session.transport_mut().establish(&p, LinkPath::Relay);
    let events = PumpedEvents::from_events(session.receive());

    assert_eq!(events.connected, vec![p.clone()]);
    let record = session.lookup(&p).expect("record exists");
    assert!(record.is_relay);
    assert!(record.is_connected());
}

#[test]
fn incoming_requests_are_accepted_automatically() {
    let mut session = recording_session("self");
    let p = peer("p");

    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionRequested(p.clone()));
    let events = PumpedEvents::from_events(session.receive());

    assert!(events.requests.is_empty());
    assert_status!(session, p, ConnectionStatus::Connecting);
    assert!(session
        .transport()
        .calls()
        .contains(&TransportCall::AcceptConnection(Some(p.clone()))));

    session.transport_mut().establish(&p, LinkPath::Direct);
    let events = PumpedEvents::from_events(session.receive());
    assert_eq!(events.connected, vec![p]);
}

#[test]
fn manual_accept_surfaces_requests() {
    let mut session = session_with(
        "self",
        SessionConfig {
            auto_accept: false,
            ..config()
        },
    );
    let (p, q) = (peer("p"), peer("q"));
    assert!(!session
        .transport()
        .calls()
        .contains(&TransportCall::AcceptConnection(None)));

    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionRequested(p.clone()));
    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionRequested(q.clone()));
    let events = PumpedEvents::from_events(session.receive());
    assert_eq!(events.requests, vec![p.clone(), q.clone()]);
    assert_status!(session, p, ConnectionStatus::Disconnected);

    session.accept(Some(&p));
    assert_status!(session, p, ConnectionStatus::Connecting);

    session.reject(&q);
    assert_eq!(session.transport().closes(), vec![q.clone()]);
    assert_status!(session, q, ConnectionStatus::Disconnected);
}

#[test]
fn accepting_everyone_later_applies_to_new_requests() {
    let mut session = session_with(
        "self",
        SessionConfig {
            auto_accept: false,
            ..config()
        },
    );
    let p = peer("p");

    session.accept(None);
    session
        .transport_mut()
        .push_event(TransportEvent::ConnectionRequested(p.clone()));
    let events = PumpedEvents::from_events(session.receive());

    assert!(events.requests.is_empty());
    assert_status!(session, p, ConnectionStatus::Connecting);
}

#[test]
fn disconnect_cancels_a_pending_handshake() {
    let mut session = recording_session("self");
    let p = peer("p");
    session.connect(&p);

    assert!(session.disconnect(&p));
    assert!(!session.disconnect(&p));
    assert_eq!(session.transport().closes(), vec![p.clone()]);

    session.transport_mut().establish(&p, LinkPath::Direct);
    let events = PumpedEvents::from_events(session.receive());
    assert_eq!(events.disconnect_reasons(&p), vec![DisconnectReason::Local]);
    assert!(events.connected.is_empty());
    assert_status!(session, p, ConnectionStatus::Disconnected);
}

#[test]
fn round_trip_samples_feed_the_estimate() {
    let mut session = recording_session("self");
    let p = connected_peer(&mut session, "p");

    session
        .transport_mut()
        .push_event(TransportEvent::RoundTrip(p.clone(), 100));
    session.receive();

    assert_eq!(
        session.lookup(&p).and_then(|record| record.round_trip_estimate_ms),
        Some(100)
    );
}

#[test]
fn shutdown_closes_every_link_and_empties_the_queue() {
    let mut session = recording_session("self");
    let a = connected_peer(&mut session, "a");
    let b = peer("b");
    session.connect(&b);
    session
        .transport_mut()
        .push_payload(TEST_NAMESPACE, &a, &[1, 2, 3]);
    session.receive();
    assert_eq!(session.queued_packets(), 1);

    session.shutdown();

    let mut closed = session.transport().closes();
    closed.sort();
    assert_eq!(closed, vec![a.clone(), b.clone()]);
    assert_eq!(session.queued_packets(), 0);
    assert!(session.snapshot().is_empty());

    let events = PumpedEvents::from_events(session.receive());
    assert_eq!(events.disconnect_reasons(&a), vec![DisconnectReason::Local]);
    assert_eq!(events.disconnect_reasons(&b), vec![DisconnectReason::Local]);
}

#[test]
fn roster_connect_failures_become_error_events() {
    let mut session = recording_session("self");
    let b = peer("b");
    session.transport_mut().set_unreachable(&b);

    session.apply_membership(MembershipEvent::Joined(member("b")));
    let events = PumpedEvents::from_events(session.receive());

    assert_eq!(events.errors.len(), 1);
    assert!(matches!(
        &events.errors[0],
        PeerLinkError::Connect { peer, source: TransportError::Unreachable { .. } } if peer == "b"
    ));
}

#[test]
fn sessions_are_independent() {
    let mut first = recording_session("one");
    let second = recording_session("two");

    connected_peer(&mut first, "p");

    assert_eq!(first.peer_count(), 1);
    assert_eq!(second.peer_count(), 0);
    assert!(second.transport().requests().is_empty());
}
