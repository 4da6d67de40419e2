use bytes::Bytes;
use zsock_socket::{
    new_dealer, new_pair, new_pub, new_pull, new_push, new_rep, new_req, new_router, new_stream,
    new_sub, new_xpub, new_xsub, Flag, Pattern, Socket, SocketConfig, SocketError,
};

fn frames(msg: &[Bytes]) -> Vec<&[u8]> {
    msg.iter().map(|f| f.as_ref()).collect()
}

#[test]
fn push_pull_round_robins_across_pullers() {
    let mut push = new_push("inproc://patterns-fanout").unwrap();
    let mut left = new_pull("inproc://patterns-fanout").unwrap();
    let mut right = new_pull("inproc://patterns-fanout").unwrap();

    for n in 0..4u8 {
        push.send_frame(&[n], Flag::None).unwrap();
    }

    let mut seen: Vec<u8> = Vec::new();
    for pull in [&mut left, &mut right] {
        let a = pull.recv_frame_nowait().unwrap();
        let b = pull.recv_frame_nowait().unwrap();
        assert!(matches!(pull.recv_frame_nowait(), Err(SocketError::WouldBlock)));
        seen.push(a.data()[0]);
        seen.push(b.data()[0]);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn pub_sub_filters_by_prefix() {
    let mut publisher = new_pub("inproc://patterns-weather").unwrap();
    let mut weather = new_sub("inproc://patterns-weather", "weather.").unwrap();
    let mut everything = new_sub("inproc://patterns-weather", "").unwrap();

    publisher.send_message(["weather.today", "sunny"]).unwrap();
    publisher.send_message(["sports", "3-1"]).unwrap();

    let msg = weather.recv_message_nowait().unwrap();
    assert_eq!(frames(&msg), vec![&b"weather.today"[..], b"sunny"]);
    assert!(matches!(weather.recv_message_nowait(), Err(SocketError::WouldBlock)));

    assert_eq!(everything.recv_message_nowait().unwrap().len(), 2);
    assert_eq!(everything.recv_message_nowait().unwrap()[0].as_ref(), b"sports");
}

#[test]
fn pub_without_subscribers_drops_silently() {
    let mut publisher = new_pub("inproc://patterns-lonely").unwrap();
    assert!(publisher.pollout());
    publisher.send_frame(b"nobody listens", Flag::None).unwrap();
}

#[test]
fn unsubscribe_stops_delivery() {
    let mut publisher = new_pub("inproc://patterns-unsub").unwrap();
    let mut sub = new_sub("inproc://patterns-unsub", "a").unwrap();

    publisher.send_frame(b"a1", Flag::None).unwrap();
    assert_eq!(sub.recv_frame_nowait().unwrap().data().as_ref(), b"a1");

    sub.unsubscribe(b"a").unwrap();
    publisher.send_frame(b"a2", Flag::None).unwrap();
    assert!(matches!(sub.recv_frame_nowait(), Err(SocketError::WouldBlock)));
}

#[test]
fn publisher_bound_to_several_endpoints() {
    let mut publisher = new_pub("inproc://patterns-multi-a,inproc://patterns-multi-b").unwrap();
    assert_eq!(publisher.endpoints().len(), 2);

    let mut on_a = new_sub("inproc://patterns-multi-a", "topic").unwrap();
    let mut on_b = new_sub(">inproc://patterns-multi-b", "topic,other").unwrap();

    publisher.send_message(["topic", "payload"]).unwrap();
    for sub in [&mut on_a, &mut on_b] {
        let msg = sub.recv_message_nowait().unwrap();
        assert_eq!(frames(&msg), vec![&b"topic"[..], b"payload"]);
    }
}

#[test]
fn subscriber_connecting_before_bind() {
    let mut sub = new_sub("inproc://patterns-late-pub", "").unwrap();
    let mut publisher = new_pub("inproc://patterns-late-pub").unwrap();

    publisher.send_frame(b"late", Flag::None).unwrap();
    assert_eq!(sub.recv_frame_nowait().unwrap().data().as_ref(), b"late");
}

#[test]
fn sub_cannot_send() {
    let mut sub = new_sub("inproc://patterns-sub-send", "").unwrap();
    assert!(matches!(
        sub.send_frame(b"x", Flag::None),
        Err(SocketError::Unsupported { pattern: Pattern::Sub, .. })
    ));
    assert!(!sub.pollout());
}

#[test]
fn req_rep_lockstep() {
    let mut rep = new_rep("inproc://patterns-reqrep").unwrap();
    let mut req = new_req("inproc://patterns-reqrep").unwrap();

    for n in 0..3 {
        req.send_frame(format!("ping {n}").as_bytes(), Flag::None).unwrap();
        let request = rep.recv_frame().unwrap();
        assert_eq!(request.data().as_ref(), format!("ping {n}").as_bytes());

        rep.send_frame(b"pong", Flag::None).unwrap();
        assert_eq!(req.recv_frame().unwrap().data().as_ref(), b"pong");
    }
}

#[test]
fn rep_cannot_reply_before_a_request() {
    let mut rep = new_rep("inproc://patterns-early-reply").unwrap();
    assert!(matches!(
        rep.send_frame(b"too soon", Flag::None),
        Err(SocketError::InvalidState(_))
    ));
}

#[test]
fn router_dealer_identity_roundtrip() {
    let mut router = new_router("inproc://patterns-router").unwrap();

    let config = SocketConfig {
        identity: Some(Bytes::from_static(b"worker-1")),
        ..SocketConfig::default()
    };
    let mut dealer = Socket::with_config(Pattern::Dealer, config).unwrap();
    dealer.connect("inproc://patterns-router").unwrap();

    dealer.send_frame(b"Hello", Flag::None).unwrap();
    let msg = router.recv_message().unwrap();
    assert_eq!(frames(&msg), vec![&b"worker-1"[..], b"Hello"]);

    router.send_message([&b"worker-1"[..], b"World"]).unwrap();
    assert_eq!(dealer.recv_frame().unwrap().data().as_ref(), b"World");
}

#[test]
fn router_generates_identities_and_drops_unknown() {
    let mut router = new_router("inproc://patterns-router-gen").unwrap();
    let mut first = new_dealer("inproc://patterns-router-gen").unwrap();
    let mut second = new_dealer("inproc://patterns-router-gen").unwrap();

    first.send_frame(b"one", Flag::None).unwrap();
    second.send_frame(b"two", Flag::None).unwrap();

    let a = router.recv_message().unwrap();
    let b = router.recv_message().unwrap();
    assert_eq!(a[0].len(), 5);
    assert_eq!(a[0][0], 0);
    assert_ne!(a[0], b[0]);

    router
        .send_message([&b"no-such-peer"[..], b"lost"])
        .unwrap();
    router.send_message([&b[0][..], b"for two"]).unwrap();
    assert_eq!(second.recv_frame().unwrap().data().as_ref(), b"for two");
    assert!(matches!(first.recv_frame_nowait(), Err(SocketError::WouldBlock)));
}

#[test]
fn dealer_to_rep() {
    let mut rep = new_rep("inproc://patterns-dealer-rep").unwrap();
    let mut dealer = new_dealer("inproc://patterns-dealer-rep").unwrap();

    dealer.send_message(["", "question"]).unwrap();
    let msg = rep.recv_message().unwrap();
    assert_eq!(frames(&msg), vec![&b""[..], b"question"]);

    rep.send_message(["", "answer"]).unwrap();
    assert_eq!(dealer.recv_message().unwrap()[1].as_ref(), b"answer");
}

#[test]
fn xpub_sees_subscriptions_and_xsub_receives() {
    let mut xpub = new_xpub("inproc://patterns-xpub").unwrap();
    let mut xsub = new_xsub("inproc://patterns-xpub").unwrap();

    xsub.subscribe(b"news").unwrap();
    let sub = xpub.recv_frame_nowait().unwrap();
    assert_eq!(sub.data().as_ref(), b"\x01news");

    xpub.send_message(["news.today", "body"]).unwrap();
    xpub.send_message(["weather", "rain"]).unwrap();
    assert_eq!(xsub.recv_message_nowait().unwrap()[0].as_ref(), b"news.today");
    assert!(matches!(xsub.recv_message_nowait(), Err(SocketError::WouldBlock)));

    // A raw subscription message sent by an XSUB is a subscription too.
    xsub.send_frame(b"\x01weather", Flag::None).unwrap();
    assert_eq!(xpub.recv_frame_nowait().unwrap().data().as_ref(), b"\x01weather");
    xpub.send_message(["weather", "sun"]).unwrap();
    assert_eq!(xsub.recv_message_nowait().unwrap()[1].as_ref(), b"sun");

    xsub.unsubscribe(b"news").unwrap();
    assert_eq!(xpub.recv_frame_nowait().unwrap().data().as_ref(), b"\x00news");
}

#[test]
fn pair_needs_sigils_and_takes_one_peer() {
    assert!(matches!(
        new_pair("inproc://patterns-pair").map_err(SocketError::from),
        Err(SocketError::InvalidEndpoint { .. })
    ));

    let mut left = new_pair("@inproc://patterns-pair").unwrap();
    let mut right = new_pair(">inproc://patterns-pair").unwrap();

    left.send_frame(b"ping", Flag::None).unwrap();
    assert_eq!(right.recv_frame().unwrap().data().as_ref(), b"ping");
    right.send_frame(b"pong", Flag::None).unwrap();
    assert_eq!(left.recv_frame().unwrap().data().as_ref(), b"pong");

    let mut third = Socket::new(Pattern::Pair);
    assert!(matches!(
        third.connect("inproc://patterns-pair"),
        Err(SocketError::InvalidState(_))
    ));
}

#[test]
fn stream_sockets_exchange_by_identity() {
    assert!(matches!(
        new_stream("inproc://patterns-stream").map_err(SocketError::from),
        Err(SocketError::InvalidEndpoint { .. })
    ));

    let config = SocketConfig {
        identity: Some(Bytes::from_static(b"server")),
        ..SocketConfig::default()
    };
    let mut server = Socket::with_config(Pattern::Stream, config).unwrap();
    server.bind("inproc://patterns-stream").unwrap();
    let mut client = new_stream(">inproc://patterns-stream").unwrap();
    assert_eq!(client.peer_count(), 1);

    client.set_last_client_id(b"server");
    client.write_bytes(b"hi").unwrap();

    let mut buf = [0u8; 16];
    let n = server.read_bytes(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"hi");
    assert_eq!(server.last_client_id()[0], 0, "client identity is generated");

    server.write_bytes(b"hello").unwrap();
    let n = client.read_bytes(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"hello");
    assert_eq!(client.last_client_id().as_ref(), b"server");
}

#[test]
fn incompatible_patterns_refuse_to_connect() {
    let mut publisher = Socket::new(Pattern::Pub);
    publisher.bind("inproc://patterns-mismatch").unwrap();

    let mut push = Socket::new(Pattern::Push);
    assert!(matches!(
        push.connect("inproc://patterns-mismatch"),
        Err(SocketError::IncompatiblePattern {
            local: Pattern::Push,
            remote: Pattern::Pub
        })
    ));
}

#[test]
fn constructors_reject_bad_endpoint_lists() {
    assert!(matches!(
        new_push("").map_err(SocketError::from),
        Err(SocketError::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        new_pull("bogus://nowhere").map_err(SocketError::from),
        Err(SocketError::InvalidEndpoint { .. })
    ));
}

#[test]
fn failed_constructor_keeps_attached_endpoints() {
    let err = new_push("inproc://patterns-partial,bogus://nowhere").unwrap_err();
    match &err.error {
        SocketError::InvalidEndpoint { endpoint, reason } => {
            assert_eq!(endpoint, "inproc://patterns-partial,bogus://nowhere");
            assert!(reason.contains("1 of 2"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let (_, mut push) = err.into_parts();
    assert_eq!(push.endpoints(), ["inproc://patterns-partial".to_string()]);

    // The first address is still bound and usable.
    let mut taken = Socket::new(Pattern::Push);
    assert!(matches!(
        taken.bind("inproc://patterns-partial"),
        Err(SocketError::InvalidEndpoint { .. })
    ));
    let mut pull = new_pull("inproc://patterns-partial").unwrap();
    push.send_frame(b"still here", Flag::None).unwrap();
    assert_eq!(pull.recv_frame().unwrap().data().as_ref(), b"still here");

    // Destroying the partly built socket succeeds and releases the name.
    push.destroy();
    push.destroy();
    assert!(push.is_destroyed());
    taken.bind("inproc://patterns-partial").unwrap();
}

#[test]
fn attach_defaults_by_serverish_flag() {
    let mut server = Socket::new(Pattern::Pair);
    server.attach("inproc://patterns-attach", true).unwrap();
    let mut client = Socket::new(Pattern::Pair);
    client.attach("inproc://patterns-attach", false).unwrap();

    client.send_frame(b"hi", Flag::None).unwrap();
    assert_eq!(server.recv_frame().unwrap().data().as_ref(), b"hi");
}
