#[cfg(test)]
mod tests {
    use crate::client::ClientState;
    use crate::config::ChatConfig;
    use crate::connection::InboundFrame;
    use crate::hub::Hub;
    use crate::message::{Message, MessageKind};
    use crate::pump::{InboundExit, OutboundExit};
    use crate::transport::mpsc::{MpscConnection, MpscTransport, OutboundFrame};
    use std::time::Duration;
    use tokio::sync::mpsc::Receiver;
    use tokio::time::timeout;

    // Next data frame, skipping probes
    async fn next_message(outbound: &mut Receiver<OutboundFrame>) -> Message {
        loop {
            let frame = timeout(Duration::from_secs(2), outbound.recv())
                .await
                .expect("timed out waiting for a frame")
                .expect("connection closed");
            match frame {
                OutboundFrame::Text(text) => return Message::from_json(&text).unwrap(),
                OutboundFrame::Ping => continue,
                OutboundFrame::Close => panic!("unexpected close"),
            }
        }
    }

    async fn say(connection: &MpscConnection, text: &str) {
        connection
            .inbound
            .send(InboundFrame::Text(text.to_string()))
            .await
            .expect("inbound closed");
    }

    #[tokio::test]
    async fn test_alice_and_bob_flow() {
        let config = ChatConfig::default();
        let (hub, handle) = Hub::new(config.hub_queue_capacity);
        let hub_task = hub.spawn();
        let transport = MpscTransport::new(handle.clone(), config);

        let mut alice = transport.connect("alice", 16);
        let joined = next_message(&mut alice.outbound).await;
        assert_eq!(joined.kind, MessageKind::Join);
        assert_eq!(joined.username, "alice");

        let mut bob = transport.connect("bob", 16);
        for outbound in [&mut alice.outbound, &mut bob.outbound] {
            let joined = next_message(outbound).await;
            assert_eq!(joined.kind, MessageKind::Join);
            assert_eq!(joined.username, "bob");
        }

        say(&alice, "hi").await;
        for outbound in [&mut alice.outbound, &mut bob.outbound] {
            let chat = next_message(outbound).await;
            assert_eq!(chat.kind, MessageKind::Chat);
            assert_eq!(chat.username, "alice");
            assert_eq!(chat.content, "hi");
        }

        // bob hangs up
        let MpscConnection {
            inbound: bob_inbound,
            outbound: mut bob_outbound,
            session: bob_session,
        } = bob;
        drop(bob_inbound);

        let left = next_message(&mut alice.outbound).await;
        assert_eq!(left.kind, MessageKind::Leave);
        assert_eq!(left.username, "bob");

        let summary = timeout(Duration::from_secs(2), bob_session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.state, ClientState::Closed);
        assert_eq!(summary.inbound, Some(InboundExit::StreamEnded));
        assert_eq!(summary.outbound, Some(OutboundExit::QueueClosed));
        let bob_id = summary.client_id;

        // bob's queue was closed by the hub: a close indication, then nothing
        let mut tail = Vec::new();
        while let Some(frame) = bob_outbound.recv().await {
            tail.push(frame);
        }
        assert_eq!(tail.last(), Some(&OutboundFrame::Close));

        drop(alice.inbound);
        timeout(Duration::from_secs(2), alice.session)
            .await
            .unwrap()
            .unwrap();

        drop(transport);
        drop(handle);
        let hub = timeout(Duration::from_secs(2), hub_task)
            .await
            .unwrap()
            .unwrap();
        assert!(hub.is_empty());
        assert!(!hub.contains(&bob_id));
    }

    #[tokio::test]
    async fn test_slow_consumer_is_evicted_silently() {
        let config = ChatConfig::default()
            .with_send_queue_capacity(8)
            .with_write_wait(Duration::from_secs(2));
        let (hub, handle) = Hub::new(config.hub_queue_capacity);
        let hub_task = hub.spawn();
        let transport = MpscTransport::new(handle.clone(), config);

        let mut fast = transport.connect("fast", 64);
        assert_eq!(next_message(&mut fast.outbound).await.username, "fast");

        // slow never reads; its peer buffer holds a single frame
        let MpscConnection {
            inbound: _slow_inbound,
            outbound: _slow_outbound,
            session: slow_session,
        } = transport.connect("slow", 1);
        assert_eq!(next_message(&mut fast.outbound).await.username, "slow");

        // slow can hold its join, one stuck write and a full queue; 12 lines overflow it
        for i in 0..12 {
            let line = format!("m{}", i);
            say(&fast, &line).await;
            assert_eq!(next_message(&mut fast.outbound).await.content, line);
        }

        // the stuck write eventually times out and the connection is torn down
        let summary = timeout(Duration::from_secs(5), slow_session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.outbound, Some(OutboundExit::WriteTimedOut));
        assert_eq!(summary.inbound, Some(InboundExit::ConnectionClosed));
        assert_eq!(summary.state, ClientState::Closed);

        // eviction emitted no leave, and fast is still being served
        say(&fast, "after").await;
        let message = next_message(&mut fast.outbound).await;
        assert_eq!(message.kind, MessageKind::Chat);
        assert_eq!(message.content, "after");
        assert!(!fast.session.is_finished());

        // fast leaves through the normal path, so it was registered until now
        drop(fast.inbound);
        let summary = timeout(Duration::from_secs(2), fast.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.inbound, Some(InboundExit::StreamEnded));
        assert_eq!(summary.outbound, Some(OutboundExit::QueueClosed));

        drop(transport);
        drop(handle);
        let hub = timeout(Duration::from_secs(2), hub_task)
            .await
            .unwrap()
            .unwrap();
        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_order_is_shared() {
        let config = ChatConfig::default();
        let (hub, handle) = Hub::new(config.hub_queue_capacity);
        hub.spawn();
        let transport = MpscTransport::new(handle, config);

        let mut alice = transport.connect("alice", 64);
        next_message(&mut alice.outbound).await;
        let mut bob = transport.connect("bob", 64);
        next_message(&mut alice.outbound).await;
        next_message(&mut bob.outbound).await;

        for i in 0..5 {
            say(&alice, &format!("a{}", i)).await;
            say(&bob, &format!("b{}", i)).await;
        }

        let mut alice_saw = Vec::new();
        let mut bob_saw = Vec::new();
        for _ in 0..10 {
            alice_saw.push(next_message(&mut alice.outbound).await.content);
            bob_saw.push(next_message(&mut bob.outbound).await.content);
        }
        assert_eq!(alice_saw, bob_saw);

        // each sender's own lines keep their order
        let alice_lines: Vec<&str> = alice_saw
            .iter()
            .map(String::as_str)
            .filter(|c| c.starts_with('a'))
            .collect();
        assert_eq!(alice_lines, vec!["a0", "a1", "a2", "a3", "a4"]);
    }
}
