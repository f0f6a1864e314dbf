mod support;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect() -> Socket {
    let (socket, _) = connect_async(support::ws_url().await)
        .await
        .expect("websocket handshake should succeed");
    socket
}

// Next text frame as JSON, skipping control frames.
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("message before timeout")
            .expect("socket open")
            .expect("valid frame");
        if msg.is_text() {
            let text = msg.to_text().expect("text frame");
            return serde_json::from_str(text).expect("server sends json");
        }
    }
}

// Read until a message of the given type arrives.
async fn next_of_type(socket: &mut Socket, ty: &str) -> Value {
    loop {
        let msg = next_json(socket).await;
        if msg["type"] == ty {
            return msg;
        }
    }
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn when_client_connects_then_identity_precedes_pellet_sync() {
    let mut socket = connect().await;

    let identity = next_json(&mut socket).await;
    assert_eq!(identity["type"], "Identity");
    assert!(identity["data"]["connection_id"].as_str().is_some());

    let sync = next_json(&mut socket).await;
    assert_eq!(sync["type"], "PelletSync");
    assert!(sync["data"]["tick"].as_u64().is_some());
    let positions = sync["data"]["positions"]
        .as_array()
        .expect("positions array");
    assert_eq!(positions.len(), 2000);
    for p in positions {
        assert_eq!(p[1].as_f64().map(|y| y as f32), Some(0.1));
    }
}

#[tokio::test]
async fn when_client_joins_twice_then_only_one_actor_is_spawned() {
    let mut socket = connect().await;
    send_json(&mut socket, json!({ "type": "Join" })).await;
    send_json(&mut socket, json!({ "type": "Join" })).await;

    let spawned = next_of_type(&mut socket, "Spawned").await;
    let actor_id = spawned["data"]["actor_id"]
        .as_str()
        .expect("actor id")
        .to_string();
    assert_eq!(
        spawned["data"]["color"].as_array().map(|c| c.len()),
        Some(3)
    );

    // The actor shows up in world updates and no second spawn follows.
    let mut seen_in_world = false;
    let deadline = Instant::now() + Duration::from_millis(500);
    while Instant::now() < deadline {
        let msg = next_json(&mut socket).await;
        match msg["type"].as_str() {
            Some("Spawned") => panic!("duplicate join spawned a second actor"),
            Some("WorldUpdate") => {
                let actors = msg["data"]["actors"].as_array().expect("actors array");
                seen_in_world |= actors.iter().any(|a| a["id"] == actor_id.as_str());
            }
            _ => {}
        }
    }
    assert!(seen_in_world);
}

#[tokio::test]
async fn when_client_disconnects_then_observers_see_despawn() {
    let mut observer = connect().await;
    let mut player = connect().await;

    send_json(&mut player, json!({ "type": "Join" })).await;
    let spawned = next_of_type(&mut player, "Spawned").await;
    let actor_id = spawned["data"]["actor_id"]
        .as_str()
        .expect("actor id")
        .to_string();

    send_json(
        &mut player,
        json!({ "type": "Input", "data": { "up": true, "down": false, "left": false, "right": true } }),
    )
    .await;
    player.close(None).await.expect("close should succeed");

    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        assert!(Instant::now() < deadline, "despawn not observed in time");
        let msg = next_of_type(&mut observer, "WorldUpdate").await;
        let Some(events) = msg["data"]["events"].as_array() else {
            continue;
        };
        let despawned = events
            .iter()
            .any(|e| e["kind"] == "Despawned" && e["actor_id"] == actor_id.as_str());
        if despawned {
            break;
        }
    }
}

#[tokio::test]
async fn when_client_sends_binary_then_connection_is_closed() {
    let mut socket = connect().await;
    socket
        .send(Message::Binary(vec![1u8, 2, 3].into()))
        .await
        .expect("send should succeed");

    let closed = timeout(Duration::from_secs(2), async {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await
    .expect("close before timeout");
    assert!(closed);
}
