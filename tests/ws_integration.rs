//! Collaboration socket tests against a real server bound to a loopback port.

use bpmn_collab::config::Config;
use bpmn_collab::db::{DocumentStore, MemoryStore};
use bpmn_collab::routes::create_router;
use bpmn_collab::state::AppState;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_server() -> (SocketAddr, AppState) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let state = AppState::new(Config::default(), store);
    let app = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn create_diagram(state: &AppState, name: &str) -> String {
    let record = state
        .store
        .create(name.to_string(), Some("<bpmn2:definitions/>".to_string()))
        .await
        .unwrap();
    record.id.to_string()
}

async fn connect(addr: SocketAddr, diagram_id: &str, user_name: &str) -> Ws {
    let url = format!("ws://{}/ws/{}?user_name={}", addr, diagram_id, user_name);
    let (ws, _) = connect_async(url).await.expect("websocket handshake");
    ws
}

/// Connect and consume the join handshake, returning the `diagram_state` frame.
async fn join(addr: SocketAddr, diagram_id: &str, user_name: &str) -> (Ws, Value) {
    let mut ws = connect(addr, diagram_id, user_name).await;
    assert_eq!(recv(&mut ws).await["type"], "user_list");
    let state = recv(&mut ws).await;
    assert_eq!(state["type"], "diagram_state");
    assert_eq!(recv(&mut ws).await["type"], "user_list");
    (ws, state)
}

async fn recv(ws: &mut Ws) -> Value {
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Close(frame) => panic!("unexpected close: {:?}", frame),
            _ => continue,
        }
    }
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn assert_quiet(ws: &mut Ws) {
    if let Ok(Some(Ok(Message::Text(text)))) =
        timeout(Duration::from_millis(200), ws.next()).await
    {
        panic!("expected no frame, got {}", text.as_str());
    }
}

#[tokio::test]
async fn unknown_diagram_is_closed_with_policy_violation() {
    let (addr, _state) = spawn_server().await;

    for diagram_id in ["6f1c1c8e-5a55-4d8a-9e52-3c0d5b1f6a10", "not-a-uuid"] {
        let mut ws = connect(addr, diagram_id, "Ada").await;
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended")
            .expect("websocket error");
        match frame {
            Message::Close(Some(close)) => {
                assert_eq!(u16::from(close.code), 1008);
                assert_eq!(close.reason.as_str(), "Diagram not found");
            }
            other => panic!("expected close frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn join_receives_state_and_peers_are_announced() {
    let (addr, state) = spawn_server().await;
    let diagram_id = create_diagram(&state, "Join").await;

    let (mut alice, alice_state) = join(addr, &diagram_id, "Alice").await;
    assert_eq!(alice_state["data"]["xml"], "<bpmn2:definitions/>");
    assert_eq!(alice_state["data"]["my_user_name"], "Alice");
    assert_eq!(alice_state["data"]["locks"], json!({}));

    let (_bob, _) = join(addr, &diagram_id, "Bob").await;
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "user_joined", "data": {"user_name": "Bob"}})
    );
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "user_list", "data": {"users": ["Alice", "Bob"]}})
    );
}

#[tokio::test]
async fn lock_takeover_update_and_disconnect() {
    let (addr, state) = spawn_server().await;
    let diagram_id = create_diagram(&state, "Flow").await;

    let (mut alice, _) = join(addr, &diagram_id, "Alice").await;
    let (mut bob, _) = join(addr, &diagram_id, "Bob").await;
    recv(&mut alice).await; // user_joined
    recv(&mut alice).await; // user_list

    send(&mut alice, json!({"type": "element_lock", "data": {"element_id": "Task_1"}})).await;
    let locked = recv(&mut bob).await;
    assert_eq!(locked["type"], "element_locked");
    assert_eq!(locked["data"]["element_id"], "Task_1");
    assert_eq!(locked["data"]["user_name"], "Alice");

    // Moving to another element releases the first one before the new lock.
    send(&mut alice, json!({"type": "element_lock", "data": {"element_id": "Task_2"}})).await;
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "element_unlocked", "data": {"element_id": "Task_1"}})
    );
    assert_eq!(recv(&mut bob).await["data"]["element_id"], "Task_2");

    // Only the holder can release a lock.
    send(&mut bob, json!({"type": "element_unlock", "data": {"element_id": "Task_2"}})).await;
    assert_quiet(&mut alice).await;

    send(&mut alice, json!({"type": "diagram_update", "data": {"xml": "<v2/>"}})).await;
    let update = recv(&mut bob).await;
    assert_eq!(update["type"], "diagram_update");
    assert_eq!(update["user"], "Alice");
    assert_eq!(update["data"]["xml"], "<v2/>");
    assert_eq!(update["data"]["locks"]["Task_2"]["user_name"], "Alice");
    assert_quiet(&mut alice).await;

    let stored = state.store.get(&diagram_id).await.unwrap().unwrap();
    assert_eq!(stored.xml, "<v2/>");

    alice.close(None).await.unwrap();
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "element_unlocked", "data": {"element_id": "Task_2"}})
    );
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "user_left", "data": {"user_name": "Alice"}})
    );
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "user_list", "data": {"users": ["Bob"]}})
    );

    // A late joiner sees the persisted body and no stale locks.
    let (_carol, carol_state) = join(addr, &diagram_id, "Carol").await;
    assert_eq!(carol_state["data"]["xml"], "<v2/>");
    assert_eq!(carol_state["data"]["locks"], json!({}));
}

#[tokio::test]
async fn malformed_frames_do_not_close_the_connection() {
    let (addr, state) = spawn_server().await;
    let diagram_id = create_diagram(&state, "Ping").await;
    let (mut ws, _) = join(addr, &diagram_id, "Ada").await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    send(&mut ws, json!({"type": "cursor_move", "data": {"x": 1}})).await;
    send(&mut ws, json!({"type": "element_lock", "data": {}})).await;
    send(&mut ws, json!({"type": "ping"})).await;

    assert_eq!(recv(&mut ws).await, json!({"type": "pong"}));
}

#[tokio::test]
async fn reserved_element_ids_are_never_locked() {
    let (addr, state) = spawn_server().await;
    let diagram_id = create_diagram(&state, "Reserved").await;
    let (mut alice, _) = join(addr, &diagram_id, "Alice").await;
    let (mut bob, _) = join(addr, &diagram_id, "Bob").await;
    recv(&mut alice).await;
    recv(&mut alice).await;

    for element_id in ["__implicitroot", "__label_1"] {
        send(
            &mut alice,
            json!({"type": "element_lock", "data": {"element_id": element_id}}),
        )
        .await;
    }
    assert_quiet(&mut bob).await;
}

#[tokio::test]
async fn last_leave_tears_the_room_down() {
    let (addr, state) = spawn_server().await;
    let diagram_id = create_diagram(&state, "Teardown").await;
    let (mut ws, _) = join(addr, &diagram_id, "Ada").await;
    assert!(state.coordinator.hub().contains(&diagram_id).await);

    ws.close(None).await.unwrap();
    timeout(RECV_TIMEOUT, async {
        while state.coordinator.hub().contains(&diagram_id).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("room should close after the last connection leaves");
}
