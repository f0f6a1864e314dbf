// One arena server per test binary, shared by every test in it.
#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};
use tokio::sync::{OnceCell, oneshot};

static BASE_URL: OnceCell<String> = OnceCell::const_new();

// Start the server on first use and return its base URL once `/status` is 200.
pub async fn ensure_server() -> &'static str {
    BASE_URL.get_or_init(start_server).await.as_str()
}

pub async fn ws_url() -> String {
    let base_url = ensure_server().await;
    format!("{}/ws", base_url.replacen("http://", "ws://", 1))
}

// Current `/status` body of the shared server.
pub async fn status() -> serde_json::Value {
    let base_url = ensure_server().await;
    reqwest::get(format!("{base_url}/status"))
        .await
        .expect("status request should succeed")
        .json()
        .await
        .expect("status body should be json")
}

async fn start_server() -> String {
    let (addr_tx, addr_rx) = oneshot::channel::<SocketAddr>();
    // The server gets its own thread and runtime so it outlives each `#[tokio::test]`.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            let _ = addr_tx.send(addr);
            arena_server::run(listener).await.expect("server failed");
        });
    });

    let addr = addr_rx.await.expect("server thread publishes its address");
    let base_url = format!("http://{addr}");
    wait_until_ready(&base_url).await;
    base_url
}

// Ready means the world task has filled the field and `/status` answers 200.
async fn wait_until_ready(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(res) = client.get(format!("{base_url}/status")).send().await {
            if res.status() == reqwest::StatusCode::OK {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("arena did not become ready in time");
}
