mod support;

#[tokio::test]
async fn when_arena_is_ready_then_status_reports_full_pellet_field() {
    let status = support::status().await;

    assert_eq!(status["ready"], true);
    assert_eq!(status["pellets"], 2000);
    assert!(status["tick"].as_u64().is_some());
    assert!(status["actors"].as_u64().is_some());
}

#[tokio::test]
async fn when_unknown_route_is_requested_then_not_found() {
    let base_url = support::ensure_server().await;
    let res = reqwest::get(format!("{base_url}/lobbies"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}
