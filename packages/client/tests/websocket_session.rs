//! WebSocket session integration tests.
//!
//! Drive a real `ChatConnection` over `WebSocketConnector` against the
//! in-process test server.

mod fixtures;

use std::{sync::Arc, time::Duration};

use fixtures::{Behavior, EventLog, TestServer, next_event};
use parley_client::{
    ChatConnection,
    domain::{ConnectionEvent, ErrorKind, RoomName, Status},
    infrastructure::transport::WebSocketConnector,
};

fn room(name: &str) -> RoomName {
    RoomName::new(name.to_string()).unwrap()
}

fn expect_status(event: ConnectionEvent, status: Status) {
    assert_eq!(event, ConnectionEvent::StatusChanged(status));
}

#[tokio::test]
async fn test_connect_join_and_disconnect() {
    // テスト項目: 接続 → 参加 → 切断の一連の流れが WebSocket 上で動作する
    // given (前提条件):
    let server = TestServer::start(Behavior {
        topic: Some("general chat".to_string()),
        ..Behavior::default()
    })
    .await;
    let connection = ChatConnection::spawn(server.config("alice"), Arc::new(WebSocketConnector::new()));
    let (log, mut events) = EventLog::new();
    connection.register_observer(log);

    // when (操作): 接続
    connection.connect();

    // then (期待する結果):
    expect_status(next_event(&mut events).await, Status::Connecting);
    expect_status(next_event(&mut events).await, Status::Connected);

    // when (操作): 参加
    connection.join(room("#lounge")).await.unwrap();

    // then (期待する結果):
    match next_event(&mut events).await {
        ConnectionEvent::RoomJoined(joined) => {
            assert_eq!(joined.name.as_str(), "#lounge");
            assert_eq!(joined.topic.as_deref(), Some("general chat"));
            assert_eq!(joined.members, vec!["alice".to_string()]);
            assert_eq!(joined.connection, connection.id());
        }
        other => panic!("expected RoomJoined, got {:?}", other),
    }
    assert_eq!(connection.joined_rooms().len(), 1);

    // when (操作): 切断
    connection.disconnect();

    // then (期待する結果): RoomParted の後に Disconnected
    expect_status(next_event(&mut events).await, Status::Disconnecting);
    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::RoomParted(_)
    ));
    expect_status(next_event(&mut events).await, Status::Disconnected);
    assert!(connection.joined_rooms().is_empty());
    assert_eq!(
        server.received_types(),
        vec!["authenticate", "join", "quit"]
    );
}

#[tokio::test]
async fn test_password_is_sent_and_rejected() {
    // テスト項目: パスワード不一致は認証エラーの did-not-connect になる
    // given (前提条件):
    let server = TestServer::start(Behavior {
        password: Some("secret".to_string()),
        ..Behavior::default()
    })
    .await;
    let mut config = server.config("alice");
    config.credentials = config.credentials.clone().with_password("wrong");
    let connection = ChatConnection::spawn(config, Arc::new(WebSocketConnector::new()));
    let (log, mut events) = EventLog::new();
    connection.register_observer(log);

    // when (操作):
    connection.connect();

    // then (期待する結果):
    expect_status(next_event(&mut events).await, Status::Connecting);
    match next_event(&mut events).await {
        ConnectionEvent::Error(error) => {
            assert_eq!(error.kind(), ErrorKind::Authentication);
            assert!(error.is_fatal());
        }
        other => panic!("expected Error, got {:?}", other),
    }
    expect_status(next_event(&mut events).await, Status::Disconnected);
    assert_eq!(server.received()[0]["password"], "wrong");
}

#[tokio::test]
async fn test_correct_password_connects() {
    // テスト項目: 正しいパスワードなら接続できる
    let server = TestServer::start(Behavior {
        password: Some("secret".to_string()),
        ..Behavior::default()
    })
    .await;
    let mut config = server.config("alice");
    config.credentials = config.credentials.clone().with_password("secret");
    let connection = ChatConnection::spawn(config, Arc::new(WebSocketConnector::new()));

    connection.connect();

    assert!(connection.wait_for_status(Status::Connected).await);
}

#[tokio::test]
async fn test_silent_server_hits_handshake_timeout() {
    // テスト項目: welcome が返らないサーバーではハンドシェイクがタイムアウトする
    // given (前提条件):
    let server = TestServer::start(Behavior {
        silent: true,
        ..Behavior::default()
    })
    .await;
    let config = server
        .config("alice")
        .with_handshake_timeout(Duration::from_millis(300));
    let connection = ChatConnection::spawn(config, Arc::new(WebSocketConnector::new()));
    let (log, mut events) = EventLog::new();
    connection.register_observer(log);

    // when (操作):
    connection.connect();

    // then (期待する結果):
    expect_status(next_event(&mut events).await, Status::Connecting);
    match next_event(&mut events).await {
        ConnectionEvent::Error(error) => assert_eq!(error.kind(), ErrorKind::Timeout),
        other => panic!("expected Error, got {:?}", other),
    }
    expect_status(next_event(&mut events).await, Status::Disconnected);
}

#[tokio::test]
async fn test_refused_connection_is_io_failure() {
    // テスト項目: listen していないポートへの接続は Io の did-not-connect
    // given (前提条件):
    let server = TestServer::start(Behavior::default()).await;
    let config = server.config("alice");
    drop(server);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let connection =
        ChatConnection::spawn(config.with_port(port), Arc::new(WebSocketConnector::new()));
    let (log, mut events) = EventLog::new();
    connection.register_observer(log);

    // when (操作):
    connection.connect();

    // then (期待する結果):
    expect_status(next_event(&mut events).await, Status::Connecting);
    match next_event(&mut events).await {
        ConnectionEvent::Error(error) => assert_eq!(error.kind(), ErrorKind::Io),
        other => panic!("expected Error, got {:?}", other),
    }
    expect_status(next_event(&mut events).await, Status::Disconnected);
}

#[tokio::test]
async fn test_keepalive_pings_keep_session_open() {
    // テスト項目: 一定間隔で ping が送られ、pong が返る限り接続は維持される
    // given (前提条件):
    let server = TestServer::start(Behavior::default()).await;
    let config = server
        .config("alice")
        .with_keepalive(Duration::from_millis(100), Duration::from_millis(400));
    let connection = ChatConnection::spawn(config, Arc::new(WebSocketConnector::new()));
    connection.connect();
    assert!(connection.wait_for_status(Status::Connected).await);

    // when (操作): タイムアウトより長く待つ
    tokio::time::sleep(Duration::from_millis(1000)).await;

    // then (期待する結果):
    assert_eq!(connection.current_status(), Status::Connected);
    let pings = server
        .received_types()
        .iter()
        .filter(|t| t.as_str() == "ping")
        .count();
    assert!(pings >= 3, "expected several pings, got {}", pings);
}

#[tokio::test]
async fn test_part_round_trip() {
    // テスト項目: part がサーバーに届き、parted で部屋が外れる
    // given (前提条件):
    let server = TestServer::start(Behavior::default()).await;
    let connection = ChatConnection::spawn(server.config("alice"), Arc::new(WebSocketConnector::new()));
    let mut rooms = connection.subscribe_rooms();
    connection.connect();
    assert!(connection.wait_for_status(Status::Connected).await);
    connection.join(room("#rust")).await.unwrap();
    rooms.wait_for(|rooms| rooms.len() == 1).await.unwrap();

    // when (操作):
    connection.part(room("#RUST")).await.unwrap();

    // then (期待する結果):
    rooms.wait_for(|rooms| rooms.is_empty()).await.unwrap();
    assert_eq!(connection.current_status(), Status::Connected);
    assert_eq!(
        server.received_types(),
        vec!["authenticate", "join", "part"]
    );
}
