//! RoomHub tests: connection lifecycle and dispatcher operations against
//! mocked collaborator services.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::*;
use crate::domain::{
    DirectoryError, MockGameDirectory, MockIdentityService, MockRoomDirectory, RoundSummary,
    UserIdentity, UserScore,
};
use crate::infrastructure::pusher::WebSocketMessagePusher;

fn room() -> RoomId {
    RoomId::new("room-1")
}

fn summary() -> RoomSummary {
    RoomSummary {
        room_idx: "room-1".to_string(),
        room_now: 1,
        room_max: 6,
        max_round: 5,
        game_category: "relay".to_string(),
        room_status: "Ready".to_string(),
        admin_user_idx: 42,
        now_round: 1,
    }
}

fn alice() -> UserIdentity {
    UserIdentity {
        user_idx: 42,
        user_nickname: "Alice".to_string(),
    }
}

/// Identity service that resolves "tok-1" to Alice and rejects the rest.
fn identity_for_alice() -> MockIdentityService {
    let mut identity = MockIdentityService::new();
    identity.expect_resolve().returning(|credential| {
        if credential == "tok-1" {
            Ok(alice())
        } else {
            Err(DirectoryError::Unauthorized)
        }
    });
    identity
}

fn build_hub(
    identity: MockIdentityService,
    rooms: MockRoomDirectory,
    games: MockGameDirectory,
) -> (RoomHub, Arc<WebSocketMessagePusher>) {
    let pusher = Arc::new(WebSocketMessagePusher::new());
    let hub = RoomHub::new(
        pusher.clone(),
        Arc::new(identity),
        Arc::new(rooms),
        Arc::new(games),
    );
    (hub, pusher)
}

/// Connect a listener socket to the room and return its receiving half.
async fn connect_listener(hub: &RoomHub, room_id: &RoomId) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    hub.connect(room_id.clone(), connection_id, tx)
        .await
        .expect("connect should succeed");
    (connection_id, rx)
}

#[tokio::test]
async fn test_connect_initializes_room_state_once() {
    // テスト項目: 同じルームへの複数接続でディレクトリのフェッチは一度だけ
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().times(1).returning(|_| Ok(summary()));
    let (hub, pusher) = build_hub(
        MockIdentityService::new(),
        rooms,
        MockGameDirectory::new(),
    );

    // when (操作): 2 本の接続を開く
    let _c1 = connect_listener(&hub, &room()).await;
    let _c2 = connect_listener(&hub, &room()).await;

    // then (期待する結果):
    assert_eq!(pusher.room_occupancy(&room()).await, 2);
    assert!(hub.game_time(&room()).await.is_ok());
}

#[tokio::test]
async fn test_connect_unregisters_on_directory_failure() {
    // テスト項目: ルーム初期化に失敗した接続はレジストリに残らない
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms
        .expect_get_room()
        .returning(|_| Err(DirectoryError::Transport("connection refused".to_string())));
    let (hub, pusher) = build_hub(
        MockIdentityService::new(),
        rooms,
        MockGameDirectory::new(),
    );

    // when (操作):
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = hub.connect(room(), ConnectionId::generate(), tx).await;

    // then (期待する結果):
    assert!(matches!(result, Err(HubError::Directory(_))));
    assert_eq!(pusher.room_occupancy(&room()).await, 0);
}

#[tokio::test]
async fn test_join_creates_participant_with_seed_score() {
    // テスト項目: tok-1 → user 42/"Alice" の join で参加者がスコア 0 で登録される
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_join().times(1).returning(|_, _| Ok(summary()));
    rooms.expect_list_participants().returning(|_| {
        Ok(vec![ParticipantRecord {
            user_idx: 42,
            user_nickname: "Alice".to_string(),
            user_score: 0,
        }])
    });
    let (hub, _pusher) = build_hub(identity_for_alice(), rooms, MockGameDirectory::new());
    let (connection_id, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let outcome = hub.join(&room(), connection_id, "tok-1").await.unwrap();

    // then (期待する結果): 占有者リストに Alice が含まれ、参加者のスコアは 0
    assert_eq!(outcome.user_list.len(), 1);
    assert_eq!(outcome.user_list[0].user_nickname, "Alice");
    let participant = hub.participant(&room(), &connection_id).await.unwrap();
    assert_eq!(participant.score, 0);
    assert_eq!(participant.user_id, UserId::new(42));
    assert_eq!(participant.nickname.as_str(), "Alice");
}

#[tokio::test]
async fn test_join_with_bad_credential_is_unauthorized() {
    // テスト項目: 解決できない資格情報の join は Unauthorized で、状態は変更されない
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_join().times(0); // ディレクトリへは進まない
    let (hub, _pusher) = build_hub(identity_for_alice(), rooms, MockGameDirectory::new());
    let (connection_id, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let result = hub.join(&room(), connection_id, "bad-token").await;

    // then (期待する結果):
    assert_eq!(result.unwrap_err(), HubError::Unauthorized);
    assert_eq!(
        hub.participant(&room(), &connection_id).await,
        Err(HubError::NotJoined)
    );
}

#[tokio::test]
async fn test_join_directory_rejection_is_surfaced() {
    // テスト項目: ディレクトリの join 拒否は Rejected として返される
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms
        .expect_join()
        .returning(|_, _| Err(DirectoryError::Rejected("room is full".to_string())));
    let (hub, _pusher) = build_hub(identity_for_alice(), rooms, MockGameDirectory::new());
    let (connection_id, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let result = hub.join(&room(), connection_id, "tok-1").await;

    // then (期待する結果):
    assert_eq!(
        result.unwrap_err(),
        HubError::Rejected("room is full".to_string())
    );
}

#[tokio::test]
async fn test_round_over_updates_matching_participant_only() {
    // テスト項目: roundOver の結果 userId 42 → 15 点が該当参加者にのみ反映される
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_join().returning(|_, _| Ok(summary()));
    rooms.expect_list_participants().returning(|_| Ok(vec![]));
    let mut games = MockGameDirectory::new();
    games.expect_end_round().returning(|room_id, winner| {
        assert_eq!(winner, UserId::new(42));
        Ok(RoundSummary {
            room_idx: room_id.as_str().to_string(),
            now_round: 2,
            user_list: vec![
                UserScore {
                    user_idx: 42,
                    user_score: 15,
                },
                UserScore {
                    user_idx: 7,
                    user_score: 0,
                },
            ],
        })
    });

    let mut identity = MockIdentityService::new();
    identity.expect_resolve().returning(|credential| match credential {
        "tok-1" => Ok(alice()),
        _ => Ok(UserIdentity {
            user_idx: 7,
            user_nickname: "Bob".to_string(),
        }),
    });

    let (hub, _pusher) = build_hub(identity, rooms, games);
    let (alice_conn, _rx1) = connect_listener(&hub, &room()).await;
    let (bob_conn, _rx2) = connect_listener(&hub, &room()).await;
    hub.join(&room(), alice_conn, "tok-1").await.unwrap();
    hub.join(&room(), bob_conn, "tok-2").await.unwrap();

    // when (操作):
    let round = hub.round_over(&room(), UserId::new(42)).await.unwrap();

    // then (期待する結果):
    assert_eq!(round.user_list.len(), 2);
    let alice = hub.participant(&room(), &alice_conn).await.unwrap();
    let bob = hub.participant(&room(), &bob_conn).await.unwrap();
    assert_eq!(alice.score, 15);
    assert_eq!(bob.score, 0);
}

#[tokio::test]
async fn test_game_over_returns_descending_ranking() {
    // テスト項目: gameOver のランキングはスコア降順（同点はユーザー ID 昇順）
    // given (前提条件): {A:30, B:90, C:90, D:10}
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_join().returning(|_, _| Ok(summary()));
    rooms.expect_list_participants().returning(|_| Ok(vec![]));
    let mut games = MockGameDirectory::new();
    games.expect_end_round().returning(|room_id, _| {
        Ok(RoundSummary {
            room_idx: room_id.as_str().to_string(),
            now_round: 1,
            user_list: vec![
                UserScore { user_idx: 1, user_score: 30 },
                UserScore { user_idx: 2, user_score: 90 },
                UserScore { user_idx: 3, user_score: 90 },
                UserScore { user_idx: 4, user_score: 10 },
            ],
        })
    });

    let mut identity = MockIdentityService::new();
    identity.expect_resolve().returning(|credential| {
        let (user_idx, name) = match credential {
            "tok-a" => (1, "A"),
            "tok-b" => (2, "B"),
            "tok-c" => (3, "C"),
            _ => (4, "D"),
        };
        Ok(UserIdentity {
            user_idx,
            user_nickname: name.to_string(),
        })
    });

    let (hub, _pusher) = build_hub(identity, rooms, games);
    for token in ["tok-a", "tok-b", "tok-c", "tok-d"] {
        let (conn, _rx) = connect_listener(&hub, &room()).await;
        hub.join(&room(), conn, token).await.unwrap();
    }
    hub.round_over(&room(), UserId::new(2)).await.unwrap();

    // when (操作):
    let ranking = hub.game_over(&room()).await.unwrap();

    // then (期待する結果):
    let names: Vec<&str> = ranking.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["B", "C", "A", "D"]);
    let scores: Vec<u32> = ranking.iter().map(|(_, score)| *score).collect();
    assert_eq!(scores, vec![90, 90, 30, 10]);
}

#[tokio::test]
async fn test_disconnect_reports_nickname_and_tears_down_empty_room() {
    // テスト項目: 最後の接続の切断でルームが teardown され、以降のブロードキャストは no-op
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_join().returning(|_, _| Ok(summary()));
    rooms.expect_list_participants().returning(|_| Ok(vec![]));
    rooms.expect_leave().times(1).returning(|_| Ok(summary()));
    let (hub, pusher) = build_hub(identity_for_alice(), rooms, MockGameDirectory::new());
    let (connection_id, _rx) = connect_listener(&hub, &room()).await;
    hub.join(&room(), connection_id, "tok-1").await.unwrap();

    // when (操作):
    let nickname = hub.disconnect(&room(), &connection_id).await;

    // then (期待する結果):
    assert_eq!(nickname, Some(Nickname::new("Alice")));
    assert_eq!(pusher.room_occupancy(&room()).await, 0);
    // ルーム状態も破棄されている
    assert_eq!(hub.game_time(&room()).await, Err(HubError::RoomNotInitialized));
    // 空のルームへのブロードキャストはエラーにならない
    hub.broadcast(&room(), "nobody-home").await;
}

#[tokio::test]
async fn test_disconnect_without_join_reports_no_nickname() {
    // テスト項目: join していない接続の切断は退室通知の対象にならない
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_leave().times(0);
    let (hub, _pusher) = build_hub(
        MockIdentityService::new(),
        rooms,
        MockGameDirectory::new(),
    );
    let (connection_id, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let nickname = hub.disconnect(&room(), &connection_id).await;

    // then (期待する結果):
    assert_eq!(nickname, None);
}

#[tokio::test]
async fn test_change_admin_failure_is_rejected() {
    // テスト項目: ディレクトリが changeAdmin を拒否した場合 Rejected が返る
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms
        .expect_change_admin()
        .returning(|_, _, _| Err(DirectoryError::Rejected("not allowed".to_string())));
    let (hub, _pusher) = build_hub(identity_for_alice(), rooms, MockGameDirectory::new());
    let (_conn, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let result = hub
        .change_admin(&room(), "tok-1", UserId::new(7))
        .await;

    // then (期待する結果):
    assert_eq!(result.unwrap_err(), HubError::Rejected("not allowed".to_string()));
}

#[tokio::test]
async fn test_change_capacity_refreshes_cached_summary() {
    // テスト項目: changeCapacity 成功時にキャッシュがディレクトリ確認済みの値へ更新される
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    rooms.expect_change_capacity().returning(|_, _, new_max| {
        let mut refreshed = summary();
        refreshed.room_max = new_max;
        Ok(refreshed)
    });
    let (hub, _pusher) = build_hub(identity_for_alice(), rooms, MockGameDirectory::new());
    let (_conn, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let updated = hub.change_capacity(&room(), "tok-1", 8).await.unwrap();

    // then (期待する結果):
    assert_eq!(updated.room_max, 8);
    let overview = hub.room_overview().await;
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].room_id, room());
}

#[tokio::test]
async fn test_time_start_requires_initialized_room() {
    // テスト項目: 未初期化のルームでの timeStart は RoomNotInitialized
    // given (前提条件):
    let (hub, _pusher) = build_hub(
        MockIdentityService::new(),
        MockRoomDirectory::new(),
        MockGameDirectory::new(),
    );

    // when (操作):
    let result = hub.time_start(&RoomId::new("never-connected")).await;

    // then (期待する結果):
    assert_eq!(result, Err(HubError::RoomNotInitialized));
}

#[tokio::test]
async fn test_game_start_marks_room_playing() {
    // テスト項目: gameStart でルームが Playing になり、ゲームディレクトリが呼ばれる
    // given (前提条件):
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_get_room().returning(|_| Ok(summary()));
    let mut games = MockGameDirectory::new();
    games.expect_start_game().times(1).returning(|_, request| {
        assert_eq!(request.room_idx, "room-1");
        assert_eq!(request.game_category, "relay");
        assert_eq!(request.max_round, 5);
        Ok(GameSummary {
            room_idx: request.room_idx,
            game_category: request.game_category,
            max_round: request.max_round,
            now_round: 1,
        })
    });
    let (hub, _pusher) = build_hub(identity_for_alice(), rooms, games);
    let (_conn, _rx) = connect_listener(&hub, &room()).await;

    // when (操作):
    let game = hub.game_start(&room(), "tok-1").await.unwrap();

    // then (期待する結果):
    assert_eq!(game.now_round, 1);
    let overview = hub.room_overview().await;
    assert_eq!(overview[0].status, RoomStatus::Playing);
}
