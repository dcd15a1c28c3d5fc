//! WebSocket wire format of the room protocol.
//!
//! Every envelope is a JSON object whose `type` field selects the
//! operation. Numeric fields of inbound envelopes travel as strings
//! (`"changedMax": "8"`), matching the clients' encoding; handlers parse
//! them and drop envelopes that do not parse. Outbound answers carry
//! numbers as JSON numbers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{GameSummary, ParticipantRecord, RoomSummary, RoundSummary};

/// Inbound client envelope. The `type` tag is closed: an unknown tag fails
/// deserialization and the dispatcher drops the envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Inbound {
    /// Bind this connection to a game identity.
    Join { authorization: String },
    /// Chat line; relayed to the room verbatim.
    Chat,
    /// Drawing stroke; relayed to the room verbatim.
    Draw,
    /// Admin request to resize the room.
    ChangeCapacity {
        authorization: String,
        changed_max: String,
    },
    /// Admin request to hand the room to another user.
    ChangeAdmin {
        authorization: String,
        new_admin_idx: String,
    },
    /// Switch the room's game category.
    ChangeGameType { change_game_type: String },
    /// Query current occupancy.
    PlayerCnt,
    /// Query the game category.
    GameMode,
    /// Query the configured round duration.
    GameTime,
    /// Query the current round number.
    GameTurn,
    /// Set the round duration used by the next countdown.
    RoundTime { changed_round_time: String },
    /// Start a game in this room.
    GameStart { authorization: String },
    /// Start the round countdown.
    TimeStart,
    /// Advance to the next round.
    NextRound,
    /// Close the round with a winner.
    RoundOver { winner_idx: String },
    /// End the game and publish the final ranking.
    GameOver,
}

/// `type` tag of outbound envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Join,
    Chat,
    ChangeCapacity,
    ChangeAdmin,
    ChangeGameType,
    PlayerCnt,
    GameMode,
    GameTime,
    GameTurn,
    GameStart,
    TimeStart,
    NextRound,
    RoundOver,
    GameOver,
}

/// Outcome marker carried by envelopes that answer a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Fail,
}

/// Failure answer for any operation: same shape for every `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailMessage {
    pub r#type: MessageType,
    pub status: ResultStatus,
    pub message: String,
}

/// Successful join: the room summary plus the current occupant listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSuccessMessage {
    pub r#type: MessageType,
    pub status: ResultStatus,
    #[serde(flatten)]
    pub room: RoomSummary,
    pub user_list: Vec<ParticipantRecord>,
}

/// Successful room mutation (`changeCapacity`, `changeAdmin`): the
/// directory-confirmed room summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryMessage {
    pub r#type: MessageType,
    pub status: ResultStatus,
    #[serde(flatten)]
    pub room: RoomSummary,
}

/// Category change notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeGameTypeMessage {
    pub r#type: MessageType,
    pub change_game_type: String,
}

/// Occupancy answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCntMessage {
    pub r#type: MessageType,
    pub player_cnt: u32,
}

/// Game category answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameModeMessage {
    pub r#type: MessageType,
    pub game_mode: String,
}

/// Round duration answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTimeMessage {
    pub r#type: MessageType,
    pub round_time: u32,
}

/// Current round answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTurnMessage {
    pub r#type: MessageType,
    pub game_turn: u32,
}

/// Game lifecycle answer (`gameStart`, `nextRound`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummaryMessage {
    pub r#type: MessageType,
    pub status: ResultStatus,
    #[serde(flatten)]
    pub game: GameSummary,
}

/// Round-close answer: the per-user scores of the finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummaryMessage {
    pub r#type: MessageType,
    pub status: ResultStatus,
    #[serde(flatten)]
    pub round: RoundSummary,
}

/// Final ranking: one single-entry `{nickname: score}` object per player,
/// ordered best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverMessage {
    pub r#type: MessageType,
    pub sorted_list: Vec<HashMap<String, u32>>,
}

/// Room-wide notice rendered as a chat line from the system author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatNotice {
    pub r#type: MessageType,
    pub author: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_join_parses() {
        // テスト項目: join エンベロープが authorization 付きでパースされる
        // given (前提条件):
        let text = r#"{"type":"join","authorization":"tok-1"}"#;

        // when (操作):
        let inbound: Inbound = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            inbound,
            Inbound::Join {
                authorization: "tok-1".to_string()
            }
        );
    }

    #[test]
    fn test_inbound_numeric_fields_stay_strings() {
        // テスト項目: 数値フィールドはワイヤ上では文字列のままパースされる
        // given (前提条件):
        let capacity = r#"{"type":"changeCapacity","authorization":"tok-1","changedMax":"8"}"#;
        let admin = r#"{"type":"changeAdmin","authorization":"tok-1","newAdminIdx":"7"}"#;
        let winner = r#"{"type":"roundOver","winnerIdx":"42"}"#;

        // when (操作):
        let capacity: Inbound = serde_json::from_str(capacity).unwrap();
        let admin: Inbound = serde_json::from_str(admin).unwrap();
        let winner: Inbound = serde_json::from_str(winner).unwrap();

        // then (期待する結果):
        assert_eq!(
            capacity,
            Inbound::ChangeCapacity {
                authorization: "tok-1".to_string(),
                changed_max: "8".to_string()
            }
        );
        assert_eq!(
            admin,
            Inbound::ChangeAdmin {
                authorization: "tok-1".to_string(),
                new_admin_idx: "7".to_string()
            }
        );
        assert_eq!(
            winner,
            Inbound::RoundOver {
                winner_idx: "42".to_string()
            }
        );
    }

    #[test]
    fn test_inbound_chat_ignores_payload_fields() {
        // テスト項目: chat/draw は追加フィールドを無視してタグのみでパースされる
        // given (前提条件):
        let chat = r#"{"type":"chat","author":"Alice","message":"hello"}"#;
        let draw = r##"{"type":"draw","x":"10","y":"20","color":"#000"}"##;

        // when (操作):
        let chat: Inbound = serde_json::from_str(chat).unwrap();
        let draw: Inbound = serde_json::from_str(draw).unwrap();

        // then (期待する結果):
        assert_eq!(chat, Inbound::Chat);
        assert_eq!(draw, Inbound::Draw);
    }

    #[test]
    fn test_inbound_unknown_type_is_rejected() {
        // テスト項目: 未知の type タグはデシリアライズに失敗する
        // given (前提条件):
        let text = r#"{"type":"teleport","destination":"room-9"}"#;

        // when (操作):
        let result = serde_json::from_str::<Inbound>(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_fail_message_shape() {
        // テスト項目: 失敗エンベロープは type ごとに同じ形になる
        // given (前提条件):
        let fail = FailMessage {
            r#type: MessageType::ChangeAdmin,
            status: ResultStatus::Fail,
            message: "not allowed".to_string(),
        };

        // when (操作):
        let json = serde_json::to_string(&fail).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"type":"changeAdmin","status":"fail","message":"not allowed"}"#
        );
    }

    #[test]
    fn test_join_success_flattens_room_fields() {
        // テスト項目: join 成功エンベロープはルーム概要をトップレベルに展開する
        // given (前提条件):
        let message = JoinSuccessMessage {
            r#type: MessageType::Join,
            status: ResultStatus::Success,
            room: RoomSummary {
                room_idx: "room-1".to_string(),
                room_now: 2,
                room_max: 6,
                max_round: 5,
                game_category: "relay".to_string(),
                room_status: "Ready".to_string(),
                admin_user_idx: 42,
                now_round: 1,
            },
            user_list: vec![ParticipantRecord {
                user_idx: 42,
                user_nickname: "Alice".to_string(),
                user_score: 0,
            }],
        };

        // when (操作):
        let value: serde_json::Value =
            serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "join");
        assert_eq!(value["status"], "success");
        assert_eq!(value["roomIdx"], "room-1");
        assert_eq!(value["roomMax"], 6);
        assert_eq!(value["userList"][0]["userNickname"], "Alice");
    }

    #[test]
    fn test_game_over_sorted_list_shape() {
        // テスト項目: gameOver の sortedList は {ニックネーム: スコア} の列になる
        // given (前提条件):
        let message = GameOverMessage {
            r#type: MessageType::GameOver,
            sorted_list: vec![
                HashMap::from([("Alice".to_string(), 90)]),
                HashMap::from([("Bob".to_string(), 30)]),
            ],
        };

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"type":"gameOver","sortedList":[{"Alice":90},{"Bob":30}]}"#
        );
    }
}
