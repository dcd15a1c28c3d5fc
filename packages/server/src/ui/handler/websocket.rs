//! WebSocket connection handler and protocol dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, HubError, RoomId, UserId},
    hub::RoomHub,
    infrastructure::dto::websocket::{
        ChangeGameTypeMessage, ChatNotice, FailMessage, GameModeMessage, GameOverMessage,
        GameSummaryMessage, GameTimeMessage, GameTurnMessage, Inbound, JoinSuccessMessage,
        MessageType, PlayerCntMessage, ResultStatus, RoomSummaryMessage, RoundSummaryMessage,
    },
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id = RoomId::new(room_id);
    let connection_id = ConnectionId::generate();

    // Create a channel for this connection to receive broadcasts
    let (tx, rx) = mpsc::unbounded_channel();

    // Register the connection before upgrading; the first connection to a
    // room also seeds its state from the room directory.
    match state
        .hub
        .connect(room_id.clone(), connection_id, tx)
        .await
    {
        Ok(()) => Ok(ws.on_upgrade(move |socket| {
            handle_socket(socket, state, room_id, connection_id, rx)
        })),
        Err(e) => {
            tracing::warn!(
                "Rejecting connection to room '{}': {}",
                room_id,
                e
            );
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// Spawns a task that receives broadcasts from the rx channel and pushes
/// them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let mut send_task = pusher_loop(rx, sender);

    let hub = state.hub.clone();
    let recv_room_id = room_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch(&hub, &recv_room_id, connection_id, &text).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // The registry entry goes away first inside disconnect, so the departure
    // notice below can never reach the closed socket.
    if let Some(nickname) = state.hub.disconnect(&room_id, &connection_id).await {
        let notice = ChatNotice {
            r#type: MessageType::Chat,
            author: "admin".to_string(),
            message: format!("{} left the room", nickname.as_str()),
        };
        let notice_json = serde_json::to_string(&notice).unwrap();
        state.hub.broadcast(&room_id, &notice_json).await;
        tracing::info!("Broadcasted departure of '{}'", nickname.as_str());
    }
}

/// Parse a numeric wire field. The clients encode numbers as strings; a
/// value that does not parse is an encoding fault and drops the envelope.
fn parse_wire_number<T: std::str::FromStr>(field: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Field '{}' is not numeric: '{}'", field, value);
            None
        }
    }
}

async fn broadcast_fail(hub: &RoomHub, room_id: &RoomId, r#type: MessageType, error: &HubError) {
    let fail = FailMessage {
        r#type,
        status: ResultStatus::Fail,
        message: error.to_string(),
    };
    hub.broadcast(room_id, &serde_json::to_string(&fail).unwrap())
        .await;
}

/// Route one inbound envelope to the hub and broadcast the answer.
///
/// A text frame that is not a known envelope is logged and dropped; the
/// connection stays open.
async fn dispatch(hub: &RoomHub, room_id: &RoomId, connection_id: ConnectionId, text: &str) {
    let inbound = match serde_json::from_str::<Inbound>(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!("Dropping unparseable envelope: {}", e);
            return;
        }
    };

    match inbound {
        Inbound::Join { authorization } => {
            match hub.join(room_id, connection_id, &authorization).await {
                Ok(outcome) => {
                    let joined = JoinSuccessMessage {
                        r#type: MessageType::Join,
                        status: ResultStatus::Success,
                        room: outcome.room,
                        user_list: outcome.user_list,
                    };
                    hub.broadcast(room_id, &serde_json::to_string(&joined).unwrap())
                        .await;
                }
                Err(e) => broadcast_fail(hub, room_id, MessageType::Join, &e).await,
            }
        }
        // Chat lines and drawing strokes are relayed to the whole room
        // verbatim; the hub never interprets their payload.
        Inbound::Chat | Inbound::Draw => {
            hub.broadcast(room_id, text).await;
        }
        Inbound::ChangeCapacity {
            authorization,
            changed_max,
        } => {
            let Some(new_max) = parse_wire_number::<u32>("changedMax", &changed_max) else {
                return;
            };
            match hub.change_capacity(room_id, &authorization, new_max).await {
                Ok(room) => {
                    let changed = RoomSummaryMessage {
                        r#type: MessageType::ChangeCapacity,
                        status: ResultStatus::Success,
                        room,
                    };
                    hub.broadcast(room_id, &serde_json::to_string(&changed).unwrap())
                        .await;
                }
                Err(e) => broadcast_fail(hub, room_id, MessageType::ChangeCapacity, &e).await,
            }
        }
        Inbound::ChangeAdmin {
            authorization,
            new_admin_idx,
        } => {
            let Some(new_admin) = parse_wire_number::<u64>("newAdminIdx", &new_admin_idx) else {
                return;
            };
            match hub
                .change_admin(room_id, &authorization, UserId::new(new_admin))
                .await
            {
                Ok(room) => {
                    let changed = RoomSummaryMessage {
                        r#type: MessageType::ChangeAdmin,
                        status: ResultStatus::Success,
                        room,
                    };
                    hub.broadcast(room_id, &serde_json::to_string(&changed).unwrap())
                        .await;
                }
                Err(e) => broadcast_fail(hub, room_id, MessageType::ChangeAdmin, &e).await,
            }
        }
        Inbound::ChangeGameType { change_game_type } => {
            match hub.change_game_category(room_id, &change_game_type).await {
                Ok(()) => {
                    let changed = ChangeGameTypeMessage {
                        r#type: MessageType::ChangeGameType,
                        change_game_type,
                    };
                    hub.broadcast(room_id, &serde_json::to_string(&changed).unwrap())
                        .await;
                }
                Err(e) => broadcast_fail(hub, room_id, MessageType::ChangeGameType, &e).await,
            }
        }
        Inbound::PlayerCnt => match hub.player_count(room_id).await {
            Ok(count) => {
                let answer = PlayerCntMessage {
                    r#type: MessageType::PlayerCnt,
                    player_cnt: count,
                };
                hub.broadcast(room_id, &serde_json::to_string(&answer).unwrap())
                    .await;
            }
            Err(e) => broadcast_fail(hub, room_id, MessageType::PlayerCnt, &e).await,
        },
        Inbound::GameMode => match hub.game_mode(room_id).await {
            Ok(category) => {
                let answer = GameModeMessage {
                    r#type: MessageType::GameMode,
                    game_mode: category,
                };
                hub.broadcast(room_id, &serde_json::to_string(&answer).unwrap())
                    .await;
            }
            Err(e) => broadcast_fail(hub, room_id, MessageType::GameMode, &e).await,
        },
        Inbound::GameTime => match hub.game_time(room_id).await {
            Ok(secs) => {
                let answer = GameTimeMessage {
                    r#type: MessageType::GameTime,
                    round_time: secs,
                };
                hub.broadcast(room_id, &serde_json::to_string(&answer).unwrap())
                    .await;
            }
            Err(e) => broadcast_fail(hub, room_id, MessageType::GameTime, &e).await,
        },
        Inbound::GameTurn => match hub.game_turn(room_id).await {
            Ok(round) => {
                let answer = GameTurnMessage {
                    r#type: MessageType::GameTurn,
                    game_turn: round,
                };
                hub.broadcast(room_id, &serde_json::to_string(&answer).unwrap())
                    .await;
            }
            Err(e) => broadcast_fail(hub, room_id, MessageType::GameTurn, &e).await,
        },
        // roundTime only reconfigures the next countdown; it has no answer
        // envelope.
        Inbound::RoundTime { changed_round_time } => {
            let Some(secs) = parse_wire_number::<u32>("changedRoundTime", &changed_round_time)
            else {
                return;
            };
            if let Err(e) = hub.set_round_time(room_id, secs).await {
                tracing::warn!("Failed to set round time for room '{}': {}", room_id, e);
            }
        }
        Inbound::GameStart { authorization } => {
            match hub.game_start(room_id, &authorization).await {
                Ok(game) => {
                    let started = GameSummaryMessage {
                        r#type: MessageType::GameStart,
                        status: ResultStatus::Success,
                        game,
                    };
                    hub.broadcast(room_id, &serde_json::to_string(&started).unwrap())
                        .await;
                }
                Err(e) => broadcast_fail(hub, room_id, MessageType::GameStart, &e).await,
            }
        }
        // The countdown task broadcasts the ticks itself.
        Inbound::TimeStart => {
            if let Err(e) = hub.time_start(room_id).await {
                broadcast_fail(hub, room_id, MessageType::TimeStart, &e).await;
            }
        }
        Inbound::NextRound => match hub.next_round(room_id).await {
            Ok(game) => {
                let advanced = GameSummaryMessage {
                    r#type: MessageType::NextRound,
                    status: ResultStatus::Success,
                    game,
                };
                hub.broadcast(room_id, &serde_json::to_string(&advanced).unwrap())
                    .await;
            }
            Err(e) => broadcast_fail(hub, room_id, MessageType::NextRound, &e).await,
        },
        Inbound::RoundOver { winner_idx } => {
            let Some(winner) = parse_wire_number::<u64>("winnerIdx", &winner_idx) else {
                return;
            };
            match hub.round_over(room_id, UserId::new(winner)).await {
                Ok(round) => {
                    let ended = RoundSummaryMessage {
                        r#type: MessageType::RoundOver,
                        status: ResultStatus::Success,
                        round,
                    };
                    hub.broadcast(room_id, &serde_json::to_string(&ended).unwrap())
                        .await;
                }
                Err(e) => broadcast_fail(hub, room_id, MessageType::RoundOver, &e).await,
            }
        }
        Inbound::GameOver => match hub.game_over(room_id).await {
            Ok(ranking) => {
                let over = GameOverMessage {
                    r#type: MessageType::GameOver,
                    sorted_list: ranking
                        .into_iter()
                        .map(|(nickname, score)| {
                            HashMap::from([(nickname.into_string(), score)])
                        })
                        .collect(),
                };
                hub.broadcast(room_id, &serde_json::to_string(&over).unwrap())
                    .await;
            }
            Err(e) => broadcast_fail(hub, room_id, MessageType::GameOver, &e).await,
        },
    }
}
