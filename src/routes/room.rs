use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::{state::AppState, utils::websocket};

pub fn routes(state: AppState) -> Router {
    Router::new()
        // 診断用: 全ルーム一覧
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        // 診断用: 特定ルームの状態
        // curl http://localhost:8080/api/room/{roomid}
        .route("/:roomid", get(get_room_info))
        // ゲームプロトコル本体はWebSocket
        // websocat ws://localhost:8080/api/room/ws
        .route("/ws", get(websocket::handler))
        .with_state(state)
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.registry.snapshot().await;
    (StatusCode::OK, Json(rooms))
}

async fn get_room_info(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Response {
    match state.registry.lookup(&room_id).await {
        Ok(session) => {
            let room = session.lock().await.room.clone();
            (StatusCode::OK, Json(room)).into_response()
        }
        Err(e) => (StatusCode::NOT_FOUND, Json(e.to_string())).into_response(),
    }
}
