use std::collections::HashMap;
use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::sleep;

use mafia_server::models::game::{GameOutcome, GamePhase};
use mafia_server::models::message::ServerEvent;
use mafia_server::models::role::Role;
use mafia_server::services::{game_service, room_service};
use mafia_server::state::AppState;

/// A room member backed by a plain channel instead of a socket.
struct TestClient {
    name: String,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl TestClient {
    /// Everything the server sent this player since the last call.
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            if let Message::Text(text) = msg {
                events.push(serde_json::from_str(&text).expect("server sent invalid JSON"));
            }
        }
        events
    }
}

async fn fill_room(state: &AppState, room_id: &str, names: &[&str]) -> Vec<TestClient> {
    let mut clients = Vec::new();
    for (idx, name) in names.iter().enumerate() {
        let (tx, rx) = mpsc::unbounded_channel();
        if idx == 0 {
            room_service::create_room(state, room_id, name, tx)
                .await
                .unwrap();
        } else {
            room_service::join_room(state, room_id, name, tx)
                .await
                .unwrap();
        }
        clients.push(TestClient {
            name: name.to_string(),
            rx,
        });
    }
    clients
}

/// Reads each player's private role assignment out of their queue.
fn collect_roles(clients: &mut [TestClient]) -> HashMap<String, Role> {
    let mut roles = HashMap::new();
    for client in clients.iter_mut() {
        for event in client.drain() {
            if let ServerEvent::RoleAssigned { role, .. } = event {
                roles.insert(client.name.clone(), role);
            }
        }
    }
    roles
}

fn name_with_role(roles: &HashMap<String, Role>, role: Role) -> String {
    roles
        .iter()
        .find(|(_, r)| **r == role)
        .map(|(name, _)| name.clone())
        .expect("role was not dealt")
}

#[tokio::test]
async fn a_two_player_game_runs_to_its_end() {
    let state = AppState::new();
    let mut clients = fill_room(&state, "r1", &["ann", "bob"]).await;

    let counts = HashMap::from([(Role::Mafia, 1), (Role::Citizen, 1)]);
    game_service::start_game(&state, "r1", counts).await.unwrap();

    let roles = collect_roles(&mut clients);
    let mafia = name_with_role(&roles, Role::Mafia);
    let citizen = name_with_role(&roles, Role::Citizen);

    // both players ack the role reveal, the first night opens
    for name in ["ann", "bob"] {
        game_service::acknowledge_phase(&state, "r1", name)
            .await
            .unwrap();
    }

    // the sole mafia is the whole quorum: the kill resolves immediately and
    // leaves nobody opposing the mafia
    game_service::submit_selection(&state, "r1", &mafia, &citizen, GamePhase::NightKill)
        .await
        .unwrap();

    for client in &mut clients {
        let events = client.drain();
        assert!(
            events.iter().any(|e| matches!(
                e,
                ServerEvent::GameFinished {
                    outcome: GameOutcome::MafiaWin,
                    ..
                }
            )),
            "{} never saw the game end",
            client.name
        );
    }
}

#[tokio::test]
async fn starting_with_a_bad_deck_reports_config_mismatch() {
    let state = AppState::new();
    let _clients = fill_room(&state, "r1", &["ann", "bob", "cal", "dee", "eve"]).await;

    let counts = HashMap::from([(Role::Mafia, 1), (Role::Citizen, 3)]);
    let err = game_service::start_game(&state, "r1", counts)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "4 roles were requested for 5 players");
}

#[tokio::test]
async fn joining_an_unknown_room_fails() {
    let state = AppState::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    let err = room_service::join_room(&state, "nowhere", "ann", tx)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "room nowhere was not found");
}

#[tokio::test]
async fn a_taken_name_cannot_join_twice() {
    let state = AppState::new();
    let _clients = fill_room(&state, "r1", &["ann"]).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = room_service::join_room(&state, "r1", "ann", tx)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "the name ann is already taken in this room");
}

#[tokio::test]
async fn the_last_disconnect_tears_the_room_down() {
    let state = AppState::new();
    let _clients = fill_room(&state, "r1", &["ann", "bob"]).await;

    room_service::disconnect(&state, "r1", "ann").await;
    assert!(state.registry.lookup("r1").await.is_ok());

    room_service::disconnect(&state, "r1", "bob").await;
    assert!(state.registry.lookup("r1").await.is_err());
}

#[tokio::test]
async fn a_voter_disconnecting_mid_phase_lets_the_vote_resolve() {
    let state = AppState::new();
    let mut clients = fill_room(&state, "r1", &["ann", "bob", "cal", "dee"]).await;

    let counts = HashMap::from([(Role::Mafia, 1), (Role::Citizen, 3)]);
    game_service::start_game(&state, "r1", counts).await.unwrap();
    let roles = collect_roles(&mut clients);
    let mafia = name_with_role(&roles, Role::Mafia);

    for client in &clients {
        game_service::acknowledge_phase(&state, "r1", &client.name)
            .await
            .unwrap();
    }

    let citizens: Vec<String> = roles
        .iter()
        .filter(|(_, r)| **r == Role::Citizen)
        .map(|(name, _)| name.clone())
        .collect();
    game_service::submit_selection(&state, "r1", &mafia, &citizens[0], GamePhase::NightKill)
        .await
        .unwrap();

    for client in &clients {
        game_service::acknowledge_phase(&state, "r1", &client.name)
            .await
            .unwrap();
    }

    // two of the three living players vote, the third drops instead
    game_service::submit_selection(&state, "r1", &citizens[1], &mafia, GamePhase::Vote)
        .await
        .unwrap();
    game_service::submit_selection(&state, "r1", &citizens[2], &mafia, GamePhase::Vote)
        .await
        .unwrap();
    room_service::disconnect(&state, "r1", &mafia).await;

    let survivor = clients
        .iter_mut()
        .find(|c| c.name == citizens[1])
        .unwrap();
    let events = survivor.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::VoteResolved {
            votes: 2,
            total: 2,
            ..
        }
    )));
}

#[tokio::test]
async fn night_chat_reaches_only_the_mafia() {
    let state = AppState::new();
    let mut clients = fill_room(&state, "r1", &["ann", "bob", "cal"]).await;

    let counts = HashMap::from([(Role::Mafia, 1), (Role::Citizen, 2)]);
    game_service::start_game(&state, "r1", counts).await.unwrap();
    let roles = collect_roles(&mut clients);
    let mafia = name_with_role(&roles, Role::Mafia);

    for client in &clients {
        game_service::acknowledge_phase(&state, "r1", &client.name)
            .await
            .unwrap();
    }

    game_service::chat(&state, "r1", &mafia, "tonight we strike", GamePhase::NightKill)
        .await
        .unwrap();

    for client in &mut clients {
        let saw_it = client
            .drain()
            .iter()
            .any(|e| matches!(e, ServerEvent::ChatMessage { .. }));
        assert_eq!(saw_it, client.name == mafia);
    }
}

#[tokio::test]
async fn rearming_the_delayed_broadcast_replaces_the_first_timer() {
    let state = AppState::new();
    let mut clients = fill_room(&state, "r1", &["ann"]).await;

    game_service::schedule_delayed_broadcast(&state, "r1", 5_000)
        .await
        .unwrap();
    game_service::schedule_delayed_broadcast(&state, "r1", 20)
        .await
        .unwrap();
    sleep(Duration::from_millis(300)).await;

    let fires = clients[0]
        .drain()
        .iter()
        .filter(|e| matches!(e, ServerEvent::DelayElapsed))
        .count();
    assert_eq!(fires, 1);
}

#[tokio::test]
async fn a_timer_outliving_its_room_fires_into_nothing() {
    let state = AppState::new();
    let _clients = fill_room(&state, "r1", &["ann"]).await;

    game_service::schedule_delayed_broadcast(&state, "r1", 20)
        .await
        .unwrap();
    room_service::leave_room(&state, "r1", "ann").await.unwrap();
    assert!(state.registry.lookup("r1").await.is_err());

    // the sleep gives a leaked timer its chance to misbehave
    sleep(Duration::from_millis(100)).await;
    assert!(state.registry.lookup("r1").await.is_err());
}
