//! Game service tests over the in-memory store and a manual clock.

use chrono::TimeDelta;
use mafia44_core::{
    Game, PLAYERS, Stage, TOTAL_CARDS, acting_index, is_action_required, owner_of,
    selected_cards_to_action,
};
use mafia44_server::{
    GameError, GameService, GameStore, MAX_MIN_MOVE_TIME, ManualClock, MemoryStore, RoomId,
};

const PLAYER_NAMES: [&str; PLAYERS] = ["alice", "bob", "carol", "dave"];

type Service = GameService<MemoryStore, ManualClock>;

fn service() -> Service {
    GameService::new(MemoryStore::new(), ManualClock::default(), 5)
}

fn full_room(service: &Service) -> RoomId {
    let room = service.create_room("alice", "table", None).unwrap();
    for player in &PLAYER_NAMES[1..] {
        service.join_room(player, *room.id()).unwrap();
    }
    *room.id()
}

fn started_room(service: &Service) -> RoomId {
    let room_id = full_room(service);
    service.start_game("alice", room_id).unwrap();
    room_id
}

fn game(service: &Service, room_id: RoomId) -> Game {
    service.store().game(room_id).unwrap().unwrap()
}

/// Every seat polls, then again once the minimum move time has passed.
fn step(service: &Service, room_id: RoomId) -> Stage {
    for player in PLAYER_NAMES {
        service.get_game_stage(player, room_id).unwrap();
    }
    service.clock().advance(TimeDelta::seconds(5));
    let mut stage = Stage::Beginning;
    for player in PLAYER_NAMES {
        stage = service.get_game_stage(player, room_id).unwrap();
    }
    stage
}

/// First selection the acting seat may legally make at the current stage.
fn legal_selection(game: &Game) -> Option<(usize, Vec<usize>)> {
    let seat = acting_index(game, game.stage()).and_then(owner_of)?;
    let singles = (0..TOTAL_CARDS).map(|a| vec![a]);
    let pairs = (0..TOTAL_CARDS).flat_map(|a| (0..TOTAL_CARDS).map(move |b| vec![a, b]));
    singles
        .chain(pairs)
        .find(|selected| selected_cards_to_action(game, seat, selected).is_ok())
        .map(|selected| (seat, selected))
}

#[test]
fn test_create_room_seats_creator_first() {
    let service = service();
    let room = service.create_room("alice", "table", Some(3)).unwrap();
    assert_eq!(room.players(), &vec!["alice".to_string()]);
    assert_eq!(*room.min_move_time(), 3);
    assert!(!room.is_game_started());

    let err = service.create_room("bob", "table", None).unwrap_err();
    assert!(matches!(err, GameError::RoomAlreadyExists));
}

#[test]
fn test_min_move_time_out_of_range_is_rejected() {
    let service = service();
    for bad in [-1, i64::MAX, MAX_MIN_MOVE_TIME + 1] {
        let err = service.create_room("alice", "table", Some(bad)).unwrap_err();
        assert!(matches!(err, GameError::InvalidMinMoveTime(t) if t == bad));
    }
    assert!(service.list_rooms().unwrap().is_empty());

    let room = service
        .create_room("alice", "table", Some(MAX_MIN_MOVE_TIME))
        .unwrap();
    let room_id = *room.id();
    for player in &PLAYER_NAMES[1..] {
        service.join_room(player, room_id).unwrap();
    }
    service.start_game("alice", room_id).unwrap();
    for player in PLAYER_NAMES {
        assert_eq!(service.get_game_stage(player, room_id).unwrap(), Stage::Beginning);
    }
    service.clock().advance(TimeDelta::days(365));
    assert_eq!(service.get_game_stage("alice", room_id).unwrap(), Stage::Beginning);
}

#[test]
fn test_room_holds_four_players() {
    let service = service();
    let room_id = full_room(&service);
    let err = service.join_room("erin", room_id).unwrap_err();
    assert!(matches!(err, GameError::RoomFull));

    let err = service.join_room("bob", room_id).unwrap_err();
    assert!(matches!(err, GameError::UserAlreadyInRoom));

    let room = service.store().room(room_id).unwrap().unwrap();
    assert_eq!(room.seat_of("carol"), Some(2));
}

#[test]
fn test_leave_room_rules() {
    let service = service();
    let room_id = full_room(&service);
    assert!(matches!(
        service.leave_room("alice", room_id).unwrap_err(),
        GameError::CreatorCannotLeaveRoom
    ));
    assert!(matches!(
        service.leave_room("erin", room_id).unwrap_err(),
        GameError::UserNotInRoom
    ));

    service.leave_room("bob", room_id).unwrap();
    let room = service.store().room(room_id).unwrap().unwrap();
    assert_eq!(room.seat_of("carol"), Some(1));
}

#[test]
fn test_only_creator_deletes_room() {
    let service = service();
    let room_id = full_room(&service);
    assert!(matches!(
        service.delete_room("bob", room_id).unwrap_err(),
        GameError::UserNotCreator
    ));
    service.delete_room("alice", room_id).unwrap();
    assert!(matches!(
        service.join_room("erin", room_id).unwrap_err(),
        GameError::RoomNotFound
    ));
}

#[test]
fn test_start_game_preconditions() {
    let service = service();
    let room = service.create_room("alice", "table", None).unwrap();
    let room_id = *room.id();
    service.join_room("bob", room_id).unwrap();

    assert!(matches!(
        service.start_game("bob", room_id).unwrap_err(),
        GameError::UserNotCreator
    ));
    assert!(matches!(
        service.start_game("erin", room_id).unwrap_err(),
        GameError::UserNotInRoom
    ));
    assert!(matches!(
        service.start_game("alice", room_id).unwrap_err(),
        GameError::NotEnoughPlayers
    ));

    service.join_room("carol", room_id).unwrap();
    service.join_room("dave", room_id).unwrap();
    service.start_game("alice", room_id).unwrap();
    assert!(matches!(
        service.start_game("alice", room_id).unwrap_err(),
        GameError::GameAlreadyStarted
    ));
    assert!(matches!(
        service.leave_room("bob", room_id).unwrap_err(),
        GameError::GameAlreadyStarted
    ));
}

#[test]
fn test_game_operations_check_room_then_game_then_seat() {
    let service = service();
    assert!(matches!(
        service.get_game_stage("alice", 42).unwrap_err(),
        GameError::RoomNotFound
    ));

    let room_id = full_room(&service);
    assert!(matches!(
        service.get_game_stage("erin", room_id).unwrap_err(),
        GameError::GameNotStarted
    ));

    service.start_game("alice", room_id).unwrap();
    assert!(matches!(
        service.get_history("erin", room_id).unwrap_err(),
        GameError::UserNotInRoom
    ));
}

#[test]
fn test_stage_waits_for_every_seat() {
    let service = service();
    let room_id = started_room(&service);
    for player in &PLAYER_NAMES[..3] {
        service.get_game_stage(player, room_id).unwrap();
    }
    service.clock().advance(TimeDelta::seconds(30));
    assert_eq!(service.get_game_stage("alice", room_id).unwrap(), Stage::Beginning);
    assert_eq!(service.get_game_stage("dave", room_id).unwrap(), Stage::Beginning);

    service.clock().advance(TimeDelta::seconds(5));
    assert!(service.get_game_stage("dave", room_id).unwrap() > Stage::Beginning);
}

#[test]
fn test_selection_out_of_turn_is_rejected() {
    let service = service();
    let room_id = started_room(&service);
    let err = service.submit_action("alice", room_id, &[0]).unwrap_err();
    assert!(matches!(err, GameError::InvalidSelectedCards(_)));

    let err = service.shoot_card("alice", room_id, 2).unwrap_err();
    assert!(matches!(err, GameError::InvalidSelectedCards(_)));
}

#[test]
fn test_full_game_through_service() {
    let service = service();
    let room_id = started_room(&service);

    let mut stage = Stage::Beginning;
    for _ in 0..64 {
        if stage >= Stage::Shooting {
            break;
        }
        stage = step(&service, room_id);
        let game = game(&service, room_id);
        if is_action_required(&game, stage)
            && game.current().and_then(|s| s.action()).is_none()
            && let Some((seat, selected)) = legal_selection(&game)
        {
            service
                .submit_action(PLAYER_NAMES[seat], room_id, &selected)
                .unwrap();
        }
    }
    assert_eq!(stage, Stage::Shooting);

    for (seat, player) in PLAYER_NAMES.iter().enumerate() {
        let target = ((seat + 1) % PLAYERS) * 2;
        service.shoot_card(player, room_id, target).unwrap();
    }
    assert!(matches!(
        service.shoot_card("alice", room_id, 4).unwrap_err(),
        GameError::InvalidSelectedCards(_)
    ));

    assert_eq!(service.get_game_stage("alice", room_id).unwrap(), Stage::Finished);
    let game = game(&service, room_id);
    assert!(game.is_finished());
    assert_eq!(game.shots(), &[Some(2), Some(4), Some(6), Some(0)]);

    let history = serde_json::to_value(service.get_history("bob", room_id).unwrap()).unwrap();
    assert_eq!(history["status"], "finished");
}
