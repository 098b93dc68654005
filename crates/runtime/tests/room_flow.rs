use std::time::Duration;

use game_core::GridMode;
use runtime::{
    ChatScope, ClientCommand, Envelope, ErrorKind, Identity, RoomManager, RoomStatus,
    RuntimeConfig, RuntimeError, ServerEvent, Topic, VoteItem,
};
use tokio::sync::broadcast;

fn manager() -> RoomManager {
    RoomManager::new(RuntimeConfig::default().with_seed(5)).expect("default config is valid")
}

/// Waits for the next event addressed to `who` that satisfies `pred`.
async fn next_for(
    rx: &mut broadcast::Receiver<Envelope>,
    who: &Identity,
    pred: impl Fn(&ServerEvent) -> bool,
) -> ServerEvent {
    loop {
        let envelope = tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("event should arrive in time")
            .expect("event bus should stay open");
        if envelope.is_for(who) && pred(&envelope.event) {
            return envelope.event;
        }
    }
}

/// Joins `players` to a fresh room on the open map and readies everyone.
async fn start_match(manager: &RoomManager, players: &[Identity]) -> runtime::RoomId {
    let room_id = manager.create(GridMode::Square).await;
    for player in players {
        manager.join(player, room_id).await.expect("join should succeed");
    }
    manager
        .vote(&players[0], VoteItem::Map, "open")
        .await
        .expect("open map vote should be valid");
    for player in players {
        manager.ready(player).await.expect("ready should succeed");
    }
    room_id
}

#[tokio::test]
async fn empty_room_is_destroyed() {
    let manager = manager();
    let (a, b) = (Identity::from("alice"), Identity::from("bob"));

    let room_id = manager.create(GridMode::Hexagon).await;
    manager.join(&a, room_id).await.expect("first join");
    assert_eq!(manager.list().await.len(), 1);

    manager.leave(&a).await.expect("leave");
    assert!(manager.list().await.is_empty());
    assert!(manager.handle(room_id).await.is_none());

    let err = manager.join(&b, room_id).await.unwrap_err();
    assert!(matches!(err, RuntimeError::RoomNotFound(id) if id == room_id));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn player_is_in_one_room_at_a_time() {
    let manager = manager();
    let (a, b, c) = (
        Identity::from("alice"),
        Identity::from("bob"),
        Identity::from("carol"),
    );

    let reply = manager
        .dispatch(&a, ClientCommand::CreateRoom {
            mode: GridMode::Triangle,
        })
        .await
        .expect("create room");
    let Some(ServerEvent::Joined { room_id: first }) = reply else {
        panic!("create should reply with Joined, got {reply:?}");
    };
    manager.join(&b, first).await.expect("bob joins");

    let second = manager.create(GridMode::Square).await;
    manager.join(&c, second).await.expect("carol joins");
    manager.join(&a, second).await.expect("alice switches rooms");

    assert_eq!(manager.room_of(&a).await, Some(second));
    let snapshot = manager.snapshot(first).await.expect("first room survives");
    assert_eq!(snapshot.members.len(), 1);
    assert_eq!(snapshot.members[0].identity, b);

    let rooms = manager.list().await;
    let ids: Vec<_> = rooms.iter().map(|r| (r.room_id, r.members)).collect();
    assert_eq!(ids, vec![(first, 1), (second, 2)]);
}

#[tokio::test]
async fn commands_outside_a_room_fail() {
    let manager = manager();
    let a = Identity::from("alice");

    let err = manager.ready(&a).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotInRoom));

    let err = manager
        .dispatch(&a, ClientCommand::Identify {
            identity: a.clone(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = manager.leave(&a).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotInRoom));
}

#[tokio::test]
async fn world_chat_reaches_everyone() {
    let manager = manager();
    let a = Identity::from("alice");
    let mut chat = manager.subscribe(Topic::Chat);

    manager
        .message(&a, ChatScope::World, "gl hf".to_owned())
        .await
        .expect("world message");
    let event = next_for(&mut chat, &Identity::from("anyone"), |_| true).await;
    assert_eq!(
        event,
        ServerEvent::Message {
            scope: ChatScope::World,
            sender: a.clone(),
            content: "gl hf".to_owned(),
        }
    );

    let err = manager
        .message(&a, ChatScope::World, "x".repeat(617))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

/// Full session: lobby, start, surrender, tick-driven end.
#[tokio::test(start_paused = true)]
async fn match_runs_until_one_side_remains() {
    let manager = manager();
    let players = [Identity::from("alice"), Identity::from("bob")];
    let mut game = manager.subscribe(Topic::Game);

    let room_id = start_match(&manager, &players).await;

    let started = next_for(&mut game, &players[1], |e| {
        matches!(e, ServerEvent::GameStarted { .. })
    })
    .await;
    let ServerEvent::GameStarted {
        room_id: started_in,
        color,
        roster,
        cells,
        width,
        height,
        ..
    } = started
    else {
        unreachable!()
    };
    assert_eq!(started_in, room_id);
    assert_eq!(color, 2);
    assert_eq!(roster.len(), 2);
    assert_eq!(cells.len(), (width * height) as usize);

    let snapshot = manager.snapshot(room_id).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Playing);
    let err = manager
        .join(&Identity::from("carol"), room_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::AlreadyPlaying(_)));

    manager.surrender(&players[1]).await.expect("surrender");
    let defeated = next_for(&mut game, &players[0], |e| {
        matches!(e, ServerEvent::PlayerDefeated { .. })
    })
    .await;
    assert_eq!(
        defeated,
        ServerEvent::PlayerDefeated {
            identity: players[1].clone(),
            color: 2,
            by: None,
        }
    );

    let ended = next_for(&mut game, &players[0], |e| {
        matches!(e, ServerEvent::GameEnded { .. })
    })
    .await;
    let ServerEvent::GameEnded { winners, aborted, .. } = ended else {
        unreachable!()
    };
    assert_eq!(winners, vec![players[0].clone()]);
    assert!(!aborted);

    assert!(manager.list().await.is_empty());
    let err = manager.surrender(&players[0]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

#[tokio::test(start_paused = true)]
async fn destroying_a_room_aborts_its_match() {
    let manager = manager();
    let players = [Identity::from("alice"), Identity::from("bob")];
    let mut game = manager.subscribe(Topic::Game);
    let mut lobby = manager.subscribe(Topic::Lobby);

    let room_id = start_match(&manager, &players).await;
    let handle = manager.handle(room_id).await.expect("room is registered");

    manager.destroy(room_id).await.expect("destroy");

    let ended = next_for(&mut game, &players[0], |e| {
        matches!(e, ServerEvent::GameEnded { .. })
    })
    .await;
    assert!(matches!(ended, ServerEvent::GameEnded { aborted: true, .. }));
    next_for(&mut lobby, &players[0], |e| {
        matches!(e, ServerEvent::RoomClosed { room_id: id } if *id == room_id)
    })
    .await;

    let err = handle.snapshot().await.unwrap_err();
    assert!(matches!(err, RuntimeError::RoomNotFound(_)));
    let err = manager.ready(&players[0]).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotInRoom));
}

#[tokio::test(start_paused = true)]
async fn stalled_room_is_force_ended() {
    let manager = manager();
    let players = [Identity::from("alice"), Identity::from("bob")];
    let mut game = manager.subscribe(Topic::Game);

    let room_id = start_match(&manager, &players).await;

    // Far beyond the default allowance of 10 ticks of 500 ms.
    tokio::time::advance(Duration::from_secs(30)).await;

    let ended = next_for(&mut game, &players[0], |e| {
        matches!(e, ServerEvent::GameEnded { .. })
    })
    .await;
    assert!(matches!(
        ended,
        ServerEvent::GameEnded { aborted: true, ref winners, .. } if winners.is_empty()
    ));

    let snapshot = manager.snapshot(room_id).await.expect("room outlives the match");
    assert_eq!(snapshot.status, RoomStatus::Ended);
}

#[tokio::test]
async fn created_rooms_start_with_their_creator() {
    let manager = manager();
    let a = Identity::from("alice");

    let room_id = manager
        .create_and_join(&a, GridMode::Square)
        .await
        .expect("create");
    assert_eq!(manager.room_of(&a).await, Some(room_id));
    let rooms = manager.list().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].members, 1);

    // Creating another room moves the creator and empties the first.
    let second = manager
        .create_and_join(&a, GridMode::Hexagon)
        .await
        .expect("create again");
    assert!(manager.handle(room_id).await.is_none());
    assert_eq!(manager.room_of(&a).await, Some(second));

    manager.leave(&a).await.expect("leave");
    assert!(manager.list().await.is_empty());
}

#[tokio::test]
async fn pending_join_does_not_block_other_rooms() {
    let manager = manager();
    let (a, b, c) = (
        Identity::from("alice"),
        Identity::from("bob"),
        Identity::from("carol"),
    );
    let first = manager.create_and_join(&a, GridMode::Square).await.expect("create");
    manager.create_and_join(&c, GridMode::Square).await.expect("create");

    // Start a join and leave it waiting on the worker's reply.
    let join = manager.join(&b, first);
    tokio::pin!(join);
    std::future::poll_fn(|cx| {
        assert!(join.as_mut().poll(cx).is_pending());
        std::task::Poll::Ready(())
    })
    .await;

    let rooms = tokio::time::timeout(Duration::from_secs(5), manager.list())
        .await
        .expect("listing proceeds while a join is in flight");
    assert_eq!(rooms.len(), 2);
    tokio::time::timeout(Duration::from_secs(5), manager.ready(&c))
        .await
        .expect("other rooms stay responsive")
        .expect("ready");

    join.await.expect("join completes");
    assert_eq!(manager.room_of(&b).await, Some(first));
}

/// A subscriber that falls behind asks for a resync and rebuilds its view.
#[tokio::test]
async fn lagging_subscriber_is_resynced() {
    let config = RuntimeConfig {
        event_buffer_size: 4,
        ..RuntimeConfig::default().with_seed(5)
    };
    let manager = RoomManager::new(config).expect("valid config");
    let players = [Identity::from("alice"), Identity::from("bob")];
    let mut game = manager.subscribe(Topic::Game);

    start_match(&manager, &players).await;
    for _ in 0..4 {
        manager.clear_movements(&players[0]).await.expect("clear");
    }

    let err = game.recv().await.unwrap_err();
    assert!(matches!(err, broadcast::error::RecvError::Lagged(_)));

    let mut game = game.resubscribe();
    manager.resync(&players[0]).await.expect("resync");
    let synced = next_for(&mut game, &players[0], |e| {
        matches!(e, ServerEvent::GameSync { .. })
    })
    .await;
    let ServerEvent::GameSync {
        color,
        width,
        height,
        cells,
        ..
    } = synced
    else {
        unreachable!()
    };
    assert_eq!(color, 1);
    assert_eq!(cells.len(), (width * height) as usize);

    let err = manager.resync(&Identity::from("nobody")).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotInRoom));
}
