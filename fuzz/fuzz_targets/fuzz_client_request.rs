#![no_main]

use fading_tictactoe::{ClientRequest, Command, MatchEngine, RoomStore};
use libfuzzer_sys::fuzz_target;
use uuid::Uuid;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Any run of requests, one per line, alternating between two players
    // seated in a fixed room.
    let mut next_code = 0u32;
    let mut engine = MatchEngine::new(RoomStore::with_generator(Box::new(move || {
        next_code += 1;
        format!("FUZZ{:02}", next_code - 1)
    })));
    let players = [Uuid::from_u128(1), Uuid::from_u128(2)];
    let _ = engine.create_room(players[0]);
    let _ = engine.join_room(players[1], "FUZZ00");

    for (i, line) in text.lines().enumerate() {
        let Ok(request) = serde_json::from_str::<ClientRequest>(line) else {
            continue;
        };
        let conn = players[i % 2];
        let _ = engine.handle(conn, request.command);

        for room in engine.rooms().iter() {
            for player in &room.players {
                assert!(room.board.count(player.symbol) <= 3);
            }
        }
    }

    let _ = engine.handle(players[0], Command::CreateRoom);
    let _ = engine.handle_disconnect(players[1]);
});
