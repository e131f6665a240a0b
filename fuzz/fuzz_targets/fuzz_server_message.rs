#![no_main]

use fading_tictactoe::protocol::ServerMessage;
use fading_tictactoe::{GameEvent, MatchView};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = serde_json::from_slice::<ServerMessage>(data) else {
        return;
    };

    // Whatever the server claims, folding it into a view must not panic.
    let mut view = MatchView::new();
    view.apply(&GameEvent::Connected);
    view.apply(&GameEvent::from(msg));
    let _ = view.status();
    for cell in 0..10 {
        let _ = view.can_move(cell);
    }
});
