//! Full-game scenario tests.
//!
//! Each test drives a complete game through `GameSession`, checking the
//! final status, the winning line and the draw/win precedence on the
//! final stone. The randomized test plays whole games and verifies the
//! structural invariants hold after every accepted move.

use gomoku_core::{
    GameError, GameSession, GameStatus, Player, Pos, MIN_BOARD_SIZE,
};

/// Play moves in order, each for whichever color is to move.
fn play_all(session: &mut GameSession, moves: &[(usize, usize)]) {
    for &(row, col) in moves {
        let player = session.status().turn().expect("game still in progress");
        session
            .apply(Pos::new(row, col), player)
            .unwrap_or_else(|e| panic!("move at ({}, {}) rejected: {}", row, col, e));
    }
}

/// Interleave black and white move lists into one alternating sequence.
fn interleave(black: &[(usize, usize)], white: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut moves = Vec::with_capacity(black.len() + white.len());
    let mut whites = white.iter();
    for &b in black {
        moves.push(b);
        if let Some(&w) = whites.next() {
            moves.push(w);
        }
    }
    moves
}

#[test]
fn black_wins_top_row_on_fifth_move() {
    let mut session = GameSession::new(5).unwrap();
    play_all(
        &mut session,
        &[
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (0, 2),
            (1, 2),
            (0, 3),
            (1, 3),
        ],
    );
    assert_eq!(session.status(), GameStatus::TurnBlack);

    let line = session
        .apply(Pos::new(0, 4), Player::Black)
        .unwrap()
        .expect("fifth stone completes the row");
    assert_eq!(session.status(), GameStatus::WinnerBlack);
    assert_eq!(line.len(), 5);
    for col in 0..5 {
        assert!(line.contains(&Pos::new(0, col)));
    }
}

#[test]
fn full_board_with_no_run_is_a_draw() {
    // Final 5x5 position, 13 black / 12 white, longest run anywhere is 2:
    //   B B W W B
    //   W W B B W
    //   B B W W B
    //   W W B B W
    //   B B W W B
    // Stones only accumulate, so no intermediate position can hold a run
    // the final position lacks.
    let black = [
        (0, 0),
        (0, 1),
        (0, 4),
        (1, 2),
        (1, 3),
        (2, 0),
        (2, 1),
        (2, 4),
        (3, 2),
        (3, 3),
        (4, 0),
        (4, 1),
        (4, 4),
    ];
    let white = [
        (0, 2),
        (0, 3),
        (1, 0),
        (1, 1),
        (1, 4),
        (2, 2),
        (2, 3),
        (3, 0),
        (3, 1),
        (3, 4),
        (4, 2),
        (4, 3),
    ];

    let mut session = GameSession::new(5).unwrap();
    play_all(&mut session, &interleave(&black, &white));

    assert_eq!(session.status(), GameStatus::Draw);
    assert_eq!(session.total_moves(), 25);
    assert_eq!(session.board().stone_count(), 25);
}

#[test]
fn winning_stone_on_last_cell_beats_draw() {
    // Final 5x5 position where Black's 13th stone at (4,0) both fills the
    // board and completes the first column:
    //   B W W B B
    //   B W B W W
    //   B W W B B
    //   B B W W W
    //   B W W B B
    let black = [
        (0, 0),
        (0, 3),
        (0, 4),
        (1, 0),
        (1, 2),
        (2, 0),
        (2, 3),
        (2, 4),
        (3, 0),
        (3, 1),
        (4, 3),
        (4, 4),
        (4, 0), // last stone: fills the board AND wins
    ];
    let white = [
        (0, 1),
        (0, 2),
        (1, 1),
        (1, 3),
        (1, 4),
        (2, 1),
        (2, 2),
        (3, 2),
        (3, 3),
        (3, 4),
        (4, 1),
        (4, 2),
    ];

    let mut session = GameSession::new(5).unwrap();
    let moves = interleave(&black, &white);
    play_all(&mut session, &moves[..24]);
    assert_eq!(session.status(), GameStatus::TurnBlack);
    assert_eq!(session.total_moves(), 24);

    let line = session
        .apply(Pos::new(4, 0), Player::Black)
        .unwrap()
        .expect("last stone completes the column");
    // Win takes precedence over the board being full
    assert_eq!(session.status(), GameStatus::WinnerBlack);
    assert_eq!(session.total_moves(), 25);
    assert_eq!(line.len(), 5);
    for row in 0..5 {
        assert!(line.contains(&Pos::new(row, 0)));
    }
}

#[test]
fn restart_resets_a_game_in_progress() {
    let mut session = GameSession::new(6).unwrap();
    play_all(&mut session, &[(0, 0), (1, 1), (2, 2)]);
    assert_eq!(session.status(), GameStatus::TurnWhite);
    assert_eq!(session.total_moves(), 3);

    session.restart();
    assert_eq!(session.status(), GameStatus::TurnBlack);
    assert_eq!(session.total_moves(), 0);
    assert_eq!(session.board().size(), 6);
    assert_eq!(session.board().stone_count(), 0);

    // The reset session accepts moves again
    session.apply(Pos::new(3, 3), Player::Black).unwrap();
    assert_eq!(session.status(), GameStatus::TurnWhite);
}

#[test]
fn finished_game_is_read_only() {
    let mut session = GameSession::new(5).unwrap();
    play_all(
        &mut session,
        &[
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (0, 2),
            (1, 2),
            (0, 3),
            (1, 3),
            (0, 4),
        ],
    );
    assert_eq!(session.status(), GameStatus::WinnerBlack);

    let snapshot = session.clone();
    assert_eq!(
        session.apply(Pos::new(4, 4), Player::White).unwrap_err(),
        GameError::GameAlreadyOver
    );
    assert_eq!(session, snapshot);
}

#[test]
fn random_games_preserve_invariants() {
    use rand::prelude::*;

    let mut rng = rand::rng();

    for _ in 0..20 {
        let size = rng.random_range(MIN_BOARD_SIZE..=8);
        let mut session = GameSession::new(size).unwrap();

        while let Some(player) = session.status().turn() {
            let empties: Vec<Pos> = session
                .board()
                .positions()
                .filter(|&pos| session.board().get(pos).unwrap().stone.is_empty())
                .collect();
            let pos = empties[rng.random_range(0..empties.len())];
            let line = session.apply(pos, player).unwrap();

            // Exactly N stones after N moves, orders a permutation of 1..=N
            let n = session.total_moves() as usize;
            assert_eq!(session.board().stone_count(), n);
            let mut orders: Vec<u32> = session
                .board()
                .positions()
                .filter_map(|pos| session.board().get(pos).unwrap().order)
                .collect();
            orders.sort_unstable();
            assert_eq!(orders, (1..=n as u32).collect::<Vec<u32>>());

            match session.status() {
                GameStatus::TurnBlack | GameStatus::TurnWhite => {
                    assert_eq!(session.status(), GameStatus::turn_of(player.opponent()));
                    assert_eq!(line, None);
                }
                GameStatus::WinnerBlack | GameStatus::WinnerWhite => {
                    assert_eq!(session.status(), GameStatus::win_of(player));
                    assert!(line.expect("winner must have a line").len() >= 5);
                }
                GameStatus::Draw => {
                    assert_eq!(n, size * size);
                    assert_eq!(line, None);
                }
            }
        }

        assert!(session.status().is_terminal());
    }
}
