//! Search behaviour on small positions.

use super::ordering::MoveOrderer;
use super::*;
use crate::game::evaluation::static_score;
use crate::game::GameState;
use shakmaty::Position;

fn state(fen: &str) -> GameState {
    GameState::from_fen(fen).unwrap()
}

fn fingerprint(pos: &GameState) -> (shakmaty::Board, Color, u64, usize) {
    (
        pos.chess().board().clone(),
        pos.side_to_move(),
        pos.zobrist(),
        pos.ply(),
    )
}

/// Plain minimax over the same tree the solver walks, without any pruning.
struct Minimax {
    reference_depth: u32,
    factor: u32,
}

impl Minimax {
    fn new(depth: u32) -> Self {
        Self {
            reference_depth: depth,
            factor: SearchConfig::default().quiescence_depth_factor,
        }
    }

    fn pick(side: Color, scores: impl Iterator<Item = i32>) -> Option<i32> {
        match side {
            Color::White => scores.max(),
            Color::Black => scores.min(),
        }
    }

    fn principal(&self, pos: &mut GameState, depth: u32, side: Color) -> i32 {
        if pos.is_checkmate() {
            return mate_score(side, self.reference_depth - depth);
        }
        if pos.is_stalemate() || pos.can_claim_draw() {
            return 0;
        }
        if depth == 0 {
            return self.quiescence(pos, self.reference_depth * self.factor, side);
        }
        let mut scores = Vec::new();
        for m in pos.legal_moves() {
            pos.apply(m);
            scores.push(self.principal(pos, depth - 1, !side));
            pos.undo();
        }
        Self::pick(side, scores.into_iter()).unwrap()
    }

    fn quiescence(&self, pos: &mut GameState, depth: u32, side: Color) -> i32 {
        if pos.is_checkmate() {
            let plies = (self.factor + 1) * self.reference_depth - depth;
            return mate_score(side, plies);
        }
        if pos.is_stalemate() || pos.can_claim_draw() {
            return 0;
        }
        let pat = static_score(pos);
        if depth == 0 {
            return pat;
        }
        let mut scores = Vec::new();
        if !pos.is_in_check() {
            scores.push(pat);
        }
        for m in MoveOrderer::new(None).order_moves(pos, None, true) {
            pos.apply(m);
            scores.push(self.quiescence(pos, depth - 1, !side));
            pos.undo();
        }
        Self::pick(side, scores.into_iter()).unwrap()
    }
}

#[test]
fn test_quick_mate_line() {
    let mut pos = state("7k/8/5K2/8/8/8/8/6Q1 b - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());

    let escape = solver.solve(&mut pos, 1, Color::Black).unwrap();
    assert_eq!(pos.san(escape), "Kh7");
    pos.apply(escape);

    let mate = solver.solve(&mut pos, 1, Color::White).unwrap();
    assert_eq!(pos.san(mate), "Qg7#");
}

#[test]
fn test_takes_hanging_queen() {
    let mut pos = state("3rk3/8/8/3Q4/8/8/8/4K3 b - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    let m = solver.solve(&mut pos, 1, Color::Black).unwrap();
    assert_eq!(pos.san(m), "Rxd5");
}

#[test]
fn test_solve_returns_legal_move() {
    let cases = [
        ("2kr4/1p1r1p2/2p1p2p/8/P1P1Rp2/8/1P3PPP/R5K1 w - - 0 1", 1),
        ("8/8/r7/P4k2/3p1p2/3P4/5K2/7R b - - 0 1", 2),
        ("4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1", 2),
        ("8/8/5rk1/R4pp1/P1N5/2P3P1/1P3KP1/1r6 b - - 0 1", 1),
    ];
    for (fen, depth) in cases {
        let mut pos = state(fen);
        let side = pos.side_to_move();
        let mut solver = Solver::new(SearchConfig {
            shuffle_seed: Some(3),
            ..SearchConfig::default()
        });
        let m = solver.solve(&mut pos, depth, side).unwrap();
        assert!(pos.legal_moves().contains(&m), "{fen}");
    }
}

#[test]
fn test_alpha_beta_matches_unpruned_minimax() {
    let cases = [
        ("4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1", 1),
        ("4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1", 2),
        ("3rk3/8/8/3Q4/8/8/8/4K3 b - - 0 1", 1),
        ("7k/8/5K2/8/8/8/8/6Q1 b - - 0 1", 2),
        ("8/8/8/4k3/8/3p4/8/3K3R w - - 0 1", 1),
    ];
    for (fen, depth) in cases {
        let mut pos = state(fen);
        let side = pos.side_to_move();
        let expected = Minimax::new(depth).principal(&mut pos, depth, side);
        let mut solver = Solver::new(SearchConfig::default());
        let result = solver.analyse(&mut pos, depth, side);
        assert_eq!(result.score, expected, "{fen} at depth {depth}");
    }
}

#[test]
fn test_move_ordering_does_not_change_value() {
    let fen = "4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1";
    let scores: Vec<i32> = [
        SearchConfig::default(),
        SearchConfig {
            use_killer_moves: false,
            ..SearchConfig::default()
        },
        SearchConfig {
            shuffle_seed: Some(11),
            ..SearchConfig::default()
        },
    ]
    .into_iter()
    .map(|config| {
        let mut pos = state(fen);
        Solver::new(config).analyse(&mut pos, 2, Color::White).score
    })
    .collect();
    assert!(scores.windows(2).all(|w| w[0] == w[1]), "{scores:?}");
}

#[test]
fn test_quiet_leaf_quiescence_is_static_score() {
    let mut pos = state("4k3/8/8/8/8/8/P7/4K3 w - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    solver.reference_depth = 1;
    let result = solver.quiescence(&mut pos, 2, Color::White, -INFINITY, INFINITY);
    assert_eq!(result.score, static_score(&pos));
    assert_eq!(result.best_move, None);
}

#[test]
fn test_quiescence_resolves_exchange() {
    // Rxd5 wins a knight; nothing can recapture.
    let mut pos = state("4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    solver.reference_depth = 1;
    let result = solver.quiescence(&mut pos, 2, Color::White, -INFINITY, INFINITY);
    assert_eq!(result.score, 5);
    assert_eq!(result.best_move.map(|m| pos.san(m)), Some("Rxd5".to_string()));
}

#[test]
fn test_quiescence_stand_pat_fails_high() {
    let mut pos = state("4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    solver.reference_depth = 1;
    let result = solver.quiescence(&mut pos, 2, Color::White, -INFINITY, 1);
    assert_eq!(result, SearchResult::leaf(1));
    assert_eq!(solver.stats().quiescence_nodes, 1);
}

#[test]
fn test_quiescence_keeps_stand_pat_over_losing_capture() {
    // Rxd5 loses the rook to cxd5.
    let mut pos = state("4k3/8/2p5/3p4/8/8/8/3RK3 w - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    solver.reference_depth = 1;
    let result = solver.quiescence(&mut pos, 2, Color::White, -INFINITY, INFINITY);
    assert_eq!(result, SearchResult::leaf(static_score(&pos)));
    assert!(solver.stats().quiescence_nodes > 1);
}

#[test]
fn test_score_move_matches_root_choice() {
    let mut pos = state("3rk3/8/8/3Q4/8/8/8/4K3 b - - 0 1");
    let before = fingerprint(&pos);
    let mut solver = Solver::new(SearchConfig::default());
    let (best, score) = solver.solve_scored(&mut pos, 1, Color::Black).unwrap();
    assert_eq!(solver.score_move(&mut pos, best, 1, Color::Black), Ok(score));

    let quiet = pos.parse_san("Ke7").unwrap();
    let worse = solver.score_move(&mut pos, quiet, 1, Color::Black).unwrap();
    assert!(worse > score);
    assert_eq!(fingerprint(&pos), before);
    assert_eq!(
        solver.score_move(&mut pos, best, 0, Color::Black),
        Err(SolveError::InvalidDepth)
    );
}

#[test]
fn test_position_unchanged_after_search() {
    let fens = [
        "2kr4/1p1r1p2/2p1p2p/8/P1P1Rp2/8/1P3PPP/R5K1 w - - 0 1",
        "3q4/6kp/2b1Q1p1/1p6/3r4/1B6/4RPPP/6K1 w - - 0 1",
    ];
    for fen in fens {
        let mut pos = state(fen);
        let before = fingerprint(&pos);
        let side = pos.side_to_move();
        let mut solver = Solver::new(SearchConfig::default());
        solver.analyse(&mut pos, 2, side);
        assert!(solver.stats().cutoffs > 0);
        assert_eq!(fingerprint(&pos), before, "{fen}");

        solver.reference_depth = 1;
        solver.quiescence(&mut pos, 2, side, -INFINITY, INFINITY);
        assert_eq!(fingerprint(&pos), before, "{fen}");
    }
}

#[test]
fn test_shorter_mate_scores_higher() {
    let mut solver = Solver::new(SearchConfig::default());

    let mut mate_in_two_plies = state("7k/8/5K2/8/8/8/8/6Q1 b - - 0 1");
    let longer = solver.analyse(&mut mate_in_two_plies, 2, Color::Black).score;

    let mut mate_in_one_ply = state("8/7k/5K2/8/8/8/8/6Q1 w - - 1 2");
    let shorter = solver.analyse(&mut mate_in_one_ply, 2, Color::White).score;

    assert_eq!(longer, mate_score(Color::Black, 2));
    assert_eq!(shorter, mate_score(Color::Black, 1));
    assert!(shorter > longer);
    assert!(longer > 0);
}

#[test]
fn test_mate_score_orders_by_distance() {
    for plies in 0..10 {
        assert!(mate_score(Color::Black, plies) > mate_score(Color::Black, plies + 1));
        assert!(mate_score(Color::White, plies) < mate_score(Color::White, plies + 1));
        assert_eq!(mate_score(Color::White, plies), -mate_score(Color::Black, plies));
    }
    assert!(mate_score(Color::Black, 0) < INFINITY);
}

#[test]
fn test_terminal_root_is_a_caller_error() {
    let mut mated = state("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    assert_eq!(
        solver.solve(&mut mated, 1, Color::Black),
        Err(SolveError::NoLegalMove)
    );
    assert_eq!(
        solver.analyse(&mut mated, 1, Color::Black).score,
        mate_score(Color::Black, 0)
    );

    let mut stalemate = state("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    assert_eq!(
        solver.analyse(&mut stalemate, 1, Color::Black),
        SearchResult::leaf(0)
    );
}

#[test]
fn test_zero_depth_is_rejected() {
    let mut pos = state("4k3/8/8/3n4/8/8/3R4/4K3 w - - 0 1");
    let mut solver = Solver::new(SearchConfig::default());
    assert_eq!(
        solver.solve(&mut pos, 0, Color::White),
        Err(SolveError::InvalidDepth)
    );
}

#[test]
fn test_config_round_trips_through_json() {
    let config = SearchConfig {
        search_depth: 4,
        shuffle_seed: Some(9),
        ..SearchConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(serde_json::from_str::<SearchConfig>(&json).unwrap(), config);

    let partial: SearchConfig = serde_json::from_str(r#"{"search_depth": 2}"#).unwrap();
    assert_eq!(partial.quiescence_depth_factor, 2);
    assert!(partial.use_killer_moves);
}
