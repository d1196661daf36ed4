// src/game/search/quiescence.rs

use shakmaty::Color;

use super::{mate_score, SearchResult, Solver};
use crate::constants::INFINITY;
use crate::game::evaluation::{side_sign, static_score};
use crate::game::{MoveGuard, PositionEngine};

impl Solver {
    /// Plies from the root at which a quiescence node with `depth` remaining sits,
    /// counted on the stretched quiescence scale.
    fn quiescence_plies(&self, depth: u32) -> u32 {
        (self.config.quiescence_depth_factor + 1) * self.reference_depth - depth
    }

    /// Searches only captures and checks (every move when in check) until the
    /// position is quiet, then falls back to the static score.
    pub(super) fn quiescence<P: PositionEngine>(
        &mut self,
        pos: &mut P,
        depth: u32,
        side: Color,
        mut alpha: i32,
        mut beta: i32,
    ) -> SearchResult {
        self.stats.quiescence_nodes += 1;

        if pos.is_checkmate() {
            return SearchResult::leaf(mate_score(side, self.quiescence_plies(depth)));
        }
        if pos.is_stalemate() || pos.can_claim_draw() {
            return SearchResult::leaf(0);
        }
        if depth == 0 {
            return SearchResult::leaf(static_score(pos));
        }

        let sign = side_sign(side);
        let pat = static_score(pos);
        let mut best = SearchResult::leaf(-sign * INFINITY);
        // Out of check, doing nothing is always an option worth `pat`.
        if !pos.is_in_check() {
            match side {
                Color::White => {
                    if pat >= beta {
                        return SearchResult::leaf(beta);
                    }
                    alpha = alpha.max(pat);
                }
                Color::Black => {
                    if pat <= alpha {
                        return SearchResult::leaf(alpha);
                    }
                    beta = beta.min(pat);
                }
            }
            best.score = pat;
        }

        for m in self.orderer.order_moves(pos, None, true) {
            let child = {
                let mut guard = MoveGuard::new(pos, m);
                self.quiescence(&mut *guard, depth - 1, !side, alpha, beta)
            };

            if child.score * sign > best.score * sign {
                best = SearchResult {
                    score: child.score,
                    best_move: Some(m),
                };
            }
            match side {
                Color::White => alpha = alpha.max(best.score),
                Color::Black => beta = beta.min(best.score),
            }
            if beta <= alpha {
                self.stats.cutoffs += 1;
                break;
            }
        }

        best
    }
}
