// src/game/search.rs

pub mod ordering;
pub mod quiescence;

use serde::{Deserialize, Serialize};
use shakmaty::{Color, Move};
use thiserror::Error;
use tracing::{debug, debug_span, trace};

use crate::constants::{INFINITY, WINNING_VALUE};
use crate::game::evaluation::side_sign;
use crate::game::{MoveGuard, PositionEngine};
use ordering::{KillerSet, MoveOrderer};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub search_depth: u32,
    /// Quiescence gets `factor * depth` plies below the principal horizon.
    pub quiescence_depth_factor: u32,
    pub use_killer_moves: bool,
    /// Shuffles quiet moves reproducibly; `None` keeps generation order.
    pub shuffle_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_depth: 3,
            quiescence_depth_factor: 2,
            use_killer_moves: true,
            shuffle_seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("search depth must be at least 1")]
    InvalidDepth,
    #[error("position is already decided, there is no move to return")]
    NoLegalMove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub score: i32,
    /// Absent at terminal nodes, at quiescence leaves, and at quiescence nodes
    /// where no searched move beat standing pat.
    pub best_move: Option<Move>,
}

impl SearchResult {
    fn leaf(score: i32) -> Self {
        Self {
            score,
            best_move: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub quiescence_nodes: u64,
    pub cutoffs: u64,
}

impl SearchStats {
    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.quiescence_nodes
    }
}

/// Score of a checkmate on `side`'s turn, `plies` half-moves into the search.
///
/// Positive for White winning; shorter mates are worth strictly more.
pub fn mate_score(side: Color, plies: u32) -> i32 {
    -side_sign(side) * (WINNING_VALUE - plies as i32)
}

/// Bounded-depth alpha-beta search with a capture/check horizon extension.
pub struct Solver {
    config: SearchConfig,
    orderer: MoveOrderer,
    reference_depth: u32,
    stats: SearchStats,
}

impl Solver {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            orderer: MoveOrderer::new(config.shuffle_seed),
            config,
            reference_depth: 0,
            stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Counters for the most recent `analyse`/`solve` call.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Best move for `side` searched `depth` plies deep.
    pub fn solve<P: PositionEngine>(
        &mut self,
        pos: &mut P,
        depth: u32,
        side: Color,
    ) -> Result<Move, SolveError> {
        self.solve_scored(pos, depth, side).map(|(m, _)| m)
    }

    /// Like `solve`, also returning the root score (positive for White).
    pub fn solve_scored<P: PositionEngine>(
        &mut self,
        pos: &mut P,
        depth: u32,
        side: Color,
    ) -> Result<(Move, i32), SolveError> {
        if depth == 0 {
            return Err(SolveError::InvalidDepth);
        }
        let result = self.analyse(pos, depth, side);
        result
            .best_move
            .map(|m| (m, result.score))
            .ok_or(SolveError::NoLegalMove)
    }

    /// Exact score of `side` playing `m` here, on the same scale `solve_scored`
    /// reports, so two root moves can be compared.
    pub fn score_move<P: PositionEngine>(
        &mut self,
        pos: &mut P,
        m: Move,
        depth: u32,
        side: Color,
    ) -> Result<i32, SolveError> {
        if depth == 0 {
            return Err(SolveError::InvalidDepth);
        }
        self.reference_depth = depth;
        self.stats = SearchStats::default();
        let mut guard = MoveGuard::new(pos, m);
        let child = self.principal_search(&mut *guard, depth - 1, !side, -INFINITY, INFINITY, None);
        Ok(child.score)
    }

    /// Full-window search from the root, returning the score alongside the move.
    pub fn analyse<P: PositionEngine>(&mut self, pos: &mut P, depth: u32, side: Color) -> SearchResult {
        let span = debug_span!("solve", depth, side = ?side);
        let _enter = span.enter();

        self.reference_depth = depth;
        self.stats = SearchStats::default();
        let result = self.principal_search(pos, depth, side, -INFINITY, INFINITY, None);

        debug!(
            score = result.score,
            best_move = ?result.best_move,
            nodes = self.stats.nodes,
            quiescence_nodes = self.stats.quiescence_nodes,
            cutoffs = self.stats.cutoffs,
            "search finished"
        );
        result
    }

    fn principal_search<P: PositionEngine>(
        &mut self,
        pos: &mut P,
        depth: u32,
        side: Color,
        mut alpha: i32,
        mut beta: i32,
        killers: Option<&mut KillerSet>,
    ) -> SearchResult {
        self.stats.nodes += 1;

        if pos.is_checkmate() {
            return SearchResult::leaf(mate_score(side, self.reference_depth - depth));
        }
        if pos.is_stalemate() || pos.can_claim_draw() {
            return SearchResult::leaf(0);
        }
        if depth == 0 {
            let horizon = self.reference_depth * self.config.quiescence_depth_factor;
            return self.quiescence(pos, horizon, side, alpha, beta);
        }

        let sign = side_sign(side);
        let mut best = SearchResult::leaf(-sign * INFINITY);
        let mut child_killers = KillerSet::new();
        let is_root = depth == self.reference_depth;

        for m in self.orderer.order_moves(pos, killers, false) {
            let child = {
                let mut guard = MoveGuard::new(pos, m);
                let shared = self.config.use_killer_moves.then_some(&mut child_killers);
                self.principal_search(&mut *guard, depth - 1, !side, alpha, beta, shared)
            };
            if let Some(reply) = child.best_move {
                child_killers.insert(reply);
            }

            if child.score * sign > best.score * sign {
                best = SearchResult {
                    score: child.score,
                    best_move: Some(m),
                };
                if is_root {
                    trace!(best_move = ?m, score = child.score, "new best root move");
                }
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

#[cfg(test)]
mod tests;
