// game/mod.rs

pub mod evaluation;
pub mod search;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, MoveList, Move, Piece, Position, PositionError,
    Role, Square,
};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Half-moves without a capture or pawn move after which a draw can be claimed.
const FIFTY_MOVE_HALFMOVES: u32 = 100;
const REPETITIONS_FOR_CLAIM: usize = 3;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("illegal or unparsable move {san:?} on board {board}")]
    IllegalMove { san: String, board: String },
}

/// Everything the search needs to know about a game, and the only way it
/// changes one. `apply` and `undo` must be exact inverses.
pub trait PositionEngine {
    fn legal_moves(&self) -> MoveList;
    fn apply(&mut self, m: Move);
    fn undo(&mut self);

    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;
    fn can_claim_draw(&self) -> bool;
    fn is_in_check(&self) -> bool;

    fn is_capture(&self, m: Move) -> bool;
    fn is_en_passant(&self, m: Move) -> bool;
    fn gives_check(&self, m: Move) -> bool;

    fn piece_type_at(&self, square: Square) -> Option<Role>;
    fn piece_count(&self, role: Role, color: Color) -> usize;
    fn side_to_move(&self) -> Color;
}

/// A chess game backed by shakmaty, with the history needed for undo and
/// repetition claims.
#[derive(Clone, Debug)]
pub struct GameState {
    chess: Chess,
    history: Vec<Chess>,
    // Zobrist keys of every position reached so far, current one last.
    seen: Vec<u64>,
}

impl GameState {
    pub fn new(chess: Chess) -> Self {
        let key = chess.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0;
        Self {
            chess,
            history: Vec::new(),
            seen: vec![key],
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let invalid = |reason: String| GameError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed = fen.parse::<Fen>().map_err(|e| invalid(format!("{e}")))?;
        // Puzzle FENs often carry castling rights that no longer match the
        // board; drop those instead of rejecting the position.
        let chess = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::new(chess))
    }

    #[cfg(test)]
    pub fn chess(&self) -> &Chess {
        &self.chess
    }

    pub fn zobrist(&self) -> u64 {
        self.seen.last().copied().unwrap_or_default()
    }

    /// Number of moves applied and not yet undone.
    #[cfg(test)]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Resolves a SAN move (check suffixes allowed) against the current position.
    pub fn parse_san(&self, san: &str) -> Result<Move, GameError> {
        let illegal = || GameError::IllegalMove {
            san: san.to_string(),
            board: self.chess.board().to_string(),
        };
        let parsed = san.parse::<SanPlus>().map_err(|_| illegal())?;
        parsed.san.to_move(&self.chess).map_err(|_| illegal())
    }

    pub fn san(&self, m: Move) -> String {
        SanPlus::from_move(self.chess.clone(), m).to_string()
    }

    fn repetitions(&self) -> usize {
        let current = self.zobrist();
        self.seen.iter().filter(|&&key| key == current).count()
    }
}

impl PositionEngine for GameState {
    fn legal_moves(&self) -> MoveList {
        self.chess.legal_moves()
    }

    fn apply(&mut self, m: Move) {
        debug_assert!(self.chess.legal_moves().contains(&m), "illegal move {m:?}");
        self.history.push(self.chess.clone());
        self.chess.play_unchecked(m);
        self.seen
            .push(self.chess.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0);
    }

    fn undo(&mut self) {
        let previous = self
            .history
            .pop()
            .expect("undo called without a matching apply");
        self.chess = previous;
        self.seen.pop();
    }

    fn is_checkmate(&self) -> bool {
        self.chess.is_checkmate()
    }

    fn is_stalemate(&self) -> bool {
        self.chess.is_stalemate()
    }

    fn can_claim_draw(&self) -> bool {
        self.chess.halfmoves() >= FIFTY_MOVE_HALFMOVES
            || self.repetitions() >= REPETITIONS_FOR_CLAIM
    }

    fn is_in_check(&self) -> bool {
        self.chess.is_check()
    }

    fn is_capture(&self, m: Move) -> bool {
        m.is_capture()
    }

    fn is_en_passant(&self, m: Move) -> bool {
        m.is_en_passant()
    }

    fn gives_check(&self, m: Move) -> bool {
        let mut after = self.chess.clone();
        after.play_unchecked(m);
        after.is_check()
    }

    fn piece_type_at(&self, square: Square) -> Option<Role> {
        self.chess.board().piece_at(square).map(|piece| piece.role)
    }

    fn piece_count(&self, role: Role, color: Color) -> usize {
        self.chess.board().by_piece(Piece { role, color }).count()
    }

    fn side_to_move(&self) -> Color {
        self.chess.turn()
    }
}

/// Applies a move for as long as the guard lives. Dropping the guard undoes
/// it, so early returns and cutoffs always leave the position restored.
pub struct MoveGuard<'a, P: PositionEngine> {
    pos: &'a mut P,
}

impl<'a, P: PositionEngine> MoveGuard<'a, P> {
    pub fn new(pos: &'a mut P, m: Move) -> Self {
        pos.apply(m);
        Self { pos }
    }
}

impl<P: PositionEngine> Deref for MoveGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.pos
    }
}

impl<P: PositionEngine> DerefMut for MoveGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.pos
    }
}

impl<P: PositionEngine> Drop for MoveGuard<'_, P> {
    fn drop(&mut self) {
        self.pos.undo();
    }
}
