//! Static evaluation of a chess position.

use shakmaty::{Color, Role};

use crate::constants::{
    BISHOP_VALUE, KING_VALUE, KNIGHT_VALUE, PAWN_VALUE, QUEEN_VALUE, ROOK_VALUE,
};
use crate::game::PositionEngine;

pub fn get_piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => KING_VALUE,
    }
}

/// +1 for White, the maximizing side, and -1 for Black.
pub fn side_sign(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// Material balance in pawns, positive when White is ahead.
///
/// The score does not depend on whose turn it is, so mirroring the colors of
/// a position negates it.
pub fn static_score<P: PositionEngine>(pos: &P) -> i32 {
    let mut score = 0;
    for &color in &Color::ALL {
        for &role in &Role::ALL {
            let count = pos.piece_count(role, color) as i32;
            score += side_sign(color) * count * get_piece_value(role);
        }
    }
    score
}
