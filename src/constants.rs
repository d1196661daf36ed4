// --- Piece values ---
pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;
pub const KING_VALUE: i32 = 0;

// Search
/// Strictly greater than any score a search can produce.
pub const INFINITY: i32 = i32::MAX - 1;
/// Score of a forced win, reduced by the number of plies needed to reach it.
pub const WINNING_VALUE: i32 = i32::MAX - 100;

// Move ordering
pub const EN_PASSANT_ORDER_KEY: i32 = 90;
pub const ATTACKER_ORDER_WEIGHT: i32 = 9;
