// src/game/search/ordering.rs

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shakmaty::Move;

use crate::constants::{ATTACKER_ORDER_WEIGHT, EN_PASSANT_ORDER_KEY};
use crate::game::evaluation::get_piece_value;
use crate::game::PositionEngine;

/// Quiet moves that refuted a sibling subtree at the same ply.
///
/// Owned by one principal-search node and handed to its children; insertion
/// order is kept so move ordering stays reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KillerSet {
    moves: Vec<Move>,
}

impl KillerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, m: Move) {
        if !self.contains(m) {
            self.moves.push(m);
        }
    }

    pub fn discard(&mut self, m: Move) {
        self.moves.retain(|&k| k != m);
    }

    pub fn contains(&self, m: Move) -> bool {
        self.moves.contains(&m)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Sort key for captures, lowest first: take the most valuable victim with
/// the least valuable attacker.
pub fn capture_order_key<P: PositionEngine>(pos: &P, m: Move) -> i32 {
    if pos.is_en_passant(m) {
        return EN_PASSANT_ORDER_KEY;
    }
    let attacker = m
        .from()
        .and_then(|sq| pos.piece_type_at(sq))
        .map_or(0, get_piece_value);
    let victim = pos.piece_type_at(m.to()).map_or(0, get_piece_value);
    ATTACKER_ORDER_WEIGHT * attacker - victim
}

pub struct MoveOrderer {
    rng: Option<StdRng>,
}

impl MoveOrderer {
    /// Without a seed the remaining quiet moves keep generation order.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map(StdRng::seed_from_u64),
        }
    }

    /// Returns every legal move exactly once: captures, then checks, then
    /// (outside quiescence) still-legal killers, then everything else.
    ///
    /// A quiescent request only yields captures and checks, unless the side to
    /// move is in check, where every reply has to be considered. Captures and
    /// checks are removed from `killers`, since only quiet killers carry
    /// information the earlier buckets don't.
    pub fn order_moves<P: PositionEngine>(
        &mut self,
        pos: &P,
        mut killers: Option<&mut KillerSet>,
        quiescent: bool,
    ) -> Vec<Move> {
        let quiescent = quiescent && !pos.is_in_check();

        let mut captures = Vec::new();
        let mut checks = Vec::new();
        let mut quiet = Vec::new();
        for m in pos.legal_moves() {
            let tactical = if pos.is_capture(m) {
                captures.push(m);
                true
            } else if pos.gives_check(m) {
                checks.push(m);
                true
            } else {
                quiet.push(m);
                false
            };
            if tactical {
                if let Some(k) = killers.as_deref_mut() {
                    k.discard(m);
                }
            }
        }
        captures.sort_by_key(|&m| capture_order_key(pos, m));

        let mut ordered = captures;
        ordered.append(&mut checks);
        if quiescent {
            return ordered;
        }

        if let Some(k) = killers.as_deref() {
            for killer in k.iter() {
                if let Some(i) = quiet.iter().position(|q| q == killer) {
                    ordered.push(quiet.remove(i));
                }
            }
        }
        if let Some(rng) = self.rng.as_mut() {
            quiet.shuffle(rng);
        }
        ordered.append(&mut quiet);
        ordered
    }
}
