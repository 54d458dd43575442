//! The seam to the chess rules.
//!
//! This crate never decides legality itself. Everything that needs the rules
//! (resolving a SAN token, applying a move, FEN output, end-of-game detection
//! and SAN rendering) goes through [`BoardState`]. The implementation for
//! [`shakmaty::Chess`] is what the rest of the crate uses by default.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};
use std::fmt::Debug;

use crate::error::PgnError;

/// A rejected move, as reported by the rules collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRejection {
    pub notation: String,
    pub reason: String,
    /// Board encoding of the position that rejected the move.
    pub fen: String,
}

/// Physical state of a position, independent of any recorded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardStatus {
    Ongoing,
    /// The side to move is mated.
    Checkmate,
    Stalemate,
    InsufficientMaterial,
}

pub trait BoardState: Clone + Debug {
    type Move: Clone + Debug + PartialEq;

    /// Resolves a SAN-like notation string against this position.
    fn resolve(&self, notation: &str) -> Result<Self::Move, MoveRejection>;

    /// Returns the position after `mv`, leaving `self` untouched.
    fn apply(&self, mv: &Self::Move) -> Self;

    /// Half-moves since the standard game start (0 for the initial position).
    fn ply(&self) -> u32;

    fn fen(&self) -> String;

    fn status(&self) -> BoardStatus;

    /// Whether the side to move is White.
    fn white_to_move(&self) -> bool {
        self.ply().is_multiple_of(2)
    }

    /// Number of the move about to be played, as written before it.
    fn fullmove_number(&self) -> u32 {
        self.ply() / 2 + 1
    }

    /// Renders `moves`, played from this position, as SAN strings.
    fn san_sequence(&self, moves: &[Self::Move]) -> Vec<String>;

    fn is_standard_start(&self) -> bool;
}

/// Standard starting position in FEN.
pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Rewrites `0-0`, `o-o` and friends into the `O-O` form SAN expects.
fn normalize_castling(notation: &str) -> String {
    let bare = notation.trim_end_matches(['+', '#']);
    if !bare.is_empty() && bare.chars().all(|c| matches!(c, '0' | 'o' | 'O' | '-')) {
        notation.replace(['0', 'o'], "O")
    } else {
        notation.to_string()
    }
}

impl BoardState for Chess {
    type Move = Move;

    fn resolve(&self, notation: &str) -> Result<Move, MoveRejection> {
        let reject = |reason: String| MoveRejection {
            notation: notation.to_string(),
            reason,
            fen: self.fen(),
        };

        let san_plus: SanPlus = normalize_castling(notation)
            .parse()
            .map_err(|err| reject(format!("{err}")))?;
        san_plus
            .san
            .to_move(self)
            .map_err(|err| reject(format!("{err}")))
    }

    fn apply(&self, mv: &Move) -> Self {
        let mut next = self.clone();
        next.play_unchecked(mv.clone());
        next
    }

    /// Clamped to `u32::MAX` for fullmove numbers near the top of the range.
    fn ply(&self) -> u32 {
        let full_moves = u64::from(self.fullmoves().get());
        let ply = (full_moves - 1) * 2 + u64::from(self.turn() == Color::Black);
        u32::try_from(ply).unwrap_or(u32::MAX)
    }

    fn white_to_move(&self) -> bool {
        self.turn() == Color::White
    }

    fn fullmove_number(&self) -> u32 {
        self.fullmoves().get()
    }

    fn fen(&self) -> String {
        Fen::from_position(self, EnPassantMode::Legal).to_string()
    }

    fn status(&self) -> BoardStatus {
        if self.is_checkmate() {
            BoardStatus::Checkmate
        } else if self.is_stalemate() {
            BoardStatus::Stalemate
        } else if self.is_insufficient_material() {
            BoardStatus::InsufficientMaterial
        } else {
            BoardStatus::Ongoing
        }
    }

    fn san_sequence(&self, moves: &[Move]) -> Vec<String> {
        let mut pos = self.clone();
        moves
            .iter()
            .map(|mv| SanPlus::from_move_and_play_unchecked(&mut pos, mv.clone()).to_string())
            .collect()
    }

    fn is_standard_start(&self) -> bool {
        self.fen() == STANDARD_START_FEN
    }
}

/// Sets up a position from a `FEN` tag value.
pub fn chess_from_fen(fen: &str, mode: CastlingMode) -> Result<Chess, PgnError> {
    let invalid = |reason: String| PgnError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };

    let parsed: Fen = fen.trim().parse().map_err(|err| invalid(format!("{err}")))?;
    parsed
        .into_position(mode)
        .map_err(|err| invalid(format!("{err}")))
}
