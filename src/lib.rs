//! Reading and writing Portable Game Notation.
//!
//! [`PgnFile`] splits multi-game text and loads individual games either by
//! a quick mainline replay or by a full parse into a [`MoveTree`] with
//! variations, comments and glyphs. [`write_game`] turns a [`Game`] back
//! into canonical PGN. Chess rules come from `shakmaty` through the
//! [`BoardState`] trait.

pub mod clock;
pub mod error;
pub mod filter;
pub mod game;
pub mod nag;
pub mod position;
pub mod reader;
pub mod tags;
pub mod tokenizer;
pub mod tree;
pub mod types;
pub mod variation;
pub mod writer;

pub use clock::{decode_clock, encode_clock};
pub use error::{ErrorAccumulator, Partial, PgnError};
pub use filter::{extract_moves, strip_brackets};
pub use game::{Game, LoadOptions, ParseMode};
pub use nag::nag_to_symbol;
pub use position::{BoardState, BoardStatus, MoveRejection};
pub use reader::{PgnFile, split_games};
pub use tags::Tags;
pub use tokenizer::{Token, Tokenizer, tokenize};
pub use tree::{MoveTree, Node, NodeId};
pub use types::{Clocks, GameRecord, GameResult, Termination, Variant};
pub use variation::{ParseOptions, ParsedMovetext, parse_movetext};
pub use writer::{WriterConfig, write_game, write_games};
