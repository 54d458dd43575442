use shakmaty::Chess;

use crate::position::{BoardState, BoardStatus};
use crate::tags::Tags;
use crate::tree::{MoveTree, NodeId};
use crate::types::{Clocks, GameResult, Termination, Variant};
use crate::variation::ParseOptions;

/// Which parse path a load goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Flat mainline replay; comments and variations are dropped.
    #[default]
    Quick,
    /// Full move tree with comments, glyphs and variations.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub mode: ParseMode,
    /// Stop loading once the mainline reaches this ply. `None` loads
    /// the whole game.
    pub ply_limit: Option<u32>,
    pub max_variation_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        let parse = ParseOptions::default();
        Self {
            mode: ParseMode::default(),
            ply_limit: parse.ply_limit,
            max_variation_depth: parse.max_variation_depth,
        }
    }
}

impl LoadOptions {
    pub fn full() -> Self {
        Self {
            mode: ParseMode::Full,
            ..Self::default()
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            ply_limit: self.ply_limit,
            max_variation_depth: self.max_variation_depth,
        }
    }
}

/// One loaded or hand-built game.
#[derive(Debug, Clone)]
pub struct Game<B: BoardState = Chess> {
    pub tags: Tags,
    pub start: B,
    /// Mainline moves.
    pub moves: Vec<B::Move>,
    /// `positions[0]` is `start`, followed by the position after each move.
    pub positions: Vec<B>,
    /// Present after a full parse.
    pub tree: Option<MoveTree<B>>,
    /// Root-to-leaf paths through `tree`; path 0 is the mainline.
    pub variations: Vec<Vec<NodeId>>,
    pub result: GameResult,
    pub termination: Option<Termination>,
    pub variant: Variant,
    pub clocks: Option<Clocks>,
    /// Non-fatal problems met while loading, `"; "`-separated.
    pub diagnostics: Option<String>,
}

impl<B: BoardState> Game<B> {
    /// An empty game starting from `start`.
    pub fn new(start: B) -> Self {
        Self {
            tags: Tags::default(),
            positions: vec![start.clone()],
            start,
            moves: Vec::new(),
            tree: None,
            variations: Vec::new(),
            result: GameResult::Ongoing,
            termination: None,
            variant: Variant::Standard,
            clocks: None,
            diagnostics: None,
        }
    }

    /// Appends a mainline move played from the current last position.
    pub fn push_move(&mut self, mv: B::Move) {
        let next = self.last_position().apply(&mv);
        self.moves.push(mv);
        self.positions.push(next);
    }

    pub fn last_position(&self) -> &B {
        self.positions.last().unwrap_or(&self.start)
    }

    /// Mainline moves rendered as SAN.
    pub fn san_moves(&self) -> Vec<String> {
        self.start.san_sequence(&self.moves)
    }

    /// Sets `result` and `termination` from the final position, then lets
    /// the recorded result override it when the whole game was loaded.
    pub(crate) fn settle_status(&mut self, recorded: GameResult, loaded_to_end: bool) {
        let last = self.last_position();
        let (result, termination) = match last.status() {
            BoardStatus::Checkmate if last.white_to_move() => {
                (GameResult::BlackWins, Some(Termination::Checkmate))
            }
            BoardStatus::Checkmate => (GameResult::WhiteWins, Some(Termination::Checkmate)),
            BoardStatus::Stalemate => (GameResult::Draw, Some(Termination::Stalemate)),
            BoardStatus::InsufficientMaterial => {
                (GameResult::Draw, Some(Termination::InsufficientMaterial))
            }
            BoardStatus::Ongoing => (GameResult::Ongoing, None),
        };
        self.result = result;
        self.termination = termination;

        if !loaded_to_end {
            return;
        }
        if recorded.is_decisive() && recorded != self.result {
            self.result = recorded;
            self.termination = Some(Termination::Resignation);
        } else if recorded == GameResult::Draw {
            self.result = GameResult::Draw;
            self.termination = Some(Termination::Agreement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_from(moves: &[&str]) -> Game {
        let mut game = Game::new(Chess::default());
        for notation in moves {
            let mv = game.last_position().resolve(notation).unwrap();
            game.push_move(mv);
        }
        game
    }

    #[test]
    fn test_new_game_is_empty() {
        let game = Game::new(Chess::default());
        assert!(game.moves.is_empty());
        assert_eq!(game.positions.len(), 1);
        assert_eq!(game.result, GameResult::Ongoing);
        assert!(game.tree.is_none());
    }

    #[test]
    fn test_push_move_tracks_positions() {
        let game = game_from(&["e4", "e5", "Nf3"]);
        assert_eq!(game.positions.len(), 4);
        assert_eq!(game.last_position().ply(), 3);
        assert_eq!(game.san_moves(), vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_checkmate_sets_winner() {
        let mut game = game_from(&["f3", "e5", "g4", "Qh4#"]);
        game.settle_status(GameResult::Ongoing, true);
        assert_eq!(game.result, GameResult::BlackWins);
        assert_eq!(game.termination, Some(Termination::Checkmate));
    }

    #[test]
    fn test_recorded_decisive_result_means_resignation() {
        let mut game = game_from(&["e4", "e5"]);
        game.settle_status(GameResult::WhiteWins, true);
        assert_eq!(game.result, GameResult::WhiteWins);
        assert_eq!(game.termination, Some(Termination::Resignation));
    }

    #[test]
    fn test_recorded_draw_means_agreement() {
        let mut game = game_from(&["e4", "e5"]);
        game.settle_status(GameResult::Draw, true);
        assert_eq!(game.result, GameResult::Draw);
        assert_eq!(game.termination, Some(Termination::Agreement));
    }

    #[test]
    fn test_recorded_result_ignored_for_partial_load() {
        let mut game = game_from(&["e4", "e5"]);
        game.settle_status(GameResult::WhiteWins, false);
        assert_eq!(game.result, GameResult::Ongoing);
        assert_eq!(game.termination, None);
    }

    #[test]
    fn test_load_options_default_to_quick_unbounded() {
        let options = LoadOptions::default();
        assert_eq!(options.mode, ParseMode::Quick);
        assert_eq!(options.ply_limit, None);
        assert_eq!(options.parse_options(), ParseOptions::default());
        assert_eq!(LoadOptions::full().mode, ParseMode::Full);
    }
}
