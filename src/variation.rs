//! Full movetext parse into a [`MoveTree`].
//!
//! Each line (the mainline or one variation) is a flat pass over the token
//! stream. Tokens inside parentheses are only counted at that level; when a
//! top-level `(` closes, the enclosed text is parsed again as a line of its
//! own, starting from the position before the move it replaces.

use tracing::{debug, warn};

use crate::error::{Partial, PgnError};
use crate::nag::nag_to_symbol;
use crate::position::BoardState;
use crate::tokenizer::{Token, Tokenizer};
use crate::tree::{MoveTree, NodeId};
use crate::types::GameResult;

/// Limits for a full movetext parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Stop extending the mainline once its position reaches this ply.
    /// `None` parses to the end.
    pub ply_limit: Option<u32>,
    /// Deepest variation nesting that is still parsed.
    pub max_variation_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ply_limit: None,
            max_variation_depth: 64,
        }
    }
}

/// Everything a full parse produces.
#[derive(Debug, Clone)]
pub struct ParsedMovetext<B: BoardState> {
    pub tree: MoveTree<B>,
    /// Mainline moves in order, without variations.
    pub moves: Vec<B::Move>,
    /// Result token found at the end of the mainline, if any.
    pub result: Option<GameResult>,
    /// Text the tokenizer could not classify.
    pub skipped: Vec<String>,
    /// Set when the mainline stopped at `ply_limit` rather than running out
    /// of tokens.
    pub stopped_at_limit: bool,
}

impl<B: BoardState> ParsedMovetext<B> {
    /// Mainline positions after each move, starting position excluded.
    pub fn mainline_positions(&self) -> Vec<B> {
        self.tree
            .mainline()
            .skip(1)
            .map(|id| self.tree.node(id).position.clone())
            .collect()
    }
}

/// Parses movetext into a move tree rooted at `start`.
///
/// On failure the returned [`Partial`] holds everything built before the
/// first error; sibling variations and the rest of a line whose variation
/// failed are still parsed.
pub fn parse_movetext<B: BoardState>(
    movetext: &str,
    start: B,
    options: &ParseOptions,
) -> Result<ParsedMovetext<B>, Partial<ParsedMovetext<B>>> {
    let mut builder = Builder {
        parsed: ParsedMovetext {
            tree: MoveTree::new(start),
            moves: Vec::new(),
            result: None,
            skipped: Vec::new(),
            stopped_at_limit: false,
        },
        options,
        error: None,
    };

    let root = builder.parsed.tree.root();
    builder.parse_line(movetext, root, None, 0);

    debug!(
        nodes = builder.parsed.tree.len(),
        mainline = builder.parsed.moves.len(),
        "parsed movetext"
    );

    match builder.error {
        None => Ok(builder.parsed),
        Some(error) => Err(Partial::new(builder.parsed, error)),
    }
}

/// Move-number text for a move played from a position at `ply`.
pub(crate) fn move_number<B: BoardState>(position: &B) -> String {
    let number = position.fullmove_number();
    if position.white_to_move() {
        format!("{number}.")
    } else {
        format!("{number}...")
    }
}

fn normalize_comment(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

struct Builder<'o, B: BoardState> {
    parsed: ParsedMovetext<B>,
    options: &'o ParseOptions,
    error: Option<PgnError>,
}

impl<B: BoardState> Builder<'_, B> {
    fn record(&mut self, error: PgnError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Parses one line starting after `base`.
    ///
    /// `replaces` is `None` for the mainline. For a variation it names the
    /// node whose move the variation replaces; the line's first node is
    /// registered there instead of being linked from `base`.
    fn parse_line(&mut self, text: &str, base: NodeId, replaces: Option<NodeId>, level: usize) {
        let is_mainline = replaces.is_none();
        let mut current = base;
        let mut first: Option<NodeId> = None;
        let mut leading_comments = Vec::new();

        let mut depth = 0usize;
        let mut open_end = 0;
        let mut fork: Option<NodeId> = None;
        let mut halted = false;

        for spanned in Tokenizer::new(text) {
            let token = spanned.token;

            match token {
                Token::VariationStart => {
                    if depth == 0 {
                        open_end = spanned.span.end;
                        fork = first.map(|_| current);
                    }
                    depth += 1;
                    continue;
                }
                Token::VariationEnd if depth == 0 => {
                    warn!(position = spanned.span.start, "ignoring unmatched ')'");
                    continue;
                }
                Token::VariationEnd => {
                    depth -= 1;
                    if depth == 0 {
                        self.parse_variation(&text[open_end..spanned.span.start], fork, level);
                    }
                    continue;
                }
                _ if depth > 0 => continue,
                _ => {}
            }

            match token {
                Token::Move { count, san, suffix } => {
                    let position = &self.parsed.tree.node(current).position;
                    let at_limit = self
                        .options
                        .ply_limit
                        .is_some_and(|limit| position.ply() >= limit);
                    if is_mainline && at_limit {
                        self.parsed.stopped_at_limit = true;
                        halted = true;
                        break;
                    }

                    let mv = match position.resolve(san) {
                        Ok(mv) => mv,
                        Err(rejection) => {
                            let ply = position.ply();
                            let number = move_number(position);
                            warn!(
                                ply,
                                notation = %rejection.notation,
                                reason = %rejection.reason,
                                "move cannot be resolved"
                            );
                            self.record(PgnError::MoveResolution {
                                move_number: number,
                                notation: rejection.notation,
                                reason: rejection.reason,
                                fen: rejection.fen,
                                ply,
                            });
                            halted = true;
                            break;
                        }
                    };

                    let next_position = position.apply(&mv);
                    let link = first.is_some() || is_mainline;
                    let id = self.parsed.tree.push_move(current, mv.clone(), next_position, link);

                    let node = self.parsed.tree.node_mut(id);
                    node.notation = Some(san.to_string());
                    node.move_count = count.map(str::to_string);
                    if let Some(suffix) = suffix {
                        node.punctuation.push_str(suffix);
                    }

                    if first.is_none() {
                        node.leading_comments = std::mem::take(&mut leading_comments);
                        if let Some(replaced) = replaces {
                            self.parsed.tree.add_variation(replaced, id);
                        }
                        first = Some(id);
                    }
                    if is_mainline {
                        self.parsed.moves.push(mv);
                    }
                    current = id;
                }
                Token::LineComment(raw) | Token::BraceComment(raw) => {
                    let comment = normalize_comment(raw);
                    if first.is_none() && !is_mainline {
                        leading_comments.push(comment);
                    } else {
                        self.parsed.tree.node_mut(current).comments.push(comment);
                    }
                }
                Token::Nag(glyph) => {
                    if first.is_none() && !is_mainline {
                        debug!(glyph, "dropping glyph before the first move of a variation");
                    } else {
                        let symbol = nag_to_symbol(glyph);
                        self.parsed.tree.node_mut(current).punctuation.push_str(&symbol);
                    }
                }
                Token::Result(result) => {
                    if is_mainline {
                        self.parsed.result = Some(result);
                    }
                    break;
                }
                Token::Unknown(unknown) => {
                    warn!(token = unknown, "skipping unrecognized movetext");
                    self.parsed.skipped.push(unknown.to_string());
                }
                Token::VariationStart | Token::VariationEnd => {}
            }
        }

        if depth > 0 && !halted {
            debug!(depth, "closing unterminated variation at end of input");
            self.parse_variation(&text[open_end..], fork, level);
        }
    }

    /// Parses `text` as an alternative to the move that produced `replaced`.
    fn parse_variation(&mut self, text: &str, replaced: Option<NodeId>, level: usize) {
        let Some(replaced) = replaced else {
            warn!("skipping variation that precedes the first move of its line");
            return;
        };
        let Some(base) = self.parsed.tree.node(replaced).prev() else {
            warn!("skipping variation on the starting position");
            return;
        };

        let limit = self.options.max_variation_depth;
        if level + 1 > limit {
            warn!(limit, "skipping variation nested too deeply");
            self.record(PgnError::VariationTooDeep { limit });
            return;
        }

        self.parse_line(text, base, Some(replaced), level + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::extract_moves;
    use crate::position::chess_from_fen;
    use shakmaty::{CastlingMode, Chess};

    fn parse(movetext: &str) -> ParsedMovetext<Chess> {
        parse_movetext(movetext, Chess::default(), &ParseOptions::default()).unwrap()
    }

    fn notations(parsed: &ParsedMovetext<Chess>, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .filter_map(|&id| parsed.tree.node(id).notation.clone())
            .collect()
    }

    fn mainline(parsed: &ParsedMovetext<Chess>) -> Vec<String> {
        let ids: Vec<_> = parsed.tree.mainline().collect();
        notations(parsed, &ids)
    }

    fn find(parsed: &ParsedMovetext<Chess>, notation: &str) -> NodeId {
        parsed
            .tree
            .paths()
            .into_iter()
            .flatten()
            .find(|&id| parsed.tree.node(id).notation.as_deref() == Some(notation))
            .unwrap()
    }

    #[test]
    fn test_variation_replaces_preceding_move() {
        let parsed = parse("1. e4 e5 2. Nf3 Nc6 (2... Nf6 3. Nc3) 3. Bc4");

        assert_eq!(mainline(&parsed), vec!["e4", "e5", "Nf3", "Nc6", "Bc4"]);
        assert_eq!(parsed.moves.len(), 5);

        let nc6 = find(&parsed, "Nc6");
        let nf3 = find(&parsed, "Nf3");
        let variations = parsed.tree.node(nc6).variations();
        assert_eq!(variations.len(), 1);

        let nf6 = variations[0];
        assert_eq!(parsed.tree.node(nf6).prev(), Some(nf3));
        assert_eq!(parsed.tree.node(nf6).move_count.as_deref(), Some("2..."));
        let line: Vec<_> = parsed.tree.line(nf6).collect();
        assert_eq!(notations(&parsed, &line), vec!["Nf6", "Nc3"]);

        let paths = parsed.tree.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(notations(&parsed, &paths[1]), vec!["e4", "e5", "Nf3", "Nf6", "Nc3"]);
    }

    #[test]
    fn test_fork_invariant_holds_for_nested_variations() {
        let parsed = parse("1. e4 (1. d4 d5 (1... Nf6 2. c4) 2. c4) (1. c4) e5 2. Nf3 *");

        for path in parsed.tree.paths() {
            for id in path {
                let node = parsed.tree.node(id);
                for &variation in node.variations() {
                    assert_eq!(parsed.tree.node(variation).prev(), node.prev());
                }
                if let Some(next) = node.next() {
                    assert_eq!(parsed.tree.node(next).prev(), Some(id));
                }
            }
        }

        let e4 = find(&parsed, "e4");
        assert_eq!(parsed.tree.node(e4).variations().len(), 2);
        assert_eq!(parsed.tree.paths().len(), 4);
    }

    #[test]
    fn test_short_draw_token_sets_draw() {
        let short = parse("1. e4 e5 1/2");
        let long = parse("1. e4 e5 1/2-1/2");
        assert_eq!(short.result, Some(GameResult::Draw));
        assert_eq!(short.result, long.result);
    }

    #[test]
    fn test_result_token_stops_parsing() {
        let parsed = parse("1. e4 e5 1-0 2. Nf3");
        assert_eq!(parsed.result, Some(GameResult::WhiteWins));
        assert_eq!(parsed.moves.len(), 2);
    }

    #[test]
    fn test_illegal_move_keeps_parsed_prefix() {
        let err = parse_movetext(
            "1. e4 e5 2. Nf3 Nc6 3. Ke3 Nf6",
            Chess::default(),
            &ParseOptions::default(),
        )
        .unwrap_err();

        match &err.error {
            PgnError::MoveResolution {
                move_number,
                notation,
                ply,
                ..
            } => {
                assert_eq!(move_number, "3.");
                assert_eq!(notation, "Ke3");
                assert_eq!(*ply, 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.value.moves.len(), 4);
        assert_eq!(err.value.tree.len(), 5);
        assert!(err.to_string().contains("move 3. 'Ke3'"));
    }

    #[test]
    fn test_black_move_error_uses_ellipsis() {
        let err = parse_movetext("1. e4 e5 2. Nf3 Ke6", Chess::default(), &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(
            &err.error,
            PgnError::MoveResolution { move_number, .. } if move_number == "2..."
        ));
        assert_eq!(err.value.moves.len(), 3);
    }

    #[test]
    fn test_unknown_token_is_skipped() {
        let parsed = parse("1. e4 Qz9 e5 2. Nf3");
        assert_eq!(mainline(&parsed), vec!["e4", "e5", "Nf3"]);
        assert_eq!(parsed.skipped, vec!["Qz9"]);
    }

    #[test]
    fn test_failed_variation_keeps_mainline_going() {
        let err = parse_movetext(
            "1. e4 e5 (1... e6 2. Qh5 Ke5) 2. Nf3 Nc6",
            Chess::default(),
            &ParseOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.value.moves.len(), 4);
        assert!(matches!(err.error, PgnError::MoveResolution { .. }));
    }

    #[test]
    fn test_unmatched_open_is_closed_at_end_of_input() {
        let parsed = parse("1. e4 e5 2. Nf3 (2. Nc3 Nf6");
        assert_eq!(mainline(&parsed), vec!["e4", "e5", "Nf3"]);

        let nf3 = find(&parsed, "Nf3");
        let variations = parsed.tree.node(nf3).variations();
        assert_eq!(variations.len(), 1);
        let line: Vec<_> = parsed.tree.line(variations[0]).collect();
        assert_eq!(notations(&parsed, &line), vec!["Nc3", "Nf6"]);
    }

    #[test]
    fn test_unmatched_close_is_ignored() {
        let parsed = parse("1. e4 ) e5 2. Nf3");
        assert_eq!(mainline(&parsed), vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_variation_before_first_move_is_skipped() {
        let parsed = parse("(1. d4) 1. e4 e5");
        assert_eq!(mainline(&parsed), vec!["e4", "e5"]);
        assert_eq!(parsed.tree.paths().len(), 1);
    }

    #[test]
    fn test_nesting_beyond_limit_is_reported() {
        let options = ParseOptions {
            max_variation_depth: 1,
            ..ParseOptions::default()
        };
        let movetext = "1. e4 e5 (1... c5 (1... e6) 2. Nf3) 2. Nf3";
        let err = parse_movetext(movetext, Chess::default(), &options).unwrap_err();

        assert_eq!(err.error, PgnError::VariationTooDeep { limit: 1 });
        assert_eq!(err.value.moves.len(), 3);
        assert_eq!(err.value.tree.paths().len(), 2);
    }

    #[test]
    fn test_ply_limit_stops_mainline() {
        let options = ParseOptions {
            ply_limit: Some(3),
            ..ParseOptions::default()
        };
        let parsed =
            parse_movetext("1. e4 e5 2. Nf3 Nc6 3. Bb5 *", Chess::default(), &options).unwrap();
        assert_eq!(parsed.moves.len(), 3);
        assert!(parsed.stopped_at_limit);
        assert_eq!(parsed.result, None);
    }

    #[test]
    fn test_comments_and_glyphs_attach_to_nodes() {
        let parsed = parse(
            "{Opening} 1. e4!? {King pawn\nopening} e5 $2 ; solid\n2. Nf3 (2. f4 {gambit}) *",
        );

        let root = parsed.tree.root();
        assert_eq!(parsed.tree.node(root).comments, vec!["Opening"]);

        let e4 = find(&parsed, "e4");
        assert_eq!(parsed.tree.node(e4).punctuation, "!?");
        assert_eq!(parsed.tree.node(e4).comments, vec!["King pawn opening"]);

        let e5 = find(&parsed, "e5");
        assert_eq!(parsed.tree.node(e5).punctuation, "?");
        assert_eq!(parsed.tree.node(e5).comments, vec![" solid"]);

        let f4 = find(&parsed, "f4");
        assert_eq!(parsed.tree.node(f4).comments, vec!["gambit"]);
    }

    #[test]
    fn test_leading_variation_comment_is_kept() {
        let parsed = parse("1. e4 e5 ({or} 1... c5) 2. Nf3");
        let c5 = find(&parsed, "c5");
        assert_eq!(parsed.tree.node(c5).leading_comments, vec!["or"]);
    }

    #[test]
    fn test_full_parse_agrees_with_quick_extractor() {
        let movetext = "1. d4 Nf6 2. c4 e6 3. Nc3 Bb4 4. Qc2 O-O 5. a3 Bxc3+ 6. Qxc3 b6 1/2-1/2";
        let parsed = parse(movetext);
        let quick: Vec<String> = extract_moves(movetext).into_iter().collect();
        assert_eq!(mainline(&parsed), quick);
    }

    #[test]
    fn test_parsing_twice_builds_equal_trees() {
        let movetext = "1. e4 {c} e5 (1... c5 2. Nf3 $1) 2. Nf3 Nc6 *";
        let first = parse(movetext);
        let second = parse(movetext);

        type Summary = (Option<String>, String, Vec<String>, Option<String>);
        let describe = |parsed: &ParsedMovetext<Chess>| -> Vec<Summary> {
            parsed
                .tree
                .paths()
                .into_iter()
                .flatten()
                .map(|id| {
                    let node = parsed.tree.node(id);
                    let parent = node
                        .prev()
                        .and_then(|p| parsed.tree.node(p).notation.clone());
                    (node.notation.clone(), node.punctuation.clone(), node.comments.clone(), parent)
                })
                .collect()
        };

        assert_eq!(describe(&first), describe(&second));
        assert_eq!(first.moves, second.moves);
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn test_move_number_text() {
        let start = Chess::default();
        let after_e4 = start.apply(&start.resolve("e4").unwrap());
        let late =
            chess_from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 40", CastlingMode::Standard).unwrap();
        assert_eq!(move_number(&start), "1.");
        assert_eq!(move_number(&after_e4), "1...");
        assert_eq!(move_number(&late), "40...");
    }
}
