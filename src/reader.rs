use shakmaty::{CastlingMode, Chess};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::clock::decode_clock;
use crate::error::{ErrorAccumulator, Partial, PgnError};
use crate::filter::{MoveList, extract_moves};
use crate::game::{Game, LoadOptions, ParseMode};
use crate::position::{BoardState, chess_from_fen};
use crate::tags::{Tags, date_fields, parse_full_date, today};
use crate::tokenizer::{Token, Tokenizer};
use crate::types::{Clocks, GameRecord, GameResult, Variant};
use crate::variation::{move_number, parse_movetext};

const DEFAULT_ELO: u32 = 1600;

/// Partitions multi-game text into one record per game.
///
/// A run of `[` lines opens a new record. Lines starting with `%` are
/// escape lines and dropped, blank lines are skipped and leading
/// whitespace is removed. Text without any header still yields a single
/// record with an empty header.
pub fn split_games(text: &str) -> Vec<GameRecord> {
    let mut records: Vec<GameRecord> = Vec::new();
    let mut in_tags = false;

    for line in text.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if line.starts_with('[') {
            if !in_tags {
                records.push(GameRecord::default());
                in_tags = true;
            }
            if let Some(record) = records.last_mut() {
                record.header.push_str(line);
                record.header.push('\n');
            }
        } else {
            in_tags = false;
            if records.is_empty() {
                records.push(GameRecord::default());
            }
            if let Some(record) = records.last_mut() {
                record.movetext.push_str(line);
                record.movetext.push('\n');
            }
        }
    }

    debug!(games = records.len(), "split pgn text");
    records
}

/// A parsed multi-game PGN file.
///
/// Tag tables are extracted the first time a game's tags are needed and
/// cached per game index, so readers on different threads can share one
/// `PgnFile`.
#[derive(Debug)]
pub struct PgnFile {
    records: Vec<GameRecord>,
    tag_cache: Vec<OnceLock<Tags>>,
}

impl PgnFile {
    pub fn parse(text: &str) -> Self {
        Self::from_records(split_games(text))
    }

    pub fn from_records(records: Vec<GameRecord>) -> Self {
        let tag_cache = records.iter().map(|_| OnceLock::new()).collect();
        Self { records, tag_cache }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&GameRecord> {
        self.records.get(index)
    }

    pub fn tags(&self, index: usize) -> Option<&Tags> {
        let record = self.records.get(index)?;
        let cell = self.tag_cache.get(index)?;
        Some(cell.get_or_init(|| Tags::parse(&record.header)))
    }

    fn tag(&self, index: usize, key: &str) -> Option<&str> {
        self.tags(index)?.non_empty(key)
    }

    pub fn event(&self, index: usize) -> &str {
        self.tag(index, "Event").unwrap_or("?")
    }

    pub fn site(&self, index: usize) -> &str {
        self.tag(index, "Site").unwrap_or("?")
    }

    /// `(white, black)`, `"Unknown"` when missing.
    pub fn player_names(&self, index: usize) -> (&str, &str) {
        (
            self.tag(index, "White").unwrap_or("Unknown"),
            self.tag(index, "Black").unwrap_or("Unknown"),
        )
    }

    /// `(white, black)` ratings; missing or non-numeric values count as 1600.
    pub fn elos(&self, index: usize) -> (u32, u32) {
        let elo = |key: &str| {
            self.tag(index, key)
                .filter(|v| v.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ELO)
        };
        (elo("WhiteElo"), elo("BlackElo"))
    }

    /// Leading integer of the `Round` tag (`"3.1"` is round 3), default 1.
    pub fn round(&self, index: usize) -> u32 {
        let Some(round) = self.tag(index, "Round") else {
            return 1;
        };
        let head = match round.find('.') {
            Some(dot) if dot >= 1 => &round[..dot],
            _ => round,
        };
        if head.bytes().all(|b| b.is_ascii_digit()) {
            head.parse().unwrap_or(1)
        } else {
            1
        }
    }

    /// `(year, month, day)` from the `Date` tag; unknown fields are today's.
    pub fn date(&self, index: usize) -> (i32, u32, u32) {
        date_fields(self.tag(index, "Date"), today())
    }

    pub fn result(&self, index: usize) -> GameResult {
        self.tag(index, "Result")
            .and_then(GameResult::from_token)
            .unwrap_or_default()
    }

    /// Bare mainline moves of a game, as the quick extractor sees them.
    pub fn moves(&self, index: usize) -> MoveList {
        self.records
            .get(index)
            .map(|record| extract_moves(&record.movetext))
            .unwrap_or_default()
    }

    /// Loads one game into a [`Game`].
    ///
    /// Tags, start position, moves and status are always filled in as far
    /// as the game could be read; a failure comes back as [`Partial`]
    /// holding that game. An index past the end yields an empty game
    /// alongside [`PgnError::NoSuchGame`].
    pub fn load_game(&self, index: usize, options: &LoadOptions) -> Result<Game, Partial<Game>> {
        let Some(record) = self.records.get(index) else {
            let error = PgnError::NoSuchGame {
                index,
                count: self.records.len(),
            };
            return Err(Partial::new(Game::new(Chess::default()), error));
        };

        let mut diagnostics = ErrorAccumulator::default();
        let tags = self.game_tags(index, &mut diagnostics);

        let variant = self.tag(index, "Variant").map(Variant::from_tag).unwrap_or_default();
        let castling = match variant {
            Variant::Chess960 => CastlingMode::Chess960,
            Variant::Standard => CastlingMode::Standard,
        };

        let mut error = None;
        let start = match self.tag(index, "FEN") {
            Some(fen) => chess_from_fen(fen, castling).unwrap_or_else(|err| {
                warn!(index, %err, "falling back to the standard start position");
                error = Some(err);
                Chess::default()
            }),
            None => Chess::default(),
        };

        let mut game = Game::new(start);
        game.tags = tags;
        game.variant = variant;
        game.clocks = self.clocks(index, &mut diagnostics);

        let loaded_to_end = if error.is_some() {
            false
        } else {
            match options.mode {
                ParseMode::Quick => self.replay_quick(index, &mut game, options, &mut error),
                ParseMode::Full => {
                    replay_full(&record.movetext, &mut game, options, &mut error, &mut diagnostics)
                }
            }
        };

        let recorded = self
            .tag(index, "Result")
            .and_then(GameResult::from_token)
            .or_else(|| movetext_result(&record.movetext))
            .unwrap_or_default();
        game.tags.set("Result", recorded.as_str());
        game.settle_status(recorded, loaded_to_end);
        game.diagnostics = diagnostics.take();

        debug!(index, moves = game.moves.len(), result = %game.result, "loaded game");

        match error {
            None => Ok(game),
            Some(error) => Err(Partial::new(game, error)),
        }
    }

    /// Builds the tag table a loaded game carries.
    fn game_tags(&self, index: usize, diagnostics: &mut ErrorAccumulator) -> Tags {
        let mut tags = Tags::default();
        let (white, black) = self.player_names(index);

        tags.set("Event", self.event(index));
        tags.set("Site", self.site(index));
        tags.set("Date", self.tag(index, "Date").unwrap_or("????.??.??"));
        tags.set("Round", self.round(index).to_string());
        tags.set("White", white);
        tags.set("Black", black);
        tags.set("Result", self.result(index).as_str());

        let header_ymd = ["Year", "Month", "Day"].map(|key| self.tag(index, key));
        if let [Some(year), Some(month), Some(day)] = header_ymd {
            tags.set("Year", year);
            tags.set("Month", month);
            tags.set("Day", day);
        } else if let Some(date) = self
            .tag(index, "Date")
            .and_then(|value| parse_full_date(value, diagnostics))
        {
            tags.set("Year", date.format("%Y").to_string());
            tags.set("Month", date.format("%m").to_string());
            tags.set("Day", date.format("%d").to_string());
        }

        for key in ["Time", "WhiteElo", "BlackElo", "TimeControl", "ECO"] {
            if let Some(value) = self.tag(index, key) {
                tags.set(key, value);
            }
        }
        tags
    }

    fn clocks(&self, index: usize, diagnostics: &mut ErrorAccumulator) -> Option<Clocks> {
        let mut decode = |key: &str| {
            let value = self.tag(index, key)?;
            let ms = decode_clock(value);
            if ms.is_none() {
                diagnostics.push(format!("Conversion error: {key}='{value}'"));
            }
            ms
        };

        match (decode("WhiteClock"), decode("BlackClock")) {
            (None, None) => None,
            (white, black) => Some(Clocks {
                white_ms: white.unwrap_or_default(),
                black_ms: black.unwrap_or_default(),
            }),
        }
    }

    /// Replays the quick extractor's moves; returns whether every move was
    /// replayed.
    fn replay_quick(
        &self,
        index: usize,
        game: &mut Game,
        options: &LoadOptions,
        error: &mut Option<PgnError>,
    ) -> bool {
        for notation in self.moves(index) {
            let position = game.last_position();
            let ply = position.ply();
            if options.ply_limit.is_some_and(|limit| ply >= limit) {
                return false;
            }

            match position.resolve(&notation) {
                Ok(mv) => game.push_move(mv),
                Err(rejection) => {
                    warn!(
                        ply,
                        notation = %rejection.notation,
                        reason = %rejection.reason,
                        "move cannot be resolved"
                    );
                    *error = Some(PgnError::MoveResolution {
                        move_number: move_number(position),
                        notation: rejection.notation,
                        reason: rejection.reason,
                        fen: rejection.fen,
                        ply,
                    });
                    return true;
                }
            }
        }
        true
    }
}

/// Result marker that closes the mainline, ignoring any inside variations.
fn movetext_result(movetext: &str) -> Option<GameResult> {
    let mut depth = 0usize;
    Tokenizer::new(movetext).find_map(|spanned| match spanned.token {
        Token::VariationStart => {
            depth += 1;
            None
        }
        Token::VariationEnd => {
            depth = depth.saturating_sub(1);
            None
        }
        Token::Result(result) if depth == 0 => Some(result),
        _ => None,
    })
}

/// Runs the variation parser over a game's movetext; returns whether the
/// mainline was parsed to its end.
fn replay_full(
    movetext: &str,
    game: &mut Game,
    options: &LoadOptions,
    error: &mut Option<PgnError>,
    diagnostics: &mut ErrorAccumulator,
) -> bool {
    let parsed = match parse_movetext(movetext, game.start.clone(), &options.parse_options()) {
        Ok(parsed) => parsed,
        Err(partial) => {
            let (parsed, err) = partial.into_parts();
            *error = Some(err);
            parsed
        }
    };

    for skipped in &parsed.skipped {
        diagnostics.push(format!("unrecognized movetext '{skipped}'"));
    }

    game.positions = std::iter::once(game.start.clone())
        .chain(parsed.mainline_positions())
        .collect();
    game.variations = parsed.tree.paths();
    game.moves = parsed.moves;
    game.tree = Some(parsed.tree);
    !parsed.stopped_at_limit
}
