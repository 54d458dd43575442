//! Canonical PGN output for a [`Game`].

use std::io;
use std::num::NonZeroUsize;

use crate::clock::encode_clock;
use crate::game::Game;
use crate::position::BoardState;
use crate::tags::format_date_tag;
use crate::types::Variant;

const DEFAULT_LINE_WIDTH: NonZeroUsize = match NonZeroUsize::new(80) {
    Some(width) => width,
    None => NonZeroUsize::MIN,
};

const OPTIONAL_TAGS: [&str; 4] = ["WhiteElo", "BlackElo", "TimeControl", "Time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Movetext lines never exceed this many columns unless a single token
    /// is longer.
    pub line_width: NonZeroUsize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// Header pairs in output order.
fn header_pairs<B: BoardState>(game: &Game<B>) -> Vec<(&'static str, String)> {
    let tag = |key: &str| game.tags.non_empty(key).unwrap_or("?").to_string();

    let mut pairs = vec![
        ("Event", tag("Event")),
        ("Site", tag("Site")),
        ("Date", format_date_tag(&game.tags)),
        ("Round", tag("Round")),
        ("White", tag("White")),
        ("Black", tag("Black")),
        ("Result", game.result.as_str().to_string()),
    ];

    for key in OPTIONAL_TAGS {
        if let Some(value) = game.tags.non_empty(key) {
            pairs.push((key, value.to_string()));
        }
    }

    if let Some(clocks) = game.clocks {
        pairs.push(("WhiteClock", encode_clock(clocks.white_ms)));
        pairs.push(("BlackClock", encode_clock(clocks.black_ms)));
    }
    if game.variant == Variant::Chess960 {
        pairs.push(("Variant", "Fischerandom".to_string()));
    }
    if !game.start.is_standard_start() {
        pairs.push(("SetUp", "1".to_string()));
        pairs.push(("FEN", game.start.fen()));
    }
    pairs
}

/// Mainline as SAN with move numbers, followed by the result.
pub fn movetext<B: BoardState>(game: &Game<B>, config: &WriterConfig) -> String {
    let mut tokens = Vec::with_capacity(game.moves.len() * 3 / 2 + 1);

    for (i, (san, before)) in game.san_moves().into_iter().zip(&game.positions).enumerate() {
        let number = before.fullmove_number();
        if before.white_to_move() {
            tokens.push(format!("{number}."));
        } else if i == 0 {
            tokens.push(format!("{number}..."));
        }
        tokens.push(san);
    }
    tokens.push(game.result.as_str().to_string());

    wrap(&tokens.join(" "), config.line_width.get())
}

/// Greedy word wrap at single spaces.
pub fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

/// Renders one game: header block, blank line, wrapped movetext.
pub fn write_game<B: BoardState>(game: &Game<B>, config: &WriterConfig) -> String {
    let mut out = String::new();
    for (key, value) in header_pairs(game) {
        out.push_str(&format!("[{key} \"{value}\"]\n"));
    }
    out.push('\n');
    out.push_str(&movetext(game, config));
    out.push('\n');
    out
}

/// Renders several games separated by one blank line.
pub fn write_games<'g, B: BoardState + 'g>(
    games: impl IntoIterator<Item = &'g Game<B>>,
    config: &WriterConfig,
) -> String {
    games
        .into_iter()
        .map(|game| write_game(game, config))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes one game to an I/O sink.
pub fn write_game_to<B: BoardState, W: io::Write>(
    writer: &mut W,
    game: &Game<B>,
    config: &WriterConfig,
) -> io::Result<()> {
    writer.write_all(write_game(game, config).as_bytes())
}
