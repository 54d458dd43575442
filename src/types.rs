use std::fmt;

/// One game of a multi-game file, exactly as split from the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    /// Tag-pair lines, concatenated with their line breaks.
    pub header: String,
    /// Movetext lines, concatenated with their line breaks.
    pub movetext: String,
}

/// Game result as recorded by a result token or the `Result` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    /// Parses a result token. `1/2` is accepted as an alias of `1/2-1/2`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" | "1/2" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }

    pub fn is_decisive(self) -> bool {
        matches!(self, Self::WhiteWins | Self::BlackWins)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a game ended the way its result says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    Resignation,
    Agreement,
}

/// Starting arrangement family of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    #[default]
    Standard,
    /// Fischer random (Chess960) setups, written as `[Variant "Fischerandom"]`.
    Chess960,
}

impl Variant {
    /// Interprets a `Variant` tag value.
    pub fn from_tag(value: &str) -> Self {
        let lower = value.to_lowercase();
        if lower.contains("fischer") || lower.contains("960") {
            Self::Chess960
        } else {
            Self::Standard
        }
    }
}

/// Remaining clock time per side, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clocks {
    pub white_ms: u64,
    pub black_ms: u64,
}
