use thiserror::Error;

/// Errors raised while turning PGN text into a game model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgnError {
    #[error(
        "the game can't be read to end, because of an error parsing move {move_number} '{notation}': {reason}"
    )]
    MoveResolution {
        /// Move number context as written in PGN, e.g. `3.` or `2...`.
        move_number: String,
        notation: String,
        reason: String,
        /// Board encoding of the position the move was tried against.
        fen: String,
        ply: u32,
    },

    #[error("variations nested deeper than {limit} levels")]
    VariationTooDeep { limit: usize },

    #[error("no game with index {index} (file holds {count} games)")]
    NoSuchGame { index: usize, count: usize },

    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// A value that was only partially built before `error` stopped the parse.
///
/// Everything parsed up to the failure stays in `value`, so callers can
/// resume from the last good ply or reject the game outright.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Partial<T: std::fmt::Debug> {
    pub value: T,
    pub error: PgnError,
}

impl<T: std::fmt::Debug> Partial<T> {
    pub fn new(value: T, error: PgnError) -> Self {
        Self { value, error }
    }

    pub fn map<U: std::fmt::Debug>(self, f: impl FnOnce(T) -> U) -> Partial<U> {
        Partial {
            value: f(self.value),
            error: self.error,
        }
    }

    pub fn into_parts(self) -> (T, PgnError) {
        (self.value, self.error)
    }
}

/// Non-fatal problems met while loading a game, in the order they were met.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator {
    messages: Vec<String>,
}

impl ErrorAccumulator {
    pub fn push(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    /// Drains everything collected so far into one `"; "`-separated message.
    pub fn take(&mut self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        let joined = self.messages.join("; ");
        self.messages.clear();
        Some(joined)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
