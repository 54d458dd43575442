use pgn_reader::Nag;

/// Translates a numeric annotation glyph token such as `$1` into its
/// traditional suffix (`!`). Glyphs without a traditional symbol are
/// returned unchanged.
pub fn nag_to_symbol(token: &str) -> String {
    let Ok(nag) = token.parse::<Nag>() else {
        return token.to_string();
    };

    match symbol_for(nag) {
        Some(symbol) => symbol.to_string(),
        None => token.to_string(),
    }
}

fn symbol_for(nag: Nag) -> Option<&'static str> {
    let symbol = match nag {
        Nag(0) => "",
        Nag::GOOD_MOVE => "!",
        Nag::MISTAKE => "?",
        Nag::BRILLIANT_MOVE => "!!",
        Nag::BLUNDER => "??",
        Nag::SPECULATIVE_MOVE => "!?",
        Nag::DUBIOUS_MOVE => "?!",
        Nag(11) => "=",
        Nag(14) => "+=",
        Nag(15) => "=+",
        Nag(16) => "+/-",
        Nag(17) => "-/+",
        Nag(18) => "+-",
        Nag(19) => "-+",
        Nag(20) => "+--",
        Nag(21) => "--+",
        _ => return None,
    };
    Some(symbol)
}
