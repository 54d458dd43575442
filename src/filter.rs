use regex::Regex;
use smallvec::SmallVec;
use std::sync::LazyLock;

pub type MoveList = SmallVec<[String; 128]>;

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{.*?\}|;[^\n\r]*|\$[0-9]+").expect("annotation pattern is valid")
});

static SAN_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"((?:[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8]=?[QRBN]?",
        r"|[Oo0]-[Oo0](?:-[Oo0])?)",
        r"[+#]?)",
        r"[?!]*\s*",
    ))
    .expect("san move pattern is valid")
});

const RESULT_MARKERS: [&str; 4] = ["*", "1/2-1/2", "1-0", "0-1"];

/// Flat mainline extraction for fast replay.
///
/// Drops comments, glyphs and parenthesized variations, then collects bare
/// SAN moves in order. No position is tracked and nothing is validated;
/// resolving each move is left to the caller.
pub fn extract_moves(movetext: &str) -> MoveList {
    let without_annotations = ANNOTATION.replace_all(movetext, " ");
    let mut mainline = strip_brackets(&without_annotations);
    mainline.push(' ');

    let mut moves: MoveList = SAN_MOVE
        .captures_iter(&mainline)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    if moves
        .last()
        .is_some_and(|last| RESULT_MARKERS.contains(&last.as_str()))
    {
        moves.pop();
    }

    moves
}

/// Copies only the text outside balanced `(...)` groups.
///
/// Unbalanced input is handled best-effort: the body of an unclosed `(` is
/// kept as trailing text, and a stray `)` is copied through untouched.
pub fn strip_brackets(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut copy_from = 0;
    let mut open_at = 0;

    for (i, ch) in text.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    result.push_str(&text[copy_from..i]);
                    open_at = i;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    copy_from = i + 1;
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        result.push_str(&text[open_at..]);
    } else {
        result.push_str(&text[copy_from..]);
    }
    result
}
