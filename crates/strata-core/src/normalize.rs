// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Text Normalizer
// ─────────────────────────────────────────────────────────────────────
//! Width folding, case folding, and whitespace collapsing.
//!
//! All character offsets reported downstream (negation ranges, term
//! hits) refer to the string returned here, not the caller's input.
//!
//! Whitespace is Unicode `White_Space` without U+0085, plus U+FEFF:
//! a byte order mark collapses like a space, NEL is kept as text.

const FULLWIDTH_FIRST: u32 = 0xFF01;
const FULLWIDTH_LAST: u32 = 0xFF5E;
const FULLWIDTH_OFFSET: u32 = 0xFF01 - 0x21;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';
const BYTE_ORDER_MARK: char = '\u{FEFF}';
const NEXT_LINE: char = '\u{0085}';

/// Whitespace for collapsing: Unicode `White_Space` minus NEL, plus BOM.
#[inline]
pub fn is_space(ch: char) -> bool {
    match ch {
        BYTE_ORDER_MARK => true,
        NEXT_LINE => false,
        _ => ch.is_whitespace(),
    }
}

/// Fold one full-width form (U+FF01..U+FF5E) to ASCII and the
/// ideographic space to a plain space. Everything else passes through.
#[inline]
pub fn fold_width(ch: char) -> char {
    let cp = ch as u32;
    if (FULLWIDTH_FIRST..=FULLWIDTH_LAST).contains(&cp) {
        // One-to-one with U+0021..U+007E.
        char::from_u32(cp - FULLWIDTH_OFFSET).unwrap_or(ch)
    } else if ch == IDEOGRAPHIC_SPACE {
        ' '
    } else {
        ch
    }
}

/// Normalize text for matching. Total: empty in, empty out.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.chars().map(fold_width).collect();
    let lowered = folded.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for word in lowered.split(is_space).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
