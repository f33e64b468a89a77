//! Word segmentation for texts and vocab normalization.
//!
//! Texts are stored alongside a parsed form: lowercase words separated by a
//! single space. Vocabs use the same normalization, which lets a saved vocab
//! be matched against a text either as one word or, for phrases, as a run of
//! whole words.

/// Apostrophes and hyphens stay inside a word when both neighbours are word
/// characters ("don't", "twenty-one").
fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '-')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedText {
    /// Words joined by single spaces.
    pub normalized: String,
    pub words: Vec<String>,
}

pub fn parse_text(raw: &str) -> ParsedText {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if is_word_char(c) {
            current.extend(c.to_lowercase());
        } else if is_joiner(c)
            && !current.is_empty()
            && chars.peek().is_some_and(|next| is_word_char(*next))
        {
            // Typographic apostrophes collapse onto the ASCII one.
            current.push(if c == '-' { '-' } else { '\'' });
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    ParsedText {
        normalized: words.join(" "),
        words,
    }
}

/// Normalized vocab text and whether it spans several words.
pub fn normalize_vocab(raw: &str) -> (String, bool) {
    let parsed = parse_text(raw);
    let is_phrase = parsed.words.len() > 1;
    (parsed.normalized, is_phrase)
}
