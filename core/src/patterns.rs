// Morse code table - character <-> dot/dash sequence
use crate::types::Symbol;

/// Appended for sequences with no table entry; has no morse code of its own
pub const UNDECODABLE: char = '#';

/// Longest sequence in the table
pub const MAX_PATTERN_LEN: usize = 7;

const MORSE_TABLE: &[(char, &str)] = &[
    // Letters
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    // Numbers
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    // Punctuation
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
];

// Direct lookup for encoding - one slot per ASCII byte
static ENCODE_INDEX: [Option<&str>; 128] = {
    let mut index: [Option<&str>; 128] = [None; 128];
    let mut i = 0;
    while i < MORSE_TABLE.len() {
        let (ch, pattern) = MORSE_TABLE[i];
        index[ch as usize] = Some(pattern);
        // Lowercase letters share the uppercase patterns
        if ch.is_ascii_uppercase() {
            index[ch.to_ascii_lowercase() as usize] = Some(pattern);
        }
        i += 1;
    }
    index
};

/// Get the dot/dash pattern for a character, e.g. `'A'` -> `".-"`
pub fn pattern_for(ch: char) -> Option<&'static str> {
    if ch.is_ascii() {
        ENCODE_INDEX[ch as usize]
    } else {
        None
    }
}

/// Decode a symbol sequence; unknown or empty sequences yield `None`
pub fn lookup(sequence: &[Symbol]) -> Option<char> {
    if sequence.is_empty() || sequence.len() > MAX_PATTERN_LEN {
        return None;
    }

    MORSE_TABLE
        .iter()
        .find(|(_, pattern)| {
            pattern.len() == sequence.len()
                && pattern
                    .chars()
                    .zip(sequence)
                    .all(|(ch, symbol)| ch == symbol.as_char())
        })
        .map(|(ch, _)| *ch)
}

/// Decode a sequence, mapping unknown sequences to [`UNDECODABLE`]
pub fn decode(sequence: &[Symbol]) -> char {
    lookup(sequence).unwrap_or(UNDECODABLE)
}

/// Parse a `.`/`-` string into symbols, ignoring anything else
pub fn parse_pattern(pattern: &str) -> Vec<Symbol> {
    pattern.chars().filter_map(Symbol::from_char).collect()
}

/// Full table in chart order
pub fn table() -> impl Iterator<Item = (char, &'static str)> {
    MORSE_TABLE.iter().copied()
}
