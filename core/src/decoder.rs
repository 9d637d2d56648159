use crate::config::SessionConfig;
use crate::patterns;
use crate::types::{DecodeOutcome, Symbol};

/// Time-driven morse decoder.
///
/// Symbols accumulate into the current letter. Letter and word boundaries are
/// never signalled explicitly; they are inferred on each [`tick`](Self::tick)
/// from how long the input has been silent.
#[derive(Debug, Clone)]
pub struct MorseDecoder {
    sequence: Vec<Symbol>,
    last_symbol_time: f64,
    /// `None` until the first letter of the session is decoded
    last_letter_time: Option<f64>,
    message: String,
    letter_pause: f64,
    space_pause: f64,
}

impl Default for MorseDecoder {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl MorseDecoder {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sequence: Vec::with_capacity(patterns::MAX_PATTERN_LEN),
            last_symbol_time: 0.0,
            last_letter_time: None,
            message: String::new(),
            letter_pause: config.letter_pause,
            space_pause: config.space_pause,
        }
    }

    pub fn push_symbol(&mut self, symbol: Symbol, now: f64) {
        self.sequence.push(symbol);
        self.last_symbol_time = now;
        tracing::debug!(sequence = %self.sequence_string(), "symbol {}", symbol.as_char());
    }

    /// Evaluate the pause rules. The letter rule wins; the space rule only
    /// runs on ticks where no letter was decoded.
    ///
    /// The space rule only looks at the time since the last decoded letter,
    /// not at the pending sequence. Keying the next letter slowly can
    /// therefore add the word space before that letter decodes.
    pub fn tick(&mut self, now: f64) -> DecodeOutcome {
        if !self.sequence.is_empty() && now - self.last_symbol_time > self.letter_pause {
            let ch = patterns::decode(&self.sequence);
            if ch == patterns::UNDECODABLE {
                tracing::warn!(sequence = %self.sequence_string(), "undecodable sequence");
            } else {
                tracing::info!(sequence = %self.sequence_string(), "decoded '{ch}'");
            }
            self.message.push(ch);
            self.sequence.clear();
            self.last_letter_time = Some(now);
            return DecodeOutcome::Decoded(ch);
        }

        if let Some(letter_time) = self.last_letter_time {
            if !self.message.is_empty()
                && !self.message.ends_with(' ')
                && now - letter_time > self.space_pause
            {
                self.message.push(' ');
                tracing::info!("word space added");
                return DecodeOutcome::SpaceAdded;
            }
        }

        DecodeOutcome::Waiting
    }

    /// Clear sequence, message and timers
    pub fn reset(&mut self) {
        self.sequence.clear();
        self.message.clear();
        self.last_symbol_time = 0.0;
        self.last_letter_time = None;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn sequence(&self) -> &[Symbol] {
        &self.sequence
    }

    pub fn sequence_string(&self) -> String {
        self.sequence.iter().map(Symbol::as_char).collect()
    }

    pub fn last_letter_time(&self) -> Option<f64> {
        self.last_letter_time
    }
}
