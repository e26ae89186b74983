//! Trigger vocabulary matching.
//!
//! Requests and triggers are both reduced to lowercase word tokens, where a
//! word is a run of alphanumerics or `_`. A trigger matches when its tokens
//! appear contiguously in the request.

/// Description words shorter than this never become triggers.
const MIN_DESCRIPTION_WORD: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "agent", "also", "from", "have", "into", "that", "their", "them", "then", "there",
    "these", "this", "tool", "tools", "using", "what", "when", "which", "will", "with", "your",
];

/// A lowercase word and the byte offset just past it in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub text: String,
    pub end: usize,
}

pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() || c == '_' {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            tokens.push(token(text, s, i));
        }
    }
    if let Some(s) = start {
        tokens.push(token(text, s, text.len()));
    }

    tokens
}

fn token(text: &str, start: usize, end: usize) -> Token {
    Token {
        text: text[start..end].to_lowercase(),
        end,
    }
}

/// Where a trigger matched in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    /// Byte offset just past the matched phrase.
    pub end: usize,
}

/// The set of word sequences that route a request to one tool.
#[derive(Debug, Clone, Default)]
pub(crate) struct Vocabulary {
    triggers: Vec<Vec<String>>,
}

impl Vocabulary {
    /// Build from a tool's tags, falling back to its description.
    pub fn for_tool(tags: &[String], description: &str) -> Self {
        let mut vocabulary = Self::default();

        for tag in tags {
            let words: Vec<String> = tokenize(tag).into_iter().map(|t| t.text).collect();
            vocabulary.push(words);
        }

        if vocabulary.is_empty() {
            for word in tokenize(description) {
                if word.text.chars().count() >= MIN_DESCRIPTION_WORD
                    && !STOP_WORDS.contains(&word.text.as_str())
                {
                    vocabulary.push(vec![word.text]);
                }
            }
        }

        vocabulary
    }

    fn push(&mut self, words: Vec<String>) {
        if !words.is_empty() && !self.triggers.contains(&words) {
            self.triggers.push(words);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Find the earliest trigger occurrence, preferring the longest phrase
    /// when several start at the same token.
    pub fn earliest_match(&self, tokens: &[Token]) -> Option<Match> {
        (0..tokens.len()).find_map(|i| {
            self.triggers
                .iter()
                .filter(|words| phrase_at(tokens, i, words))
                .max_by_key(|words| words.len())
                .map(|words| Match {
                    end: tokens[i + words.len() - 1].end,
                })
        })
    }
}

fn phrase_at(tokens: &[Token], at: usize, words: &[String]) -> bool {
    tokens.len() - at >= words.len()
        && tokens[at..]
            .iter()
            .zip(words)
            .all(|(token, word)| token.text == *word)
}
