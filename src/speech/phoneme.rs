//! Text to phonemes.
//!
//! This is a spelling-based approximation, good enough to move a mouth
//! roughly in time with speech. It is not a transcription. Each word is
//! scanned greedily left to right:
//!
//! * the digraphs "ee", "oo", "ay", "ow" (tried in that order),
//! * a single vowel,
//! * one of the lip consonants b p m f v w r,
//! * anything else becomes `Default`,
//!
//! and every word is followed by a `Pause`.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phoneme {
    A,
    E,
    I,
    O,
    U,
    Ee,
    Oo,
    Ay,
    Ow,
    B,
    P,
    M,
    F,
    V,
    W,
    R,
    Pause,
    Default,
}

impl Phoneme {
    pub fn symbol(self) -> &'static str {
        match self {
            Phoneme::A => "a",
            Phoneme::E => "e",
            Phoneme::I => "i",
            Phoneme::O => "o",
            Phoneme::U => "u",
            Phoneme::Ee => "ee",
            Phoneme::Oo => "oo",
            Phoneme::Ay => "ay",
            Phoneme::Ow => "ow",
            Phoneme::B => "b",
            Phoneme::P => "p",
            Phoneme::M => "m",
            Phoneme::F => "f",
            Phoneme::V => "v",
            Phoneme::W => "w",
            Phoneme::R => "r",
            Phoneme::Pause => "pause",
            Phoneme::Default => "default",
        }
    }

    fn from_char(c: char) -> Phoneme {
        match c {
            'a' => Phoneme::A,
            'e' => Phoneme::E,
            'i' => Phoneme::I,
            'o' => Phoneme::O,
            'u' => Phoneme::U,
            'b' => Phoneme::B,
            'p' => Phoneme::P,
            'm' => Phoneme::M,
            'f' => Phoneme::F,
            'v' => Phoneme::V,
            'w' => Phoneme::W,
            'r' => Phoneme::R,
            _ => Phoneme::Default,
        }
    }
}

impl std::fmt::Display for Phoneme {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

static DIGRAPHS: [(char, char, Phoneme); 4] = [
    ('e', 'e', Phoneme::Ee),
    ('o', 'o', Phoneme::Oo),
    ('a', 'y', Phoneme::Ay),
    ('o', 'w', Phoneme::Ow),
];

/// Lowercases `text`, drops punctuation and symbols, and splits it into
/// words. Digits are kept: they are spoken, so they should move the mouth.
pub fn words(text: &str) -> Vec<String> {
    let cleaned = text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect::<String>();
    cleaned.split_whitespace().map(|w| w.to_string()).collect()
}

pub fn approximate(text: &str) -> Vec<Phoneme> {
    let mut phonemes = vec![];
    for word in words(text) {
        word_phonemes(&word, &mut phonemes);
        phonemes.push(Phoneme::Pause);
    }
    phonemes
}

fn word_phonemes(word: &str, out: &mut Vec<Phoneme>) {
    let chars = word.chars().collect::<Vec<char>>();
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair = (chars[i], chars[i + 1]);
            let digraph = DIGRAPHS.iter().find(|&&(a, b, _)| (a, b) == pair);
            if let Some(&(_, _, ph)) = digraph {
                out.push(ph);
                i += 2;
                continue;
            }
        }
        out.push(Phoneme::from_char(chars[i]));
        i += 1;
    }
}

#[cfg(test)]
fn symbols(text: &str) -> Vec<&'static str> {
    approximate(text).into_iter().map(|p| p.symbol()).collect()
}

#[test]
fn test_hi_bob() {
    assert_eq!(symbols("hi bob"), vec!["default", "i", "pause", "b", "o", "b", "pause"]);
}

#[test]
fn test_digraphs_win_over_single_letters() {
    assert_eq!(symbols("see"), vec!["default", "ee", "pause"]);
    assert_eq!(symbols("moon"), vec!["m", "oo", "default", "pause"]);
    assert_eq!(symbols("way"), vec!["w", "ay", "pause"]);
    assert_eq!(symbols("bow"), vec!["b", "ow", "pause"]);
    // Greedy, no backtracking: "eee" is "ee" then "e".
    assert_eq!(symbols("eee"), vec!["ee", "e", "pause"]);
}

#[test]
fn test_punctuation_and_case() {
    assert_eq!(symbols("Hi, BOB!"), symbols("hi bob"));
    assert_eq!(symbols("don't"), vec!["default", "o", "default", "default", "pause"]);
}

#[test]
fn test_total_on_odd_input() {
    assert!(approximate("").is_empty());
    assert!(approximate("   \t\n ").is_empty());
    assert!(approximate("?! ... -").is_empty());
    // Accented vowels are not vowels here.
    assert_eq!(symbols("żółw"), vec!["default", "default", "default", "w", "pause"]);
}

#[test]
fn test_digits_are_kept() {
    assert_eq!(symbols("911!"), vec!["default", "default", "default", "pause"]);
    assert_eq!(symbols("room 4b"), vec!["r", "oo", "m", "pause", "default", "b", "pause"]);
}
