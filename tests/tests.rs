mod offsets;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Map arbitrary text onto a small alphabet so that generated subjects
/// actually contain matches for the patterns under test.
fn small_alphabet(text: &str) -> String {
    const ALPHABET: [char; 6] = ['a', 'b', '-', '1', 'β', '☃'];
    text.chars().map(|c| ALPHABET[c as usize % ALPHABET.len()]).collect()
}
