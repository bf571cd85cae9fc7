//! Splitting oversized documents into indexable pieces.
//!
//! Splits fall on paragraph boundaries first (`\n\n`), then sentence
//! boundaries (`. `, `! `, `? `), then whitespace. A split never lands inside
//! a word; a single word longer than the limit is kept whole rather than cut.

/// Sentence terminators recognized by the splitter. All ASCII, so the byte
/// index after a match is always a valid char boundary.
const SENTENCE_BREAKS: [&str; 3] = [". ", "! ", "? "];

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Returns a single piece when the trimmed text already fits, and no pieces
/// for blank input. Pieces are non-empty and appear in document order.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    pack(paragraphs, "\n\n", max_chars, split_sentences)
        .into_iter()
        .map(|piece| piece.trim_end().to_string())
        .collect()
}

fn split_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let sentences = split_after_any(text, &SENTENCE_BREAKS);
    pack(sentences, "", max_chars, split_words)
}

fn split_words(text: &str, max_chars: usize) -> Vec<String> {
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    // Terminal level: an oversized word is emitted as-is.
    pack(words, " ", max_chars, |word, _| vec![word.to_string()])
}

/// Greedily merge `segments` (joined by `joiner`) into pieces that respect
/// `max_chars`; a segment that alone exceeds the limit is handed to
/// `split_further` for the next, finer boundary level.
fn pack<F>(segments: Vec<String>, joiner: &str, max_chars: usize, split_further: F) -> Vec<String>
where
    F: Fn(&str, usize) -> Vec<String>,
{
    let joiner_len = char_len(joiner);
    let mut pieces = Vec::new();
    let mut current = String::new();

    for segment in segments {
        if current.is_empty() {
            current = segment;
        } else if char_len(&current) + joiner_len + char_len(&segment) <= max_chars {
            current.push_str(joiner);
            current.push_str(&segment);
        } else {
            flush(&mut pieces, current, max_chars, &split_further);
            current = segment;
        }
    }
    if !current.is_empty() {
        flush(&mut pieces, current, max_chars, &split_further);
    }

    pieces
}

fn flush<F>(pieces: &mut Vec<String>, piece: String, max_chars: usize, split_further: &F)
where
    F: Fn(&str, usize) -> Vec<String>,
{
    if char_len(&piece) > max_chars {
        pieces.extend(split_further(&piece, max_chars));
    } else {
        pieces.push(piece);
    }
}

/// Split `text` after each occurrence of any separator, keeping the separator
/// attached to the preceding segment.
fn split_after_any(text: &str, separators: &[&str]) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = text;

    loop {
        let next_break = separators
            .iter()
            .filter_map(|sep| rest.find(sep).map(|at| at + sep.len()))
            .min();
        match next_break {
            Some(end) => {
                segments.push(rest[..end].to_string());
                rest = &rest[end..];
            }
            None => {
                if !rest.is_empty() {
                    segments.push(rest.to_string());
                }
                break;
            }
        }
    }

    segments
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
