/// Break separators, tried in priority order against each limit-length
/// prefix. The match closest to the end of the prefix wins within a
/// separator, and a sentence split keeps its period.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits `text` into substrings of at most `limit` characters, preferring
/// to break at paragraph, line, sentence, or word boundaries over a hard
/// cut. Limits are counted in Unicode scalar values.
///
/// The iterator is lazy and finite; re-invoking the function restarts the
/// split from scratch.
pub fn smart_split(text: &str, limit: usize) -> SmartSplit {
    SmartSplit { remaining: Some(text.to_owned()), limit: limit.max(1) }
}

pub struct SmartSplit {
    remaining: Option<String>,
    limit: usize,
}

impl Iterator for SmartSplit {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let remaining = self.remaining.take()?;

        // A remainder within the limit is the final chunk, emitted verbatim.
        let Some((prefix_end, _)) = remaining.char_indices().nth(self.limit) else {
            return Some(remaining);
        };

        let (prefix, tail) = remaining.split_at(prefix_end);
        for separator in SEPARATORS {
            if let Some(position) = prefix.rfind(separator) {
                let mut chunk = prefix[..position].to_owned();
                if separator == ". " {
                    chunk.push('.');
                }
                self.remaining = Some(format!("{}{tail}", &prefix[position + separator.len()..]));
                return Some(chunk);
            }
        }

        // No separator in the prefix at all; hard cut at the limit.
        self.remaining = Some(tail.to_owned());
        Some(prefix.to_owned())
    }
}
