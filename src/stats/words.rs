use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Most frequent lowercase words across `titles`.
///
/// A word is a non-empty maximal run of alphanumeric characters or `_` with
/// at least `min_len` characters. Ties keep first-seen order.
pub fn top_words<'a>(
    titles: impl IntoIterator<Item = &'a str>,
    min_len: usize,
    limit: usize,
) -> Vec<WordCount> {
    // word → (count, first position)
    let mut seen: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;

    for title in titles {
        let lower = title.to_lowercase();
        for word in lower.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if word.is_empty() || word.chars().count() < min_len {
                continue;
            }
            let entry = seen.entry(word.to_string()).or_insert((0, order));
            entry.0 += 1;
            order += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> =
        seen.into_iter().map(|(w, (c, first))| (w, c, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, count, _)| WordCount { word, count })
        .collect()
}
