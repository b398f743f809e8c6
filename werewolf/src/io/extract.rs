//! Free-text reply parsing into one of a fixed set of options.
//!
//! Models tend to put their decision at the end of a reply, so every rule
//! below prefers later text. Longer options win over shorter options they
//! contain (`Ann-Marie` over `Ann`).

use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;

static DECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s*_#>-]*(?:my\s+)?(?:final\s+)?(?:answer|decision|choice|target|vote|selection)[\s*_]*[:：]\s*(.+)$",
    )
    .unwrap()
});

static NEGATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not|never|no|don't|dont|won't|wont|cannot|can't)\s+(?:\w+\s+)?$").unwrap()
});

/// Pick the option the reply commits to, or `None` if it names none.
///
/// Rules, first hit wins:
/// 1. An explicit `Decision: <option>` style line, scanning from the end.
///    If the latest such line names no option, the reply abstains.
/// 2. The last line is exactly an option.
/// 3. The last line mentions exactly one option.
/// 4. The option mentioned latest anywhere in the reply.
pub fn extract_choice(text: &str, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let last = *lines.last()?;

    if let Some(caps) = lines.iter().rev().find_map(|line| DECISION_RE.captures(line)) {
        return latest_mention(&caps[1], options);
    }

    let bare = strip_decoration(last);
    if let Some(found) = options
        .iter()
        .find(|option| option.trim().to_lowercase() == bare.to_lowercase())
    {
        return Some(found.clone());
    }

    let mut in_last: Vec<usize> = mentions(last, options).into_iter().map(|(_, i)| i).collect();
    in_last.sort_unstable();
    in_last.dedup();
    if let [only] = in_last.as_slice() {
        return Some(options[*only].clone());
    }

    latest_mention(text, options)
}

fn latest_mention(text: &str, options: &[String]) -> Option<String> {
    mentions(text, options)
        .last()
        .map(|(_, index)| options[*index].clone())
}

fn strip_decoration(line: &str) -> &str {
    line.trim_matches(|c: char| {
        c.is_whitespace() || c.is_ascii_punctuation() || matches!(c, '。' | '，' | '！' | '“' | '”')
    })
}

/// Non-overlapping option mentions as `(byte offset, option index)`, sorted by offset.
///
/// Negated mentions (`not save`, `won't vote Ben`) are skipped.
fn mentions(text: &str, options: &[String]) -> Vec<(usize, usize)> {
    let mut by_length: Vec<usize> = (0..options.len()).collect();
    by_length.sort_by_key(|&index| Reverse(options[index].trim().chars().count()));

    let mut taken: Vec<(usize, usize)> = Vec::new();
    let mut found = Vec::new();
    for index in by_length {
        let needle = options[index].trim();
        if needle.is_empty() {
            continue;
        }
        let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(needle))) else {
            continue;
        };
        for m in re.find_iter(text) {
            let overlaps = taken
                .iter()
                .any(|&(start, end)| m.start() < end && start < m.end());
            if overlaps || !is_bounded(text, m.start(), m.end()) {
                continue;
            }
            taken.push((m.start(), m.end()));
            if NEGATION_RE.is_match(&text[..m.start()]) {
                continue;
            }
            found.push((m.start(), index));
        }
    }
    found.sort_unstable();
    found
}

/// Reject matches glued to ASCII letters or digits (`Ben` inside `Benjamin`).
fn is_bounded(text: &str, start: usize, end: usize) -> bool {
    let glued = |outer: Option<char>, inner: Option<char>| {
        outer.is_some_and(|c| c.is_ascii_alphanumeric())
            && inner.is_some_and(|c| c.is_ascii_alphanumeric())
    };
    let matched = &text[start..end];
    !glued(text[..start].chars().next_back(), matched.chars().next())
        && !glued(text[end..].chars().next(), matched.chars().next_back())
}
