//! Fuzzy person-name matching against document text
//!
//! Query names are read as "given ... surname". A match is accepted when the
//! text contains the full name, the name reversed, the surname with the given
//! initial (either order), or the surname alone next to a reporting-person
//! marker. A single middle initial may sit between the two parts.
//!
//! When the query carries a given name, a lone surname next to some other
//! name word is taken to belong to someone else: "Public Jane" does not match
//! "Reporting Person: Jane Doe".

/// Token window around a surname in which a reporting-person marker counts
const MARKER_WINDOW: usize = 40;

const MARKERS: &[&[&str]] = &[
    &["reporting", "person"],
    &["reporting", "persons"],
    &["reporting", "owner"],
    &["reporting", "owners"],
    &["reportingowner"],
    &["rptownername"],
];

/// Lowercase, punctuation to spaces, whitespace collapsed
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokens(text: &str) -> Vec<String> {
    normalize(text).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Does `candidate_text` mention `query_name`?
pub fn matches(candidate_text: &str, query_name: &str) -> bool {
    matches_in_context(candidate_text, query_name, false)
}

/// Like [`matches`], for text that is itself a reporting owner's name; the
/// surname alone is then enough.
pub fn matches_owner_name(owner_name: &str, query_name: &str) -> bool {
    matches_in_context(owner_name, query_name, true)
}

fn matches_in_context(candidate_text: &str, query_name: &str, owner_context: bool) -> bool {
    let query = tokens(query_name);
    let (Some(given), Some(surname)) = (query.first(), query.last()) else {
        return false;
    };
    let text = tokens(candidate_text);
    if text.is_empty() {
        return false;
    }

    if query.len() > 1 {
        if contains_sequence(&text, &query)
            || contains_pair(&text, given, surname)
            || contains_pair(&text, surname, given)
        {
            return true;
        }

        let initial: String = given.chars().take(1).collect();
        if contains_pair(&text, &initial, surname) || contains_pair(&text, surname, &initial) {
            return true;
        }
    }

    let given = (query.len() > 1 && !owner_context).then_some(given.as_str());
    surname_near_marker(&text, surname, given, owner_context)
}

fn contains_sequence(text: &[String], sequence: &[String]) -> bool {
    text.windows(sequence.len()).any(|window| window == sequence)
}

/// `first` followed by `second`, allowing one single-letter token between them
fn contains_pair(text: &[String], first: &str, second: &str) -> bool {
    text.iter().enumerate().any(|(i, token)| {
        if token != first {
            return false;
        }
        match (text.get(i + 1), text.get(i + 2)) {
            (Some(next), _) if next == second => true,
            (Some(middle), Some(after)) => middle.chars().count() == 1 && after == second,
            _ => false,
        }
    })
}

fn is_marker_word(token: &str) -> bool {
    MARKERS.iter().any(|marker| marker.contains(&token))
}

/// A neighbour that cannot be part of another person's name
fn is_neutral_neighbour(token: &str, given: &str) -> bool {
    token == given || token.chars().count() == 1 || is_marker_word(token)
}

fn surname_near_marker(text: &[String], surname: &str, given: Option<&str>, owner_context: bool) -> bool {
    let positions: Vec<usize> = text
        .iter()
        .enumerate()
        .filter(|(_, token)| token.as_str() == surname)
        .map(|(i, _)| i)
        .filter(|&i| match given {
            Some(given) => {
                let before = i.checked_sub(1).and_then(|j| text.get(j));
                let after = text.get(i + 1);
                [before, after]
                    .into_iter()
                    .flatten()
                    .all(|neighbour| is_neutral_neighbour(neighbour, given))
            }
            None => true,
        })
        .collect();

    if positions.is_empty() {
        return false;
    }
    if owner_context {
        return true;
    }

    let marker_positions: Vec<usize> = (0..text.len())
        .filter(|&i| {
            MARKERS.iter().any(|marker| {
                marker.len() <= text.len() - i
                    && marker.iter().zip(&text[i..]).all(|(m, t)| *m == t.as_str())
            })
        })
        .collect();

    positions.iter().any(|&p| {
        marker_positions
            .iter()
            .any(|&m| p.abs_diff(m) <= MARKER_WINDOW)
    })
}
