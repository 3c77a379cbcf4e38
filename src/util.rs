//! Small text helpers shared by the resolver and the gateways.

use unicode_normalization::UnicodeNormalization;

/// Normalize a search term into a cache key: collapse whitespace, NFKC-fold,
/// lowercase. "Ivan  Petrenko " and "ivan petrenko" share one key.
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .nfkc()
        .collect::<String>()
        .to_lowercase()
}

/// True if the string contains any Cyrillic letters.
pub fn is_cyrillic(s: &str) -> bool {
    s.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

/// Transliterate a Cyrillic term to Latin for directory queries.
///
/// The directory stores Latin-script names, so input like "Петренко" has to
/// be searched as "petrenko". Follows the Ukrainian national transliteration
/// table; the handful of Russian-only letters map to their closest Latin
/// forms. Anything that is not a letter or digit is dropped.
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(|c| c.to_lowercase()) {
        match c {
            'а' => out.push('a'),
            'б' => out.push('b'),
            'в' => out.push('v'),
            'г' => out.push('h'),
            'ґ' => out.push('g'),
            'д' => out.push('d'),
            'е' | 'э' | 'ё' => out.push('e'),
            'є' => out.push_str("ie"),
            'ж' => out.push_str("zh"),
            'з' => out.push('z'),
            'и' | 'ы' => out.push('y'),
            'і' | 'ї' | 'й' => out.push('i'),
            'к' => out.push('k'),
            'л' => out.push('l'),
            'м' => out.push('m'),
            'н' => out.push('n'),
            'о' => out.push('o'),
            'п' => out.push('p'),
            'р' => out.push('r'),
            'с' => out.push('s'),
            'т' => out.push('t'),
            'у' => out.push('u'),
            'ф' => out.push('f'),
            'х' => out.push_str("kh"),
            'ц' => out.push_str("ts"),
            'ч' => out.push_str("ch"),
            'ш' => out.push_str("sh"),
            'щ' => out.push_str("shch"),
            'ю' => out.push_str("iu"),
            'я' => out.push_str("ia"),
            'ь' | 'ъ' => {}
            c if c.is_ascii_alphanumeric() => out.push(c),
            _ => {}
        }
    }
    out
}

/// True if the participant string looks like a raw email address.
pub fn looks_like_email(s: &str) -> bool {
    match s.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Longest whitespace-delimited token of a name; first wins on ties.
pub fn longest_token(name: &str) -> &str {
    let mut longest = "";
    for token in name.split_whitespace() {
        if token.chars().count() > longest.chars().count() {
            longest = token;
        }
    }
    longest
}
