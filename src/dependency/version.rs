//! Version parsing and ordering for artifact file names

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// A version starts with a digit; later parts follow `.`, `-`, `_` or `+`
static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:[.\-_+][0-9A-Za-z]+)*$").expect("static regex is valid")
});

/// Whether `version` opens with `<digits>.<digit>`
fn is_dotted(version: &str) -> bool {
    let rest = version.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.len() < version.len()
        && rest
            .strip_prefix('.')
            .is_some_and(|tail| tail.starts_with(|c: char| c.is_ascii_digit()))
}

/// Split a file stem such as `play-services-base-15.0.1` into its
/// version-stripped name and version.
///
/// Every `-` followed by a version-shaped remainder is a candidate split.
/// The first candidate whose version is dotted wins, so `foo-1-1.0.0` is
/// `foo-1` at `1.0.0`. Without a dotted candidate the first one is used,
/// which makes a bare numeric name segment ambiguous: `foo-1-1` splits
/// as `foo` at `1-1`.
pub fn split_versioned_name(stem: &str) -> (&str, Option<&str>) {
    let candidates: Vec<usize> = stem
        .match_indices('-')
        .map(|(i, _)| i)
        .filter(|&i| i > 0 && VERSION.is_match(&stem[i + 1..]))
        .collect();
    let chosen = candidates
        .iter()
        .find(|&&i| is_dotted(&stem[i + 1..]))
        .or(candidates.first());
    match chosen {
        Some(&i) => (&stem[..i], Some(&stem[i + 1..])),
        None => (stem, None),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Component<'a> {
    Number(u64),
    Text(&'a str),
}

fn components(version: &str) -> Vec<Component<'_>> {
    version
        .split(['.', '-', '_', '+'])
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<u64>() {
            Ok(n) => Component::Number(n),
            Err(_) => Component::Text(part),
        })
        .collect()
}

/// Order two dependency versions.
///
/// Strict semver strings use semver precedence. Everything else is compared
/// component by component: numbers numerically, qualifiers
/// case-insensitively, a number outranks a qualifier, and a missing
/// component counts as `0` against a number but outranks a qualifier
/// (`1.0` < `1.0.1`, `1.0-alpha` < `1.0`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Ok(a), Ok(b)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return a.cmp(&b);
    }

    let left = components(a);
    let right = components(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(Component::Number(x)), Some(Component::Number(y))) => x.cmp(y),
            (Some(Component::Text(x)), Some(Component::Text(y))) => {
                x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase())
            }
            (Some(Component::Number(_)), Some(Component::Text(_))) => Ordering::Greater,
            (Some(Component::Text(_)), Some(Component::Number(_))) => Ordering::Less,
            (Some(Component::Number(x)), None) => x.cmp(&0),
            (None, Some(Component::Number(y))) => 0.cmp(y),
            (Some(Component::Text(_)), None) => Ordering::Less,
            (None, Some(Component::Text(_))) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
