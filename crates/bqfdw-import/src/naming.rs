//! Identifier truncation and collision handling

use std::collections::{HashMap, HashSet};

/// Cut `name` to at most `max_bytes`, never splitting a UTF-8 character.
pub fn truncate_identifier(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }
    let mut end = max_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Truncated names shared by more than one input name, with the colliding originals.
///
/// Groups are ordered by the first occurrence of the truncated name.
pub fn find_collisions<'a>(names: &[&'a str], max_bytes: usize) -> Vec<(&'a str, Vec<&'a str>)> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut groups: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
    for &name in names {
        let truncated = truncate_identifier(name, max_bytes);
        let group = groups.entry(truncated).or_default();
        if group.is_empty() {
            order.push(truncated);
        }
        group.push(name);
    }
    order
        .into_iter()
        .filter_map(|t| {
            let group = groups.remove(t)?;
            (group.len() > 1).then_some((t, group))
        })
        .collect()
}

/// Give every name a unique identifier of at most `max_bytes`.
///
/// The first name truncating to a given identifier keeps it; later ones get
/// `_2`, `_3`, ... appended to a shortened stem, skipping identifiers already
/// taken. `None` marks a name for which no identifier could be found.
pub fn disambiguate(names: &[&str], max_bytes: usize) -> Vec<Option<String>> {
    let truncated: Vec<&str> = names.iter().map(|n| truncate_identifier(n, max_bytes)).collect();
    // Suffixed names must avoid every plain truncated name
    let mut taken: HashSet<String> = truncated.iter().map(|t| (*t).to_string()).collect();

    let mut claimed: HashSet<&str> = HashSet::new();
    truncated
        .iter()
        .map(|t| {
            if claimed.insert(*t) {
                return Some((*t).to_string());
            }
            (2..10_000usize).find_map(|n| {
                let suffix = format!("_{}", n);
                let stem_bytes = max_bytes.checked_sub(suffix.len())?;
                let candidate = format!("{}{}", truncate_identifier(t, stem_bytes), suffix);
                taken.insert(candidate.clone()).then_some(candidate)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_1: &str = "long_column_name___2_________3_________4_________5_________6__3_1";
    const LONG_2: &str = "long_column_name___2_________3_________4_________5_________6__3_2";

    #[test]
    fn test_truncate_identifier() {
        assert_eq!(truncate_identifier("short", 63), "short");
        assert_eq!(truncate_identifier(LONG_1, 63).len(), 63);
        // 'é' is two bytes and would be split at byte 4
        assert_eq!(truncate_identifier("abcé", 4), "abc");
    }

    #[test]
    fn test_find_collisions() {
        let names = [LONG_1, "id", LONG_2];
        let collisions = find_collisions(&names, 63);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].1, vec![LONG_1, LONG_2]);
        assert!(find_collisions(&["a", "b"], 63).is_empty());
    }

    #[test]
    fn test_disambiguate() {
        let names = [LONG_1, LONG_2, "id"];
        let resolved = disambiguate(&names, 63);
        let first = resolved[0].clone().unwrap();
        let second = resolved[1].clone().unwrap();

        assert_eq!(first, truncate_identifier(LONG_1, 63));
        assert!(second.ends_with("_2"));
        assert!(second.len() <= 63);
        assert_ne!(first, second);
        assert_eq!(resolved[2].as_deref(), Some("id"));
    }

    #[test]
    fn test_disambiguate_avoids_existing_names() {
        // "ab_2" is a real column, so the duplicate of "abcd" must skip it
        let names = ["abcde", "abcdf", "ab_2"];
        assert_eq!(
            disambiguate(&names, 4),
            vec![Some("abcd".to_string()), Some("ab_3".to_string()), Some("ab_2".to_string())]
        );
    }

    #[test]
    fn test_disambiguate_without_room_for_suffix() {
        assert_eq!(disambiguate(&["ab", "ac"], 1), vec![Some("a".to_string()), None]);
    }
}
