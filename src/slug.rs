//! URL-safe project identifiers derived from project names.

/// The shortest slug accepted by [validate].
pub const MIN_LENGTH: usize = 2;
/// The longest slug accepted by [validate].
pub const MAX_LENGTH: usize = 50;
/// Used when a name contains no letters or digits.
pub const FALLBACK: &str = "project";

/// The reasons a slug can be rejected.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at least 2 characters long")]
    TooShort,
    #[error("slug must be no more than 50 characters long")]
    TooLong,
    #[error("slug must contain only lowercase letters, numbers, and hyphens")]
    InvalidCharacter,
    #[error("slug cannot contain consecutive hyphens")]
    ConsecutiveHyphens,
    #[error("slug cannot start or end with hyphens")]
    EdgeHyphen,
}

/// Derive a slug from `name`.
///
/// The name is lowercased, every run of characters other than ASCII letters
/// and digits becomes a single hyphen, and hyphens are trimmed from both ends.
/// The result is cut to [MAX_LENGTH]. A name without any letters or digits
/// produces [FALLBACK], and a single character result has [FALLBACK]
/// appended so that the slug is always valid.
pub fn generate(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    match slug.len() {
        0 => FALLBACK.to_owned(),
        1 => format!("{slug}-{FALLBACK}"),
        _ => truncate(&slug, MAX_LENGTH),
    }
}

/// The candidate slug for the given retry `attempt`.
///
/// Attempt zero is `base` itself, attempt `n` is `base-n`. The base is
/// shortened when needed so that the candidate never exceeds [MAX_LENGTH].
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        return truncate(base, MAX_LENGTH);
    }

    let suffix = format!("-{attempt}");
    let base = truncate(base, MAX_LENGTH - suffix.len());

    format!("{base}{suffix}")
}

/// Check that `slug` is a lowercase kebab-case string of 2 to 50 characters.
pub fn validate(slug: &str) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }

    if slug.len() < MIN_LENGTH {
        return Err(SlugError::TooShort);
    }

    if slug.len() > MAX_LENGTH {
        return Err(SlugError::TooLong);
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(SlugError::InvalidCharacter);
    }

    if slug.contains("--") {
        return Err(SlugError::ConsecutiveHyphens);
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(SlugError::EdgeHyphen);
    }

    Ok(())
}

// Slugs only ever hold ASCII so byte indexing is safe.
fn truncate(slug: &str, max_length: usize) -> String {
    if slug.len() <= max_length {
        return slug.to_owned();
    }

    slug[..max_length].trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod generate_tests {
    use super::{MAX_LENGTH, candidate, generate, validate};

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(generate("Test Project"), "test-project");
        assert_eq!(generate("Home  Budget 2024"), "home-budget-2024");
    }

    #[test]
    fn collapses_and_trims_separators() {
        assert_eq!(generate("  --Hello,   World!!  "), "hello-world");
        assert_eq!(generate("a/b\\c"), "a-b-c");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(generate("Żółw i Kot"), "w-i-kot");
    }

    #[test]
    fn falls_back_when_nothing_remains() {
        assert_eq!(generate(""), "project");
        assert_eq!(generate("!!! ???"), "project");
    }

    #[test]
    fn pads_single_character_result() {
        assert_eq!(generate("A"), "a-project");
    }

    #[test]
    fn long_names_are_cut_to_max_length() {
        let name = "word ".repeat(30);

        let slug = generate(&name);

        assert!(slug.len() <= MAX_LENGTH);
        assert_eq!(validate(&slug), Ok(()));
    }

    #[test]
    fn candidates_append_attempt_number() {
        assert_eq!(candidate("test-project", 0), "test-project");
        assert_eq!(candidate("test-project", 1), "test-project-1");
        assert_eq!(candidate("test-project", 12), "test-project-12");
    }

    #[test]
    fn candidates_stay_within_max_length() {
        let base = "a".repeat(MAX_LENGTH);

        let slug = candidate(&base, 7);

        assert_eq!(slug.len(), MAX_LENGTH);
        assert!(slug.ends_with("-7"));
    }
}

#[cfg(test)]
mod validate_tests {
    use super::{SlugError, validate};

    #[test]
    fn accepts_kebab_case() {
        assert_eq!(validate("my-project-2"), Ok(()));
        assert_eq!(validate("ab"), Ok(()));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(validate(""), Err(SlugError::Empty));
    }

    #[test]
    fn rejects_bad_length() {
        assert_eq!(validate("a"), Err(SlugError::TooShort));
        assert_eq!(validate(&"a".repeat(51)), Err(SlugError::TooLong));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert_eq!(validate("My-Project"), Err(SlugError::InvalidCharacter));
        assert_eq!(validate("my_project"), Err(SlugError::InvalidCharacter));
    }

    #[test]
    fn rejects_misplaced_hyphens() {
        assert_eq!(validate("my--project"), Err(SlugError::ConsecutiveHyphens));
        assert_eq!(validate("-project"), Err(SlugError::EdgeHyphen));
        assert_eq!(validate("project-"), Err(SlugError::EdgeHyphen));
    }
}
