/// Generate a URL-safe slug from a name.
///
/// Keeps ASCII letters, digits and underscores (lowercased). Runs of
/// whitespace or hyphens become a single hyphen; every other character is
/// dropped without leaving a gap, so apostrophes do not split words.
///
/// - "Trivia Night" -> "trivia-night"
/// - "Mom & Pop's Diner" -> "mom-pops-diner"
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_gap = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_gap && !slug.is_empty() {
                slug.push('-');
            }
            pending_gap = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_gap = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Trivia Night"), "trivia-night");
    }

    #[test]
    fn apostrophes_stay_inside_words() {
        assert_eq!(slugify("Joe's Bar"), "joes-bar");
        assert_eq!(slugify("Mom & Pop's Diner"), "mom-pops-diner");
    }

    #[test]
    fn separators_collapse_and_trim() {
        assert_eq!(slugify("  -- Open  Mic --  "), "open-mic");
        assert_eq!(slugify("Late-Night\tJazz"), "late-night-jazz");
        assert_eq!(slugify("dj_set 2"), "dj_set-2");
    }

    #[test]
    fn empty_name_gives_empty_slug() {
        assert_eq!(slugify("!!!"), "");
    }
}
