use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use regex::Regex;

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^a-z0-9.]+").expect("regex compiles");
}

/// Lowercases a user-supplied file name and collapses anything that isn't
/// alphanumeric or a dot into underscores
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.to_lowercase();
    UNSAFE_FILENAME_CHARS.replace_all(&lowered, "_").to_string()
}

/// Builds an ILIKE pattern from a raw search term, escaping the wildcard
/// characters so they match literally
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_random_string() {
        let first = random_string(32);
        let second = random_string(32);

        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Video (1).mp4"), "my_video_1_.mp4");
        assert_eq!(sanitize_filename("clean.webm"), "clean.webm");
        assert_eq!(sanitize_filename("ünicode name.png"), "_nicode_name.png");
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("cats"), "%cats%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("snake_case"), "%snake\\_case%");
    }
}
