use crate::registry::{HandlerRegistry, RegistryEntry};
use shared::handler::CommandArgs;

/// Keywords that end the dispatch loop instead of reaching a handler.
pub const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

/// Similarity a keyword needs before approximate resolution accepts it.
pub const FUZZY_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub raw: String,
    pub keyword: String,
    pub params: Vec<String>,
}

impl ParsedCommand {
    pub fn args(&self) -> CommandArgs {
        CommandArgs {
            raw: self.raw.clone(),
            params: self.params.clone(),
        }
    }
}

/// Splits recognized text into a lower-cased keyword and its parameters.
pub fn parse_command(raw: &str) -> ParsedCommand {
    let mut parts = raw.split_whitespace();
    let keyword = parts.next().map(str::to_lowercase).unwrap_or_default();
    ParsedCommand {
        raw: raw.to_string(),
        keyword,
        params: parts.map(str::to_string).collect(),
    }
}

pub fn normalize_keyword(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn is_exit(keyword: &str) -> bool {
    EXIT_KEYWORDS.contains(&keyword)
}

pub fn resolve<'a>(keyword: &str, registry: &'a HandlerRegistry) -> Option<&'a RegistryEntry> {
    registry.get(keyword)
}

/// Similarity of two strings on a 0..=100 scale, from their insertion and
/// deletion edit distance. Empty input scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let common = longest_common_subsequence(&a, &b);
    // total - distance == 2 * common
    ((200 * common) as f64 / total as f64).round() as u8
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Highest scoring registered keyword; ties go to the earliest registration.
pub fn find_best_match(keyword: &str, registry: &HandlerRegistry) -> Option<(String, u8)> {
    let mut best: Option<(String, u8)> = None;
    for entry in registry.entries() {
        let score = ratio(keyword, &entry.keyword);
        if score > best.as_ref().map_or(0, |(_, s)| *s) {
            best = Some((entry.keyword.clone(), score));
        }
    }
    best
}

/// Exact lookup first, then the best approximate match at or above `threshold`.
pub fn resolve_approximate<'a>(
    keyword: &str,
    registry: &'a HandlerRegistry,
    threshold: u8,
) -> Option<(&'a RegistryEntry, u8)> {
    if let Some(entry) = resolve(keyword, registry) {
        return Some((entry, 100));
    }
    let (best, score) = find_best_match(keyword, registry)?;
    if score < threshold {
        return None;
    }
    registry.get(&best).map(|entry| (entry, score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryBuilder;
    use shared::handler::handler_fn;

    fn registry(keywords: &[&str]) -> HandlerRegistry {
        let mut builder = RegistryBuilder::new();
        for keyword in keywords {
            builder.insert("test", keyword, handler_fn(|_| Ok(String::new())));
        }
        builder.build()
    }

    #[test]
    fn test_parse_command() {
        let parsed = parse_command("  Weather  New York ");
        assert_eq!(parsed.keyword, "weather");
        assert_eq!(parsed.params, vec!["New", "York"]);
        assert_eq!(parsed.raw, "  Weather  New York ");
        assert_eq!(parsed.args().params, vec!["New", "York"]);
    }

    #[test]
    fn test_parse_empty_command() {
        let parsed = parse_command("   ");
        assert_eq!(parsed.keyword, "");
        assert!(parsed.params.is_empty());
        assert_eq!(parsed.raw, "   ");
    }

    #[test]
    fn test_exit_keywords() {
        assert!(is_exit("exit"));
        assert!(is_exit(&normalize_keyword(" QUIT ")));
        assert!(!is_exit("exiting"));
    }

    #[test]
    fn test_resolve_is_exact() {
        let registry = registry(&["time", "date"]);
        assert_eq!(resolve("time", &registry).unwrap().keyword, "time");
        assert!(resolve("tim", &registry).is_none());
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("weather", "weather"), 100);
        assert_eq!(ratio("", "weather"), 0);
        assert_eq!(ratio("abc", "xyz"), 0);
        // lcs("wether", "weather") = 6, 12 / 13
        assert_eq!(ratio("wether", "weather"), 92);
        assert_eq!(ratio("time", "timer"), 89);
    }

    #[test]
    fn test_find_best_match() {
        let registry = registry(&["time", "timer", "weather"]);

        assert_eq!(
            find_best_match("timer", &registry),
            Some(("timer".to_string(), 100))
        );
        assert_eq!(
            find_best_match("wether", &registry),
            Some(("weather".to_string(), 92))
        );
        assert_eq!(find_best_match("zzz", &registry), None);
        assert_eq!(find_best_match("time", &self::registry(&[])), None);
    }

    #[test]
    fn test_resolve_approximate_threshold() {
        let registry = registry(&["weather", "wikipedia"]);

        let (entry, score) = resolve_approximate("wether", &registry, FUZZY_THRESHOLD).unwrap();
        assert_eq!(entry.keyword, "weather");
        assert_eq!(score, 92);

        let (entry, score) = resolve_approximate("weather", &registry, FUZZY_THRESHOLD).unwrap();
        assert_eq!(entry.keyword, "weather");
        assert_eq!(score, 100);

        assert!(resolve_approximate("wiki", &registry, FUZZY_THRESHOLD).is_none());
    }
}
