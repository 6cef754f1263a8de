/// Hostnames of common third-party CDNs, excluded from refresh by default.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "cdn.jsdelivr.net",
    "cdnjs.cloudflare.com",
    "unpkg.com",
    "maxcdn.bootstrapcdn.com",
    "stackpath.bootstrapcdn.com",
    "use.fontawesome.com",
    "use.typekit.net",
    "code.jquery.com",
];

/// Literal substring rules excluding stylesheet URLs from refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blacklist {
    rules: Vec<String>,
}

impl Blacklist {
    /// Builds a blacklist from raw rule lines; lines are trimmed and blank ones dropped.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect();
        Self { rules }
    }

    /// Builds a blacklist from newline-delimited text, as stored in settings.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if any rule occurs in `url` (case-sensitive, no pattern syntax).
    pub fn is_blacklisted(&self, url: &str) -> bool {
        self.rules.iter().any(|rule| url.contains(rule.as_str()))
    }

    pub fn should_refresh(&self, url: &str) -> bool {
        !self.is_blacklisted(url)
    }
}
