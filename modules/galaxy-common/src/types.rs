use serde::{Deserialize, Serialize};

use crate::error::GalaxyError;

/// Sentinel for "no link was found in the message".
pub const URL_MISSING: &str = "MISSING";

/// Sentinel for "this entry intentionally has no link".
pub const URL_NONE: &str = "#";

// --- Categories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ideas,
    Fun,
    Shop,
    #[default]
    Ai,
    Prompts,
    Study,
    Prog,
    Dev,
    Apk,
    Sys,
    Osint,
}

/// Icon + color token used when rendering a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Ideas,
        Category::Fun,
        Category::Shop,
        Category::Ai,
        Category::Prompts,
        Category::Study,
        Category::Prog,
        Category::Dev,
        Category::Apk,
        Category::Sys,
        Category::Osint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ideas => "ideas",
            Category::Fun => "fun",
            Category::Shop => "shop",
            Category::Ai => "ai",
            Category::Prompts => "prompts",
            Category::Study => "study",
            Category::Prog => "prog",
            Category::Dev => "dev",
            Category::Apk => "apk",
            Category::Sys => "sys",
            Category::Osint => "osint",
        }
    }

    /// Case-insensitive lookup. `None` for anything outside the closed set.
    pub fn parse(raw: &str) -> Option<Category> {
        let key = raw.trim().to_lowercase();
        Category::ALL.into_iter().find(|c| c.as_str() == key)
    }

    pub fn style(&self) -> CategoryStyle {
        let (icon, color) = match self {
            Category::Ideas => ("lightbulb", "yellow"),
            Category::Fun => ("gamepad", "pink"),
            Category::Shop => ("cart-shopping", "rose"),
            Category::Ai => ("robot", "purple"),
            Category::Prompts => ("key", "amber"),
            Category::Study => ("graduation-cap", "indigo"),
            Category::Prog => ("code", "blue"),
            Category::Dev => ("flask", "emerald"),
            Category::Apk => ("mobile-screen", "green"),
            Category::Sys => ("microchip", "cyan"),
            Category::Osint => ("eye", "red"),
        };
        CategoryStyle { icon, color }
    }

    /// Upper-cased key used in markers, commit messages and status lines.
    pub fn upper(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Literal comment in the shared document that new cards are inserted before.
    pub fn marker(&self) -> String {
        format!("<!-- INSERT_{}_HERE -->", self.upper())
    }

    /// Whether an entry in this category is useless without a link.
    pub fn requires_link(&self) -> bool {
        !matches!(
            self,
            Category::Prompts | Category::Ideas | Category::Shop | Category::Fun
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = GalaxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s).ok_or_else(|| GalaxyError::UnknownCategory(s.to_string()))
    }
}

// --- Classification ---

/// One analyzed message: produced by the classifier, optionally amended by
/// the conversation, consumed once by the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub section: Category,
    pub alternative: Option<Category>,
    /// 0..=100
    pub confidence: u8,
    pub name: String,
    pub desc: String,
    /// Absolute URL, [`URL_NONE`] or [`URL_MISSING`].
    pub url: String,
    pub platform: Option<String>,
    pub prompt_body: Option<String>,
    pub reply_text: Option<String>,
}

impl Default for ClassificationRecord {
    fn default() -> Self {
        Self {
            section: Category::Ai,
            alternative: None,
            confidence: 100,
            name: "Resource".to_string(),
            desc: "No description.".to_string(),
            url: URL_NONE.to_string(),
            platform: None,
            prompt_body: None,
            reply_text: None,
        }
    }
}

impl ClassificationRecord {
    /// True when `url` is a real link rather than a sentinel.
    pub fn has_link(&self) -> bool {
        !is_sentinel_url(&self.url)
    }

    /// Alternative category worth offering to the user, if any.
    pub fn distinct_alternative(&self) -> Option<Category> {
        self.alternative.filter(|alt| *alt != self.section)
    }
}

pub fn is_sentinel_url(url: &str) -> bool {
    let trimmed = url.trim();
    trimmed.is_empty() || trimmed == URL_NONE || trimmed == URL_MISSING
}
