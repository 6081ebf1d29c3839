use super::types::{Category, CategoryRule};

/// Keyword table used when the config does not override `category_keywords`.
///
/// Order matters: the first rule with a matching keyword wins.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            Category::PersonalDevelopment,
            &[
                "personal development",
                "soft skills",
                "leadership",
                "communication",
            ],
        ),
        CategoryRule::new(
            Category::It,
            &[
                "cybersecurity",
                "security",
                "ethical hacking",
                "penetration testing",
                "cyber",
            ],
        ),
        CategoryRule::new(
            Category::Business,
            &["cryptocurrency", "blockchain", "bitcoin", "crypto", "web3"],
        ),
        CategoryRule::new(
            Category::Marketing,
            &["marketing", "digital marketing", "social media marketing"],
        ),
        CategoryRule::new(
            Category::Development,
            &["backend", "python", "java", "nodejs", "php", "database"],
        ),
        CategoryRule::new(
            Category::Design,
            &[
                "web design",
                "html",
                "css",
                "ui design",
                "graphic design",
                "photoshop",
                "illustrator",
                "figma",
            ],
        ),
        CategoryRule::new(
            Category::Development,
            &[
                "full stack",
                "fullstack",
                "mern",
                "web development",
                "application development",
                "software development",
                "app development",
                "mobile development",
                "android",
                "ios",
                "flutter",
                "react native",
            ],
        ),
        CategoryRule::new(
            Category::It,
            &[
                "cloud computing",
                "aws",
                "azure",
                "google cloud",
                "devops",
                "quantum computing",
                "quantum",
            ],
        ),
        CategoryRule::new(
            Category::Marketing,
            &["seo", "search engine optimization", "google analytics"],
        ),
        CategoryRule::new(
            Category::Business,
            &[
                "business",
                "finance",
                "accounting",
                "entrepreneurship",
                "management",
                "excel",
            ],
        ),
        CategoryRule::new(
            Category::It,
            &["software", "tools", "applications", "productivity"],
        ),
    ]
}

/// Maps listing titles to a [`Category`] through an ordered rule table.
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<CategoryRule>,
}

impl Categorizer {
    pub fn new(rules: &[CategoryRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CategoryRule {
                category: rule.category,
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .filter(|rule| !rule.keywords.is_empty())
            .collect();
        Self { rules }
    }

    pub fn categorize(&self, title: &str) -> Category {
        let title = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| contains_word(&title, k)))
            .map_or(Category::Other, |rule| rule.category)
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(&default_rules())
    }
}

/// True when `needle` occurs in `haystack` without alphanumeric neighbours.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();

        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());

        if before_ok && after_ok {
            return true;
        }

        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
