use crate::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Page classification derived from URL shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationTag {
    Category,
    Product,
    Normal,
}

impl ClassificationTag {
    /// Scheduling tier rank (lower is fetched first)
    pub fn rank(&self) -> u8 {
        match self {
            Self::Category => 0,
            Self::Product => 1,
            Self::Normal => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Product => "product",
            Self::Normal => "normal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(Self::Category),
            "product" => Some(Self::Product),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }
}

impl fmt::Display for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a URL by testing its path against the two patterns
///
/// The category pattern is tested first and wins outright, so a path matching both
/// patterns is a category.
///
/// # Examples
///
/// ```
/// use regex::Regex;
/// use sumi_sweep::url::{classify, ClassificationTag};
/// use url::Url;
///
/// let category = Regex::new("^/catalog").unwrap();
/// let product = Regex::new(r"\d+\.html$").unwrap();
/// let url = Url::parse("https://shop.test/item-1001.html").unwrap();
/// assert_eq!(classify(&url, &category, &product), ClassificationTag::Product);
/// ```
pub fn classify(url: &Url, category: &Regex, product: &Regex) -> ClassificationTag {
    let path = url.path();

    if category.is_match(path) {
        ClassificationTag::Category
    } else if product.is_match(path) {
        ClassificationTag::Product
    } else {
        ClassificationTag::Normal
    }
}

/// A compiled pair of category/product patterns
#[derive(Debug, Clone)]
pub struct Classifier {
    category: Regex,
    product: Regex,
}

impl Classifier {
    /// Compiles both patterns
    pub fn new(category_pattern: &str, product_pattern: &str) -> Result<Self, ConfigError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
        };

        Ok(Self {
            category: compile(category_pattern)?,
            product: compile(product_pattern)?,
        })
    }

    /// A classifier that matches wherever either `self` or `other` matches
    pub fn union(&self, other: &Classifier) -> Result<Self, ConfigError> {
        Self::new(
            &format!("(?:{})|(?:{})", self.category_pattern(), other.category_pattern()),
            &format!("(?:{})|(?:{})", self.product_pattern(), other.product_pattern()),
        )
    }

    pub fn classify(&self, url: &Url) -> ClassificationTag {
        classify(url, &self.category, &self.product)
    }

    pub fn category_pattern(&self) -> &str {
        self.category.as_str()
    }

    pub fn product_pattern(&self) -> &str {
        self.product.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CATEGORY_PATTERN, DEFAULT_PRODUCT_PATTERN};

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://shop.test{}", path)).unwrap()
    }

    fn default_classifier() -> Classifier {
        Classifier::new(DEFAULT_CATEGORY_PATTERN, DEFAULT_PRODUCT_PATTERN).unwrap()
    }

    #[test]
    fn test_default_patterns() {
        let classifier = default_classifier();
        assert_eq!(
            classifier.classify(&url("/catalog-shoes")),
            ClassificationTag::Category
        );
        assert_eq!(
            classifier.classify(&url("/collections/summer")),
            ClassificationTag::Category
        );
        assert_eq!(
            classifier.classify(&url("/item-1001.html")),
            ClassificationTag::Product
        );
        assert_eq!(
            classifier.classify(&url("/products/red-boot")),
            ClassificationTag::Product
        );
        assert_eq!(classifier.classify(&url("/about")), ClassificationTag::Normal);
        assert_eq!(classifier.classify(&url("/")), ClassificationTag::Normal);
    }

    #[test]
    fn test_category_wins_tie() {
        let classifier = Classifier::new("shoes", r"\.html$").unwrap();
        assert_eq!(
            classifier.classify(&url("/shoes-42.html")),
            ClassificationTag::Category
        );
    }

    #[test]
    fn test_query_is_not_classified() {
        let classifier = Classifier::new("^/c$", "item").unwrap();
        assert_eq!(
            classifier.classify(&url("/c?ref=item")),
            ClassificationTag::Category
        );
        assert_eq!(
            classifier.classify(&url("/x?ref=item")),
            ClassificationTag::Normal
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Classifier::new("(", "x"),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_union_matches_either_side() {
        let planned =
            Classifier::new(r"/(?:catalog\-bags)(?:/|$)", r"/(?:item\-1\.html)(?:/|$)").unwrap();
        let combined = planned.union(&default_classifier()).unwrap();

        assert_eq!(combined.classify(&url("/item-1.html")), ClassificationTag::Product);
        // Not in the planned group, but product-shaped
        assert_eq!(combined.classify(&url("/item-7.html")), ClassificationTag::Product);
        assert_eq!(
            combined.classify(&url("/collections/summer")),
            ClassificationTag::Category
        );
        assert_eq!(combined.classify(&url("/about")), ClassificationTag::Normal);
    }

    #[test]
    fn test_rank_ordering() {
        assert!(ClassificationTag::Category.rank() < ClassificationTag::Product.rank());
        assert!(ClassificationTag::Product.rank() < ClassificationTag::Normal.rank());
        assert_eq!(
            ClassificationTag::parse("product"),
            Some(ClassificationTag::Product)
        );
        assert_eq!(ClassificationTag::parse("other"), None);
    }
}
