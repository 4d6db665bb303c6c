// Pure normalization passes over a fetched article batch: relevance filter
// then title dedup. Both are idempotent and order-preserving.

use std::collections::HashSet;

use tracing::info;

use econpulse_common::Article;

/// Keyword set defining economic relevance. An article survives the filter
/// iff its combined title+body contains at least one of these,
/// case-insensitively.
pub const ECONOMIC_KEYWORDS: &[&str] = &[
    "economy",
    "economic",
    "finance",
    "financial",
    "market",
    "stock",
    "trading",
    "investment",
    "bank",
    "fed",
    "reserve",
    "interest",
    "rate",
    "inflation",
    "gdp",
    "trade",
    "export",
    "import",
    "semiconductor",
    "chip",
    "oil",
    "energy",
    "currency",
    "dollar",
    "euro",
];

/// Keep only articles whose title or body mentions an economic keyword.
pub fn filter_economic(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let filtered: Vec<Article> = articles.into_iter().filter(is_economic).collect();
    info!(before, after = filtered.len(), "Filtered economic articles");
    filtered
}

fn is_economic(article: &Article) -> bool {
    let text = format!("{} {}", article.title, article.body).to_lowercase();
    ECONOMIC_KEYWORDS.iter().any(|kw| text.contains(kw))
}

/// Drop articles whose trimmed, case-folded title was already seen.
/// First occurrence wins; output preserves input order.
pub fn dedupe_by_title(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let mut seen = HashSet::new();
    let unique: Vec<Article> = articles
        .into_iter()
        .filter(|article| seen.insert(article.title.trim().to_lowercase()))
        .collect();
    info!(before, after = unique.len(), "Deduplicated articles");
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(title: &str, body: &str) -> Article {
        Article {
            title: title.to_string(),
            body: body.to_string(),
            source: "Test Wire".to_string(),
            published_at: Utc::now(),
            url: format!("https://example.com/{}", title.len()),
        }
    }

    #[test]
    fn filter_output_is_subset_with_keyword() {
        let input = vec![
            article("Inflation cools in July", "Prices rose slower."),
            article("Local bakery wins award", "Best croissant in town."),
            article("New stadium opens", "The economy of the region benefits."),
        ];
        let out = filter_economic(input.clone());
        assert_eq!(out.len(), 2);
        for kept in &out {
            assert!(input.contains(kept));
            let text = format!("{} {}", kept.title, kept.body).to_lowercase();
            assert!(ECONOMIC_KEYWORDS.iter().any(|kw| text.contains(kw)));
        }
    }

    #[test]
    fn filter_is_case_insensitive() {
        let out = filter_economic(vec![article("GDP Figures Released", "")]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn filter_drops_everything_irrelevant() {
        let out = filter_economic(vec![article("Cat rescued from tree", "A happy ending.")]);
        assert!(out.is_empty());
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order() {
        let input = vec![
            article("Markets rally", "a"),
            article("  markets RALLY  ", "b"),
            article("Oil slides", "c"),
            article("Markets rally", "d"),
        ];
        let out = dedupe_by_title(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].body, "a");
        assert_eq!(out[1].title, "Oil slides");
    }

    #[test]
    fn dedupe_is_idempotent() {
        let input = vec![
            article("Markets rally", "a"),
            article("markets rally", "b"),
            article("Euro gains", "c"),
        ];
        let once = dedupe_by_title(input);
        let twice = dedupe_by_title(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_passes_through_both_passes() {
        assert!(filter_economic(Vec::new()).is_empty());
        assert!(dedupe_by_title(Vec::new()).is_empty());
    }
}
