//! Free-text matching over a candidate set.
//!
//! Two strategies, picked by the caller:
//!
//! - **Exact tokens**: the share of query tokens found among an item's
//!   name tokens and tokenized auxiliary fields.
//! - **Fuzzy**: normalized Levenshtein similarity between the whole query
//!   and each text field, keeping the best field per item.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use jeannie_core::{tokenize, ContentItem, ItemId};

use crate::generation::Generation;

/// Minimum fuzzy similarity an item must exceed to be returned.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.3;

/// A matched item with its relevance score in 0.0-1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: ContentItem,
    pub score: f64,
}

/// Score candidates by the fraction of `query_tokens` they contain.
///
/// Items matching no token are dropped. Results are ordered by score, then
/// by name.
#[must_use]
pub fn token_search(
    generation: &Generation,
    query_tokens: &[String],
    candidates: &BTreeSet<ItemId>,
) -> Vec<ScoredItem> {
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<ScoredItem> = generation
        .resolve(candidates)
        .filter_map(|item| {
            let score = token_score(item, query_tokens);
            (score > 0.0).then(|| ScoredItem {
                item: item.clone(),
                score,
            })
        })
        .collect();

    results.sort_by(|a, b| by_score_then_name(a.score, &a.item, b.score, &b.item));
    results
}

/// Fraction of `query_tokens` present in the item's searchable tokens.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn token_score(item: &ContentItem, query_tokens: &[String]) -> f64 {
    let mut item_tokens: HashSet<&str> = item.name_tokens.iter().map(String::as_str).collect();
    let auxiliary: Vec<String> = item.auxiliary_fields().flat_map(tokenize).collect();
    item_tokens.extend(auxiliary.iter().map(String::as_str));

    let matched = query_tokens
        .iter()
        .filter(|token| item_tokens.contains(token.as_str()))
        .count();
    matched as f64 / query_tokens.len() as f64
}

/// Score candidates by edit-distance similarity to `query`.
///
/// Only items whose best field similarity exceeds `threshold` are kept.
/// Ties are ordered by name, then id.
#[must_use]
pub fn fuzzy_search(
    generation: &Generation,
    query: &str,
    candidates: &BTreeSet<ItemId>,
    threshold: f64,
) -> Vec<ScoredItem> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<ScoredItem> = generation
        .resolve(candidates)
        .filter_map(|item| {
            let best = item
                .name
                .as_deref()
                .into_iter()
                .chain(item.auxiliary_fields())
                .filter_map(|field| similarity(&query, field))
                .fold(None, |best: Option<f64>, score| {
                    Some(best.map_or(score, |b| b.max(score)))
                })?;
            (best > threshold).then(|| ScoredItem {
                item: item.clone(),
                score: best,
            })
        })
        .collect();

    results.sort_by(|a, b| by_score_then_name(a.score, &a.item, b.score, &b.item));
    results
}

/// `1 - distance / max(len)` between a lowercased query and a field.
///
/// Lengths count characters. Returns `None` when both strings are empty.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn similarity(query_lower: &str, field: &str) -> Option<f64> {
    let field = field.to_lowercase();
    let longest = query_lower.chars().count().max(field.chars().count());
    if longest == 0 {
        return None;
    }
    let distance = strsim::levenshtein(query_lower, &field);
    Some(1.0 - distance as f64 / longest as f64)
}

/// Descending score, then ascending display name, then ascending id.
pub(crate) fn by_score_then_name(
    a_score: f64,
    a: &ContentItem,
    b_score: f64,
    b: &ContentItem,
) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a.display_name().cmp(b.display_name()))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jeannie_core::Catalog;

    fn generation() -> Generation {
        let mut reali = ContentItem::new(1, "RealiBanjo")
            .with_content_type("Preset")
            .with_creator("Realitone");
        reali.name_tokens = vec!["reali".into(), "banjo".into()];

        let catalog = Catalog::from_items(vec![
            ContentItem::new(0, "Misfit Banjo")
                .with_content_type("Preset")
                .with_creator("8DIO")
                .with_library("Misfit Series"),
            reali,
            ContentItem::new(2, "Spitfire Strings")
                .with_content_type("Device")
                .with_creator("Spitfire Audio")
                .with_category("Orchestral Strings"),
            ContentItem::new(3, "Banjo Ensemble")
                .with_creator("8DIO")
                .with_plugin("Kontakt"),
        ])
        .unwrap();
        Generation::build(catalog, 1)
    }

    fn tokens(query: &str) -> Vec<String> {
        tokenize(query)
    }

    fn result_ids(results: &[ScoredItem]) -> Vec<u64> {
        results.iter().map(|hit| hit.item.id.get()).collect()
    }

    #[test]
    fn test_levenshtein_kitten_sitting() {
        assert_eq!(strsim::levenshtein("kitten", "sitting"), 3);
        let score = similarity("kitten", "sitting").unwrap();
        assert!((score - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_is_case_insensitive() {
        assert_eq!(similarity("banjo", "BANJO"), Some(1.0));
        assert_eq!(similarity("", ""), None);
    }

    #[test]
    fn test_own_name_token_scores_one() {
        let generation = generation();
        let all = generation.all_ids();
        for item in generation.catalog().items() {
            for token in &item.name_tokens {
                let results = token_search(&generation, std::slice::from_ref(token), &all);
                let hit = results
                    .iter()
                    .find(|hit| hit.item.id == item.id)
                    .expect("item matches its own token");
                assert!((hit.score - 1.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_token_search_proportional_score() {
        let generation = generation();
        let results = token_search(&generation, &tokens("misfit banjo"), &generation.all_ids());
        assert_eq!(result_ids(&results), vec![0, 3, 1]);
        assert!((results[0].score - 1.0).abs() < f64::EPSILON);
        assert!((results[1].score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_token_search_matches_auxiliary_fields() {
        let generation = generation();
        let results = token_search(&generation, &tokens("kontakt"), &generation.all_ids());
        assert_eq!(result_ids(&results), vec![3]);

        let results = token_search(&generation, &tokens("8dio"), &generation.all_ids());
        assert_eq!(result_ids(&results), vec![3, 0]);
    }

    #[test]
    fn test_token_search_respects_candidates() {
        let generation = generation();
        let only_device: BTreeSet<ItemId> = [ItemId::new(2)].into_iter().collect();
        assert!(token_search(&generation, &tokens("banjo"), &only_device).is_empty());
    }

    #[test]
    fn test_token_search_empty_query() {
        let generation = generation();
        assert!(token_search(&generation, &[], &generation.all_ids()).is_empty());
    }

    #[test]
    fn test_fuzzy_search_banjoo() {
        let generation = generation();
        let results = fuzzy_search(&generation, "banjoo", &generation.all_ids(), 0.3);
        let ids = result_ids(&results);
        assert!(ids.contains(&0));
        assert!(ids.contains(&1));
        assert!(!ids.contains(&2));
        assert!(results.iter().all(|hit| hit.score > 0.3));
    }

    #[test]
    fn test_fuzzy_search_best_field_wins() {
        let generation = generation();
        let results = fuzzy_search(&generation, "Spitfire Audio", &generation.all_ids(), 0.3);
        assert_eq!(results[0].item.id, ItemId::new(2));
        assert!((results[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fuzzy_ties_broken_by_name() {
        let catalog = Catalog::from_items(vec![
            ContentItem::new(0, "Zeta Pad").with_creator("Acme"),
            ContentItem::new(1, "Alpha Pad").with_creator("Acme"),
        ])
        .unwrap();
        let generation = Generation::build(catalog, 1);
        let results = fuzzy_search(&generation, "acme", &generation.all_ids(), 0.3);
        assert_eq!(result_ids(&results), vec![1, 0]);
    }

    #[test]
    fn test_fuzzy_search_threshold_is_exclusive() {
        let catalog = Catalog::from_items(vec![ContentItem::new(0, "abcd")]).unwrap();
        let generation = Generation::build(catalog, 1);
        // 3 edits over 4 characters: similarity exactly 0.25
        assert!(fuzzy_search(&generation, "axxx", &generation.all_ids(), 0.25).is_empty());
        assert_eq!(
            fuzzy_search(&generation, "axxx", &generation.all_ids(), 0.2).len(),
            1
        );
    }
}
