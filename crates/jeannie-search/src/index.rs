//! Derived lookup structures over one catalog snapshot.
//!
//! [`Indices::build`] makes a single pass over the catalog and never looks
//! at a previous generation, so every index always describes exactly the
//! catalog it was built from.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use jeannie_core::{Catalog, ItemId, PlayingMode};

/// Attribute value to the ids of items carrying it, in catalog order.
pub type AttributeIndex<K> = BTreeMap<K, Vec<ItemId>>;

/// Genre to per-item suitability score. Only scores above zero are kept.
pub type GenreIndex = BTreeMap<String, HashMap<ItemId, u8>>;

/// Every derived index of one catalog generation.
#[derive(Debug, Default)]
pub struct Indices {
    /// Name token to the items whose `name_tokens` contain it.
    pub tokens: HashMap<String, BTreeSet<ItemId>>,
    pub content_types: AttributeIndex<String>,
    pub creators: AttributeIndex<String>,
    pub categories: AttributeIndex<String>,
    pub vibes: AttributeIndex<String>,
    pub playing_modes: AttributeIndex<PlayingMode>,
    pub genres: GenreIndex,
    /// Items that declare any strum or pattern behavior.
    pub strum: Vec<ItemId>,
    positions: HashMap<ItemId, usize>,
}

impl Indices {
    /// Build all indices from `catalog` in one traversal.
    #[must_use]
    pub fn build(catalog: &Catalog) -> Self {
        let mut indices = Self {
            positions: HashMap::with_capacity(catalog.len()),
            ..Self::default()
        };

        for (position, item) in catalog.items().enumerate() {
            let id = item.id;
            indices.positions.insert(id, position);

            for token in &item.name_tokens {
                indices.tokens.entry(token.clone()).or_default().insert(id);
            }

            add_to_bucket(&mut indices.content_types, item.content_type.as_ref(), id);
            add_to_bucket(&mut indices.creators, item.creator.as_ref(), id);
            add_to_bucket(&mut indices.categories, item.category.as_ref(), id);

            for vibe in &item.vibe {
                add_to_bucket(&mut indices.vibes, Some(vibe), id);
            }

            if let Some(modes) = &item.playing_modes {
                for mode in &modes.available {
                    add_to_bucket(&mut indices.playing_modes, Some(mode), id);
                }
            }

            for (genre, &score) in &item.genres {
                if score > 0 {
                    indices
                        .genres
                        .entry(genre.clone())
                        .or_default()
                        .insert(id, score);
                }
            }

            if item.has_strum_behavior() {
                indices.strum.push(id);
            }
        }

        log::debug!(
            "Built indices for {} items: {} tokens, {} content types, {} creators, \
             {} categories, {} genres, {} vibes, {} playing modes, {} with strum behavior",
            catalog.len(),
            indices.tokens.len(),
            indices.content_types.len(),
            indices.creators.len(),
            indices.categories.len(),
            indices.genres.len(),
            indices.vibes.len(),
            indices.playing_modes.len(),
            indices.strum.len()
        );

        indices
    }

    /// Position of `id` in the catalog item sequence.
    #[must_use]
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Ids of items whose name contains `token` (already normalized).
    #[must_use]
    pub fn items_with_token(&self, token: &str) -> Option<&BTreeSet<ItemId>> {
        self.tokens.get(token)
    }

    /// Items rated at least `min_score` for `genre`.
    #[must_use]
    pub fn genre_matches(&self, genre: &str, min_score: u8) -> BTreeSet<ItemId> {
        self.genres
            .get(genre)
            .map(|scores| {
                scores
                    .iter()
                    .filter(|(_, &score)| score >= min_score)
                    .map(|(&id, _)| id)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn genre_score(&self, genre: &str, id: ItemId) -> Option<u8> {
        self.genres.get(genre).and_then(|scores| scores.get(&id)).copied()
    }
}

/// Append `id` under `key`, skipping a repeat of the same item.
fn add_to_bucket<K: Ord + Clone>(index: &mut AttributeIndex<K>, key: Option<&K>, id: ItemId) {
    let Some(key) = key else {
        return;
    };
    let bucket = index.entry(key.clone()).or_default();
    if bucket.last() != Some(&id) {
        bucket.push(id);
    }
}

/// Sorted keys of an attribute index.
pub fn keys<K: Ord + Clone>(index: &AttributeIndex<K>) -> Vec<K> {
    index.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jeannie_core::model::{PlayingModes, StrumBehavior};
    use jeannie_core::ContentItem;

    fn ids(raw: &[u64]) -> BTreeSet<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_items(vec![
            ContentItem::new(0, "Misfit Banjo")
                .with_content_type("Preset")
                .with_creator("8DIO")
                .with_genre("country", 90)
                .with_genre("rock", 0)
                .with_vibe("organic")
                .with_vibe("organic")
                .with_strum_behavior(StrumBehavior {
                    kind: "auto-strum".into(),
                    description: "Strums held chords".into(),
                }),
            ContentItem::new(1, "RealiBanjo")
                .with_content_type("Preset")
                .with_creator("Realitone")
                .with_genre("country", 70)
                .with_playing_modes(PlayingModes {
                    available: vec![PlayingMode::Poly, PlayingMode::Mono],
                    default: Some(PlayingMode::Poly),
                    switch_method: None,
                    switch_trigger: None,
                }),
            ContentItem::new(2, "Spitfire Strings")
                .with_content_type("Device")
                .with_creator("Spitfire Audio"),
        ])
        .unwrap()
    }

    #[test]
    fn test_token_index_exact_membership() {
        let indices = Indices::build(&sample_catalog());
        assert_eq!(indices.items_with_token("banjo"), Some(&ids(&[0])));
        assert_eq!(indices.items_with_token("misfit"), Some(&ids(&[0])));
        assert_eq!(indices.items_with_token("reali"), None);
        assert_eq!(indices.items_with_token("realibanjo"), Some(&ids(&[1])));
        assert_eq!(indices.items_with_token("strings"), Some(&ids(&[2])));
    }

    #[test]
    fn test_attribute_indices() {
        let indices = Indices::build(&sample_catalog());
        assert_eq!(
            indices.content_types.get("Preset"),
            Some(&vec![ItemId::new(0), ItemId::new(1)])
        );
        assert_eq!(keys(&indices.creators), vec!["8DIO", "Realitone", "Spitfire Audio"]);
        assert!(indices.categories.is_empty());
    }

    #[test]
    fn test_repeated_vibe_indexed_once() {
        let indices = Indices::build(&sample_catalog());
        assert_eq!(indices.vibes.get("organic"), Some(&vec![ItemId::new(0)]));
    }

    #[test]
    fn test_item_in_multiple_playing_mode_buckets() {
        let indices = Indices::build(&sample_catalog());
        assert_eq!(
            keys(&indices.playing_modes),
            vec![PlayingMode::Mono, PlayingMode::Poly]
        );
        assert_eq!(indices.playing_modes[&PlayingMode::Mono], vec![ItemId::new(1)]);
    }

    #[test]
    fn test_genre_index_skips_zero_scores() {
        let indices = Indices::build(&sample_catalog());
        assert!(!indices.genres.contains_key("rock"));
        assert_eq!(indices.genre_score("country", ItemId::new(0)), Some(90));
        assert_eq!(indices.genre_score("country", ItemId::new(2)), None);
    }

    #[test]
    fn test_genre_matches_threshold_inclusive() {
        let indices = Indices::build(&sample_catalog());
        assert_eq!(indices.genre_matches("country", 70), ids(&[0, 1]));
        assert_eq!(indices.genre_matches("country", 71), ids(&[0]));
        assert!(indices.genre_matches("techno", 0).is_empty());
    }

    #[test]
    fn test_strum_index_and_positions() {
        let indices = Indices::build(&sample_catalog());
        assert_eq!(indices.strum, vec![ItemId::new(0)]);
        assert_eq!(indices.position(ItemId::new(2)), Some(2));
        assert_eq!(indices.position(ItemId::new(9)), None);
    }

    #[test]
    fn test_item_without_enrichment_still_positioned() {
        let catalog = Catalog::from_json(r#"{"content": [{"id": 4}]}"#).unwrap();
        let indices = Indices::build(&catalog);
        assert_eq!(indices.position(ItemId::new(4)), Some(0));
        assert!(indices.tokens.is_empty());
        assert!(indices.content_types.is_empty());
    }
}
