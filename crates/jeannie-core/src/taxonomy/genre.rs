/// Genres the curated metadata rates items against.
///
/// Names are stored lowercase; catalog genre keys are compared after
/// [`normalize_label`].
pub const BUILTIN_GENRES: &[&str] = &[
    "ambient",
    "blues",
    "cinematic",
    "classical",
    "country",
    "edm",
    "folk",
    "funk",
    "hip-hop",
    "house",
    "jazz",
    "lo-fi",
    "metal",
    "orchestral",
    "pop",
    "r&b",
    "reggae",
    "rock",
    "soul",
    "techno",
    "trap",
    "world",
];

/// Descriptive character tags.
pub const BUILTIN_VIBES: &[&str] = &[
    "aggressive",
    "airy",
    "bright",
    "clean",
    "dark",
    "dreamy",
    "epic",
    "experimental",
    "gritty",
    "intimate",
    "lush",
    "organic",
    "punchy",
    "vintage",
    "warm",
    "wide",
];

/// Canonical form of a genre or vibe label: trimmed and lowercased.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
