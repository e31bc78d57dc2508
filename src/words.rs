//! Built-in word packs the secret word is drawn from.

use rand::seq::IndexedRandom;

pub const DEFAULT_WORD_PACK: &str = "TF2 Pack";

pub const WORD_PACKS: &[(&str, &[&str])] = &[
    (
        "TF2 Pack",
        &[
            "sandwich", "dispenser", "sentry", "medic", "intel", "payload", "rocket", "capture",
            "fortress", "mercenary", "teleporter", "spy", "sniper", "heavy", "scout", "engineer",
            "pyro", "demoman", "backstab", "critical", "headshot", "ubercharge", "respawn",
            "domination",
        ],
    ),
    (
        "General Objects",
        &[
            "computer", "telephone", "book", "chair", "table", "window", "door", "lamp", "clock",
            "mirror", "bottle", "cup", "plate", "fork", "spoon", "knife", "car", "bicycle",
        ],
    ),
    (
        "Animals",
        &[
            "dog", "cat", "bird", "fish", "elephant", "lion", "tiger", "bear", "wolf", "fox",
            "rabbit", "mouse", "horse", "cow", "pig", "sheep", "duck", "chicken",
        ],
    ),
    (
        "Food",
        &[
            "pizza", "hamburger", "pasta", "rice", "bread", "cheese", "apple", "banana", "orange",
            "grape", "strawberry", "tomato", "potato", "carrot", "lettuce", "chicken", "beef",
            "fish",
        ],
    ),
    (
        "Abstract Concepts",
        &[
            "love", "happiness", "freedom", "justice", "peace", "war", "time", "space", "dream",
            "reality", "truth", "lie", "beauty", "ugliness", "good", "evil", "light", "darkness",
        ],
    ),
];

/// Words of a pack, matched by exact name
pub fn pack(name: &str) -> Option<&'static [&'static str]> {
    WORD_PACKS
        .iter()
        .find(|(pack_name, _)| *pack_name == name)
        .map(|(_, words)| *words)
}

pub fn pack_names() -> Vec<&'static str> {
    WORD_PACKS.iter().map(|(name, _)| *name).collect()
}

/// Draw a word uniformly from the named pack
pub fn random_word(pack_name: &str) -> Option<&'static str> {
    pack(pack_name)?.choose(&mut rand::rng()).copied()
}
