//! Term sets consumed by the scanner.
//!
//! Lists are matched against normalized text (see `normalize_text`), so
//! entries are lowercase ASCII. Multi-word entries match as phrases.

/// Known-safe phrases that short-circuit the scan entirely. Gaming and
/// idiomatic uses of violent vocabulary dominate false positives.
pub const BENIGN_PHRASES: &[&str] = &[
    "killing it",
    "killed it",
    "kill it with fire",
    "kill the lights",
    "kill the music",
    "kill some time",
    "killer app",
    "dead tired",
    "dying of laughter",
    "you killed that solo",
];

/// Literal harassment terms. A bare hit is a soft violation: logged and
/// privately flagged, but no strike.
pub const HARASSMENT_TERMS: &[&str] = &[
    "idiot",
    "moron",
    "loser",
    "pathetic",
    "worthless",
    "nobody likes you",
];

/// Targeted harassment patterns, written against the normalizer's output
/// ("you're" arrives as "youre"). These are hard violations: a
/// second-person construction aimed at a person, not a stray insult.
pub const HARASSMENT_PATTERNS: &[&str] = &[
    r"\byou ?a?re (?:so |such an? |an? )?(?:idiot|moron|loser|pathetic|worthless|disgusting)\b",
    r"\bnobody (?:likes|wants|needs) you\b",
    r"\beveryone (?:hates|despises) you\b",
];

/// Verbs that signal violence when aimed at a person.
pub const VIOLENT_VERBS: &[&str] = &[
    "kill", "hurt", "stab", "shoot", "beat", "attack", "punch", "strangle", "destroy",
];

/// First-person intent phraseology, post-normalization ("i'll" arrives as
/// "ill"). Matched on word boundaries.
pub const FIRST_PERSON_INTENT: &[&str] = &[
    "i will",
    "i am going to",
    "im going to",
    "ill",
    "im gonna",
    "i am gonna",
];

/// Tokens that refer to a human target.
pub const HUMAN_TARGETS: &[&str] = &[
    "you", "him", "her", "them", "everyone", "everybody", "people", "yourself", "himself",
    "herself", "myself",
];

/// Real-world location context that moves a statement out of game space.
pub const REAL_WORLD_LOCATIONS: &[&str] = &[
    "school", "work", "house", "home", "street", "park", "mall", "church", "office",
    "neighborhood", "tomorrow", "tonight",
];

/// Explicit dangerous-action phrasing.
pub const DANGEROUS_ACTIONS: &[&str] = &[
    "burn down",
    "blow up",
    "bring a gun",
    "bring a knife",
    "set fire to",
    "plant a bomb",
];

/// Recreational/gaming vocabulary that discounts the intent score.
pub const GAMING_CONTEXT: &[&str] = &[
    "game", "match", "round", "respawn", "spawn", "lobby", "server", "raid", "boss", "loot",
    "rank", "ranked", "noob", "gg", "clutch", "headshot", "minecraft", "fortnite", "valorant",
];

/// Self-referential phrases for the self-harm window rule.
pub const SELF_REFERENTIAL: &[&str] = &["myself", "my own life", "my life", "end it all"];

/// Self-harm encouragement abbreviations caught by the sparse-token check,
/// independent of the intent score.
pub const SELF_HARM_ABBREVIATIONS: &[&str] = &["kys", "kms", "unalive"];
