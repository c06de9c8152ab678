//! Word banks and templates for procedural text.

/// Slot markers used by [`SENTENCE_STRUCTURES`].
pub const ADJ_SLOT: &str = "{adj}";
pub const NOUN_SLOT: &str = "{noun}";
pub const VERB_SLOT: &str = "{verb}";

/// Slot marker used by title templates.
pub const TITLE_SLOT: &str = "{}";

/// Theme used when nothing more specific applies.
pub const GENERIC_THEME: &str = "generic";

pub static ADJECTIVES: &[&str] = &[
    "innovative", "comprehensive", "revolutionary", "essential", "advanced",
    "strategic", "dynamic", "scalable", "robust", "seamless",
    "emerging", "proven", "holistic", "granular", "adaptive",
    "unprecedented", "critical", "optimized", "integrated", "next-generation",
];

pub static NOUNS: &[&str] = &[
    "framework", "methodology", "ecosystem", "paradigm", "strategy",
    "platform", "workflow", "benchmark", "architecture", "pipeline",
    "insight", "approach", "landscape", "initiative", "dataset",
    "signal", "model", "community", "solution", "trend",
];

pub static VERBS: &[&str] = &[
    "transforms", "accelerates", "redefines", "enables", "streamlines",
    "amplifies", "reshapes", "unlocks", "drives", "elevates",
    "empowers", "disrupts", "leverages", "optimizes", "bridges",
];

pub static SENTENCE_STRUCTURES: &[&str] = &[
    "The {adj} {noun} {verb} how teams approach every stage of the process.",
    "Every {adj} {noun} {verb} the way results are measured and shared.",
    "Experts agree that a {adj} {noun} {verb} long-term outcomes.",
    "This {adj} {noun} {verb} existing practices in surprising ways.",
    "A truly {adj} {noun} {verb} both speed and quality at scale.",
    "In practice, the {adj} {noun} {verb} decisions made further downstream.",
    "Recent analysis shows the {adj} {noun} consistently {verb} expectations.",
    "Nothing {verb} adoption like a {adj} {noun} backed by real data.",
];

pub static CONNECTORS: &[&str] = &[
    "Furthermore,", "Moreover,", "In addition,", "Consequently,", "Meanwhile,",
    "Notably,", "As a result,", "Similarly,", "In contrast,", "Ultimately,",
];

/// Title templates and curated keywords for one theme.
#[derive(Debug)]
pub struct Theme {
    pub name: &'static str,
    pub title_templates: &'static [&'static str],
    pub curated_keywords: &'static [&'static str],
}

static THEMES: &[Theme] = &[
    Theme {
        name: "viral",
        title_templates: &[
            "The {} Trend Everyone Is Talking About",
            "Why {} Is Taking Over Your Feed",
            "{} Challenge: The Complete Breakdown",
            "Top 10 {} Moments This Week",
        ],
        curated_keywords: &["viral", "trending", "challenge", "dance", "music", "fyp", "reels"],
    },
    Theme {
        name: "technical",
        title_templates: &[
            "A Practical Guide to {}",
            "Understanding {}: A Deep Dive",
            "{} Explained With Worked Examples",
            "Building Production Systems With {}",
        ],
        curated_keywords: &[
            "dataset", "training data", "machine learning", "neural network",
            "fine-tuning", "model weights", "benchmark",
        ],
    },
    Theme {
        name: "news",
        title_templates: &[
            "Breaking: New Developments in {}",
            "Exclusive Report on {}",
            "{}: What We Know So Far",
            "Analysis: The Hidden Story Behind {}",
        ],
        curated_keywords: &["breaking", "exclusive", "report", "investigation", "headlines"],
    },
    Theme {
        name: "shopping",
        title_templates: &[
            "Best {} Deals of the Season",
            "{} Price Comparison and Buying Guide",
            "Limited Offer: Save Big on {}",
        ],
        curated_keywords: &["discount", "sale", "price", "deal", "coupon", "offer"],
    },
    Theme {
        name: "academic",
        title_templates: &[
            "A Systematic Study of {}",
            "{}: Methods, Data and Findings",
            "Revisiting {} With Longitudinal Evidence",
        ],
        curated_keywords: &["research", "study", "findings", "methodology", "peer review"],
    },
    Theme {
        name: GENERIC_THEME,
        title_templates: &[
            "Everything You Need to Know About {}",
            "The Ultimate Guide to {}",
            "{} in Depth",
        ],
        curated_keywords: &["guide", "overview", "resources", "insights"],
    },
];

/// Look up a theme, falling back to the generic theme for unknown names.
pub fn theme(name: &str) -> &'static Theme {
    THEMES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or_else(generic_theme)
}

fn generic_theme() -> &'static Theme {
    // THEMES always ends with the generic entry.
    &THEMES[THEMES.len() - 1]
}

/// Whether `name` has its own templates.
pub fn is_known_theme(name: &str) -> bool {
    THEMES.iter().any(|t| t.name.eq_ignore_ascii_case(name))
}

/// Title-case each whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
