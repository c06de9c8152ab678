//! Trap composition.
//!
//! A trap bundle is everything attached to a generated document that exists only
//! to prolong or multiply a crawl: hidden keyword blocks, meta and structured-data
//! entries, recursive links, a nested frame and (for targeted archetypes)
//! interactive widgets.

pub mod composer;
pub mod interactive;

pub use composer::{MetaEntry, NestedFrame, StructuredDataEntry, TrapBundle, TrapComposer};
pub use interactive::InteractiveWidgets;

/// Class carried by every hidden keyword block.
pub const HIDDEN_BLOCK_CLASS: &str = "tp-shadow";

/// Class carried by the nested frame element.
pub const NESTED_FRAME_CLASS: &str = "tp-frame";

/// Path segment shared by recursive links and nested frames.
pub const CONTENT_SEGMENT: &str = "/content/";

/// Number of recursive links per bundle.
pub const RECURSIVE_LINK_COUNT: usize = 5;

/// Reduce free text to a URL path segment.
pub fn slug(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("machine learning"), "machine_learning");
        assert_eq!(slug("video-platform"), "video-platform");
        assert_eq!(slug(" <GPU>'s "), "_gpu__s");
    }
}
