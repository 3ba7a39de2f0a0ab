//! Text heuristics over message content.

use once_cell::sync::Lazy;
use regex::Regex;
use throttler_common::UserId;

static LEADING_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<@!?(\d+)>").expect("Invalid user mention regex pattern"));

const LINK_MARKER: &str = "http";

/// Whether the content may produce a link preview later.
pub fn looks_like_link(content: &str) -> bool {
    content.contains(LINK_MARKER)
}

/// Number of link-like substrings, used to size the re-fetch delay.
pub fn link_hint_count(content: &str) -> usize {
    content.matches(LINK_MARKER).count()
}

/// User mentioned at the very start of the content, in `<@id>` or `<@!id>` form.
pub fn leading_user_mention(content: &str) -> Option<UserId> {
    LEADING_MENTION
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
        .map(UserId)
}
