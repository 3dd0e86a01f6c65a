//! Splitting a model completion into posts

use regex::Regex;
use std::sync::OnceLock;

/// Posts longer than this are dropped (Bluesky's post limit)
pub const MAX_POST_CHARS: usize = 300;

/// A completion yielding fewer posts is rejected
pub const MIN_THREAD_POSTS: usize = 3;

const PREAMBLES: [&str; 3] = ["Here's the thread:", "Here are the posts:", "Thread:"];

fn numbered_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\n\s*\d+/\d+\s*\n").expect("marker pattern is valid"))
}

fn strip_preambles(content: &str) -> &str {
    let mut rest = content.trim();
    for prefix in PREAMBLES {
        let matches = rest
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            rest = rest[prefix.len()..].trim();
        }
    }
    rest
}

fn clean_post(post: &str) -> Option<String> {
    let mut post = post.trim();
    if post.starts_with('"') && post.ends_with('"') {
        // A lone quote strips to nothing
        post = post
            .strip_prefix('"')
            .and_then(|p| p.strip_suffix('"'))
            .unwrap_or("");
    }
    if post.is_empty() || post.chars().count() > MAX_POST_CHARS {
        return None;
    }
    Some(post.to_string())
}

/// Split a completion into individual posts
///
/// Separators are tried in order: `---`, then a run of two blank lines, then
/// numbered markers on their own line (`1/5`). Posts are trimmed and
/// unquoted; empty and over-long posts are dropped, so the result may be
/// shorter than what the model wrote.
pub fn parse_thread(content: &str) -> Vec<String> {
    let content = strip_preambles(content);

    let parts: Vec<&str> = if content.contains("---") {
        content.split("---").collect()
    } else if content.contains("\n\n\n") {
        content.split("\n\n\n").collect()
    } else {
        numbered_marker().split(content).collect()
    };

    parts.into_iter().filter_map(clean_post).collect()
}
