/// System message sent to chat-style providers
pub const SYSTEM_PROMPT: &str = "You write threads for Bluesky. Its readers value authentic, \
thoughtful and substantive posts. Write threads that start real conversations and give \
readers something useful.";

/// Prompt asking for a 5-7 post thread separated by `---`
pub fn thread_prompt(topic: &str) -> String {
    format!(
        r#"Write an engaging Bluesky thread about: "{topic}"

Structure (5-7 posts):
- Post 1 hooks the reader with a question, a bold claim or the start of a story
- The middle posts carry the substance: insights, tips, concrete examples
- The last post concludes and asks readers a question

Every post:
- 200-280 characters (hard limit is 300)
- Opens strongly, without filler words
- Reads conversationally and makes sense on its own
- Uses specifics and numbers over vague claims
- No hashtags; at most one or two emojis, only where natural

Number the posts (1/6, 2/6, ...) and separate them with a line containing only "---".

Example:
First post text (1/5)
---
Second post text (2/5)
---
...

Write the thread now:"#
    )
}
