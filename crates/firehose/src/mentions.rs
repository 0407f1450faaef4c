//! Inline mention resolution for comment text.

use regex::Regex;

use crate::directory::UserDirectory;

/// Rewrites `@username` tokens in comment text into chat mentions.
///
/// Replacement is span-exact: only the matched `@username` token is rewritten,
/// never other occurrences of the name elsewhere in the text. Unresolvable
/// tokens are left untouched, so resolution is idempotent.
#[derive(Debug)]
pub struct MentionResolver {
    pattern: Regex,
}

impl MentionResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"@([\w-]+)").expect("mention pattern is valid"),
        }
    }

    /// Replace resolvable `@username` tokens with chat mentions.
    #[must_use]
    pub fn resolve(&self, directory: &UserDirectory, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(text) {
            let token = caps.get(0).expect("match has a full capture");
            let username = &caps[1];

            out.push_str(&text[last..token.start()]);
            match directory.mention(username) {
                Some(mention) => out.push_str(&mention),
                None => out.push_str(token.as_str()),
            }
            last = token.end();
        }

        out.push_str(&text[last..]);
        out
    }
}

impl Default for MentionResolver {
    fn default() -> Self {
        Self::new()
    }
}
