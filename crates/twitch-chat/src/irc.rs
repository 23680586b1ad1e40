//! IRCv3 line parsing.
//!
//! Twitch chat is IRC with message tags. One line is
//! `[@tags] [:prefix] COMMAND [params] [:trailing]`; tag values escape
//! spaces, semicolons and CRLF per the IRCv3 message-tags spec.

use rustc_hash::FxHashMap;

/// One parsed IRC line.
#[derive(Debug, Clone, Default)]
pub struct IrcMessage {
    pub tags: FxHashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl IrcMessage {
    /// Parse one line. Returns `None` for lines without a command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut message = Self::default();
        let mut remaining = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = remaining.strip_prefix('@') {
            let (tag_str, after) = rest.split_once(' ')?;
            for tag in tag_str.split(';') {
                match tag.split_once('=') {
                    Some((key, value)) => {
                        message
                            .tags
                            .insert(key.to_string(), unescape_tag_value(value));
                    }
                    None => {
                        message.tags.insert(tag.to_string(), String::new());
                    }
                }
            }
            remaining = after;
        }

        if let Some(rest) = remaining.strip_prefix(':') {
            let (prefix, after) = rest.split_once(' ')?;
            message.prefix = Some(prefix.to_string());
            remaining = after;
        }

        let (middle, trailing) = match remaining.split_once(" :") {
            Some((middle, trailing)) => (middle, Some(trailing.to_string())),
            None => (remaining, None),
        };
        message.trailing = trailing;

        let mut parts = middle.split_ascii_whitespace();
        message.command = parts.next()?.to_string();
        message.params = parts.map(str::to_string).collect();

        Some(message)
    }

    /// Look up a tag value.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Nickname portion of the prefix (`nick!user@host`).
    pub fn sender_nick(&self) -> Option<&str> {
        self.prefix.as_deref().map(|p| match p.split_once('!') {
            Some((nick, _)) => nick,
            None => p,
        })
    }

    /// First parameter with any leading `#` stripped, the channel for
    /// PRIVMSG/USERNOTICE.
    pub fn channel(&self) -> Option<&str> {
        self.params
            .first()
            .map(|p| p.strip_prefix('#').unwrap_or(p))
    }
}

/// Undo IRCv3 tag value escaping.
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
