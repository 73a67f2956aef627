//! Custom dialect path rewriting
//!
//! The configured match pattern is either a delimited regex literal
//! (`/pattern/flags`) or a plain string. Regex literals accept the flags
//! `g`, `i`, `m`, `s`, `u` and `y`; `g` replaces every match, otherwise only
//! the first. Plain strings replace their first occurrence.
//!
//! Substitutions use JavaScript replacement tokens: `$1`..`$99`, `$&`,
//! `` $` ``, `$'`, `$<name>` and `$$`.

use regex::{Captures, Regex, RegexBuilder};

use crate::error::ImageRequestError;

const REGEX_FLAGS: &str = "gimsuy";

/// One configured rewrite: match pattern plus substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pub match_pattern: String,
    pub substitution: String,
}

/// A rewrite rule ready to apply, built once per configuration
#[derive(Debug, Clone)]
pub struct CompiledRewrite {
    regex: Regex,
    template: Vec<Token>,
    global: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Group(usize),
    Named(String),
    Prefix,
    Suffix,
}

impl RewriteRule {
    pub fn new(match_pattern: impl Into<String>, substitution: impl Into<String>) -> Self {
        Self {
            match_pattern: match_pattern.into(),
            substitution: substitution.into(),
        }
    }

    /// Split a `/pattern/flags` literal into its parts
    pub fn regex_literal(&self) -> Option<(&str, &str)> {
        let body = self.match_pattern.strip_prefix('/')?;
        let end = body.rfind('/')?;
        let (pattern, flags) = (&body[..end], &body[end + 1..]);
        if flags.chars().all(|c| REGEX_FLAGS.contains(c)) {
            Some((pattern, flags))
        } else {
            None
        }
    }

    pub fn compile(&self) -> Result<CompiledRewrite, ImageRequestError> {
        let (pattern, flags) = match self.regex_literal() {
            Some((pattern, flags)) => (pattern.to_string(), flags),
            None => (regex::escape(&self.match_pattern), ""),
        };

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| {
                ImageRequestError::invalid_rewrite_pattern(format!(
                    "Rewrite pattern '{}' is not a valid regular expression: {}",
                    self.match_pattern, e
                ))
            })?;

        let template = parse_template(&self.substitution, &regex);

        Ok(CompiledRewrite {
            regex,
            template,
            global: flags.contains('g'),
        })
    }

    /// Compile and apply in one step
    pub fn apply(&self, path: &str) -> Result<String, ImageRequestError> {
        Ok(self.compile()?.apply(path))
    }
}

impl CompiledRewrite {
    /// Rewrite a request path
    pub fn apply(&self, path: &str) -> String {
        let limit = if self.global { 0 } else { 1 };
        let rewritten = self
            .regex
            .replacen(path, limit, |caps: &Captures| self.expand(caps, path))
            .into_owned();
        tracing::debug!(original = %path, rewritten = %rewritten, "Rewrote request path");
        rewritten
    }

    fn expand(&self, caps: &Captures, input: &str) -> String {
        let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
        let mut out = String::new();
        for token in &self.template {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Group(index) => out.push_str(caps.get(*index).map_or("", |m| m.as_str())),
                Token::Named(name) => out.push_str(caps.name(name).map_or("", |m| m.as_str())),
                Token::Prefix => out.push_str(&input[..start]),
                Token::Suffix => out.push_str(&input[end..]),
            }
        }
        out
    }
}

/// Split a substitution into literal text and capture references
///
/// Numbered references only bind to groups the pattern has; `$<name>` is
/// literal when the pattern has no named groups.
fn parse_template(substitution: &str, regex: &Regex) -> Vec<Token> {
    let groups = regex.captures_len() - 1;
    let has_named = regex.capture_names().flatten().next().is_some();

    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = substitution;

    while let Some(idx) = rest.find('$') {
        text.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];

        let (token, consumed) = match after.chars().next() {
            Some('$') => (Token::Text("$".to_string()), 1),
            Some('&') => (Token::Group(0), 1),
            Some('`') => (Token::Prefix, 1),
            Some('\'') => (Token::Suffix, 1),
            Some('<') if has_named => match after.find('>') {
                Some(close) => (Token::Named(after[1..close].to_string()), close + 1),
                None => (Token::Text("$".to_string()), 0),
            },
            Some(d) if d.is_ascii_digit() => match group_reference(after, groups) {
                Some((index, len)) => (Token::Group(index), len),
                None => (Token::Text("$".to_string()), 0),
            },
            _ => (Token::Text("$".to_string()), 0),
        };

        match token {
            Token::Text(literal) => text.push_str(&literal),
            token => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(token);
            }
        }
        rest = &after[consumed..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

/// Longest of `$nn` / `$n` naming an existing group, with its digit count
fn group_reference(after: &str, groups: usize) -> Option<(usize, usize)> {
    let digits: String = after.chars().take(2).take_while(char::is_ascii_digit).collect();
    if digits.len() == 2 {
        if let Ok(index) = digits.parse::<usize>() {
            if (1..=groups).contains(&index) {
                return Some((index, 2));
            }
        }
    }
    let index = digits.get(..1)?.parse::<usize>().ok()?;
    (1..=groups).contains(&index).then_some((index, 1))
}
