//! Detection of schedule-like attachment markers.
//!
//! A paragraph opens an attachment when its style is a marker style, or failing
//! that, when its text starts with a marker label. The first rule that matches
//! decides the attachment's type and label.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Attachment, AttachmentType};

/// Longest paragraph still considered a text marker.
const MAX_MARKER_CHARS: usize = 120;

fn style_regex() -> &'static Regex {
    static STYLE: OnceLock<Regex> = OnceLock::new();
    STYLE.get_or_init(|| {
        Regex::new(r"(?i)^(schedule|annex|exhibit|appendix)\b").expect("Invalid style regex")
    })
}

fn text_regex() -> &'static Regex {
    static TEXT: OnceLock<Regex> = OnceLock::new();
    TEXT.get_or_init(|| {
        Regex::new(r"(?is)^(schedule|annex|exhibit|appendix)\s+([0-9]+[a-z]?|[ivxlc]+|[a-z])\b(.*)$")
            .expect("Invalid marker regex")
    })
}

#[derive(Debug, Default)]
pub struct AttachmentDetector {
    ids: HashSet<String>,
}

impl AttachmentDetector {
    pub fn detect(&mut self, style_name: &str, text: &str, numbered: bool) -> Option<Attachment> {
        let text = text.trim();
        let (attachment_type, number, title) = match_style(style_name, text)
            .or_else(|| (!numbered).then(|| match_text(text)).flatten())?;

        let label = match &number {
            Some(number) => format!("{} {number}", attachment_type.display_name()),
            None if !text.is_empty() => first_line(text).to_string(),
            None => attachment_type.display_name().to_string(),
        };
        let slug_source = number.as_deref().unwrap_or(&label);
        let attachment_id = self.unique_id(format!("{}-{}", attachment_type.as_str(), slug(slug_source)));

        Some(Attachment {
            attachment_id,
            attachment_type,
            label,
            title,
        })
    }

    fn unique_id(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !self.ids.insert(candidate.clone()) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        candidate
    }
}

type MarkerMatch = (AttachmentType, Option<String>, Option<String>);

fn match_style(style_name: &str, text: &str) -> Option<MarkerMatch> {
    let keyword = style_regex().captures(style_name.trim())?;
    let attachment_type = AttachmentType::from_keyword(&keyword[1])?;
    match labelled(text) {
        Some((text_type, number, title)) if text_type == attachment_type => {
            Some((attachment_type, Some(number), title))
        }
        _ => Some((attachment_type, None, None)),
    }
}

fn match_text(text: &str) -> Option<MarkerMatch> {
    if text.chars().count() > MAX_MARKER_CHARS {
        return None;
    }
    let (attachment_type, number, title) = labelled(text)?;
    let rest = text_regex().captures(text)?.get(3)?.as_str().trim_start();
    let accepted = rest.is_empty()
        || rest.starts_with([':', '.', '-', '\u{2013}', '\u{2014}', '('])
        || rest.chars().next().is_some_and(char::is_uppercase)
        || is_all_caps(text);
    accepted.then_some((attachment_type, Some(number), title))
}

/// Splits `Schedule 2 - Pricing` into type, normalized number and title.
fn labelled(text: &str) -> Option<(AttachmentType, String, Option<String>)> {
    let captures = text_regex().captures(text)?;
    let attachment_type = AttachmentType::from_keyword(&captures[1])?;
    let number = captures[2].to_uppercase();
    let title = captures
        .get(3)
        .map(|m| {
            m.as_str()
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '.' | '-' | '\u{2013}' | '\u{2014}'))
                .trim()
        })
        .filter(|t| !t.is_empty())
        .map(|t| first_line(t).to_string());
    Some((attachment_type, number, title))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}

fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn slug(value: &str) -> String {
    let mut out = String::new();
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}
