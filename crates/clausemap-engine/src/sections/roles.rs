use std::sync::OnceLock;

use regex::Regex;

use crate::models::SectionRole;

/// Checked in order; the first match wins.
const ROLE_PATTERNS: [(SectionRole, &str); 6] = [
    (
        SectionRole::Definitions,
        r"^(definitions?|interpretation|defined terms)\b",
    ),
    (
        SectionRole::Signatures,
        r"^(signatures?|signed|signatories|execution( page)?|executed( as a deed)?|in witness whereof)\b",
    ),
    (SectionRole::Parties, r"^((the )?parties|between)\b"),
    (
        SectionRole::AgreementDate,
        r"^(effective date|commencement( date)?|agreement date|date of (this )?agreement|dated?)\b",
    ),
    (
        SectionRole::OrderDetails,
        r"^(order (form|details|summary)|key (commercial )?(details|terms)|commercial terms|particulars|details of (the )?order)\b",
    ),
    (
        SectionRole::FrontMatter,
        r"^(recitals?|background|preamble|whereas|introduction)\b",
    ),
];

fn role_regexes() -> &'static [(SectionRole, Regex)] {
    static ROLES: OnceLock<Vec<(SectionRole, Regex)>> = OnceLock::new();
    ROLES.get_or_init(|| {
        ROLE_PATTERNS
            .iter()
            .map(|(role, pattern)| (*role, Regex::new(pattern).expect("Invalid role regex")))
            .collect()
    })
}

fn leading_ordinal_regex() -> &'static Regex {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    ORDINAL.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:(?:article|clause|section|part)\s+)?(?:[0-9]+(?:\.[0-9]+)*[.:]?|\(?[a-z]{1,4}\)|[ivxlc]+\.)\s+",
        )
        .expect("Invalid ordinal regex")
    })
}

/// Lowercased title without its leading ordinal or punctuation, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let stripped = leading_ordinal_regex().replace(title, "");
    let cleaned: String = stripped
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn infer_role(title: &str) -> Option<SectionRole> {
    let normalized = normalize_title(title);
    role_regexes()
        .iter()
        .find(|(_, regex)| regex.is_match(&normalized))
        .map(|(role, _)| *role)
}
