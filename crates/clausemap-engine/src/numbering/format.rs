//! Rendering of a single counter value in a level's number format.

use crate::models::NumberFormat;

/// Largest counter a level may reach before it is treated as malformed.
pub const MAX_COUNTER: u32 = 99_999;

/// Longest run of repeated letters a letter format renders.
const MAX_LETTER_REPEAT: u32 = 32;

/// Whether `value` renders to a bounded label in `format`.
pub fn renderable(value: u32, format: NumberFormat) -> bool {
    match format {
        NumberFormat::LowerLetter | NumberFormat::UpperLetter => value <= 26 * MAX_LETTER_REPEAT,
        _ => value <= MAX_COUNTER,
    }
}

pub fn render(value: u32, format: NumberFormat) -> String {
    match format {
        NumberFormat::Decimal | NumberFormat::Other => value.to_string(),
        NumberFormat::DecimalZero => format!("{value:02}"),
        NumberFormat::LowerLetter => letters(value),
        NumberFormat::UpperLetter => letters(value).to_uppercase(),
        NumberFormat::LowerRoman => roman(value).unwrap_or_else(|| value.to_string()),
        NumberFormat::UpperRoman => roman(value)
            .map(|r| r.to_uppercase())
            .unwrap_or_else(|| value.to_string()),
        NumberFormat::Ordinal => ordinal_suffix(value),
        NumberFormat::CardinalText => cardinal_text(value).unwrap_or_else(|| value.to_string()),
        NumberFormat::OrdinalText => ordinal_text(value).unwrap_or_else(|| value.to_string()),
        NumberFormat::Bullet | NumberFormat::None => String::new(),
    }
}

/// `a`..`z`, then `aa`..`zz`, `aaa`.. as Word does.
fn letters(value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let index = (value - 1) % 26;
    let repeat = (value - 1) / 26 + 1;
    if repeat > MAX_LETTER_REPEAT {
        return value.to_string();
    }
    let letter = char::from(b'a' + index as u8);
    std::iter::repeat_n(letter, repeat as usize).collect()
}

fn roman(value: u32) -> Option<String> {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    if !(1..=3999).contains(&value) {
        return None;
    }
    let mut rest = value;
    let mut out = String::new();
    for (n, symbol) in TABLE {
        while rest >= n {
            out.push_str(symbol);
            rest -= n;
        }
    }
    Some(out)
}

fn ordinal_suffix(value: u32) -> String {
    let suffix = match (value % 10, value % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{value}{suffix}")
}

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn cardinal_text(value: u32) -> Option<String> {
    match value {
        0..=19 => Some(ONES[value as usize].to_string()),
        20..=99 => {
            let tens = TENS[(value / 10) as usize];
            Some(match value % 10 {
                0 => tens.to_string(),
                ones => format!("{tens}-{}", ONES[ones as usize].to_lowercase()),
            })
        }
        _ => None,
    }
}

fn ordinal_text(value: u32) -> Option<String> {
    const IRREGULAR: [(&str, &str); 6] = [
        ("One", "First"),
        ("Two", "Second"),
        ("Three", "Third"),
        ("Five", "Fifth"),
        ("Eight", "Eighth"),
        ("Twelve", "Twelfth"),
    ];
    if value == 0 {
        return None;
    }
    let cardinal = cardinal_text(value)?;
    let (head, last) = match cardinal.rsplit_once('-') {
        Some((head, last)) => (format!("{head}-"), last.to_string()),
        None => (String::new(), cardinal),
    };
    let capitalized = head.is_empty();
    let word = if capitalized { last.clone() } else { capitalize(&last) };
    let ordinal = IRREGULAR
        .iter()
        .find(|(c, _)| *c == word)
        .map(|(_, o)| o.to_string())
        .unwrap_or_else(|| match word.strip_suffix('y') {
            Some(stem) => format!("{stem}ieth"),
            None => format!("{word}th"),
        });
    let ordinal = if capitalized { ordinal } else { ordinal.to_lowercase() };
    Some(format!("{head}{ordinal}"))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
