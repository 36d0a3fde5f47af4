//! Amount-to-words: English cardinal phrasing for the "in words" field.
//!
//! ## Phrasing rules
//!
//! Legal receipts repeat the amount in words, so the phrasing must be stable
//! for a given amount. The rules follow the common English convention:
//!
//! - tens and units are hyphenated: `forty-five`
//! - a remainder below one hundred after a hundreds/thousands group is joined
//!   with `and`: `one hundred and one`, `two thousand and ten`
//! - larger groups are separated by a comma: `one thousand, two hundred`
//! - a fractional part is spoken as `point` followed by one word per digit of
//!   the shortest decimal representation: `12.05` → `twelve point zero five`
//!
//! [`amount_to_words`] title-cases the result (every run of letters starts
//! upper-case), so `forty-five` becomes `Forty-Five` and `and` becomes `And`.

const LOW: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Group names from 10^3 upwards, one per power of a thousand.
const SCALES: [&str; 11] = [
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
    "sextillion",
    "septillion",
    "octillion",
    "nonillion",
    "decillion",
];

/// Exclusive upper bound for [`cardinal_words`] and [`amount_to_words`]: 10^36.
///
/// The scale table ends at decillion, so the largest nameable amount is just
/// under one thousand decillion. Larger amounts are rejected as
/// [`crate::RowError::AmountTooLarge`] instead of being spelled with scale
/// words beyond decillion (undecillion up to centillion).
pub const MAX_WORDABLE: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;

/// Lower-case cardinal words for a whole number below [`MAX_WORDABLE`].
///
/// Returns `None` when the number is too large to name.
pub fn cardinal_words(n: u128) -> Option<String> {
    if n >= MAX_WORDABLE {
        return None;
    }
    Some(cardinal(n).0)
}

/// Title-cased words for a non-negative, finite amount.
///
/// Returns `None` for negative, non-finite or too-large values; callers are
/// expected to have rejected those already.
///
/// ```
/// use hand_receipts::pipeline::words::amount_to_words;
///
/// assert_eq!(amount_to_words(0.0).as_deref(), Some("Zero"));
/// assert_eq!(amount_to_words(100.0).as_deref(), Some("One Hundred"));
/// assert_eq!(
///     amount_to_words(12345.5).as_deref(),
///     Some("Twelve Thousand, Three Hundred And Forty-Five Point Five"),
/// );
/// ```
pub fn amount_to_words(amount: f64) -> Option<String> {
    if !amount.is_finite() || amount < 0.0 || amount >= MAX_WORDABLE as f64 {
        return None;
    }

    let whole = amount.trunc();
    let mut words = cardinal_words(whole as u128)?;

    if amount != whole {
        let digits = fraction_digits(amount, whole);
        words.push_str(" point");
        for d in digits.chars().filter_map(|c| c.to_digit(10)) {
            words.push(' ');
            words.push_str(LOW[d as usize]);
        }
    }

    Some(title_case(&words))
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Words for `n` paired with the value they denote, the unit the joining
/// rules in [`join`] operate on.
fn cardinal(n: u128) -> (String, u128) {
    if n < 20 {
        return (LOW[n as usize].to_string(), n);
    }
    if n < 100 {
        let tens = (TENS[(n / 10) as usize].to_string(), n / 10 * 10);
        return match n % 10 {
            0 => tens,
            units => join(tens, cardinal(units)),
        };
    }

    let (scale, name) = largest_scale(n);
    let (head, _) = cardinal(n / scale);
    let left = (format!("{head} {name}"), n / scale * scale);

    match n % scale {
        0 => left,
        rest => join(left, cardinal(rest)),
    }
}

/// Largest named group (hundred, thousand, million …) not exceeding `n >= 100`.
fn largest_scale(n: u128) -> (u128, &'static str) {
    let mut best = (100, "hundred");
    let mut value: u128 = 1_000;
    for name in SCALES {
        if value > n {
            break;
        }
        best = (value, name);
        value = match value.checked_mul(1_000) {
            Some(v) => v,
            None => break,
        };
    }
    best
}

fn join(left: (String, u128), right: (String, u128)) -> (String, u128) {
    let (ltext, lnum) = left;
    let (rtext, rnum) = right;
    let text = if lnum < 100 {
        format!("{ltext}-{rtext}")
    } else if rnum < 100 {
        format!("{ltext} and {rtext}")
    } else {
        format!("{ltext}, {rtext}")
    };
    (text, lnum + rnum)
}

/// Decimal digits after the point, as many as the shortest round-trip
/// representation of `amount` shows.
fn fraction_digits(amount: f64, whole: f64) -> String {
    let repr = amount.to_string();
    let precision = repr.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0);
    if precision == 0 {
        return String::new();
    }

    // Scale the fractional part up; values within 0.01 of an integer are
    // float noise (1.239999… means 1.24) and round, everything else floors.
    let scaled = (amount - whole) * 10f64.powi(precision as i32);
    let digits = if (scaled.round() - scaled).abs() < 0.01 {
        scaled.round()
    } else {
        scaled.floor()
    } as u128;

    let mut s = format!("{digits:0>precision$}");
    s.truncate(precision);
    s
}
