//! Company deduplication
//!
//! Three pure building blocks used by the merge workflow:
//! - [`normalize`] canonicalizes a company name for equality comparison
//! - [`find_matches`] selects the records whose canonical name equals a query
//! - [`merge_companies`] combines two records field by field
//!
//! None of these touch storage.

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::db::{Company, CompanyFields};

/// Characters folded to a word break before token substitution
const SEPARATORS: &[char] = &['-', '\'', '\u{2019}', '.', ',', '_', '/'];

/// Whole-token substitutions, applied in order over the output of the
/// previous rule.
///
/// Order is significant: `lgt` expands to `lycee gt`, which the later `gt`
/// rule expands again. No replacement contains a token that appears on a
/// left-hand side, which keeps [`normalize`] idempotent.
pub const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("lgt", "lycee gt"),
    ("lp", "lycee professionnel"),
    ("gt", "general et technologique"),
    ("nd", "notre dame"),
    ("st", "saint"),
    ("ste", "sainte"),
    ("cie", "compagnie"),
    ("societe", "entreprise"),
];

/// Canonicalize a company name
///
/// Trims and lower-cases, strips diacritics (NFD then drop combining marks),
/// folds punctuation separators to single spaces, then applies
/// [`SUBSTITUTIONS`]. Total: any input, including empty, yields a string.
///
/// ```
/// use stagedirect_common::normalize;
///
/// assert_eq!(normalize(" Lycée ND "), "lycee notre dame");
/// assert_eq!(normalize("LGT Saint-Exupéry"), "lycee general et technologique saint exupery");
/// ```
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let mut tokens: Vec<String> = stripped
        .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    for (from, to) in SUBSTITUTIONS {
        if tokens.iter().any(|token| token == from) {
            tokens = tokens
                .into_iter()
                .flat_map(|token| {
                    if token == *from {
                        to.split(' ').map(str::to_string).collect()
                    } else {
                        vec![token]
                    }
                })
                .collect();
        }
    }

    tokens.join(" ")
}

/// Select the records whose normalized name equals the normalized query
///
/// Matching is equality after canonicalization, not similarity scoring. The
/// result is ordered by raw name, then id. An empty query only matches names
/// that normalize to the empty string.
pub fn find_matches(all: Vec<Company>, query: &str) -> Vec<Company> {
    let wanted = normalize(query);

    let mut matches: Vec<Company> = all
        .into_iter()
        .filter(|company| normalize(&company.fields.name) == wanted)
        .collect();

    matches.sort_by(|a, b| {
        a.fields
            .name
            .cmp(&b.fields.name)
            .then_with(|| a.id.cmp(&b.id))
    });

    matches
}

/// How the `validated` flag is resolved when two companies are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatedPolicy {
    /// Merged record is validated when either source was
    #[default]
    Either,
    /// Primary's flag wins, like every other field
    PrimaryWins,
}

impl std::fmt::Display for ValidatedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidatedPolicy::Either => write!(f, "either"),
            ValidatedPolicy::PrimaryWins => write!(f, "primary_wins"),
        }
    }
}

/// Combine two companies into the field set of the surviving record
///
/// Each field takes the primary's value when it is present and not blank,
/// otherwise the secondary's. `validated` follows `policy`.
pub fn merge_companies(
    primary: &Company,
    secondary: &Company,
    policy: ValidatedPolicy,
) -> CompanyFields {
    let p = &primary.fields;
    let s = &secondary.fields;

    CompanyFields {
        name: prefer_required(&p.name, &s.name),
        street: prefer_text(&p.street, &s.street),
        postal_code: prefer_text(&p.postal_code, &s.postal_code),
        city: prefer_required(&p.city, &s.city),
        country: prefer_required(&p.country, &s.country),
        department: prefer_text(&p.department, &s.department),
        phone: prefer_text(&p.phone, &s.phone),
        fax: prefer_text(&p.fax, &s.fax),
        email: prefer_text(&p.email, &s.email),
        size: prefer_text(&p.size, &s.size),
        sector_id: if p.sector_id > 0 { p.sector_id } else { s.sector_id },
        contact_id: p.contact_id.or(s.contact_id),
        validated: match policy {
            ValidatedPolicy::Either => p.validated || s.validated,
            ValidatedPolicy::PrimaryWins => p.validated,
        },
    }
}

fn prefer_text(primary: &Option<String>, secondary: &Option<String>) -> Option<String> {
    match primary {
        Some(value) if !value.trim().is_empty() => Some(value.clone()),
        _ => secondary.clone(),
    }
}

fn prefer_required(primary: &str, secondary: &str) -> String {
    if primary.trim().is_empty() {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}
