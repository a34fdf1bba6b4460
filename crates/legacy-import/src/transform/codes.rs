//! Legacy code mappings.
//!
//! The legacy schemas key languages and countries with two-letter codes; the
//! target system uses ISO 639-3 and ISO 3166-1 alpha-3. The tables map the
//! codes the legacy database actually uses, several of which are custom and
//! collide with different ISO alpha-2 assignments (`mt` is Mauritania, not
//! Malta; `se` is Swedish, not `sv`). Unknown codes are transformation
//! errors, never silently passed through.

use crate::error::{ImportError, Result};
use crate::source::LegacyRow;

/// Legacy two-letter language code -> ISO 639-3.
const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("ch", "zho"), // legacy code for Chinese, standard would be zh
    ("cs", "ces"),
    ("de", "deu"),
    ("el", "ell"),
    ("en", "eng"),
    ("es", "spa"),
    ("fa", "fas"),
    ("fr", "fra"),
    ("he", "heb"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("pt", "por"),
    ("ru", "rus"),
    ("se", "swe"), // legacy code for Swedish, standard would be sv
    ("si", "slv"), // legacy code for Slovenian, standard would be sl
    ("tr", "tur"),
    ("zh", "zho"),
];

/// Legacy two-letter country code -> ISO 3166-1 alpha-3.
///
/// The non-obvious entries are custom legacy codes: `is` Israel, `ia` Iran,
/// `mc` North Macedonia, `ml` Malta, `mt` Mauritania, `nt` Netherlands,
/// `sl` Slovakia, `sw` Switzerland. `pd` and `ww` are sentinel codes for
/// public-domain and worldwide records.
const COUNTRIES: &[(&str, &str)] = &[
    ("ab", "alb"),
    ("ag", "arg"),
    ("al", "aus"),
    ("at", "aut"),
    ("az", "aze"),
    ("be", "bel"),
    ("bg", "bgd"),
    ("bh", "bhr"),
    ("bl", "blr"),
    ("br", "bra"),
    ("bs", "bih"),
    ("bu", "bgr"),
    ("ca", "can"),
    ("ch", "chn"),
    ("co", "com"),
    ("cy", "cyp"),
    ("cz", "cze"),
    ("de", "deu"),
    ("dj", "dji"),
    ("dn", "dnk"),
    ("dz", "dza"),
    ("eg", "egy"),
    ("es", "esp"),
    ("et", "est"),
    ("fn", "fin"),
    ("fr", "fra"),
    ("ge", "geo"),
    ("gr", "grc"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("ia", "irn"),
    ("iq", "irq"),
    ("is", "isr"),
    ("ix", "ita"),
    ("jo", "jor"),
    ("jp", "jpn"),
    ("lb", "lbn"),
    ("ln", "ltu"),
    ("lt", "lva"),
    ("lx", "lux"),
    ("ly", "lby"),
    ("ma", "mar"),
    ("mc", "mkd"),
    ("md", "mda"),
    ("ml", "mlt"),
    ("mn", "mne"),
    ("mt", "mrt"),
    ("nt", "nld"),
    ("on", "omn"),
    ("pa", "pse"),
    ("pd", "zzzpd"),
    ("pl", "pol"),
    ("pt", "prt"),
    ("px", "pse"),
    ("qt", "qat"),
    ("rm", "rou"),
    ("ro", "rou"),
    ("ru", "rus"),
    ("sa", "sau"),
    ("sb", "srb"),
    ("sd", "sdn"),
    ("sf", "zaf"),
    ("sl", "svk"),
    ("so", "som"),
    ("sw", "che"),
    ("sy", "syr"),
    ("tn", "tun"),
    ("tr", "tur"),
    ("uc", "ukr"),
    ("uk", "gbr"),
    ("va", "vat"),
    ("ww", "zzzww"),
    ("ym", "yem"),
];

fn lookup(table: &'static [(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    table
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map(|(_, iso)| *iso)
}

/// Map a legacy language code to ISO 639-3. Codes already in 639-3 form are
/// accepted as-is (lowercased).
pub fn language_id(row: &LegacyRow, field: &str, code: &str) -> Result<String> {
    if let Some(iso) = lookup(LANGUAGES, code) {
        return Ok(iso.to_string());
    }
    let code = code.trim().to_lowercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(code);
    }
    Err(ImportError::transformation(field, row.describe()))
}

/// Map a legacy country code to ISO 3166-1 alpha-3. Codes already in alpha-3
/// form are accepted as-is (lowercased).
pub fn country_id(row: &LegacyRow, field: &str, code: &str) -> Result<String> {
    if let Some(iso) = lookup(COUNTRIES, code) {
        return Ok(iso.to_string());
    }
    let code = code.trim().to_lowercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(code);
    }
    Err(ImportError::transformation(field, row.describe()))
}
