//! Extraction of `Dz.U.` citations from free text.
//!
//! Recognized spellings include `Dz.U. 2020 poz. 2146`, `Dz. U. z 2019 r.
//! poz. 631`, `Dz.U.2019.2393`, `Dz.U.2018.0.1799` and the legacy
//! `Dz.U. z 2004 r. Nr 54, poz. 535`. Only the first citation in the text
//! is extracted.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::types::ActReference;

/// The legacy number can appear in two places: `Nr 54,` before `poz.`, or
/// as the middle part of the dotted form `2018.0.1799`. The first non-zero
/// slot wins; a later zero never clears it.
///
/// Digits are ASCII only, since other scripts' digits do not parse as `u32`.
/// Whitespace stays Unicode-aware so non-breaking spaces pasted from the
/// gazette still separate the parts.
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Dz\.\s*U\.\s*z?\s*(?P<year>[0-9]{4})?\s*(?:r\.?)?\s*(?:Nr\s*(?P<nr>[0-9]{1,3}),?\s*)?(?:\s*[Pp]oz)?\.(?:(?P<nr_dotted>[0-9]{1,3})\.)?\s*(?P<pos>[0-9]{1,4})",
    )
    .expect("Invalid citation regex")
});

/// Capture slots holding the legacy number, in precedence order.
const NUMBER_SLOTS: [&str; 2] = ["nr", "nr_dotted"];

/// Parse the first citation found in `text`.
///
/// Never fails: text without a recognizable citation yields
/// `ActReference::default()`. A match without a position also counts as
/// "not found" (`position == 0`).
#[must_use]
pub fn parse_citation(text: &str) -> ActReference {
    let Some(caps) = CITATION.captures(text) else {
        return ActReference::default();
    };

    let number = NUMBER_SLOTS
        .iter()
        .map(|slot| capture_number(&caps, slot))
        .find(|n| *n != 0)
        .unwrap_or(0);

    ActReference {
        year: capture_number(&caps, "year"),
        number,
        position: capture_number(&caps, "pos"),
    }
}

fn capture_number(caps: &Captures<'_>, name: &str) -> u32 {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_and_position(text: &str) -> (u32, u32) {
        let reference = parse_citation(text);
        (reference.year, reference.position)
    }

    #[test]
    fn test_empty_and_unrelated_text() {
        assert_eq!(parse_citation(""), ActReference::default());
        assert_eq!(
            parse_citation("Rozporządzenie @MF_gov_PLN z dnia 31 grudnia 2019 r. w sprawie postępowania kwalifikacyjnego"),
            ActReference::default()
        );
        assert_eq!(
            parse_citation("Dziennik Ustaw nie zawiera dziś nic ciekawego"),
            ActReference::default()
        );
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(
            parse_citation("Dz.U. 2020 poz. 2146"),
            ActReference::new(2020, 0, 2146)
        );
    }

    #[test]
    fn test_inline_in_parentheses() {
        assert_eq!(
            year_and_position("@Grzegorz_64 @LBalcerowicz Art. 14. Wprowadzenie podatku nie może stanowić podstawy do zmiany warunków (Dz.U. 2016 poz. 68) 😉"),
            (2016, 68)
        );
    }

    #[test]
    fn test_dotted_forms() {
        assert_eq!(
            year_and_position("(art. 11 p. 4 - Dz.U.2020.1668 t.j.)."),
            (2020, 1668)
        );
        assert_eq!(
            year_and_position("@gucio_70 @ZiobroPL Źródło:  Dz.U.2019.2393    "),
            (2019, 2393)
        );
        assert_eq!(
            parse_citation("Dz.U.2018.0.1799 t.j. - Ustawa z dnia 9 maja 1996 r. o wykonywaniu mandatu posła i senatora"),
            ActReference::new(2018, 0, 1799)
        );
        assert_eq!(
            year_and_position("Dz.U.2020.0.360 t.j. - Ustawa z dnia 6 kwietnia 1990 r. o Policji"),
            (2020, 360)
        );
        assert_eq!(
            year_and_position("Dziennik Ustaw Dz.U.2019.1347 t.j. dla ułatwienia Dział II\n"),
            (2019, 1347)
        );
    }

    #[test]
    fn test_year_with_r_suffix() {
        assert_eq!(
            year_and_position("Źródło: Dz.U. z 2012 r.  poz. 318."),
            (2012, 318)
        );
        assert_eq!(
            year_and_position("Kodeks wykroczeń (Dz.U. z 2019 r. poz. 821,z późn. zm.2)”"),
            (2019, 821)
        );
        assert_eq!(
            year_and_position(" Prawo o zgromadzeniach (Dz. U. z 2019 r. poz. 631),z wyłączeniem zgromadzeń"),
            (2019, 631)
        );
    }

    #[test]
    fn test_non_ascii_digits_are_not_a_citation() {
        assert_eq!(parse_citation("Dz.U. ٢٠٢٠ poz. 5"), ActReference::default());
        assert_eq!(parse_citation("Dz.U. 2020 poz. ١٢"), ActReference::default());
        assert_eq!(parse_citation("Dz.U. ２０２０ poz. ５"), ActReference::default());
    }

    #[test]
    fn test_non_breaking_spaces() {
        assert_eq!(
            year_and_position("Dz.\u{a0}U. z\u{a0}2019\u{a0}r. poz.\u{a0}631"),
            (2019, 631)
        );
    }

    #[test]
    fn test_capitalized_poz() {
        assert_eq!(
            year_and_position("[1/2] Absurd z Dz.U. 2020 Poz. 2132"),
            (2020, 2132)
        );
    }

    #[test]
    fn test_only_first_citation_is_used() {
        assert_eq!(
            parse_citation("Dz.U. z 2012 r.  poz. 318. Dz.U. z 2012 r.  poz. 319."),
            ActReference::new(2012, 0, 318)
        );
    }

    #[test]
    fn test_legacy_number() {
        assert_eq!(
            parse_citation("ustawa (Dz.U. z 2004 r. Nr 54, poz. 535)"),
            ActReference::new(2004, 54, 535)
        );
    }

    #[test]
    fn test_first_non_zero_number_wins() {
        // `Nr 12` is captured first; the dotted slot is absent and must not clear it
        let reference = parse_citation("Dz.U. 1997 Nr 12 poz.5");
        assert_eq!(reference.number, 12);
        assert_eq!(reference.position, 5);

        // A zero in the dotted slot leaves the number unset
        assert_eq!(parse_citation("Dz.U.2018.0.1799").number, 0);
    }

    #[test]
    fn test_without_year() {
        assert_eq!(
            parse_citation("zob. Dz.U. poz. 44"),
            ActReference::new(0, 0, 44)
        );
    }
}
