#![forbid(unsafe_code)]

//! Layout direction and logical-to-visual slot mapping.
//!
//! A PIN row is laid out left-to-right or right-to-left depending on the host
//! environment. The direction is fixed when a view is constructed and only
//! affects which *visual* slot corresponds to a *logical* code position.

use std::env;

/// Language subtags whose scripts are written right-to-left.
const RTL_LANGUAGES: &[&str] = &[
    "ar", "ckb", "dv", "fa", "he", "iw", "ku", "ps", "sd", "ug", "ur", "yi",
];

/// Slot ordering direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutDirection {
    /// Left-to-right: logical index equals visual index.
    #[default]
    Ltr,
    /// Right-to-left: logical index 0 is the rightmost slot.
    Rtl,
}

impl LayoutDirection {
    /// Detect the direction from the process locale.
    ///
    /// Preference order: `LC_ALL`, then `LANG`. Falls back to [`Ltr`](Self::Ltr).
    #[must_use]
    pub fn detect() -> Self {
        let lc_all = env::var("LC_ALL").ok();
        let lang = env::var("LANG").ok();
        Self::from_locale_vars(lc_all.as_deref(), lang.as_deref())
    }

    /// Direction for a single locale string such as `"he_IL.UTF-8"`.
    #[must_use]
    pub fn from_locale(locale: &str) -> Self {
        match language_subtag(locale) {
            Some(lang) if RTL_LANGUAGES.iter().any(|rtl| lang.eq_ignore_ascii_case(rtl)) => {
                Self::Rtl
            }
            _ => Self::Ltr,
        }
    }

    fn from_locale_vars(lc_all: Option<&str>, lang: Option<&str>) -> Self {
        lc_all
            .filter(|raw| language_subtag(raw).is_some())
            .or(lang)
            .map_or(Self::Ltr, Self::from_locale)
    }

    /// Whether this is [`Rtl`](Self::Rtl).
    #[must_use]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// Map a logical slot index to its visual position in a row of `len` slots.
    ///
    /// The mapping is an involution: applying it twice yields the input.
    #[must_use]
    pub const fn normalize(self, index: usize, len: usize) -> usize {
        match self {
            Self::Ltr => index,
            Self::Rtl => len.saturating_sub(1).saturating_sub(index),
        }
    }
}

/// Extract the language subtag, ignoring codeset and modifier suffixes.
///
/// Returns `None` for empty input and for the `C`/`POSIX` pseudo-locales.
fn language_subtag(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw);
    let lang = raw.split(['_', '-']).next().unwrap_or(raw).trim();
    if lang.is_empty() || lang.eq_ignore_ascii_case("c") || lang.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ltr_normalize_is_identity() {
        for i in 0..4 {
            assert_eq!(LayoutDirection::Ltr.normalize(i, 4), i);
        }
    }

    #[test]
    fn rtl_normalize_mirrors() {
        let dir = LayoutDirection::Rtl;
        assert_eq!(dir.normalize(0, 4), 3);
        assert_eq!(dir.normalize(3, 4), 0);
        assert_eq!(dir.normalize(1, 4), 2);
    }

    #[test]
    fn rtl_single_slot_maps_to_itself() {
        assert_eq!(LayoutDirection::Rtl.normalize(0, 1), 0);
    }

    #[test]
    fn locale_detection() {
        assert_eq!(LayoutDirection::from_locale("he_IL.UTF-8"), LayoutDirection::Rtl);
        assert_eq!(LayoutDirection::from_locale("ar"), LayoutDirection::Rtl);
        assert_eq!(LayoutDirection::from_locale("fa-IR"), LayoutDirection::Rtl);
        assert_eq!(LayoutDirection::from_locale("en_US.UTF-8"), LayoutDirection::Ltr);
        assert_eq!(LayoutDirection::from_locale("fr_FR@euro"), LayoutDirection::Ltr);
        assert_eq!(LayoutDirection::from_locale("C"), LayoutDirection::Ltr);
        assert_eq!(LayoutDirection::from_locale(""), LayoutDirection::Ltr);
    }

    #[test]
    fn lc_all_takes_precedence_over_lang() {
        let dir = LayoutDirection::from_locale_vars(Some("ar_EG.UTF-8"), Some("en_US.UTF-8"));
        assert_eq!(dir, LayoutDirection::Rtl);
        let dir = LayoutDirection::from_locale_vars(Some("en_US.UTF-8"), Some("he_IL.UTF-8"));
        assert_eq!(dir, LayoutDirection::Ltr);
    }

    #[test]
    fn empty_lc_all_falls_back_to_lang() {
        let dir = LayoutDirection::from_locale_vars(Some(""), Some("ur_PK"));
        assert_eq!(dir, LayoutDirection::Rtl);
        assert_eq!(LayoutDirection::from_locale_vars(None, None), LayoutDirection::Ltr);
    }

    proptest! {
        #[test]
        fn normalize_is_involution(len in 1usize..64, seed in any::<usize>(), rtl in any::<bool>()) {
            let dir = if rtl { LayoutDirection::Rtl } else { LayoutDirection::Ltr };
            let index = seed % len;
            let visual = dir.normalize(index, len);
            prop_assert!(visual < len);
            prop_assert_eq!(dir.normalize(visual, len), index);
        }
    }
}
