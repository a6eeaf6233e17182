use crate::models::format::{ALIASES, PRIORITY_LIST};
use crate::models::FormatId;

use super::error::SnapshotError;

/// A canonical format selected for encoding, with the advertised names to read it from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// Canonical identifier written to the wire
    pub format: FormatId,
    /// Advertised names that provide this format, best first
    pub sources: Vec<String>,
}

/// Choose which formats to encode for the given advertised names
///
/// Output follows the fixed priority list (image, uri list, text). Each canonical
/// format appears once even when several of its aliases are advertised; the
/// canonical name is tried first, then aliases in table order.
pub fn negotiate<S: AsRef<str>>(available: &[S]) -> Result<Vec<NegotiatedFormat>, SnapshotError> {
    let advertised = |name: &str| available.iter().any(|a| a.as_ref() == name);

    let selected: Vec<NegotiatedFormat> = PRIORITY_LIST
        .iter()
        .filter_map(|&canonical| {
            let aliases = ALIASES
                .iter()
                .filter(|(_, target)| *target == canonical)
                .map(|(alias, _)| *alias);

            let sources: Vec<String> = std::iter::once(canonical)
                .chain(aliases)
                .filter(|name| advertised(*name))
                .map(str::to_string)
                .collect();

            (!sources.is_empty()).then(|| NegotiatedFormat {
                format: FormatId::from(canonical),
                sources,
            })
        })
        .collect();

    if selected.is_empty() {
        return Err(SnapshotError::NoMatchingFormat {
            available: available.iter().map(|a| a.as_ref().to_string()).collect(),
        });
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats(selected: &[NegotiatedFormat]) -> Vec<&str> {
        selected.iter().map(|n| n.format.as_str()).collect()
    }

    #[test]
    fn test_aliases_collapse_to_one_entry() {
        let selected = negotiate(&["text/plain", "image/png", "UTF8_STRING"]).unwrap();

        assert_eq!(formats(&selected), vec!["image/png", "text/plain"]);
        assert_eq!(selected[1].sources, vec!["text/plain", "UTF8_STRING"]);
    }

    #[test]
    fn test_priority_order_ignores_advertised_order() {
        let selected =
            negotiate(&["UTF8_STRING", "TARGETS", "text/uri-list", "image/png"]).unwrap();

        assert_eq!(
            formats(&selected),
            vec!["image/png", "text/uri-list", "text/plain"]
        );
    }

    #[test]
    fn test_alias_only_maps_to_canonical() {
        let selected = negotiate(&["TARGETS", "UTF8_STRING"]).unwrap();

        assert_eq!(formats(&selected), vec!["text/plain"]);
        assert_eq!(selected[0].sources, vec!["UTF8_STRING"]);
    }

    #[test]
    fn test_no_matching_format() {
        let err = negotiate(&["TARGETS", "application/x-qt-image"]).unwrap_err();

        match err {
            SnapshotError::NoMatchingFormat { available } => {
                assert_eq!(available, vec!["TARGETS", "application/x-qt-image"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_advertised_set() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            negotiate(&empty),
            Err(SnapshotError::NoMatchingFormat { .. })
        ));
    }
}
