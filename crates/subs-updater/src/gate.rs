//! Version gating for incoming documents.

/// Whether an incoming document may replace the stored one.
///
/// The incoming id must equal the subscription id it was fetched for, and
/// its version must be strictly greater than the stored version. With no
/// stored document any version is accepted.
pub fn accepts_update(
    expected_id: i64,
    current_version: Option<u32>,
    incoming_id: i64,
    incoming_version: u32,
) -> bool {
    incoming_id == expected_id && current_version.is_none_or(|current| incoming_version > current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gate_examples() {
        assert!(accepts_update(1, Some(3), 1, 4));
        assert!(!accepts_update(1, Some(3), 1, 3));
        assert!(!accepts_update(1, Some(3), 1, 2));
        assert!(!accepts_update(1, Some(3), 2, 9));
        assert!(accepts_update(1, None, 1, 0));
        assert!(!accepts_update(1, None, -1, 0));
    }

    proptest! {
        #[test]
        fn prop_only_newer_matching_documents_pass(
            expected in -5i64..5,
            incoming_id in -5i64..5,
            current in 0u32..100,
            incoming in 0u32..100,
        ) {
            let accepted = accepts_update(expected, Some(current), incoming_id, incoming);
            prop_assert_eq!(accepted, incoming_id == expected && incoming > current);
        }
    }
}
