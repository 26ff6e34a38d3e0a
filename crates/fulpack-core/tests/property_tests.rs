//! Property-based tests for path validation and checksum formatting.

#![allow(clippy::expect_used)]

use fulpack_core::checksum;
use fulpack_core::checksum::Algorithm;
use fulpack_core::checksum::Digest;
use fulpack_core::is_safe_path;
use fulpack_core::types::DestDir;
use fulpack_core::types::SafePath;
use fulpack_core::validate_path;
use proptest::prelude::*;
use std::path::Component;
use tempfile::TempDir;

fn create_test_dest() -> (TempDir, DestDir) {
    let temp = TempDir::new().expect("failed to create temp dir");
    let dest = DestDir::new(temp.path()).expect("failed to create dest");
    (temp, dest)
}

fn algorithm_strategy() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::Xxh3_128),
        Just(Algorithm::Sha256),
        Just(Algorithm::Crc32),
    ]
}

proptest! {
    /// Whatever the input, an accepted path joins to somewhere under the root.
    #[test]
    fn prop_validated_paths_stay_inside(raw in "[a-z./\\\\]{0,24}") {
        let (_temp, dest) = create_test_dest();
        if let Ok(safe) = SafePath::validate(&raw) {
            let joined = dest.join(&safe);
            prop_assert!(joined.starts_with(dest.as_path()));
            prop_assert!(
                safe.to_path_buf()
                    .components()
                    .all(|c| matches!(c, Component::Normal(_))),
                "non-normal component in {}", safe
            );
        }
    }

    /// Any `..` segment is rejected, wherever it appears.
    #[test]
    fn prop_parent_segment_rejected(
        prefix in prop::collection::vec("[a-z]{1,8}", 0..4),
        suffix in prop::collection::vec("[a-z]{1,8}", 0..4),
        backslash in any::<bool>(),
    ) {
        let sep = if backslash { "\\" } else { "/" };
        let mut parts = prefix;
        parts.push("..".to_string());
        parts.extend(suffix);
        let raw = parts.join(sep);
        prop_assert!(validate_path(&raw).is_err(), "accepted {raw}");
    }

    /// Plain relative paths are accepted unchanged.
    #[test]
    fn prop_plain_relative_paths_accepted(
        components in prop::collection::vec("[a-zA-Z0-9_-]{1,16}", 1..6)
    ) {
        let raw = components.join("/");
        let safe = validate_path(&raw).expect("plain path rejected");
        prop_assert_eq!(safe.as_str(), raw.as_str());
        prop_assert_eq!(safe.depth(), components.len());
    }

    /// Absolute paths never validate.
    #[test]
    fn prop_absolute_paths_rejected(
        components in prop::collection::vec("[a-z]{1,8}", 0..4)
    ) {
        let raw = format!("/{}", components.join("/"));
        prop_assert!(!is_safe_path(&raw));
    }

    /// The boolean form agrees with the validating form.
    #[test]
    fn prop_is_safe_path_agrees(raw in "\\PC{0,32}") {
        prop_assert_eq!(is_safe_path(&raw), validate_path(&raw).is_ok());
    }

    /// Formatted digests are `name:` plus lowercase hex of the right length.
    #[test]
    fn prop_digest_format(
        data in prop::collection::vec(any::<u8>(), 0..512),
        algorithm in algorithm_strategy(),
    ) {
        let formatted = checksum::hash(&data, algorithm).formatted();
        let (prefix, hex_part) = formatted.split_once(':').expect("missing prefix");
        prop_assert_eq!(prefix, algorithm.as_str());
        prop_assert_eq!(hex_part.len(), algorithm.digest_len() * 2);
        prop_assert!(hex_part.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    /// Parsing a formatted digest, in any case, gives the same digest back.
    #[test]
    fn prop_digest_parse_round_trip(
        data in prop::collection::vec(any::<u8>(), 0..512),
        algorithm in algorithm_strategy(),
    ) {
        let digest = checksum::hash(&data, algorithm);
        let parsed = Digest::parse(&digest.formatted()).expect("parse failed");
        prop_assert_eq!(&parsed, &digest);
        let upper = Digest::parse(&digest.formatted().to_ascii_uppercase()).expect("parse failed");
        prop_assert_eq!(&upper, &digest);
        prop_assert!(checksum::verify(&data, &digest.formatted()).expect("verify failed"));
    }

    /// Streaming in arbitrary chunks matches one-shot hashing.
    #[test]
    fn prop_streaming_matches_one_shot(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        split in 0usize..2048,
        algorithm in algorithm_strategy(),
    ) {
        let split = split.min(data.len());
        let mut hasher = checksum::stream(algorithm);
        hasher.update(&data[..split]);
        hasher.update(&data[split..]);
        prop_assert_eq!(hasher.digest(), checksum::hash(&data, algorithm));
    }
}
