//! Integration tests for types

#[cfg(test)]
mod tests {
    use relbuild_types::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn record() -> BuildRecord {
        BuildRecord {
            target: PathBuf::from("/src/assets/simp-utils"),
            package: "simp-utils".into(),
            version: "6.0.0".into(),
            release: "1".into(),
            reason: DecisionReason::NewPackage,
            fetched: false,
            recorded_at: chrono::Utc::now(),
            binary_packages: vec![ArtifactDescriptor::new(
                "dist/simp-utils-6.0.0-1.noarch.rpm",
                "noarch",
                true,
            )],
            source_packages: vec![ArtifactDescriptor::new(
                "dist/simp-utils-6.0.0-1.src.rpm",
                "noarch",
                false,
            )],
        }
    }

    #[test]
    fn test_build_record_yaml() {
        let rec = record();
        let yaml = serde_yml::to_string(&rec).unwrap();
        assert!(yaml.contains("binary_packages"));
        assert!(yaml.contains("reason: new_package"));
        let back: BuildRecord = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_build_record_helpers() {
        let rec = record();
        assert!(rec.has_signed_binary());
        assert_eq!(rec.artifact_count(), 2);
        assert_eq!(
            rec.resolve(&rec.binary_packages[0]),
            PathBuf::from("/src/assets/simp-utils/dist/simp-utils-6.0.0-1.noarch.rpm")
        );
    }

    #[test]
    fn test_signing_summary_counts() {
        let mut results = BTreeMap::new();
        results.insert(PathBuf::from("a.rpm"), SigningStatus::Signed);
        results.insert(PathBuf::from("b.rpm"), SigningStatus::SkippedAlreadySigned);
        results.insert(PathBuf::from("c.rpm"), SigningStatus::Unsigned);
        results.insert(PathBuf::from("d.rpm"), SigningStatus::Unsigned);
        let summary = SigningSummary::from_results(&results);
        assert_eq!(summary.signed, 1);
        assert_eq!(summary.already_signed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.attempted(), 3);
    }

    #[test]
    fn test_record_matches_only_its_own_local_build() {
        let mut metadata = PackageMetadata {
            name: "simp-utils".into(),
            packages: vec!["simp-utils".into()],
            version: "6.0.0".into(),
            release: "1".into(),
            arch: "noarch".into(),
            origin: None,
        };
        let mut record = record();
        assert!(record.built_from(&metadata));

        metadata.release = "2".into();
        assert!(!record.built_from(&metadata));

        metadata.release = "1".into();
        record.fetched = true;
        assert!(!record.built_from(&metadata));
    }

    #[test]
    fn test_rebuild_policy_parsing() {
        assert_eq!("always".parse::<RebuildPolicy>().unwrap(), RebuildPolicy::Always);
        assert_eq!("YES".parse::<RebuildPolicy>().unwrap(), RebuildPolicy::Always);
        assert_eq!("never".parse::<RebuildPolicy>().unwrap(), RebuildPolicy::Never);
        assert_eq!("".parse::<RebuildPolicy>().unwrap(), RebuildPolicy::Unset);
        assert!("sometimes".parse::<RebuildPolicy>().is_err());
        assert!(!RebuildPolicy::Never.forces_rebuild());
    }

    #[test]
    fn test_decision_fetch_fallback() {
        let remote: RemotePackage = "foo-1.0.0-1.noarch.rpm".parse().unwrap();
        let decision = RebuildDecision::skip(vec![remote.clone()]);
        assert!(!decision.must_build);
        assert_eq!(decision.fetch_candidate(), Some(&remote));

        let fallback = decision.into_fetch_failed();
        assert!(fallback.must_build);
        assert_eq!(fallback.reason, DecisionReason::FetchFailed);
        assert!(fallback.fetch_candidates.is_empty());
    }

    #[test]
    fn test_tag_advisory_serialization() {
        let advisory = TagAdvisory::TagOwed { tag: "1.0.0".into() };
        let json = serde_json::to_string(&advisory).unwrap();
        assert_eq!(json, r#"{"status":"tag_owed","tag":"1.0.0"}"#);
        assert!(advisory.is_tag_owed());
    }
}
