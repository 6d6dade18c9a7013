//! Integration tests for error types

#[cfg(test)]
mod tests {
    use relbuild_errors::*;

    #[test]
    fn test_error_conversion() {
        let index_err = IndexError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = index_err.into();
        assert!(matches!(err, Error::Index(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_transient_classification() {
        assert!(IndexError::Http {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(IndexError::Http {
            status: 429,
            message: "slow down".into()
        }
        .is_transient());
        assert!(!IndexError::Http {
            status: 404,
            message: "missing".into()
        }
        .is_transient());
        assert!(!IndexError::Unauthorized {
            url: "https://example.com".into()
        }
        .is_transient());
    }

    #[test]
    fn test_aggregate_lists_every_target() {
        let err = BuildError::TargetsFailed {
            operation: "build".into(),
            failures: vec![
                TargetFailure::new("src/assets/a", "no binary packages generated"),
                TargetFailure::new("src/puppet/modules/b", "empty artifact"),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("build failed for 2 target(s):"));
        assert!(text.contains("src/assets/a"));
        assert!(text.contains("src/puppet/modules/b"));
    }

    #[test]
    fn test_housekeeping_display() {
        let err = BuildError::HousekeepingFailed {
            task: "clean".into(),
            failed: vec!["dir2".into()],
            interrupted: vec!["dir1".into()],
            cancelled: 2,
        };
        let text = err.to_string();
        assert!(text.contains("dir2"));
        assert!(text.contains("interrupted while running:"));
        assert!(text.contains("dir1"));
    }

    #[test]
    fn test_signing_failures_are_distinct() {
        let total = SigningError::TotalFailure {
            root: "dist".into(),
            attempted: 3,
        };
        let partial = SigningError::PartialFailure {
            root: "dist".into(),
            failed: vec!["a.rpm".into()],
        };
        assert_ne!(total.user_code(), partial.user_code());
        assert_ne!(total.user_hint(), partial.user_hint());
    }

    #[test]
    fn test_error_clone() {
        let err = BuildError::NoArtifacts {
            target: "src/assets/a".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err = StorageError::from_io_with_path(&io_err, std::path::Path::new("/tmp/x"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));
    }

    #[test]
    fn test_io_error_names_the_file() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io_with_path(&io_err, "/tree/dist/last_build_record.yaml");
        assert_eq!(
            err.user_message(),
            "/tree/dist/last_build_record.yaml: gone"
        );
        assert_eq!(err.user_code(), Some("error.io"));
    }

    #[test]
    fn test_missing_records_has_a_hint() {
        let err: Error = BuildError::NoRecords {
            root: "/tree".into(),
            file: "last_build_record.yaml".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("build.no_records"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_rules_is_a_config_error() {
        let err: Error = ConfigError::RulesNotFound {
            path: "build/rpm/dependencies.yaml".into(),
        }
        .into();
        assert!(err.to_string().starts_with("config error: dependency rules file not found"));
        assert_eq!(err.user_code(), Some("config.rules_not_found"));
    }
}
