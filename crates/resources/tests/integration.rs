//! Integration tests for resources

#[cfg(test)]
mod tests {
    use relbuild_resources::*;

    #[test]
    fn test_zero_limit_allows_one_worker() {
        assert_eq!(create_semaphore(0).available_permits(), 1);
        assert_eq!(create_semaphore(4).available_permits(), 4);
    }

    #[tokio::test]
    async fn test_permits_are_bounded() {
        let sem = create_semaphore(2);
        let a = acquire_semaphore_permit(sem.clone(), "build").await.unwrap();
        let _b = acquire_semaphore_permit(sem.clone(), "build").await.unwrap();
        assert_eq!(sem.available_permits(), 0);
        drop(a);
        assert_eq!(sem.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool_names_the_pass() {
        let sem = create_semaphore(1);
        sem.close();
        let err = acquire_semaphore_permit(sem, "clean").await.unwrap_err();
        assert!(err.to_string().contains("clean"));
    }
}
