// Panic isolation for job executions
use std::any::Any;

/// Extract a readable message from a panic payload
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_from_spawned_panic() {
        let handle = tokio::spawn(async { panic!("boom {}", 42) });
        let err = handle.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(panic_message(err.into_panic()), "boom 42");
    }

    #[test]
    fn test_unknown_payload() {
        assert_eq!(panic_message(Box::new(7u8)), "Unknown panic");
    }
}
