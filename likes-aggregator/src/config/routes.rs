use std::sync::Arc;

use likes_aggregator_pipeline::processor::{LikesHandler, VoteChangeProcessor, VoteRoute};
use tracing::info;

use crate::config::Settings;
use crate::errors::IndexingError;

/// Builds the vote change processor with the likes routes enabled in `settings`.
///
/// The all-time route is always registered; the daily route only when
/// `daily_likes_enabled` is set. Both share one `LikesHandler`.
pub fn build_processor(settings: &Settings) -> Result<VoteChangeProcessor, IndexingError> {
    let handler = Arc::new(LikesHandler);
    let mut processor = VoteChangeProcessor::new();

    let mut routes = vec![VoteRoute::likes(&settings.likes_root)?];
    if settings.daily_likes_enabled {
        routes.push(VoteRoute::daily_likes(&settings.likes_daily_root)?);
    }

    for route in routes {
        info!(
            route = route.name(),
            vote_path = %route.vote_path(),
            aggregate_path = %route.aggregate_path(),
            "Registering vote route"
        );
        processor.register_handler(route, handler.clone());
    }
    Ok(processor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use likes_aggregator_shared::types::TemplateError;
    use std::time::Duration;

    fn settings(daily_likes_enabled: bool) -> Settings {
        Settings {
            database_url: "postgresql://localhost/likes".to_string(),
            likes_root: "likes".to_string(),
            likes_daily_root: "likes_daily".to_string(),
            daily_likes_enabled,
            poll_interval: Duration::from_millis(500),
            change_batch_size: 100,
            max_concurrency: 16,
            tx_max_retries: 8,
            max_delivery_attempts: 10,
            delivery_lease: Duration::from_secs(30),
            database_max_connections: 10,
        }
    }

    #[test]
    fn test_registers_both_routes() {
        let processor = build_processor(&settings(true)).unwrap();
        let names: Vec<_> = processor.routes().map(|route| route.name().to_string()).collect();
        assert_eq!(names, vec!["likes", "daily_likes"]);
    }

    #[test]
    fn test_daily_route_can_be_disabled() {
        let processor = build_processor(&settings(false)).unwrap();
        assert_eq!(processor.routes().count(), 1);
    }

    #[test]
    fn test_rejects_malformed_root() {
        let mut settings = settings(true);
        settings.likes_root = "likes/{oops".to_string();
        assert!(matches!(build_processor(&settings), Err(IndexingError::Route(_))));
    }

    #[test]
    fn test_rejects_nested_root_that_overlaps_daily_route() {
        // `menu/likes/{item_key}/votes/{user_id}` would also match `menu/{date}/...`.
        let mut settings = settings(true);
        settings.likes_root = "menu/likes".to_string();
        settings.likes_daily_root = "menu".to_string();

        assert!(matches!(
            build_processor(&settings),
            Err(IndexingError::Route(TemplateError::InvalidRoot(root))) if root == "menu/likes"
        ));
    }
}
