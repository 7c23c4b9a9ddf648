use likes_aggregator_shared::types::{
    AggregateDelta, ItemKey, PathParams, VoteChange, VoteDate, VoteSnapshot,
};

use crate::errors::ProcessorError;
use crate::processor::{DATE_PARAM, HandleVoteChange, ITEM_KEY_PARAM, VoteRoute};

/// Signed change in "liked" between two states of a vote record.
///
/// A missing record counts as not liked, so deleting a liked vote is `-1` and
/// creating an unliked one is `0`.
pub fn compute_delta(before: Option<VoteSnapshot>, after: Option<VoteSnapshot>) -> i64 {
    let was_liked = before.is_some_and(|snapshot| snapshot.liked);
    let is_liked = after.is_some_and(|snapshot| snapshot.liked);
    match (was_liked, is_liked) {
        (false, true) => 1,
        (true, false) => -1,
        _ => 0,
    }
}

/// Counts likes for any [`VoteRoute`].
///
/// The item key (and the date, for dated routes) is validated before anything
/// else; a change with a malformed key never produces a delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikesHandler;

impl LikesHandler {
    fn validate(route: &VoteRoute, params: &PathParams, path: &str) -> Result<(), ProcessorError> {
        let raw_item_key = params.get(ITEM_KEY_PARAM).map_or("", String::as_str);
        ItemKey::parse(raw_item_key).map_err(|e| ProcessorError::InvalidKey {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        if route.is_dated() {
            let raw_date = params.get(DATE_PARAM).map_or("", String::as_str);
            VoteDate::parse(raw_date).map_err(|e| ProcessorError::InvalidDate {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

impl HandleVoteChange for LikesHandler {
    fn handle(
        &self,
        route: &VoteRoute,
        params: &PathParams,
        change: &VoteChange,
    ) -> Result<Option<AggregateDelta>, ProcessorError> {
        Self::validate(route, params, &change.path)?;

        let delta = compute_delta(change.before, change.after);
        if delta == 0 {
            return Ok(None);
        }

        let key = route
            .aggregate_key(params)
            .map_err(|source| ProcessorError::AggregatePath {
                path: change.path.clone(),
                source,
            })?;
        Ok(Some(AggregateDelta { key, delta }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likes_aggregator_shared::types::AggregateKey;

    const LIKED: Option<VoteSnapshot> = Some(VoteSnapshot { liked: true });
    const UNLIKED: Option<VoteSnapshot> = Some(VoteSnapshot { liked: false });

    fn handle(route: &VoteRoute, change: &VoteChange) -> Result<Option<AggregateDelta>, ProcessorError> {
        let params = route.matches(&change.path).unwrap();
        LikesHandler.handle(route, &params, change)
    }

    #[test]
    fn test_delta_table() {
        let cases = [
            (None, LIKED, 1),
            (None, UNLIKED, 0),
            (LIKED, LIKED, 0),
            (UNLIKED, UNLIKED, 0),
            (UNLIKED, LIKED, 1),
            (LIKED, UNLIKED, -1),
            (LIKED, None, -1),
            (UNLIKED, None, 0),
            (None, None, 0),
        ];
        for (before, after, expected) in cases {
            assert_eq!(
                compute_delta(before, after),
                expected,
                "before={before:?} after={after:?}"
            );
        }
    }

    #[test]
    fn test_first_like_targets_item_aggregate() {
        let route = VoteRoute::likes("likes").unwrap();
        let change = VoteChange::created(1, "likes/moqueca/votes/uid-1", VoteSnapshot::liked());

        let delta = handle(&route, &change).unwrap().unwrap();

        assert_eq!(delta.key, AggregateKey::from_path("likes/moqueca"));
        assert_eq!(delta.delta, 1);
    }

    #[test]
    fn test_unlike_on_daily_route() {
        let route = VoteRoute::daily_likes("likes_daily").unwrap();
        let change = VoteChange::updated(
            2,
            "likes_daily/2025-03-10/moqueca/votes/uid-1",
            VoteSnapshot::liked(),
            VoteSnapshot::unliked(),
        );

        let delta = handle(&route, &change).unwrap().unwrap();

        assert_eq!(delta.key, AggregateKey::from_path("likes_daily/2025-03-10/moqueca"));
        assert_eq!(delta.delta, -1);
    }

    #[test]
    fn test_redundant_update_produces_no_delta() {
        let route = VoteRoute::likes("likes").unwrap();
        let change = VoteChange::updated(
            3,
            "likes/moqueca/votes/uid-1",
            VoteSnapshot::liked(),
            VoteSnapshot::liked(),
        );

        assert_eq!(handle(&route, &change), Ok(None));
    }

    #[test]
    fn test_rejects_item_key_over_200_characters() {
        let route = VoteRoute::likes("likes").unwrap();
        let path = format!("likes/{}/votes/uid-1", "a".repeat(201));
        let change = VoteChange::created(4, path, VoteSnapshot::liked());

        assert!(matches!(handle(&route, &change), Err(ProcessorError::InvalidKey { .. })));
    }

    #[test]
    fn test_accepts_item_key_of_200_characters() {
        let route = VoteRoute::likes("likes").unwrap();
        let path = format!("likes/{}/votes/uid-1", "a".repeat(200));
        let change = VoteChange::created(5, path, VoteSnapshot::liked());

        assert_eq!(handle(&route, &change).unwrap().unwrap().delta, 1);
    }

    #[test]
    fn test_rejects_empty_item_key() {
        let route = VoteRoute::likes("likes").unwrap();
        let change = VoteChange::created(6, "likes//votes/uid-1", VoteSnapshot::liked());

        assert!(matches!(handle(&route, &change), Err(ProcessorError::InvalidKey { .. })));
    }

    #[test]
    fn test_rejects_invalid_dates() {
        let route = VoteRoute::daily_likes("likes_daily").unwrap();
        for date in ["2025-13-01", "2025-02-30", "25-01-01"] {
            let path = format!("likes_daily/{date}/moqueca/votes/uid-1");
            let change = VoteChange::created(7, path, VoteSnapshot::liked());
            assert!(
                matches!(handle(&route, &change), Err(ProcessorError::InvalidDate { .. })),
                "{date} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_key_is_rejected_even_without_delta() {
        let route = VoteRoute::daily_likes("likes_daily").unwrap();
        let change = VoteChange::created(8, "likes_daily/2025-13-01/moqueca/votes/uid-1", VoteSnapshot::unliked());

        assert!(matches!(handle(&route, &change), Err(ProcessorError::InvalidDate { .. })));
    }
}
