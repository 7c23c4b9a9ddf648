use likes_aggregator_shared::types::{AggregateKey, PathParams, PathTemplate, TemplateError, VOTES_COLLECTION};

pub const ITEM_KEY_PARAM: &str = "item_key";
pub const DATE_PARAM: &str = "date";
pub const USER_ID_PARAM: &str = "user_id";

/// Binds the location of a family of vote records to the aggregate they count
/// towards, e.g. `likes/{item_key}/votes/{user_id}` to `likes/{item_key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRoute {
    name: String,
    vote_path: PathTemplate,
    aggregate_path: PathTemplate,
}

impl VoteRoute {
    /// Creates a route. Every parameter of the aggregate template must also be
    /// captured by the vote template.
    pub fn new(
        name: impl Into<String>,
        vote_path: &str,
        aggregate_path: &str,
    ) -> Result<Self, TemplateError> {
        let vote_path = PathTemplate::parse(vote_path)?;
        let aggregate_path = PathTemplate::parse(aggregate_path)?;
        if let Some(missing) = aggregate_path.params().find(|p| !vote_path.has_param(p)) {
            return Err(TemplateError::MissingParam(missing.to_string()));
        }
        Ok(Self {
            name: name.into(),
            vote_path,
            aggregate_path,
        })
    }

    /// All-time likes: `{root}/{item_key}/votes/{user_id}` counted at `{root}/{item_key}`.
    pub fn likes(root: &str) -> Result<Self, TemplateError> {
        check_root(root)?;
        Self::new(
            "likes",
            &format!("{root}/{{{ITEM_KEY_PARAM}}}/{VOTES_COLLECTION}/{{{USER_ID_PARAM}}}"),
            &format!("{root}/{{{ITEM_KEY_PARAM}}}"),
        )
    }

    /// Per-day likes: `{root}/{date}/{item_key}/votes/{user_id}` counted at
    /// `{root}/{date}/{item_key}`.
    pub fn daily_likes(root: &str) -> Result<Self, TemplateError> {
        check_root(root)?;
        Self::new(
            "daily_likes",
            &format!("{root}/{{{DATE_PARAM}}}/{{{ITEM_KEY_PARAM}}}/{VOTES_COLLECTION}/{{{USER_ID_PARAM}}}"),
            &format!("{root}/{{{DATE_PARAM}}}/{{{ITEM_KEY_PARAM}}}"),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vote_path(&self) -> &PathTemplate {
        &self.vote_path
    }

    pub fn aggregate_path(&self) -> &PathTemplate {
        &self.aggregate_path
    }

    /// Whether this route's aggregates are keyed by day.
    pub fn is_dated(&self) -> bool {
        self.aggregate_path.has_param(DATE_PARAM)
    }

    pub fn matches(&self, path: &str) -> Option<PathParams> {
        self.vote_path.captures(path)
    }

    pub fn aggregate_key(&self, params: &PathParams) -> Result<AggregateKey, TemplateError> {
        self.aggregate_path.render(params).map(AggregateKey::from_path)
    }
}

/// Roots are single literal segments. The all-time and daily vote paths then
/// differ in length and no change can match both routes.
fn check_root(root: &str) -> Result<(), TemplateError> {
    if root.is_empty() || root.contains(['/', '{', '}']) {
        return Err(TemplateError::InvalidRoot(root.to_string()));
    }
    Ok(())
}
