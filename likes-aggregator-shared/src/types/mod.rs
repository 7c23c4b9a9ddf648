mod aggregate;
mod aggregate_delta;
mod aggregate_key;
mod item_key;
mod key_error;
mod path_template;
mod vote_change;
mod vote_date;

pub use aggregate::LikesAggregate;
pub use aggregate_delta::AggregateDelta;
pub use aggregate_key::{AggregateKey, VOTES_COLLECTION, VoteKey};
pub use item_key::{ItemKey, MAX_ITEM_KEY_LEN};
pub use key_error::KeyError;
pub use path_template::{PathParams, PathTemplate, TemplateError};
pub use vote_change::{ChangeId, VoteChange, VoteSnapshot};
pub use vote_date::VoteDate;
