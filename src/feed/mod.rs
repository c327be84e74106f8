//! Feeds: the two filtered views over the formula collection.
//!
//! - [`FeedKind`] names a feed and derives its filter from the session
//! - [`FeedLoader`] runs one read per request, with per-feed generations
//! - [`render`] turns records into sanitized [`FormulaCard`]s

mod cards;
mod loader;

use thiserror::Error;

use crate::records::{FieldFilter, StoreError};

pub use cards::{render, FormulaCard};
pub use loader::{fetch_feed, FeedLoader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Every public formula.
    Home,
    /// The signed-in user's formulas.
    My,
}

impl FeedKind {
    pub const ALL: [FeedKind; 2] = [FeedKind::Home, FeedKind::My];

    pub fn id(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::My => "my",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Home => 0,
            Self::My => 1,
        }
    }

    /// The filter sent to the document store for this feed.
    ///
    /// Home ignores the user entirely. My requires one.
    pub fn filter(self, user_id: Option<&str>) -> Result<FieldFilter, FeedError> {
        match self {
            Self::Home => Ok(FieldFilter::public_only()),
            Self::My => user_id
                .map(FieldFilter::owned_by)
                .ok_or(FeedError::Unauthenticated),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Sign in required")]
    Unauthenticated,
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Feed load crashed: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_my_without_user_is_unauthenticated() {
        assert!(matches!(
            FeedKind::My.filter(None),
            Err(FeedError::Unauthenticated)
        ));
    }

    #[test]
    fn test_my_filters_on_owner() {
        let filter = FeedKind::My.filter(Some("u1")).unwrap();
        assert_eq!(filter, FieldFilter::owned_by("u1"));
    }

    proptest! {
        #[test]
        fn home_filter_ignores_session(user in proptest::option::of("[a-zA-Z0-9]{1,28}")) {
            let filter = FeedKind::Home.filter(user.as_deref()).unwrap();
            prop_assert_eq!(filter, FieldFilter::public_only());
        }

        #[test]
        fn my_filter_is_uid_of_session(user in "[a-zA-Z0-9]{1,28}") {
            let filter = FeedKind::My.filter(Some(user.as_str())).unwrap();
            prop_assert_eq!(filter, FieldFilter::owned_by(&user));
        }
    }
}
