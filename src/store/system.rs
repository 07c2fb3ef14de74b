// 👤 System Store - the current user

use std::sync::{Arc, PoisonError, RwLock};

use crate::api::SystemApi;
use crate::entities::User;
use crate::feedback::{Feedback, NotifyKind};

const USER_FAILED: &str = "Failed to get current user. Are you logged in?";

pub struct SystemStore<A> {
    api: Arc<A>,
    feedback: Feedback,
    user: RwLock<Option<User>>,
}

impl<A: SystemApi> SystemStore<A> {
    pub fn new(api: Arc<A>, feedback: Feedback) -> Self {
        SystemStore {
            api,
            feedback,
            user: RwLock::new(None),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch the logged-in user. A failure warns the user and keeps the
    /// previous value.
    pub async fn get_current_user(&self) {
        match self.api.get_current_user().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "current user loaded");
                self.set_current_user(user);
            }
            Err(e) => {
                tracing::warn!(error = %e, "loading current user failed");
                self.feedback.notify(USER_FAILED, NotifyKind::Warning);
            }
        }
    }

    pub fn set_current_user(&self, user: User) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FakeApi;

    #[tokio::test]
    async fn test_get_current_user() {
        let api = Arc::new(FakeApi::default());
        *api.user.lock().unwrap() = Some(User::new("u-1", "jdoe"));
        let (feedback, recorder) = Feedback::recording();
        let store = SystemStore::new(api, feedback);

        assert!(store.current_user().is_none());
        store.get_current_user().await;

        assert_eq!(store.current_user().unwrap().username, "jdoe");
        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_get_current_user_failure_warns() {
        let api = Arc::new(FakeApi::default());
        let (feedback, recorder) = Feedback::recording();
        let store = SystemStore::new(api, feedback);
        store.set_current_user(User::new("u-0", "previous"));

        store.get_current_user().await;

        assert_eq!(store.current_user().unwrap().username, "previous");
        assert_eq!(recorder.notifications(), vec![(USER_FAILED.to_string(), NotifyKind::Warning)]);
    }
}
