//! # LikesManager — query, toggle and list the visitor's liked movies
//!
//! Every operation resolves the current identity through the
//! [`RemoteService`] first. A signed-out caller is not an error: lookups answer
//! `false`, toggles do nothing, and the liked list is empty.
//!
//! [`toggle_like`](LikesManager::toggle_like) is a read followed by a write with
//! no atomicity between them. Two toggles racing on the same movie can both see
//! "not liked"; the backend's `unique (movie_id, user_id)` constraint then
//! rejects the second insert and the caller gets [`ServiceError::Conflict`].

use std::sync::Arc;

use store::{Like, Movie, NewLike, RemoteService, ServiceError};
use tokio::sync::watch;

/// Likes operations plus the observable list they fill.
#[derive(Clone, Debug)]
pub struct LikesManager<S> {
    service: S,
    liked: Arc<watch::Sender<Vec<Like>>>,
    loading: Arc<watch::Sender<bool>>,
}

impl<S: RemoteService> LikesManager<S> {
    pub fn new(service: S) -> Self {
        let (liked, _) = watch::channel(Vec::new());
        let (loading, _) = watch::channel(false);
        Self {
            service,
            liked: Arc::new(liked),
            loading: Arc::new(loading),
        }
    }

    /// Whether the current user has liked `movie_id`. `false` when signed out,
    /// without touching the likes table.
    pub async fn check_like_status(&self, movie_id: i64) -> Result<bool, ServiceError> {
        let Some(user) = self.service.get_current_identity().await? else {
            return Ok(false);
        };

        match self.service.query_like_row(movie_id, &user.id).await {
            Ok(like) => Ok(like.is_some()),
            // Only a single matching row counts as liked.
            Err(ServiceError::MultipleRows(count)) => {
                tracing::warn!(movie_id, count, "duplicate like rows");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Flip the like on `movie`. Returns `Some(true)` when it is now liked,
    /// `Some(false)` when it was un-liked, `None` when nobody is signed in.
    pub async fn toggle_like(&self, movie: &Movie) -> Result<Option<bool>, ServiceError> {
        let Some(user) = self.service.get_current_identity().await? else {
            tracing::debug!(movie_id = movie.id, "toggle ignored, signed out");
            return Ok(None);
        };

        match self.service.query_like_row(movie.id, &user.id).await? {
            Some(existing) => {
                self.service.delete_like_row(existing.id).await?;
                tracing::debug!(movie_id = movie.id, like_id = existing.id, "like removed");
                Ok(Some(false))
            }
            None => {
                self.service
                    .insert_like_row(&NewLike::for_movie(movie, &user.id))
                    .await?;
                tracing::debug!(movie_id = movie.id, "like added");
                Ok(Some(true))
            }
        }
    }

    /// Reload the liked list, newest first. The loading flag is raised for the
    /// duration of the call and cleared on every exit path. On failure the
    /// previous list is kept.
    pub async fn fetch_user_likes(&self) -> Result<(), ServiceError> {
        self.loading.send_replace(true);
        let result = self.load_likes().await;
        self.loading.send_replace(false);

        self.liked.send_replace(result?);
        Ok(())
    }

    async fn load_likes(&self) -> Result<Vec<Like>, ServiceError> {
        match self.service.get_current_identity().await? {
            Some(user) => self.service.query_all_likes(&user.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub fn liked_movies(&self) -> Vec<Like> {
        self.liked.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn watch_liked(&self) -> watch::Receiver<Vec<Like>> {
        self.liked.subscribe()
    }

    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Probe;
    use chrono::{Duration, TimeZone, Utc};
    use store::Credentials;

    fn matrix() -> Movie {
        Movie {
            id: 603,
            title: "The Matrix".to_string(),
            poster_path: Some("/matrix.jpg".to_string()),
        }
    }

    async fn signed_in() -> (Probe, String) {
        let probe = Probe::new();
        let session = probe
            .store
            .sign_up(&Credentials::new("ada@example.com", "hunter22"))
            .await
            .unwrap()
            .unwrap();
        (probe, session.user.id)
    }

    #[tokio::test]
    async fn test_signed_out_check_skips_query() {
        let probe = Probe::new();
        let likes = LikesManager::new(probe.clone());

        assert!(!likes.check_like_status(603).await.unwrap());
        assert_eq!(probe.row_queries(), 0);
    }

    #[tokio::test]
    async fn test_signed_out_toggle_is_noop() {
        let probe = Probe::new();
        let likes = LikesManager::new(probe.clone());

        assert_eq!(likes.toggle_like(&matrix()).await.unwrap(), None);
        assert!(probe.store.likes().is_empty());
        assert_eq!(probe.row_queries(), 0);
    }

    #[tokio::test]
    async fn test_toggle_on_then_off() {
        let (probe, user_id) = signed_in().await;
        let likes = LikesManager::new(probe.clone());

        assert_eq!(likes.toggle_like(&matrix()).await.unwrap(), Some(true));
        let rows = probe.store.likes();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].movie_id, 603);
        assert_eq!(rows[0].user_id, user_id);
        assert_eq!(rows[0].movie_title, "The Matrix");
        assert_eq!(rows[0].movie_poster.as_deref(), Some("/matrix.jpg"));
        assert!(likes.check_like_status(603).await.unwrap());

        assert_eq!(likes.toggle_like(&matrix()).await.unwrap(), Some(false));
        assert!(probe.store.likes().is_empty());
        assert!(!likes.check_like_status(603).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_orders_newest_first() {
        let (probe, user_id) = signed_in().await;
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for (id, title, offset) in [(1, "Alien", 0), (2, "Heat", 2), (3, "Ran", 1)] {
            probe.store.seed_like(Like {
                id,
                movie_id: 100 + id,
                user_id: user_id.clone(),
                movie_title: title.to_string(),
                movie_poster: None,
                created_at: base + Duration::days(offset),
            });
        }
        probe.store.seed_like(Like {
            id: 4,
            movie_id: 999,
            user_id: "someone-else".to_string(),
            movie_title: "Brazil".to_string(),
            movie_poster: None,
            created_at: base,
        });

        let likes = LikesManager::new(probe);
        likes.fetch_user_likes().await.unwrap();

        let titles: Vec<String> = likes
            .liked_movies()
            .into_iter()
            .map(|l| l.movie_title)
            .collect();
        assert_eq!(titles, ["Heat", "Ran", "Alien"]);
        assert!(!likes.is_loading());
    }

    #[tokio::test]
    async fn test_refetch_after_unlike_drops_row() {
        let (probe, _) = signed_in().await;
        let likes = LikesManager::new(probe);
        let mut list = likes.watch_liked();

        likes.toggle_like(&matrix()).await.unwrap();
        likes.fetch_user_likes().await.unwrap();
        assert_eq!(likes.liked_movies().len(), 1);
        list.borrow_and_update();

        assert_eq!(likes.toggle_like(&matrix()).await.unwrap(), Some(false));
        likes.fetch_user_likes().await.unwrap();
        assert!(list.has_changed().unwrap());
        assert!(list.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_signed_out_clears_loading() {
        let probe = Probe::new();
        let likes = LikesManager::new(probe.clone());
        let mut loading = likes.watch_loading();

        likes.fetch_user_likes().await.unwrap();
        assert!(likes.liked_movies().is_empty());
        assert!(!likes.is_loading());
        // The flag was raised and lowered again.
        assert!(loading.has_changed().unwrap());
        assert_eq!(probe.row_queries(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_list() {
        let (probe, _) = signed_in().await;
        let likes = LikesManager::new(probe.clone());
        likes.toggle_like(&matrix()).await.unwrap();
        likes.fetch_user_likes().await.unwrap();
        assert_eq!(likes.liked_movies().len(), 1);

        probe.fail_identity();
        assert!(likes.fetch_user_likes().await.is_err());
        assert_eq!(likes.liked_movies().len(), 1);
        assert!(!likes.is_loading());
    }

    #[tokio::test]
    async fn test_duplicate_rows_are_not_liked() {
        let (probe, user_id) = signed_in().await;
        for id in [1, 2] {
            probe.store.seed_like(Like {
                id,
                movie_id: 603,
                user_id: user_id.clone(),
                movie_title: "The Matrix".to_string(),
                movie_poster: None,
                created_at: Utc::now(),
            });
        }

        let likes = LikesManager::new(probe);
        assert!(!likes.check_like_status(603).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_insert_once() {
        let (probe, _) = signed_in().await;
        probe.yield_after_read();
        let likes = LikesManager::new(probe.clone());
        let movie = matrix();

        // Both toggles read "not liked" before either writes.
        let (first, second) = tokio::join!(likes.toggle_like(&movie), likes.toggle_like(&movie));

        let results = [first, second];
        let liked = results.iter().filter(|r| matches!(r, Ok(Some(true)))).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
            .count();
        assert_eq!((liked, conflicts), (1, 1));
        assert_eq!(probe.store.likes().len(), 1);
    }
}
