//! Likes hooks and the like toggle button.

use api::{LikesManager, SupabaseClient};
use dioxus::prelude::*;
use store::{Like, Movie};

use crate::auth::use_auth;

/// The shared likes manager.
pub fn use_likes_manager() -> LikesManager<SupabaseClient> {
    use_context::<LikesManager<SupabaseClient>>()
}

/// Signals mirroring the likes manager's list and loading flag.
#[derive(Clone)]
pub struct LikesState {
    pub liked: Signal<Vec<Like>>,
    pub loading: Signal<bool>,
    pub error: Signal<Option<String>>,
    manager: LikesManager<SupabaseClient>,
}

impl LikesState {
    /// Reload the visitor's likes in the background.
    pub fn refresh(&self) {
        let manager = self.manager.clone();
        let mut error = self.error;
        spawn(async move {
            match manager.fetch_user_likes().await {
                Ok(()) => error.set(None),
                Err(e) => {
                    tracing::error!("Failed to load likes: {}", e);
                    error.set(Some(e.to_string()));
                }
            }
        });
    }
}

/// Subscribe the calling component to the liked list.
pub fn use_likes() -> LikesState {
    let manager = use_likes_manager();
    let mut liked = use_signal(|| manager.liked_movies());
    let mut loading = use_signal(|| manager.is_loading());
    let error = use_signal(|| Option::<String>::None);

    use_hook(|| {
        let mut liked_rx = manager.watch_liked();
        spawn(async move {
            while liked_rx.changed().await.is_ok() {
                liked.set(liked_rx.borrow_and_update().clone());
            }
        });

        let mut loading_rx = manager.watch_loading();
        spawn(async move {
            while loading_rx.changed().await.is_ok() {
                loading.set(*loading_rx.borrow_and_update());
            }
        });
    });

    LikesState {
        liked,
        loading,
        error,
        manager,
    }
}

/// Heart button that likes or un-likes `movie` for the signed-in visitor.
/// `ontoggle` receives the new liked state after each successful toggle.
#[component]
pub fn LikeButton(
    movie: Movie,
    #[props(default = "".to_string())] class: String,
    #[props(default)] ontoggle: EventHandler<bool>,
) -> Element {
    let manager = use_likes_manager();
    let auth = use_auth();
    let mut liked = use_signal(|| false);
    let mut busy = use_signal(|| false);

    let checker = manager.clone();
    let movie_id = movie.id;
    // Re-checked whenever the signed-in user changes.
    let _ = use_resource(move || {
        let manager = checker.clone();
        let signed_in = auth().user.is_some();
        async move {
            if !signed_in {
                liked.set(false);
                return;
            }
            match manager.check_like_status(movie_id).await {
                Ok(status) => liked.set(status),
                Err(e) => tracing::warn!("Failed to check like status: {}", e),
            }
        }
    });

    let label = if liked() {
        format!("Unlike {}", movie.title)
    } else {
        format!("Like {}", movie.title)
    };
    let onclick = move |_| {
        let manager = manager.clone();
        let movie = movie.clone();
        async move {
            busy.set(true);
            match manager.toggle_like(&movie).await {
                Ok(Some(now_liked)) => {
                    liked.set(now_liked);
                    ontoggle.call(now_liked);
                }
                Ok(None) => tracing::debug!("Like ignored, nobody signed in"),
                Err(e) => tracing::error!("Failed to toggle like: {}", e),
            }
            busy.set(false);
        }
    };

    rsx! {
        button {
            class: "like-button {class}",
            disabled: busy() || auth().user.is_none(),
            title: "{label}",
            onclick: onclick,
            if liked() { "♥" } else { "♡" }
        }
    }
}
