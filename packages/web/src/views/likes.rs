//! The visitor's liked movies, newest first.

use dioxus::prelude::*;
use store::Movie;
use ui::{use_likes, LikeButton};

#[component]
pub fn Likes() -> Element {
    let state = use_likes();

    // Load on mount
    let loader = state.clone();
    use_hook(move || loader.refresh());

    // Un-liking from this page drops the row from the list.
    let reloader = state.clone();
    let on_toggle = use_callback(move |_: bool| reloader.refresh());

    let liked = (state.liked)();
    let loading = (state.loading)();
    let error = (state.error)();

    rsx! {
        div {
            class: "page likes",
            h1 { "Liked movies" }

            if let Some(err) = error {
                div { class: "error", "{err}" }
            }

            if loading && liked.is_empty() {
                p { "Loading..." }
            } else if liked.is_empty() {
                p { class: "empty", "You haven't liked anything yet." }
            } else {
                ul {
                    class: "movie-list",
                    for like in liked {
                        li {
                            key: "{like.id}",
                            class: "movie-row",
                            span { class: "movie-title", "{like.movie_title}" }
                            span {
                                class: "liked-at",
                                {like.created_at.format("%b %e, %Y").to_string()}
                            }
                            LikeButton {
                                movie: Movie::new(
                                    like.movie_id,
                                    like.movie_title.clone(),
                                    like.movie_poster.as_deref(),
                                ),
                                ontoggle: on_toggle,
                            }
                        }
                    }
                }
            }
        }
    }
}
