//! Landing page for signed-in visitors.

use dioxus::prelude::*;
use store::Movie;
use ui::{use_auth, LikeButton};

fn featured() -> Vec<Movie> {
    vec![
        Movie::new(603, "The Matrix", Some("/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg")),
        Movie::new(680, "Pulp Fiction", Some("/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg")),
        Movie::new(13, "Forrest Gump", None),
    ]
}

#[component]
pub fn Home() -> Element {
    let auth = use_auth();
    let greeting = match auth().user {
        Some(user) => format!("Welcome back, {}", user.display_name()),
        None => "Welcome".to_string(),
    };

    rsx! {
        div {
            class: "page home",
            h1 { "{greeting}" }
            p { class: "subtitle", "Pick something to watch tonight." }

            ul {
                class: "movie-grid",
                for movie in featured() {
                    li {
                        key: "{movie.id}",
                        class: "movie-card",
                        span { class: "movie-title", "{movie.title}" }
                        LikeButton { movie: movie.clone() }
                    }
                }
            }
        }
    }
}
