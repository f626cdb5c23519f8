use dioxus::prelude::*;

use crate::auth::{use_auth, AuthState, LogoutButton};

/// Top navigation. Shows the app sections to signed-in visitors and the entry
/// pages to everyone else.
#[component]
pub fn Navbar() -> Element {
    let auth = use_auth();
    let AuthState { user, loading } = auth();

    rsx! {
        nav {
            class: "navbar",
            Link { to: "/about", "About" }
            {match user {
                Some(user) => {
                    let name = user.display_name().to_string();
                    rsx! {
                        Link { to: "/", "Movies" }
                        Link { to: "/diary", "Diary" }
                        Link { to: "/likes", "Likes" }
                        Link { to: "/profile", "{name}" }
                        LogoutButton { class: "navbar-logout" }
                    }
                }
                None if loading => rsx! {},
                None => rsx! {
                    Link { to: "/login", "Sign in" }
                    Link { to: "/signup", "Sign up" }
                },
            }}
        }
    }
}
