use dioxus::prelude::*;
use ui::{use_auth, LogoutButton};

#[component]
pub fn Profile() -> Element {
    let auth = use_auth();

    let Some(user) = auth().user else {
        return rsx! {};
    };
    let name = user.display_name().to_string();
    let email = user.email.clone().unwrap_or_default();

    rsx! {
        div {
            class: "page profile",
            h1 { "{name}" }
            if !email.is_empty() {
                p { class: "email", "{email}" }
            }
            LogoutButton { label: "Sign out", class: "profile-logout" }
        }
    }
}
