//! Registration page view with email/password form.

use dioxus::prelude::*;
use store::{Credentials, RemoteService};
use ui::use_client;

/// Sign-up page component.
#[component]
pub fn Signup() -> Element {
    let client = use_client();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut pending = use_signal(|| false);
    let mut loading = use_signal(|| false);

    let handle_signup = move |evt: FormEvent| {
        evt.prevent_default();
        let client = client.clone();
        spawn(async move {
            error.set(None);

            let e = email().trim().to_string();
            let p = password();
            let cp = confirm_password();

            if e.is_empty() || !e.contains('@') {
                error.set(Some("Please enter a valid email".to_string()));
                return;
            }
            if p.len() < 6 {
                error.set(Some("Password must be at least 6 characters".to_string()));
                return;
            }
            if p != cp {
                error.set(Some("Passwords do not match".to_string()));
                return;
            }

            loading.set(true);
            match client.sign_up(&Credentials::new(e, p)).await {
                Ok(Some(_)) => {
                    nav.replace("/");
                }
                // Confirmation email sent, no session yet
                Ok(None) => {
                    loading.set(false);
                    pending.set(true);
                }
                Err(e) => {
                    loading.set(false);
                    error.set(Some(e.to_string()));
                }
            }
        });
    };

    if pending() {
        return rsx! {
            div {
                class: "page auth-page",
                h1 { "Check your email" }
                p { "We sent a confirmation link to {email}. Follow it, then sign in." }
                Link { to: "/login", "Go to sign in" }
            }
        };
    }

    rsx! {
        div {
            class: "page auth-page",

            h1 { "Create account" }

            form {
                onsubmit: handle_signup,
                class: "auth-form",

                if let Some(err) = error() {
                    div { class: "error", "{err}" }
                }

                input {
                    r#type: "email",
                    placeholder: "Email",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                input {
                    r#type: "password",
                    placeholder: "Password (min 6 characters)",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                input {
                    r#type: "password",
                    placeholder: "Confirm password",
                    value: confirm_password(),
                    oninput: move |evt: FormEvent| confirm_password.set(evt.value()),
                }

                button {
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Creating account..." } else { "Sign up" }
                }
            }

            p {
                "Already have an account? "
                Link { to: "/login", "Sign in" }
            }
        }
    }
}
