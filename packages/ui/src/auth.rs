//! Authentication context and hooks for the UI.

use api::auth::persist_session;
use api::{LikesManager, NavigationGuard, SessionContext, SupabaseClient};
use dioxus::prelude::*;
use store::{Identity, RemoteService};

use crate::client::make_client;
use crate::storage::session_storage;

/// Authentication state for the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<Identity>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Get the current authentication state.
/// Returns a signal that updates when the user logs in or out.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// The backend client shared by every view.
pub fn use_client() -> SupabaseClient {
    use_context::<SupabaseClient>()
}

/// Provider component that manages authentication state.
/// Wrap your app with this component to enable authentication.
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let client = use_hook(make_client);

    match client {
        Ok(client) => rsx! {
            SessionProvider { client, {children} }
        },
        Err(e) => {
            tracing::error!("Backend is not configured: {}", e);
            rsx! {
                div {
                    class: "config-error",
                    "The app is not configured: {e}"
                }
            }
        }
    }
}

/// Puts the client, the session mirror, the likes manager and the navigation
/// guard into context, and keeps [`AuthState`] in step with the mirror.
#[component]
fn SessionProvider(client: SupabaseClient, children: Element) -> Element {
    let client = use_context_provider(|| client);
    let session = use_context_provider(SessionContext::new);
    use_context_provider(|| LikesManager::new(client.clone()));
    use_context_provider(NavigationGuard::default);

    let mut auth_state = use_signal(AuthState::default);
    use_context_provider(|| auth_state);

    // Follow session changes for the lifetime of the app.
    use_hook(|| {
        spawn(session.attach(&client));
        spawn(persist_session(&client, session_storage()));

        let mut identity = session.watch();
        spawn(async move {
            while identity.changed().await.is_ok() {
                let user = identity.borrow_and_update().clone();
                auth_state.set(AuthState {
                    user,
                    loading: false,
                });
            }
        });
    });

    // Fetch the current user on mount
    let _ = use_resource(move || {
        let client = client.clone();
        let session = session.clone();
        async move {
            if let Err(e) = session.initialize(&client).await {
                tracing::error!("Failed to fetch current user: {}", e);
            }
            auth_state.set(AuthState {
                user: session.identity(),
                loading: false,
            });
        }
    });

    rsx! {
        {children}
    }
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let client = use_client();
    let nav = use_navigator();

    let onclick = move |_| {
        let client = client.clone();
        async move {
            match client.sign_out().await {
                Ok(()) => {
                    nav.replace("/login");
                }
                Err(e) => tracing::error!("Failed to log out: {}", e),
            }
        }
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
