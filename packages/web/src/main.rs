use api::{Access, Navigation, NavigationGuard, RouteAccess};
use dioxus::prelude::*;

use ui::{use_client, AuthProvider, Navbar};
use views::{About, Diary, Home, Likes, Login, NotFound, Profile, Signup};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Guarded)]
        #[route("/")]
        Home {},
        #[route("/diary")]
        Diary {},
        #[route("/likes")]
        Likes {},
        #[route("/profile")]
        Profile {},
        #[route("/about")]
        About {},
        #[route("/login")]
        Login {},
        #[route("/signup")]
        Signup {},
        #[route("/:..segments")]
        NotFound { segments: Vec<String> },
}

impl RouteAccess for Route {
    fn access(&self) -> Access {
        match self {
            Route::Home {}
            | Route::Diary {}
            | Route::Likes {}
            | Route::Profile {}
            | Route::NotFound { .. } => Access::Protected,
            Route::About {} => Access::Public,
            Route::Login {} | Route::Signup {} => Access::AuthOnly,
        }
    }
}

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        AuthProvider {
            Router::<Route> {}
        }
    }
}

/// Layout around every page. Re-keyed on each route change so the guard runs
/// once per navigation.
#[component]
fn Guarded() -> Element {
    let route = use_route::<Route>();
    rsx! {
        Navbar {}
        RouteGate { key: "{route}", route }
    }
}

/// Asks the backend for the session before rendering the page, and redirects
/// when the page's access level does not allow the visitor in.
#[component]
fn RouteGate(route: Route) -> Element {
    let client = use_client();
    let guard = use_context::<NavigationGuard>();
    let nav = use_navigator();

    let decision = use_resource(move || {
        let client = client.clone();
        let guard = guard.clone();
        let route = route.clone();
        async move {
            match guard.check(&client, &route).await {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::error!("Session check failed for {}: {}", route, e);
                    guard.decide(route.access(), false)
                }
            }
        }
    });

    use_effect(move || {
        if let Some(Navigation::Redirect(path)) = decision.cloned() {
            match path.parse::<Route>() {
                Ok(target) => {
                    nav.replace(target);
                }
                Err(e) => tracing::error!("Unknown redirect target {}: {}", path, e),
            }
        }
    });

    match decision.cloned() {
        Some(Navigation::Proceed) => rsx! {
            Outlet::<Route> {}
        },
        Some(Navigation::Redirect(_)) => rsx! {},
        None => rsx! {
            p { class: "route-pending", "Loading..." }
        },
    }
}
