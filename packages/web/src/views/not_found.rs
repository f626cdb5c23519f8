use dioxus::prelude::*;

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div {
            class: "page not-found",
            h1 { "Page not found" }
            p { "Nothing lives at /{path}." }
            Link { to: "/", "Back to movies" }
        }
    }
}
