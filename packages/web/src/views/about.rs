use dioxus::prelude::*;

#[component]
pub fn About() -> Element {
    rsx! {
        div {
            class: "page about",
            h1 { "About" }
            p { "Keep track of the movies you watch and the ones you love." }
            p {
                "New here? "
                Link { to: "/signup", "Create an account" }
            }
        }
    }
}
