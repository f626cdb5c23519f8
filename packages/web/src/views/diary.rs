use dioxus::prelude::*;

#[component]
pub fn Diary() -> Element {
    rsx! {
        div {
            class: "page diary",
            h1 { "Diary" }
            p { "Movies you log will show up here." }
        }
    }
}
