mod home;
pub use home::Home;

mod diary;
pub use diary::Diary;

mod likes;
pub use likes::Likes;

mod profile;
pub use profile::Profile;

mod about;
pub use about::About;

mod login;
pub use login::Login;

mod signup;
pub use signup::Signup;

mod not_found;
pub use not_found::NotFound;
