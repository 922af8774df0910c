pub mod auth;
pub mod books;
pub mod catalog;
pub mod core;
pub mod loans;
pub mod users;
pub mod utils;
