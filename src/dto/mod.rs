pub mod auth;
pub mod books;
pub mod cart;
pub mod orders;
pub mod payments;
pub mod reviews;
