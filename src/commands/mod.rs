pub mod admin;
pub mod cart;
pub mod checkout;
pub mod menu;
pub mod orders;
pub mod students;
