pub mod catalog;
pub mod provider;
