pub mod credential_list;
pub mod error;
pub mod fetcher;
