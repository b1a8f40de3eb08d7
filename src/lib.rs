pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod movies;
pub mod response;
pub mod reviews;
pub mod state;
pub mod storage;
pub mod translate;
pub mod watchlists;
