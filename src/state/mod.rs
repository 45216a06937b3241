pub mod cell;
pub mod config;
pub mod controller;
pub mod data_model;
pub mod focus;
pub mod i18n;
pub mod ordering;
pub mod store;
