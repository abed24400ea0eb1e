//! Core conversion and ranking logic

pub mod balance;
pub mod cache;
pub mod config;
pub mod controller;
pub mod convert;
pub mod currency;
pub mod debounce;
pub mod log;
pub mod notice;
pub mod rate;

// Re-export main types for cleaner imports
pub use currency::PopularCurrencyProvider;
pub use notice::{Notice, Notifier};
pub use rate::{CurrencyRate, RateCatalog, RateObservation, RateProvider};
