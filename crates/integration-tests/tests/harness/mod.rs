//! Shared test harness

pub mod mock_provider;
