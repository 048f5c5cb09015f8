//! Unit tests for the rate limiter (local tier)

#[cfg(test)]
mod limiter_tests;
