//! Unit tests for the plain HTTP fetch phase (mock server backed)

#[cfg(test)]
mod http_tests;
