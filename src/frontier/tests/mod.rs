//! Frontier tests. The store-backed tests need live PostgreSQL and are
//! ignored by default.

#[cfg(test)]
mod frontier_tests;
