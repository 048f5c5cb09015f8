//! Queue tests. Redis-backed tests are ignored without a live instance.
