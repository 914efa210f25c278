//! Cross-crate integration tests for FetchBench live under `tests/`.
