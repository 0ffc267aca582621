//! End-to-end tests for tailwatch live under `tests/`.
