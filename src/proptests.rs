//! Property-based tests for the ordered containers and the term passes.
