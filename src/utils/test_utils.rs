//! Test utilities for Intcode programs.
