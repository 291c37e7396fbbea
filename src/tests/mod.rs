//! Integration-style tests for the binary: full calculation → selection →
//! planning → persistence cycle, driven only through the public library API.

mod full_cycle;
