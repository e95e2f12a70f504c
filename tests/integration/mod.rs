//! Integration tests for the monorail binary

mod helpers;
mod test_release;
mod test_stubs;
mod test_targets;
