//! Database integration for seeding test data.
//!
//! The [`Seeder`] inserts generated races into Postgres, with batching and
//! progress logging for larger fields.

mod seeder;

pub use seeder::{SeedError, Seeder};
