//! Row structs mapped from the database.

pub mod profile;
