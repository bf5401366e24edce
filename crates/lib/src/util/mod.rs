//! Template hashing and logical-name helpers.

pub mod hash;
pub mod naming;

#[cfg(test)]
pub mod testutil;
