//! Field elements, the Poseidon hash, and account addresses.

mod address;
mod field;
pub mod hash;

pub use address::Address;
pub use field::FieldElement;
pub use hash::{hash1, hash2, hash3};
