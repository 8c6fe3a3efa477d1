pub use super::org::Entity as Org;
pub use super::pet::{EnergyLevel, Entity as Pet, PetSize};
pub use super::photo::Entity as Photo;
