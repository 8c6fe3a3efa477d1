pub mod org;
pub mod pet;
pub mod photo;

pub use org::Entity as Org;
pub use pet::Entity as Pet;
pub use photo::Entity as Photo;

pub mod prelude;
