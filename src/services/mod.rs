pub mod orgs;
pub mod pets;

pub use orgs::OrgService;
pub use pets::{PetProfile, PetService, RegisterPet, UpdatePet};
