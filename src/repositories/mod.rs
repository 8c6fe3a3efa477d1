//! Narrow persistence interfaces used by the services, with Postgres
//! (sea-orm) and in-memory implementations.

pub mod in_memory;
pub mod orgs;
pub mod pets;
pub mod photos;

pub use in_memory::{InMemoryOrgRepository, InMemoryPetRepository, InMemoryPhotoIndex};
pub use orgs::{NewOrg, OrgRepository, PostgresOrgRepository};
pub use pets::{NewPet, PetFilters, PetRepository, PostgresPetRepository, PAGE_SIZE};
pub use photos::{PhotoIndex, PostgresPhotoIndex};
