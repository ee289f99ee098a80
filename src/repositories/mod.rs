use std::sync::Arc;

use crate::store::DocumentStore;

pub mod application_repository;
pub mod bom_repository;
pub mod part_repository;

pub use application_repository::ApplicationRepository;
pub use bom_repository::BomRepository;
pub use part_repository::PartRepository;

/// Common access to the document store backing a repository
pub trait Repository {
    fn store(&self) -> &dyn DocumentStore;
}

#[derive(Clone, Debug)]
pub struct BaseRepository {
    store: Arc<dyn DocumentStore>,
}

impl BaseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Repository for BaseRepository {
    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
