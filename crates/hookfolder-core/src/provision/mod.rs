//! Idempotent folder provisioning against a remote hierarchical store.

pub mod memory;
pub mod provisioner;
pub mod store;

pub use memory::InMemoryFolderStore;
pub use provisioner::FolderProvisioner;
pub use store::FolderStore;
