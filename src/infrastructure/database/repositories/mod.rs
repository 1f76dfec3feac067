//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories, the transactional unit of work,
//! and the unified RepositoryProvider.

pub mod branch_repository;
pub mod item_repository;
pub mod repository_provider;
pub mod transfer_repository;
pub mod unit_of_work;

pub use branch_repository::SeaOrmBranchRepository;
pub use item_repository::SeaOrmItemRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use transfer_repository::SeaOrmTransferRepository;
pub use unit_of_work::SeaOrmUnitOfWork;
