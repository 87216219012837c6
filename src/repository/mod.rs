//! User persistence behind a narrow async interface.

use async_trait::async_trait;

use crate::error::Result;
use crate::user::User;

/// In-memory user registry.
pub mod memory;

/// PostgreSQL-backed user repository.
pub mod postgres;

pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;

/// CRUD operations over user records, keyed by integer identifier.
///
/// The domain layer only ever talks to this trait; the concrete store is
/// chosen at startup (PostgreSQL in production, the in-memory registry in
/// tests).
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user and returns it with its assigned id.
    async fn insert(&self, user: User) -> Result<User>;

    /// Fetches a user by id.
    async fn get_by_id(&self, id: i64) -> Result<User>;

    /// Fetches a user by account name.
    async fn get_by_name(&self, name: &str) -> Result<User>;

    /// Fetches a user by email address.
    async fn get_by_email(&self, email: &str) -> Result<User>;

    /// Lists all users.
    async fn list(&self) -> Result<Vec<User>>;

    /// Updates the non-empty fields of a user record, returning the number
    /// of rows affected. Empty fields mean "no change".
    async fn update(&self, user: User) -> Result<i64>;

    /// Deletes a user by id, returning the number of rows affected.
    async fn remove(&self, id: i64) -> Result<i64>;
}
