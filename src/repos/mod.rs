/*
 * Responsibility
 * - ユーザーストア (trait) と実装 (Postgres / in-memory)
 */
pub mod error;
pub mod memory;
pub mod store;
pub mod user_repo;
