/*
 * Responsibility
 * - ドメインサービス (token / principal / policy / password)
 */
pub mod auth;
