/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth (filter + access policy), cors, http (request-id / trace / limit / timeout)
 */
pub mod auth;
pub mod cors;
pub mod http;
