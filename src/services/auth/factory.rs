/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::repos::store::UserStore;
use crate::services::auth::AuthService;
use crate::services::auth::principal::StorePrincipalLoader;
use crate::services::auth::token_codec::TokenCodec;

pub fn build_auth_service(config: &Config, users: Arc<dyn UserStore>) -> Arc<AuthService> {
    let codec = TokenCodec::new(
        config.jwt_secret.as_bytes(),
        &config.jwt_issuer,
        config.jwt_ttl_seconds,
        config.jwt_leeway_seconds,
    );

    Arc::new(AuthService::new(
        codec,
        Arc::new(StorePrincipalLoader::new(users)),
        config.principal_lookup_timeout,
    ))
}
