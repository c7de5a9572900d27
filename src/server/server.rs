use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (session_store, pool) = Self::build_store(settings).await?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let auth_service = Self::build_auth_service(settings, session_store, clock)?;

        info!(store = %settings.store.backend, hasher = %settings.auth.hasher, "server started");

        Ok(Self { auth_service, pool })
    }

    /// Wires the rotation protocol from settings around a given store and clock.
    pub fn build_auth_service(
        settings: &Settings,
        session_store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Arc<dyn AuthService>> {
        let auth = &settings.auth;

        let credential_hasher: Arc<dyn CredentialHasher> = match auth.hasher.as_str() {
            "bcrypt" => Arc::new(BcryptHasher::new(auth.bcrypt_cost)),
            "argon2" => Arc::new(Argon2Hasher),
            other => return Err(anyhow::anyhow!("Unknown hasher: {}", other)),
        };

        let refresh_generator: Arc<dyn RefreshTokenGenerator> =
            match auth.refresh_generator.as_str() {
                "random" => Arc::new(RandomRefreshGenerator),
                "derived" => {
                    warn!("derived refresh tokens are guessable, prefer \"random\"");
                    Arc::new(DerivedRefreshGenerator)
                }
                other => return Err(anyhow::anyhow!("Unknown refresh generator: {}", other)),
            };

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs512Codec::new(JwtConfig {
            access_ttl: auth.access_ttl()?,
            signing_key: auth.signing_key.clone().into_bytes(),
        }));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            token_codec,
            refresh_generator,
            credential_hasher,
            session_store,
            clock,
            auth.refresh_ttl()?,
        ));
        Ok(auth_service)
    }

    async fn build_store(
        settings: &Settings,
    ) -> anyhow::Result<(Arc<dyn SessionStore>, Option<Pool<MySql>>)> {
        let store = &settings.store;
        match store.backend.as_str() {
            "memory" => {
                warn!("memory session store: sessions are lost on restart");
                let memory_store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
                Ok((memory_store, None))
            }
            "redis" => {
                let url = store
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.redis_url is required for redis"))?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let redis_store: Arc<dyn SessionStore> = Arc::new(RedisSessionStore::new(
                    redis_manager,
                    store.key_prefix.clone(),
                ));
                Ok((redis_store, None))
            }
            "mysql" => {
                let url = store
                    .mysql_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.mysql_url is required for mysql"))?;
                let pool = Pool::<MySql>::connect(url).await?;
                let mysql_store = MySqlSessionStore::new(pool.clone());
                mysql_store.ensure_schema().await?;
                let mysql_store: Arc<dyn SessionStore> = Arc::new(mysql_store);
                Ok((mysql_store, Some(pool)))
            }
            other => Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
