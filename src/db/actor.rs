use crate::db::models::{DbConfigEntry, DbTemplate, Template};
use crate::db::schema::SQLITE_INIT;
use crate::error::StoreError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::collections::BTreeMap;
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

/// Rename request: `new_name == None` keeps the current name and only replaces `data`.
#[derive(Debug, Clone)]
pub struct RenameTemplate {
    pub old_name: String,
    pub new_name: Option<String>,
    pub data: Value,
}

type Reply<T> = RpcReplyPort<Result<T, StoreError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// All templates, newest first.
    ListTemplates(Reply<Vec<Template>>),

    /// Single template by name.
    GetTemplate(String, Reply<Option<Template>>),

    /// Insert or replace a template's data; returns the updated list.
    UpsertTemplate(String, Value, Reply<Vec<Template>>),

    /// Atomic rename (+ data replacement); returns the updated list.
    RenameTemplate(RenameTemplate, Reply<Vec<Template>>),

    /// Delete by name (absent is fine); returns the updated list.
    DeleteTemplate(String, Reply<Vec<Template>>),

    /// Every config entry.
    GetConfig(Reply<BTreeMap<String, String>>),

    /// Insert or replace a single config entry.
    SetConfig(String, String, Reply<()>),

    /// Write all entries in one transaction, only while no entry exists yet.
    /// Replies with the number of entries written.
    SeedConfig(Vec<(String, String)>, Reply<usize>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

fn rpc_failed(op: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("DbActor {op} RPC failed: {e}"))
}

impl DbActorHandle {
    pub async fn list_templates(&self) -> Result<Vec<Template>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::ListTemplates)
            .map_err(|e| rpc_failed("ListTemplates", e))?
    }

    pub async fn get_template(&self, name: String) -> Result<Option<Template>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::GetTemplate, name)
            .map_err(|e| rpc_failed("GetTemplate", e))?
    }

    pub async fn upsert_template(
        &self,
        name: String,
        data: Value,
    ) -> Result<Vec<Template>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::UpsertTemplate, name, data)
            .map_err(|e| rpc_failed("UpsertTemplate", e))?
    }

    pub async fn rename_template(
        &self,
        rename: RenameTemplate,
    ) -> Result<Vec<Template>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::RenameTemplate, rename)
            .map_err(|e| rpc_failed("RenameTemplate", e))?
    }

    pub async fn delete_template(&self, name: String) -> Result<Vec<Template>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::DeleteTemplate, name)
            .map_err(|e| rpc_failed("DeleteTemplate", e))?
    }

    pub async fn get_config(&self) -> Result<BTreeMap<String, String>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::GetConfig)
            .map_err(|e| rpc_failed("GetConfig", e))?
    }

    pub async fn set_config(&self, key: String, value: String) -> Result<(), StoreError> {
        ractor::call!(self.actor, DbActorMessage::SetConfig, key, value)
            .map_err(|e| rpc_failed("SetConfig", e))?
    }

    pub async fn seed_config(&self, entries: Vec<(String, String)>) -> Result<usize, StoreError> {
        ractor::call!(self.actor, DbActorMessage::SeedConfig, entries)
            .map_err(|e| rpc_failed("SeedConfig", e))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

/// Owns the pool. Messages are handled one at a time, so check-then-act
/// sequences (rename) never interleave with other writes; the UNIQUE(name)
/// constraint still backs them up.
struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::ListTemplates(reply) => {
                let res = self.list_templates(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetTemplate(name, reply) => {
                let res = self.get_template(&state.pool, &name).await;
                let _ = reply.send(res);
            }
            DbActorMessage::UpsertTemplate(name, data, reply) => {
                let res = match self.upsert_template(&state.pool, &name, &data).await {
                    Ok(()) => self.list_templates(&state.pool).await,
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::RenameTemplate(rename, reply) => {
                let res = match self.rename_template(&state.pool, rename).await {
                    Ok(()) => self.list_templates(&state.pool).await,
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::DeleteTemplate(name, reply) => {
                let res = match self.delete_template(&state.pool, &name).await {
                    Ok(()) => self.list_templates(&state.pool).await,
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::GetConfig(reply) => {
                let res = self.get_config(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::SetConfig(key, value, reply) => {
                let res = self.set_config(&state.pool, &key, &value).await;
                let _ = reply.send(res);
            }
            DbActorMessage::SeedConfig(entries, reply) => {
                let res = self.seed_config(&state.pool, entries).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn list_templates(&self, pool: &SqlitePool) -> Result<Vec<Template>, StoreError> {
        let rows = sqlx::query_as::<_, DbTemplate>(
            r#"
        SELECT id, name, data, created_at, updated_at
        FROM templates
        ORDER BY created_at DESC, id DESC
        "#,
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Template::try_from).collect()
    }

    async fn get_template(
        &self,
        pool: &SqlitePool,
        name: &str,
    ) -> Result<Option<Template>, StoreError> {
        let row = sqlx::query_as::<_, DbTemplate>(
            r#"
        SELECT id, name, data, created_at, updated_at
        FROM templates
        WHERE name = ?
        "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        row.map(Template::try_from).transpose()
    }

    async fn upsert_template(
        &self,
        pool: &SqlitePool,
        name: &str,
        data: &Value,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let data = data.to_string();

        // created_at is only written on insert.
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO templates (name, data, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        RETURNING id
        "#,
        )
        .bind(name)
        .bind(data)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        debug!(id, name, "template upserted");
        Ok(())
    }

    async fn rename_template(
        &self,
        pool: &SqlitePool,
        rename: RenameTemplate,
    ) -> Result<(), StoreError> {
        let RenameTemplate {
            old_name,
            new_name,
            data,
        } = rename;

        let mut tx = pool.begin().await?;

        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM templates WHERE name = ?")
            .bind(&old_name)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(id) = id else {
            return Err(StoreError::NotFound(old_name));
        };

        let target = match new_name {
            Some(new_name) if new_name != old_name => {
                let taken: Option<i64> =
                    sqlx::query_scalar("SELECT id FROM templates WHERE name = ?")
                        .bind(&new_name)
                        .fetch_optional(&mut *tx)
                        .await?;
                if taken.is_some() {
                    return Err(StoreError::NameCollision(new_name));
                }
                new_name
            }
            _ => old_name.clone(),
        };

        let updated_at = Utc::now();
        sqlx::query(
            r#"
        UPDATE templates
        SET name = ?, data = ?, updated_at = ?
        WHERE id = ?
        "#,
        )
        .bind(&target)
        .bind(data.to_string())
        .bind(updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::NameCollision(target.clone())
            }
            _ => StoreError::from(e),
        })?;

        tx.commit().await?;

        debug!(id, from = %old_name, to = %target, "template renamed");
        Ok(())
    }

    async fn delete_template(&self, pool: &SqlitePool, name: &str) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM templates WHERE name = ?")
            .bind(name)
            .execute(pool)
            .await?;

        debug!(name, affected = res.rows_affected(), "template delete applied");
        Ok(())
    }

    async fn get_config(&self, pool: &SqlitePool) -> Result<BTreeMap<String, String>, StoreError> {
        let rows = sqlx::query_as::<_, DbConfigEntry>("SELECT key, value FROM config_entries")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|r| (r.key, r.value)).collect())
    }

    async fn set_config(&self, pool: &SqlitePool, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
        INSERT INTO config_entries (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        debug!(key, value_len = value.len(), "config entry set");
        Ok(())
    }

    async fn seed_config(
        &self,
        pool: &SqlitePool,
        entries: Vec<(String, String)>,
    ) -> Result<usize, StoreError> {
        let mut tx = pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM config_entries")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            debug!(existing, "config not empty; seed skipped");
            return Ok(0);
        }

        let now = Utc::now();
        for (key, value) in &entries {
            sqlx::query(
                r#"
            INSERT INTO config_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(entries.len())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, StoreError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| StoreError::Unavailable(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
