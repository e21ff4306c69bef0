//! SQLite settings store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::debug;

use repocast_protocols::{
    validate_job_name, CollectSettings, EndpointConfig, ExecutionRecord, HistoryQuery, JobSetting,
    JobStatus, PromptSettings, PromptSettingsUpdate, SettingsStore, SortOrder, StoreError,
};

use crate::defaults::default_job_settings;
use crate::schema::init_schema;

/// SQLite-backed settings store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Self::with_connection(conn).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening SQLite store at {:?}", path);
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::StorageError(e.to_string()))?;
        Ok(Self { conn })
    }
}

fn query_error(e: tokio_rusqlite::Error) -> StoreError {
    StoreError::QueryError(e.to_string())
}

/// Fixed-width UTC timestamps so text comparison orders chronologically.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<JobStatus> {
    let code: i64 = row.get(idx)?;
    u8::try_from(code)
        .ok()
        .and_then(JobStatus::from_code)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

fn job_setting_from_row(row: &Row<'_>) -> rusqlite::Result<JobSetting> {
    Ok(JobSetting {
        name: row.get(0)?,
        schedule: row.get(1)?,
        is_active: row.get(2)?,
        updated_at: timestamp_at(row, 3)?,
    })
}

fn prompt_from_row(row: &Row<'_>) -> rusqlite::Result<PromptSettings> {
    Ok(PromptSettings {
        use_direct_url: row.get(0)?,
        llm_provider: row.get(1)?,
        temperature: row.get(2)?,
        content: row.get(3)?,
        model: row.get(4)?,
        llm_output_language: row.get(5)?,
        updated_at: timestamp_at(row, 6)?,
    })
}

const SELECT_PROMPT: &str = "SELECT use_direct_url, llm_provider, temperature, content, model,
     llm_output_language, updated_at FROM prompt_settings WHERE id = 1";

fn write_prompt(conn: &rusqlite::Connection, p: &PromptSettings) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO prompt_settings (id, use_direct_url, llm_provider, temperature, content,
             model, llm_output_language, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET use_direct_url = excluded.use_direct_url,
             llm_provider = excluded.llm_provider, temperature = excluded.temperature,
             content = excluded.content, model = excluded.model,
             llm_output_language = excluded.llm_output_language,
             updated_at = excluded.updated_at",
        params![
            p.use_direct_url,
            p.llm_provider,
            p.temperature,
            p.content,
            p.model,
            p.llm_output_language,
            format_timestamp(p.updated_at)
        ],
    )?;
    Ok(())
}

/// WHERE clause and bound values for the history filters.
fn history_filter(query: &HistoryQuery) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut values = Vec::new();

    if let Some(ref name) = query.name {
        sql.push_str(" AND name = ?");
        values.push(Value::Text(name.clone()));
    }
    if let Some(status) = query.status {
        sql.push_str(" AND status = ?");
        values.push(Value::Integer(i64::from(status.code())));
    }
    if let Some(start) = query.start_bound() {
        sql.push_str(" AND timestamp >= ?");
        values.push(Value::Text(format_timestamp(start)));
    }
    if let Some(end) = query.end_bound() {
        sql.push_str(" AND timestamp < ?");
        values.push(Value::Text(format_timestamp(end)));
    }

    (sql, values)
}

#[async_trait]
impl SettingsStore for SqliteStore {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn initialize_defaults(&self) -> Result<(), StoreError> {
        let jobs = default_job_settings();
        let collect = CollectSettings::default();
        let prompt = PromptSettings::default();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for job in jobs {
                    tx.execute(
                        "INSERT OR IGNORE INTO cron_settings (name, schedule, is_active, updated_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![job.name, job.schedule, job.is_active, format_timestamp(job.updated_at)],
                    )?;
                }
                tx.execute(
                    "INSERT OR IGNORE INTO collect_settings (id, max_repos, resource, since,
                         spoken_language_code, period, language, updated_at)
                     VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        collect.max_repos,
                        collect.resource,
                        collect.since,
                        collect.spoken_language_code,
                        collect.period,
                        collect.language,
                        format_timestamp(collect.updated_at)
                    ],
                )?;
                let has_prompt = tx
                    .query_row("SELECT 1 FROM prompt_settings WHERE id = 1", [], |_| Ok(()))
                    .optional()?
                    .is_some();
                if !has_prompt {
                    write_prompt(&tx, &prompt)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(query_error)
    }

    async fn get_job_setting(&self, name: &str) -> Result<Option<JobSetting>, StoreError> {
        let name = name.to_string();
        self.conn
            .call(move |conn| {
                let setting = conn
                    .query_row(
                        "SELECT name, schedule, is_active, updated_at FROM cron_settings WHERE name = ?1",
                        [&name],
                        job_setting_from_row,
                    )
                    .optional()?;
                Ok(setting)
            })
            .await
            .map_err(query_error)
    }

    async fn get_all_job_settings(&self) -> Result<Vec<JobSetting>, StoreError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name, schedule, is_active, updated_at FROM cron_settings ORDER BY name",
                )?;
                let settings = stmt
                    .query_map([], job_setting_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(settings)
            })
            .await
            .map_err(query_error)
    }

    async fn upsert_job_setting(
        &self,
        name: &str,
        schedule: &str,
        is_active: bool,
    ) -> Result<JobSetting, StoreError> {
        validate_job_name(name)?;
        let setting = JobSetting::new(name, schedule, is_active);
        let row = setting.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cron_settings (name, schedule, is_active, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(name) DO UPDATE SET schedule = excluded.schedule,
                         is_active = excluded.is_active, updated_at = excluded.updated_at",
                    params![row.name, row.schedule, row.is_active, format_timestamp(row.updated_at)],
                )?;
                Ok(())
            })
            .await
            .map_err(query_error)?;

        Ok(setting)
    }

    async fn log_execution(
        &self,
        name: &str,
        status: JobStatus,
        output: &str,
    ) -> Result<(), StoreError> {
        validate_job_name(name)?;
        let record = ExecutionRecord::new(name, status, output);

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cron_history (name, timestamp, status, output) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        record.name,
                        format_timestamp(record.timestamp),
                        record.status.code(),
                        record.output
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(query_error)
    }

    async fn count_execution_history(&self, query: &HistoryQuery) -> Result<usize, StoreError> {
        let (filter, values) = history_filter(query);
        let sql = format!("SELECT COUNT(*) FROM cron_history{}", filter);

        let count: i64 = self
            .conn
            .call(move |conn| {
                let count = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
                Ok(count)
            })
            .await
            .map_err(query_error)?;

        usize::try_from(count).map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn get_execution_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<ExecutionRecord>, StoreError> {
        let (filter, mut values) = history_filter(query);
        let direction = match query.sort {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            "SELECT name, timestamp, status, output FROM cron_history{} \
             ORDER BY timestamp {dir}, id {dir} LIMIT ? OFFSET ?",
            filter,
            dir = direction
        );
        values.push(Value::Integer(i64::try_from(query.limit).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(query.offset).unwrap_or(i64::MAX)));

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(values.iter()), |row| {
                        Ok(ExecutionRecord {
                            name: row.get(0)?,
                            timestamp: timestamp_at(row, 1)?,
                            status: status_at(row, 2)?,
                            output: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(query_error)
    }

    async fn get_collect_settings(&self) -> Result<CollectSettings, StoreError> {
        let settings = self
            .conn
            .call(|conn| {
                let settings = conn
                    .query_row(
                        "SELECT max_repos, resource, since, spoken_language_code, period, language,
                             updated_at FROM collect_settings WHERE id = 1",
                        [],
                        |row| {
                            Ok(CollectSettings {
                                max_repos: row.get(0)?,
                                resource: row.get(1)?,
                                since: row.get(2)?,
                                spoken_language_code: row.get(3)?,
                                period: row.get(4)?,
                                language: row.get(5)?,
                                updated_at: timestamp_at(row, 6)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(settings)
            })
            .await
            .map_err(query_error)?;

        settings.ok_or_else(|| StoreError::NotFound("collect settings".to_string()))
    }

    async fn update_collect_settings(&self, settings: &CollectSettings) -> Result<(), StoreError> {
        let s = settings.clone();
        let now = format_timestamp(Utc::now());

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO collect_settings (id, max_repos, resource, since,
                         spoken_language_code, period, language, updated_at)
                     VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET max_repos = excluded.max_repos,
                         resource = excluded.resource, since = excluded.since,
                         spoken_language_code = excluded.spoken_language_code,
                         period = excluded.period, language = excluded.language,
                         updated_at = excluded.updated_at",
                    params![
                        s.max_repos,
                        s.resource,
                        s.since,
                        s.spoken_language_code,
                        s.period,
                        s.language,
                        now
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(query_error)
    }

    async fn get_prompt_settings(&self) -> Result<PromptSettings, StoreError> {
        let settings = self
            .conn
            .call(|conn| Ok(conn.query_row(SELECT_PROMPT, [], prompt_from_row).optional()?))
            .await
            .map_err(query_error)?;

        settings.ok_or_else(|| StoreError::NotFound("prompt settings".to_string()))
    }

    async fn update_prompt_settings(
        &self,
        update: &PromptSettingsUpdate,
    ) -> Result<PromptSettings, StoreError> {
        let update = update.clone();

        let settings = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let current = tx.query_row(SELECT_PROMPT, [], prompt_from_row).optional()?;
                let updated = match current {
                    Some(mut settings) => {
                        update.apply(&mut settings);
                        write_prompt(&tx, &settings)?;
                        Some(settings)
                    }
                    None => None,
                };
                tx.commit()?;
                Ok(updated)
            })
            .await
            .map_err(query_error)?;

        settings.ok_or_else(|| StoreError::NotFound("prompt settings".to_string()))
    }

    async fn get_endpoint(&self, name: &str) -> Result<Option<EndpointConfig>, StoreError> {
        let name = name.to_string();
        let raw: Option<String> = self
            .conn
            .call(move |conn| {
                let raw = conn
                    .query_row("SELECT config FROM api_configs WHERE name = ?1", [&name], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(raw)
            })
            .await
            .map_err(query_error)?;

        raw.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    async fn get_all_endpoints(&self) -> Result<Vec<EndpointConfig>, StoreError> {
        let rows: Vec<String> = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT config FROM api_configs ORDER BY name")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }

    async fn save_endpoint(&self, endpoint: &EndpointConfig) -> Result<(), StoreError> {
        if endpoint.name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "endpoint name cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let mut saved = endpoint.clone();
        saved.updated_at = Some(now);
        let json = serde_json::to_string(&saved)?;
        let name = saved.name;
        let now = format_timestamp(now);

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO api_configs (name, config, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET config = excluded.config,
                         updated_at = excluded.updated_at",
                    params![name, json, now],
                )?;
                Ok(())
            })
            .await
            .map_err(query_error)
    }

    async fn delete_endpoint(&self, name: &str) -> Result<(), StoreError> {
        let key = name.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM api_configs WHERE name = ?1", [&key])?))
            .await
            .map_err(query_error)?;

        if deleted == 0 {
            return Err(StoreError::NotFound(format!("endpoint '{}'", name)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
