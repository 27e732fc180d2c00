//! CLI command implementations
//!
//! Each invocation opens one store, runs one command and writes one JSON
//! response to stdout. Failures are written as an error response and
//! returned so the process exits non-zero.

use std::io::{self, Read};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::cache::MemoCache;
use crate::document::{Document, Pick};
use crate::observability::{init_logging, Event};
use crate::schema::{SchemaLoader, SchemaRegistry};
use crate::store::{DocumentStore, StoreConfig, Where};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_object, read_document, write_error, write_response};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging("info");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_command(cli))
}

/// Open the configured store, run the command and write the response
pub async fn run_command(cli: Cli) -> CliResult<()> {
    let mut stdout = io::stdout();

    let result = match open_store(&cli).await {
        Ok(store) => execute(&store, cli.command, io::stdin()).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(data) => write_response(&mut stdout, data),
        Err(err) => {
            write_error(&mut stdout, err.code_str(), err.message())?;
            Err(err)
        }
    }
}

/// Build the store from the config file and command line overrides
pub async fn open_store(cli: &Cli) -> CliResult<DocumentStore> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(doc_type) = &cli.doc_type {
        config.doc_type = doc_type.clone();
    }
    if let Some(storage) = &cli.storage {
        config.storage_path = storage.clone();
    }
    config.validate()?;

    let mut registry = SchemaRegistry::builtin();
    if let Some(dir) = &config.schema_dir {
        let loaded = SchemaLoader::new(dir).load_into(&mut registry)?;
        info!(
            event = %Event::SchemasLoaded,
            schema_dir = %dir.display(),
            count = loaded,
            "type definitions loaded"
        );
    }

    let cache = Arc::new(MemoCache::new(config.cache_config()));
    let options = config.into_options(&registry)?;
    Ok(DocumentStore::open(options, cache).await?)
}

/// Run one command against `store`, reading documents from `input`
pub async fn execute<R: Read>(store: &DocumentStore, command: Command, input: R) -> CliResult<Value> {
    let data = match command {
        Command::Keys => json!(store.keys().await?),
        Command::Count => json!(store.count().await?),
        Command::Schema => json!(store.schema_description()),
        Command::Get { id, pick } => store.get(&id, &parse_pick(pick)).await?.into_value(),
        Command::Create => store.create(read_document(input)?).await?.into_value(),
        Command::Update => store.update(read_document(input)?).await?.into_value(),
        Command::Stock { merge } => store.stock(read_document(input)?, merge).await?.into_value(),
        Command::Remove { id } => store.remove(&id).await?.into_value(),
        Command::RemoveAll => documents(store.remove_all().await?),
        Command::Clone {
            from,
            to,
            overrides,
        } => {
            let overrides = overrides.as_deref().map(parse_object).transpose()?;
            store
                .clone_document(&from, &to, overrides.as_ref())
                .await?
                .into_value()
        }
        Command::Rename { from, to } => store.rename(&from, &to).await?.into_value(),
        Command::Restore { id } => store.restore(&id).await?.into_value(),
        Command::Random { count, pick } => documents(store.random(count, &parse_pick(pick)).await?),
        Command::Find { query, logic, pick } => {
            let query = match query {
                Some(query) => parse_where(&query)?,
                None => Where::new(),
            };
            documents(store.find(&query, logic, &parse_pick(pick)).await?)
        }
    };
    Ok(data)
}

fn parse_pick(pick: Option<String>) -> Pick {
    pick.as_deref().map(Pick::parse).unwrap_or_else(Pick::all)
}

fn parse_where(query: &str) -> CliResult<Where> {
    let value: Value = serde_json::from_str(query)?;
    Where::from_object(&value).ok_or_else(|| CliError::invalid_input("where must be a JSON object"))
}

fn documents(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(Document::into_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cli(temp: &TempDir, command: Command) -> Cli {
        Cli {
            config: None,
            doc_type: None,
            storage: Some(temp.path().join("memo")),
            command,
        }
    }

    async fn store(temp: &TempDir) -> DocumentStore {
        open_store(&cli(temp, Command::Keys)).await.unwrap()
    }

    fn no_input() -> &'static [u8] {
        b""
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let created = execute(
            &store,
            Command::Create,
            &br#"{"id": "t1", "content": "hello"}"#[..],
        )
        .await
        .unwrap();
        assert_eq!(created["type"], "memo");

        let fetched = execute(
            &store,
            Command::Get {
                id: "t1".into(),
                pick: Some("id|content".into()),
            },
            no_input(),
        )
        .await
        .unwrap();
        assert_eq!(fetched, json!({"id": "t1", "content": "hello"}));
    }

    #[tokio::test]
    async fn test_store_error_code() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let err = execute(&store, Command::Remove { id: "nope".into() }, no_input())
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "NOTFOUND");
    }

    #[tokio::test]
    async fn test_find_with_where() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        for body in [
            r#"{"id": "a", "author": "ann"}"#,
            r#"{"id": "b", "author": "bob"}"#,
        ] {
            execute(&store, Command::Create, body.as_bytes()).await.unwrap();
        }

        let found = execute(
            &store,
            Command::Find {
                query: Some(r#"{"author": "bob"}"#.into()),
                logic: Default::default(),
                pick: Some("id".into()),
            },
            no_input(),
        )
        .await
        .unwrap();
        assert_eq!(found, json!([{"id": "b"}]));
    }

    #[tokio::test]
    async fn test_clone_with_overrides() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        execute(&store, Command::Create, &br#"{"id": "a", "content": "x"}"#[..])
            .await
            .unwrap();
        let cloned = execute(
            &store,
            Command::Clone {
                from: "a".into(),
                to: "b".into(),
                overrides: Some(r#"{"content": "y"}"#.into()),
            },
            no_input(),
        )
        .await
        .unwrap();
        assert_eq!(cloned["id"], "b");
        assert_eq!(cloned["content"], "y");
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let err = execute(&store, Command::Create, &b"not json"[..])
            .await
            .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_unknown_type_is_config_error() {
        let temp = TempDir::new().unwrap();
        let mut cli = cli(&temp, Command::Keys);
        cli.doc_type = Some("invoice".into());

        let err = open_store(&cli).await.unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[tokio::test]
    async fn test_schema_dir_from_config() {
        let temp = TempDir::new().unwrap();
        let schema_dir = temp.path().join("types");
        std::fs::create_dir_all(&schema_dir).unwrap();
        std::fs::write(
            schema_dir.join("task.json"),
            r#"{"type": "task", "fields": [{"name": "id", "type": "string"}, {"name": "done", "type": "bool"}], "defaults": {"done": false}}"#,
        )
        .unwrap();

        let config_path: PathBuf = temp.path().join("memodb.json");
        std::fs::write(
            &config_path,
            json!({
                "doc_type": "task",
                "storage_path": temp.path().join("tasks"),
                "schema_dir": schema_dir,
            })
            .to_string(),
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            doc_type: None,
            storage: None,
            command: Command::Schema,
        };
        let store = open_store(&cli).await.unwrap();
        let created = execute(&store, Command::Create, &br#"{"id": "t1"}"#[..])
            .await
            .unwrap();
        assert_eq!(created["done"], false);
        assert_eq!(created["type"], "task");
    }
}
