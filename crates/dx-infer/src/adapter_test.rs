use super::*;
use crate::test_utils::{RecordingSleeper, ScriptedService};
use dx_core::CacheConfig;

fn adapter(service: Arc<ScriptedService>) -> (GenerativeAdapter, Arc<RecordingSleeper>) {
    let config = Config::default();
    let cache = Arc::new(ConversionCache::new(&CacheConfig::default()));
    let sleeper = Arc::new(RecordingSleeper::new());
    let adapter = GenerativeAdapter::new(&config, service, cache)
        .unwrap()
        .with_sleeper(sleeper.clone());
    (adapter, sleeper)
}

fn request(sql: &str) -> GenerativeRequest<'_> {
    GenerativeRequest {
        sql,
        source: Dialect::Oracle,
        target: Dialect::Postgres,
        complexity: 2,
    }
}

#[tokio::test]
async fn test_convert_cleans_and_caches() {
    let service = Arc::new(ScriptedService::new().respond("```sql\nSELECT CURRENT_DATE;\n```"));
    let (adapter, _) = adapter(service.clone());
    let cancel = CancellationToken::new();

    let out = adapter
        .convert(&request("SELECT SYSDATE FROM dual"), &cancel)
        .await
        .unwrap();
    assert_eq!(out.text, "SELECT CURRENT_DATE;");
    assert_eq!(out.prompt, Some(PromptKind::OracleToPostgres));
    assert!(!out.cache_hit);

    let again = adapter
        .convert(&request("SELECT  SYSDATE\nFROM dual"), &cancel)
        .await
        .unwrap();
    assert!(again.cache_hit);
    assert_eq!(again.text, "SELECT CURRENT_DATE;");
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_rejected_response_retries_with_basic_prompt() {
    let service = Arc::new(
        ScriptedService::new()
            .respond("Sorry, I cannot help with that.")
            .respond("SELECT CURRENT_DATE;"),
    );
    let (adapter, _) = adapter(service.clone());

    let out = adapter
        .convert(&request("SELECT SYSDATE FROM dual"), &CancellationToken::new())
        .await
        .unwrap();
    assert!(out.used_fallback_prompt);
    assert_eq!(out.prompt, Some(PromptKind::BasicConversion));
    let prompts = service.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(
        prompts[1].starts_with("Convert the following SQL from Oracle to PostgreSQL"),
        "got: {}",
        prompts[1]
    );
}

#[tokio::test]
async fn test_second_rejection_surfaces() {
    let service = Arc::new(ScriptedService::new().with_default("no sql here"));
    let (adapter, _) = adapter(service.clone());

    let err = adapter
        .convert(&request("SELECT 1 FROM dual"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), crate::error::InferenceErrorKind::InvalidResponse);
    assert_eq!(service.calls(), 2);
    assert!(adapter.cache().is_empty());
}

#[tokio::test]
async fn test_transient_errors_back_off() {
    let service = Arc::new(
        ScriptedService::new()
            .fail(InferenceError::Timeout { secs: 30 })
            .fail(InferenceError::RateLimit("429".to_string()))
            .respond("SELECT 1;"),
    );
    let (adapter, sleeper) = adapter(service.clone());

    let out = adapter
        .convert(&request("SELECT 1 FROM dual"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(out.text, "SELECT 1;");
    assert_eq!(
        sleeper.delays(),
        vec![
            std::time::Duration::from_millis(1000),
            std::time::Duration::from_millis(2000)
        ]
    );
}

#[tokio::test]
async fn test_authentication_error_not_retried() {
    let service = Arc::new(
        ScriptedService::new().fail(InferenceError::Authentication("401".to_string())),
    );
    let (adapter, sleeper) = adapter(service.clone());

    let err = adapter
        .convert(&request("SELECT 1 FROM dual"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_critical());
    assert_eq!(service.calls(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_recover_uses_error_prompt() {
    let service = Arc::new(ScriptedService::new().respond("SELECT 1;"));
    let (adapter, _) = adapter(service.clone());

    let out = adapter
        .recover(
            "SELEC 1",
            Dialect::MySql,
            Dialect::Postgres,
            "[S001] Expected an SQL statement",
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(out.prompt, Some(PromptKind::ErrorRecovery));
    assert!(service.prompts()[0].contains("[S001] Expected an SQL statement"));
    // Recovery output is never cached
    assert!(adapter.cache().is_empty());
}
