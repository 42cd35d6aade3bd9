//! Store and substitution integration tests
//!
//! Exercise the template lifecycle through the `EmailTemplateStore` trait
//! object returned by the factory, the way the HTTP layer uses it.

use std::collections::HashMap;
use std::sync::Arc;

use email_template_service::config::{ApiConfig, ServerConfig, Settings, StoreConfig};
use email_template_service::template::{
    create_template_store, CreateEmailTemplateRequest, EmailTemplateStore, TemplateError, Token,
};

async fn memory_store() -> Arc<dyn EmailTemplateStore> {
    let settings = Settings {
        server: ServerConfig::default(),
        store: StoreConfig {
            backend: "memory".to_string(),
            ..Default::default()
        },
        database: None,
        api: ApiConfig::default(),
    };
    create_template_store(&settings, None).await.unwrap()
}

fn request(name: &str) -> CreateEmailTemplateRequest {
    CreateEmailTemplateRequest {
        name: name.to_string(),
        subject: "Hi {{NAME}}".to_string(),
        html_content: "<h1>Welcome {{NAME}}</h1><p>Your code is {{CODE}}</p>".to_string(),
        plain_text_content: "Welcome {{NAME}}, your code is {{CODE}}".to_string(),
        tokens: Some(vec![Token::new("{{CODE}}", 1), Token::new("{{NAME}}", 0)]),
    }
}

#[tokio::test]
async fn test_welcome_lifecycle() {
    let store = memory_store().await;

    let created = store
        .create(request("welcome").into_template().unwrap())
        .await
        .unwrap();

    let mut template = store.get(&created.id).await.unwrap();

    let values = HashMap::from([
        ("{{NAME}}".to_string(), "Alice".to_string()),
        ("{{CODE}}".to_string(), "1234".to_string()),
    ]);
    template.apply_substitutions(&values).unwrap();

    assert_eq!(template.subject, "Hi Alice");
    assert_eq!(
        template.html_content,
        "<h1>Welcome Alice</h1><p>Your code is 1234</p>"
    );
    assert_eq!(template.plain_text_content, "Welcome Alice, your code is 1234");

    // Substitution works on a copy; the stored record is unchanged
    let stored = store.get(&created.id).await.unwrap();
    assert_eq!(stored.subject, "Hi {{NAME}}");

    store.delete(&created.id).await.unwrap();
    assert!(matches!(
        store.get(&created.id).await,
        Err(TemplateError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_substitution_leaves_template_intact() {
    let store = memory_store().await;
    let created = store
        .create(request("welcome").into_template().unwrap())
        .await
        .unwrap();

    let mut template = store.get(&created.id).await.unwrap();
    let before = template.clone();

    let partial = HashMap::from([("{{NAME}}".to_string(), "Alice".to_string())]);
    let err = template.apply_substitutions(&partial).unwrap_err();

    assert!(matches!(err, TemplateError::SubstitutionTokenMismatch(token) if token == "{{CODE}}"));
    assert_eq!(template, before);
}

#[tokio::test]
async fn test_names_unique_across_lifecycle() {
    let store = memory_store().await;

    let first = store
        .create(request("welcome").into_template().unwrap())
        .await
        .unwrap();

    let second = request("welcome").into_template().unwrap();
    assert_ne!(first.id, second.id);
    assert!(matches!(
        store.create(second).await,
        Err(TemplateError::NameConflict(_))
    ));

    store.delete(&first.id).await.unwrap();
    let third = store
        .create(request("welcome").into_template().unwrap())
        .await
        .unwrap();

    assert_eq!(store.get_by_name("welcome").await.unwrap().id, third.id);
    assert_eq!(store.list(Some("welcome")).await.unwrap().len(), 1);
}
