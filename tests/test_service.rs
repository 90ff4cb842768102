use nyetcooking::config::FetchConfig;
use nyetcooking::{
    CacheManager, HttpRecipeSource, RecipeError, RecipeService, RetryPolicy, RetryingClient,
};
use std::time::Duration;

const PIE_PAGE: &str = r#"
<html>
<head>
    <script type="application/ld+json">
    {
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": "Apple Pie",
        "recipeIngredient": ["6 apples", "1 crust"],
        "recipeInstructions": [
            { "@type": "HowToStep", "text": "Fill the crust." },
            { "@type": "HowToStep", "text": "Bake." }
        ],
        "totalTime": "PT1H15M"
    }
    </script>
</head>
<body></body>
</html>
"#;

fn service() -> RecipeService<HttpRecipeSource> {
    let source = HttpRecipeSource::new(&FetchConfig::default()).unwrap();
    let client = RetryingClient::new(source, RetryPolicy::new(3, Duration::from_millis(5), 2.0));
    RecipeService::new(CacheManager::in_memory(), client, Duration::from_secs(30))
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/pie")
        .with_status(200)
        .with_body(PIE_PAGE)
        .expect(1)
        .create_async()
        .await;
    let svc = service();
    let url = format!("{}/pie", server.url());

    let (key, first) = svc.recipe_for_url(&url, false).await.unwrap();
    let (again, second) = svc.recipe_for_url(&url, false).await.unwrap();

    assert_eq!(key, again);
    assert_eq!(first, second);
    assert_eq!(first.title, "Apple Pie");
    assert!(key.ends_with("/pie"));
    assert!(key.starts_with("127.0.0.1:"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_refresh_bypasses_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/pie")
        .with_status(200)
        .with_body(PIE_PAGE)
        .expect(2)
        .create_async()
        .await;
    let svc = service();
    let url = format!("{}/pie", server.url());

    svc.recipe_for_url(&url, false).await.unwrap();
    svc.recipe_for_url(&url, true).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried_then_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/flaky")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;
    let svc = service();

    let result = svc
        .recipe_for_url(&format!("{}/flaky", server.url()), false)
        .await;

    assert!(matches!(
        result,
        Err(RecipeError::FetchError {
            status: Some(503),
            ..
        })
    ));
    assert!(svc.cache().keys().await.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let report = service().health();
    assert_eq!(report.status, "healthy");
    assert_eq!(report.cache_backend, "memory");
}
