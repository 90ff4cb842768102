use nyetcooking::{fetch_recipe, RecipeError};

fn create_recipe_html(json_ld: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Recipe Page</title>
            <script type="application/ld+json">
                {json_ld}
            </script>
        </head>
        <body>
            <h1>Recipe</h1>
        </body>
        </html>
        "#
    )
}

async fn serve(server: &mut mockito::Server, path: &str, body: String) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_graph_with_sections_and_entities() {
    let mut server = mockito::Server::new_async().await;
    let json_ld = r#"
    {
        "@context": "https://schema.org",
        "@graph": [
            { "@type": "WebSite", "name": "Example Kitchen" },
            { "@type": "BreadcrumbList", "itemListElement": [] },
            {
                "@type": ["Recipe", "NewsArticle"],
                "name": "Mac &amp;amp; Cheese",
                "description": "Creamy &quot;baked&quot; pasta",
                "author": [{ "@type": "Person", "name": "Ana" }, { "@type": "Person", "name": "Ben" }],
                "image": { "@type": "ImageObject", "url": "https://example.com/mac.jpg" },
                "recipeYield": ["4", "4 servings"],
                "prepTime": "PT10M",
                "cookTime": "PT35M",
                "totalTime": "PT45M",
                "recipeIngredient": ["1 lb macaroni", "2 cups cheddar", "2 cups cheddar"],
                "recipeInstructions": [
                    {
                        "@type": "HowToSection",
                        "name": "Pasta",
                        "itemListElement": [
                            { "@type": "HowToStep", "text": "Boil the pasta." },
                            { "@type": "HowToStep", "text": "Drain." }
                        ]
                    },
                    {
                        "@type": "HowToSection",
                        "name": "Sauce",
                        "itemListElement": [
                            { "@type": "HowToStep", "text": "Melt the cheese." }
                        ]
                    }
                ],
                "aggregateRating": { "@type": "AggregateRating", "ratingValue": "4.7", "ratingCount": "212" }
            }
        ]
    }
    "#;
    let mock = serve(&mut server, "/mac", create_recipe_html(json_ld)).await;

    let recipe = fetch_recipe(&format!("{}/mac", server.url())).await.unwrap();

    assert_eq!(recipe.title, "Mac & Cheese");
    assert_eq!(recipe.description, "Creamy \"baked\" pasta");
    assert_eq!(recipe.author.as_deref(), Some("Ana, Ben"));
    assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/mac.jpg"));
    assert_eq!(recipe.recipe_yield.as_deref(), Some("4 servings"));
    assert_eq!(
        recipe.ingredients,
        vec!["1 lb macaroni", "2 cups cheddar", "2 cups cheddar"]
    );
    assert_eq!(
        recipe.instructions,
        vec!["Boil the pasta.", "Drain.", "Melt the cheese."]
    );
    assert_eq!(recipe.duration(), "45 minutes");
    assert_eq!(recipe.duration_raw.as_deref(), Some("PT45M"));
    let rating = recipe.rating.unwrap();
    assert_eq!(rating.value, 4.7);
    assert_eq!(rating.count, Some(212));
    assert_eq!(recipe.source_url, format!("{}/mac", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_single_step_object_instructions() {
    let mut server = mockito::Server::new_async().await;
    let json_ld = r#"
    {
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": "Toast",
        "recipeIngredient": "1 slice bread",
        "recipeInstructions": { "@type": "HowToStep", "text": "Toast the bread until golden." }
    }
    "#;
    serve(&mut server, "/toast", create_recipe_html(json_ld)).await;

    let recipe = fetch_recipe(&format!("{}/toast", server.url())).await.unwrap();

    assert_eq!(recipe.ingredients, vec!["1 slice bread"]);
    assert_eq!(recipe.instructions, vec!["Toast the bread until golden."]);
    assert!(recipe.instructions.iter().all(|s| !s.contains("@type")));
}

#[tokio::test]
async fn test_array_root_with_string_instructions_and_empty_fields() {
    let mut server = mockito::Server::new_async().await;
    let json_ld = r#"
    [
        { "@context": "https://schema.org", "@type": "Organization", "name": "Blog" },
        {
            "@context": "https://schema.org",
            "@type": "recipe",
            "name": "Shahi Paneer",
            "description": "",
            "image": ["https://example.com/a.jpg", "https://example.com/b.jpg"],
            "prepTime": "",
            "totalTime": "",
            "recipeYield": "",
            "recipeIngredient": ["300g paneer", "", "4 roma tomatoes"],
            "recipeInstructions": "Chop vegetables.\nCook the dish.\n\nServe."
        }
    ]
    "#;
    serve(&mut server, "/paneer", create_recipe_html(json_ld)).await;

    let recipe = fetch_recipe(&format!("{}/paneer", server.url())).await.unwrap();

    assert_eq!(recipe.title, "Shahi Paneer");
    assert_eq!(recipe.description, "");
    assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/a.jpg"));
    assert_eq!(recipe.ingredients, vec!["300g paneer", "4 roma tomatoes"]);
    assert_eq!(
        recipe.instructions,
        vec!["Chop vegetables.", "Cook the dish.", "Serve."]
    );
    assert_eq!(recipe.duration_raw, None);
    assert_eq!(recipe.duration(), "");
    assert_eq!(recipe.recipe_yield, None);
}

#[tokio::test]
async fn test_page_without_recipe_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/about")
        .with_status(200)
        .with_body("<html><head><title>About</title></head><body>No recipe.</body></html>")
        .expect(1)
        .create_async()
        .await;

    let result = fetch_recipe(&format!("{}/about", server.url())).await;

    assert!(matches!(result, Err(RecipeError::NoStructuredData { .. })));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let result = fetch_recipe(&format!("{}/missing", server.url())).await;

    match result {
        Err(RecipeError::FetchError { status, stage, .. }) => {
            assert_eq!(status, Some(404));
            assert_eq!(stage, "status");
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
    mock.assert_async().await;
}
