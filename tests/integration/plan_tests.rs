//! Integration tests for structure detection and profile caching

use std::fs;
use std::path::Path;
use sumi_sweep::config::{parse_config, Config};
use sumi_sweep::plan::{
    derive_pattern, page_url, prepare_plan, Plan, ProfileStore, PLAN_FILE_NAME,
};
use sumi_sweep::render::{FixtureRenderer, RenderedPage};
use tempfile::TempDir;
use url::Url;

fn create_test_config(output: &Path) -> Config {
    parse_config(&format!(
        r#"
        [crawler]
        start-urls = ["https://shop.test/"]

        [output]
        directory = '{}'

        [structure]
        enabled = true
        "#,
        output.display()
    ))
    .expect("test config parses")
}

fn shop_site() -> FixtureRenderer {
    FixtureRenderer::new()
        .with_page(
            "https://shop.test/",
            ["/catalog-shoes", "/catalog-bags", "/item-1001.html"],
        )
        .with_page(
            "https://shop.test/catalog-shoes",
            ["/item-2001.html", "/item-2002.html", "/about"],
        )
        .with_page("https://shop.test/catalog-bags", ["/item-3001.html"])
}

#[tokio::test]
async fn test_shop_scenario() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let plan = prepare_plan(&config, &shop_site(), false).await.unwrap();

    assert_eq!(plan.root, "https://shop.test/");
    assert_eq!(
        plan.categories,
        vec![
            "https://shop.test/catalog-bags",
            "https://shop.test/catalog-shoes"
        ]
    );
    assert!(!plan.product_list.is_empty());
    assert_eq!(
        plan.category_products["https://shop.test/catalog-bags"],
        vec!["https://shop.test/item-3001.html"]
    );
    assert_eq!(
        plan.origin_category("https://shop.test/item-2001.html"),
        Some("https://shop.test/catalog-shoes")
    );
    assert!(plan.verify_hash());

    let written: Plan =
        serde_json::from_str(&fs::read_to_string(config.crawl_dir().join(PLAN_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(written, plan);
    assert!(ProfileStore::new(config.profiles_dir())
        .profile_path("shop.test")
        .exists());
}

#[tokio::test]
async fn test_planning_twice_yields_same_hash() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();

    let first = prepare_plan(&create_test_config(first_dir.path()), &shop_site(), false)
        .await
        .unwrap();
    let second = prepare_plan(&create_test_config(second_dir.path()), &shop_site(), false)
        .await
        .unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(first.categories, second.categories);
    assert_eq!(first.product_list, second.product_list);
}

#[tokio::test]
async fn test_cached_profile_is_reused() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let original = prepare_plan(&config, &shop_site(), false).await.unwrap();

    // The site is gone, the profile still answers
    let offline = FixtureRenderer::new();
    let reused = prepare_plan(&config, &offline, false).await.unwrap();

    assert_eq!(reused, original);
    assert!(offline.rendered().is_empty());
}

#[tokio::test]
async fn test_force_rebuild_probes_again() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    prepare_plan(&config, &shop_site(), false).await.unwrap();

    let offline = FixtureRenderer::new();
    let rebuilt = prepare_plan(&config, &offline, true).await.unwrap();

    assert!(rebuilt.categories.is_empty());
    assert_eq!(offline.rendered(), vec!["https://shop.test/"]);
}

#[tokio::test]
async fn test_tampered_profile_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    prepare_plan(&config, &shop_site(), false).await.unwrap();

    let path = ProfileStore::new(config.profiles_dir()).profile_path("shop.test");
    let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    json["categories"] = serde_json::json!(["https://shop.test/catalog-hats"]);
    fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

    let offline = FixtureRenderer::new();
    let plan = prepare_plan(&config, &offline, false).await.unwrap();

    assert!(plan.categories.is_empty());
    assert!(!offline.rendered().is_empty());
}

#[tokio::test]
async fn test_paginated_category_is_harvested() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let first_page = RenderedPage {
        outbound_hrefs: vec!["/item-1.html".to_string()],
        pagination_hints: vec!["https://shop.test/catalog-shoes/page/2".to_string()],
        ..Default::default()
    };
    let site = FixtureRenderer::new()
        .with_page("https://shop.test/", ["/catalog-shoes"])
        .with_render("https://shop.test/catalog-shoes", first_page)
        .with_page("https://shop.test/catalog-shoes/page/2", ["/item-2.html"])
        .with_page("https://shop.test/catalog-shoes/page/3", ["/item-3.html"]);

    let plan = prepare_plan(&config, &site, false).await.unwrap();

    let hint = &plan.pagination["https://shop.test/catalog-shoes"];
    assert_eq!(hint.pattern_hint, "https://shop.test/catalog-shoes/page/{N}");
    for product in [
        "https://shop.test/item-1.html",
        "https://shop.test/item-2.html",
        "https://shop.test/item-3.html",
    ] {
        assert!(plan.product_list.iter().any(|p| p == product), "missing {}", product);
    }
}

#[test]
fn test_pagination_derivation() {
    let category = Url::parse("https://x.test/cat").unwrap();

    let query = Url::parse("https://x.test/cat?page=2").unwrap();
    let template = derive_pattern(&category, &query).unwrap();
    assert_eq!(template, "https://x.test/cat?page={N}");
    assert_eq!(
        page_url(&template, 4).unwrap().as_str(),
        "https://x.test/cat?page=4"
    );

    let path = Url::parse("https://x.test/cat/page/2").unwrap();
    assert_eq!(
        derive_pattern(&category, &path).unwrap(),
        "https://x.test/cat/page/{N}"
    );

    let foreign = Url::parse("https://y.test/cat?page=2").unwrap();
    assert_eq!(derive_pattern(&category, &foreign), None);
}

#[test]
fn test_plan_hash_depends_on_content_and_order() {
    let root = "https://shop.test/";
    let categories = vec![
        "https://shop.test/catalog-bags".to_string(),
        "https://shop.test/catalog-shoes".to_string(),
    ];
    let products = vec!["https://shop.test/item-1.html".to_string()];

    let hash = Plan::compute_hash(root, &categories, &products);
    assert_eq!(hash, Plan::compute_hash(root, &categories, &products));
    assert_eq!(hash.len(), 64);

    let reversed: Vec<String> = categories.iter().rev().cloned().collect();
    assert_ne!(hash, Plan::compute_hash(root, &reversed, &products));
    assert_ne!(hash, Plan::compute_hash(root, &categories, &[]));
}
