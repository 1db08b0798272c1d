use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use catalog_admin::config::{AfterSubmit, UpdateMethod};
use catalog_admin::form_controller::{ProductFormController, SubmitOutcome};
use catalog_admin::http_gateway::HttpGateway;
use catalog_admin::navigator::Route;
use catalog_admin::product_form::{FormPhase, LoadOutcome, SubmitBlocked};
use catalog_admin::session::SessionStore;
use catalog_common::gateway::{GatewayError, ProductGateway};
use catalog_common::product::{ImageFile, Product, ProductCategory, ProductId};
use catalog_gateway_integration::harness::{Envelope, MockCatalog};
use catalog_gateway_integration::{accord, civic, init_tracing, RecordingNavigator};

fn controller(
    mock: &MockCatalog,
) -> ProductFormController<HttpGateway, RecordingNavigator> {
    let gateway = HttpGateway::new(mock.config()).unwrap();
    ProductFormController::new(gateway, RecordingNavigator::default())
}

#[tokio::test]
async fn edit_mode_hydrates_the_draft() {
    init_tracing();
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    let form = controller(&mock);

    let outcome = form.initialize(Some(ProductId::new("42"))).await;
    assert_eq!(outcome, LoadOutcome::Hydrated);
    assert_eq!(form.phase(), FormPhase::Ready);
    assert_eq!(
        form.draft(),
        Product {
            id: Some(ProductId::new("42")),
            name: "Civic".into(),
            price: Some(20000.0),
            model: "2020".into(),
            location: "Lagos".into(),
            category: Some(ProductCategory::Premium),
            is_featured: true,
            description: vec!["Low mileage".into(), "One owner".into()],
        }
    );

    // Same id again: no second request.
    assert_eq!(
        form.initialize(Some(ProductId::new("42"))).await,
        LoadOutcome::Skipped
    );
    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/products/42");
}

#[tokio::test]
async fn create_with_image_sends_multipart() {
    init_tracing();
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let form = controller(&mock);

    assert_eq!(form.initialize(None).await, LoadOutcome::CreateMode);
    form.edit(|f| {
        f.set_name("Corolla");
        f.set_price_text("15000").unwrap();
        f.set_model("2019");
        f.set_location("Accra");
        f.set_category(Some(ProductCategory::Featured));
        f.set_featured(true);
        assert!(f.add_description("Clean title"));
    });
    form.set_image(Some(ImageFile::new("corolla.png", "image/png", vec![1, 2, 3])));

    let SubmitOutcome::Saved {
        receipt,
        destination,
    } = form.submit().await
    else {
        panic!("expected a save");
    };
    assert_eq!(receipt.id, Some(ProductId::new("p1")));
    assert_eq!(receipt.message.as_deref(), Some("Product created"));
    assert_eq!(destination, Route::ProductList);
    assert_eq!(form.navigator().routes(), [Route::ProductList]);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let create = &requests[0];
    assert_eq!((create.method.as_str(), create.path.as_str()), ("POST", "/api/products"));
    assert!(create.is_multipart());
    assert_eq!(create.fields["name"], "Corolla");
    assert_eq!(create.fields["price"], "15000");
    assert_eq!(create.fields["category"], "Featured");
    assert_eq!(create.fields["isFeatured"], "true");
    assert_eq!(create.fields["description"], r#"["Clean title"]"#);
    let file = create.file.as_ref().expect("image part");
    assert_eq!(file.field, "imageFile");
    assert_eq!(file.file_name, "corolla.png");
    assert_eq!(file.content_type.as_deref(), Some("image/png"));
    assert_eq!(file.bytes, [1, 2, 3]);

    // Saved: the form is blank again.
    assert_eq!(form.draft(), Product::default());
    assert_eq!(form.phase(), FormPhase::Empty);
    assert_eq!(mock.product("p1").unwrap()["name"], "Corolla");
}

#[tokio::test]
async fn create_without_image_sends_json() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let form = controller(&mock);
    form.initialize(None).await;
    form.edit(|f| f.set_name("Yaris"));

    assert!(matches!(form.submit().await, SubmitOutcome::Saved { .. }));
    let requests = mock.requests();
    let create = &requests[0];
    assert!(!create.is_multipart());
    let body = create.json.as_ref().unwrap();
    assert_eq!(body["name"], "Yaris");
    assert!(body.get("id").is_none());
}

#[tokio::test]
async fn edit_submits_a_json_put() {
    init_tracing();
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    let form = controller(&mock);

    form.initialize(Some(ProductId::new("42"))).await;
    form.edit(|f| {
        f.set_price(Some(18500.0));
        f.remove_description(0);
    });

    assert!(matches!(form.submit().await, SubmitOutcome::Saved { .. }));

    let requests = mock.requests();
    let update = requests.last().unwrap();
    assert_eq!((update.method.as_str(), update.path.as_str()), ("PUT", "/api/products/42"));
    let body = update.json.as_ref().unwrap();
    assert_eq!(body["price"], 18500.0);
    assert_eq!(body["description"], json!(["One owner"]));
    assert!(body.get("id").is_none());

    let stored = mock.product("42").unwrap();
    assert_eq!(stored["price"], 18500.0);
    assert_eq!(stored["name"], "Civic");
}

#[tokio::test]
async fn update_method_is_configurable() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(accord());
    let mut config = mock.config();
    config.update_method = UpdateMethod::Patch;
    let form =
        ProductFormController::new(HttpGateway::new(config).unwrap(), RecordingNavigator::default());

    form.initialize(Some(ProductId::new("43"))).await;
    form.edit(|f| f.set_location("Kano"));
    assert!(matches!(form.submit().await, SubmitOutcome::Saved { .. }));

    assert_eq!(mock.requests().last().unwrap().method, "PATCH");
    assert_eq!(mock.product("43").unwrap()["location"], "Kano");
}

#[tokio::test]
async fn detail_destination_uses_the_new_id() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let form = controller(&mock).with_after_submit(AfterSubmit::ProductDetail);
    form.initialize(None).await;
    form.edit(|f| f.set_name("Sienna"));

    form.submit().await;
    assert_eq!(
        form.navigator().routes(),
        [Route::ProductDetail {
            id: ProductId::new("p1")
        }]
    );
}

#[tokio::test]
async fn bearer_token_from_the_session_is_attached() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    let session = Arc::new(SessionStore::in_memory());
    let gateway = HttpGateway::new(mock.config())
        .unwrap()
        .with_credentials(session.clone());

    gateway.fetch_by_id(&ProductId::new("42")).await.unwrap();
    session.sign_in("tok-7").unwrap();
    gateway.fetch_by_id(&ProductId::new("42")).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer tok-7"));
}

#[tokio::test]
async fn bare_responses_need_no_envelope() {
    let mock = MockCatalog::start(Envelope::Bare).await;
    mock.insert_product(accord());
    let form = controller(&mock).with_after_submit(AfterSubmit::ProductDetail);

    assert_eq!(
        form.initialize(Some(ProductId::new("43"))).await,
        LoadOutcome::Hydrated
    );
    assert_eq!(form.draft().price, Some(31000.0));
    assert_eq!(form.draft().category, Some(ProductCategory::Classic));

    form.initialize(None).await;
    form.edit(|f| f.set_name("Pilot"));
    let SubmitOutcome::Saved { receipt, .. } = form.submit().await else {
        panic!("expected a save");
    };
    assert_eq!(receipt.id, Some(ProductId::new("p1")));
    assert_eq!(receipt.message, None);
}

#[tokio::test]
async fn rejected_save_keeps_the_draft() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let form = controller(&mock);
    form.initialize(None).await;
    form.edit(|f| {
        f.set_name("Camry");
        f.add_description("Sunroof");
    });
    mock.fail_writes(true);

    assert_eq!(
        form.submit().await,
        SubmitOutcome::Failed(GatewayError::Rejected("rejected by mock".into()))
    );
    assert_eq!(form.draft().name, "Camry");
    assert_eq!(form.draft().description, ["Sunroof"]);
    assert_eq!(form.phase(), FormPhase::Ready);
    assert!(form.navigator().routes().is_empty());

    mock.fail_writes(false);
    assert!(matches!(form.submit().await, SubmitOutcome::Saved { .. }));
    assert_eq!(form.navigator().routes(), [Route::ProductList]);
}

#[tokio::test]
async fn server_error_without_envelope_is_a_status_failure() {
    let mock = MockCatalog::start(Envelope::Bare).await;
    let form = controller(&mock);
    form.initialize(None).await;
    form.edit(|f| f.set_name("Camry"));
    mock.fail_writes(true);

    let SubmitOutcome::Failed(GatewayError::Status { status, .. }) = form.submit().await else {
        panic!("expected an HTTP status failure");
    };
    assert_eq!(status, 500);
    assert_eq!(form.draft().name, "Camry");
}

#[tokio::test]
async fn missing_product_fails_the_load() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let form = controller(&mock);

    let outcome = form.initialize(Some(ProductId::new("404"))).await;
    assert!(matches!(
        outcome,
        LoadOutcome::Failed(GatewayError::Status { status: 404, .. })
    ));
    assert_eq!(form.draft().name, "");

    assert_eq!(
        form.submit().await,
        SubmitOutcome::Blocked(SubmitBlocked::NotHydrated)
    );
    assert!(mock.requests().iter().all(|r| r.method == "GET"));
}

#[tokio::test]
async fn late_response_for_a_superseded_id_is_dropped() {
    init_tracing();
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    mock.insert_product(accord());
    mock.delay_fetch("42", Duration::from_millis(300));
    let form = controller(&mock);

    let (first, second) = tokio::join!(form.initialize(Some(ProductId::new("42"))), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        form.initialize(Some(ProductId::new("43"))).await
    });

    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Hydrated);
    assert_eq!(form.draft().name, "Accord");
    assert_eq!(form.draft().id, Some(ProductId::new("43")));
}

#[tokio::test]
async fn teardown_discards_an_in_flight_load() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    mock.delay_fetch("42", Duration::from_millis(200));
    let form = controller(&mock);

    let (outcome, ()) = tokio::join!(form.initialize(Some(ProductId::new("42"))), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        form.teardown();
    });

    assert_eq!(outcome, LoadOutcome::Stale);
    assert_eq!(form.draft(), Product::default());
}
