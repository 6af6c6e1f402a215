use bookshelf_app::bootstrap::run_until;
use bookshelf_kernel::settings::Settings;

#[tokio::test]
async fn service_starts_and_stops_cleanly() {
    let mut settings = Settings::default();
    settings.server.host = "127.0.0.1".to_string();
    settings.server.port = 0;

    run_until(settings, async {}).await.unwrap();
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut settings = Settings::default();
    settings.server.host = "127.0.0.1".to_string();
    settings.server.port = taken.local_addr().unwrap().port();

    let err = run_until(settings, async {}).await.unwrap_err();
    assert!(err.to_string().contains("failed to bind"));
}

#[test]
fn books_module_is_registered() {
    let registry = bookshelf_app::build_registry();
    assert!(registry.get_module("books").is_some());
}
