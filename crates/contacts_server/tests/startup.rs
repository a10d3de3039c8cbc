use contacts_core::StoreConfig;
use contacts_server::config::Config;
use contacts_server::error::StartupError;
use contacts_server::serve;
use std::path::PathBuf;
use tokio::net::TcpListener;

fn config(port: u16, store: StoreConfig) -> Config {
    Config {
        port,
        store,
        public_dir: PathBuf::from("public"),
        log_level: "info".to_string(),
        log_dir: None,
    }
}

#[tokio::test]
async fn occupied_port_fails_before_the_store_is_opened() {
    let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    // The store address is unreachable too; the bind error must win.
    let store = StoreConfig::new("/definitely/missing/contacts-dir", "contactsdb");
    let err = serve(config(port, store)).await.unwrap_err();

    assert!(matches!(err, StartupError::Io(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn unreachable_store_is_a_startup_error() {
    let store = StoreConfig::new("/definitely/missing/contacts-dir", "contactsdb");
    let err = serve(config(0, store)).await.unwrap_err();

    assert!(matches!(err, StartupError::Store(_)), "unexpected error: {err}");
}
