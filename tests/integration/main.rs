//! Integration tests for precache

mod worker_tests {
    use async_trait::async_trait;
    use precache::cache::{CacheStorage, DiskCacheStorage, MemoryCacheStorage};
    use precache::host::{WorkerHost, WorkerState};
    use precache::http::{Request, Response};
    use precache::network::Network;
    use precache::worker::{FetchSource, ServiceWorker, CACHE_NAME};
    use precache::{PrecacheError, PrecacheResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use url::Url;

    const ORIGIN: &str = "http://spese.test";

    /// Network that serves a fixed site and counts calls
    struct CountingNetwork {
        pages: HashMap<String, Response>,
        calls: AtomicUsize,
    }

    impl CountingNetwork {
        fn site() -> Self {
            let mut pages = HashMap::new();
            pages.insert(
                format!("{}/", ORIGIN),
                Response::new(200, "<html>Gestione spese</html>")
                    .with_header("Content-Type", "text/html; charset=utf-8"),
            );
            pages.insert(
                format!("{}/static/style.css", ORIGIN),
                Response::new(200, "body { font-family: sans-serif }")
                    .with_header("Content-Type", "text/css"),
            );
            pages.insert(
                format!("{}/api/data", ORIGIN),
                Response::new(200, r#"[{"importo": 12.5}]"#)
                    .with_header("Content-Type", "application/json"),
            );
            Self {
                pages,
                calls: AtomicUsize::new(0),
            }
        }

        fn without(mut self, path: &str) -> Self {
            self.pages.remove(&format!("{}{}", ORIGIN, path));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Network for CountingNetwork {
        async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(request.url.as_str()) {
                Some(response) => Ok(response.clone()),
                None => Ok(Response::new(404, "Not Found")),
            }
        }
    }

    fn get(path: &str) -> Request {
        Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
    }

    fn worker(storage: Arc<dyn CacheStorage>, network: Arc<CountingNetwork>) -> ServiceWorker {
        ServiceWorker::new(Url::parse(ORIGIN).unwrap(), storage, network)
    }

    #[tokio::test]
    async fn scenario_install_caches_two_entries() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(CountingNetwork::site());

        worker(storage.clone(), network.clone()).on_install().await.unwrap();

        let cache = storage.open(CACHE_NAME).await.unwrap();
        let paths: Vec<String> = cache
            .entries()
            .await
            .unwrap()
            .iter()
            .map(|e| Url::parse(&e.url).unwrap().path().to_string())
            .collect();
        assert_eq!(paths, vec!["/", "/static/style.css"]);
    }

    #[tokio::test]
    async fn scenario_root_served_from_cache() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let installer = Arc::new(CountingNetwork::site());
        worker(storage.clone(), installer.clone()).on_install().await.unwrap();
        let installed = installer.fetch(&get("/")).await.unwrap();

        let network = Arc::new(CountingNetwork::site());
        let response = worker(storage, network.clone())
            .on_fetch(&get("/"))
            .await
            .unwrap();

        assert_eq!(response, installed);
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_uncached_path_goes_to_network() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(CountingNetwork::site());
        let sw = worker(storage.clone(), network.clone());
        sw.on_install().await.unwrap();
        let before = network.calls();

        let response = sw.on_fetch(&get("/api/data")).await.unwrap();

        assert_eq!(network.calls(), before + 1);
        assert_eq!(response.body, br#"[{"importo": 12.5}]"#);
        let cache = storage.open(CACHE_NAME).await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn scenario_install_fails_when_stylesheet_missing() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(CountingNetwork::site().without("/static/style.css"));

        let err = worker(storage, network).on_install().await.unwrap_err();

        assert!(matches!(err, PrecacheError::AddAllFailed { .. }));
    }

    #[tokio::test]
    async fn uncached_404_returned_unmodified() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let network = Arc::new(CountingNetwork::site());
        let sw = worker(storage, network);
        sw.on_install().await.unwrap();

        let response = sw.on_fetch(&get("/missing")).await.unwrap();
        assert_eq!(response, Response::new(404, "Not Found"));
    }

    #[tokio::test]
    async fn fetch_before_install_creates_no_cache_on_disk() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(DiskCacheStorage::new(temp.path()));
        let network = Arc::new(CountingNetwork::site());

        let response = worker(storage.clone(), network.clone())
            .on_fetch(&get("/"))
            .await
            .unwrap();

        assert_eq!(response.body, b"<html>Gestione spese</html>");
        assert_eq!(network.calls(), 1);
        assert!(!storage.has(CACHE_NAME).await.unwrap());
        assert!(!temp.path().join(CACHE_NAME).exists());
    }

    #[tokio::test]
    async fn disk_cache_serves_offline_after_restart() {
        let temp = TempDir::new().unwrap();

        let online = Arc::new(CountingNetwork::site());
        let host = WorkerHost::new(worker(
            Arc::new(DiskCacheStorage::new(temp.path())),
            online,
        ));
        host.install().await.unwrap();

        // A fresh host whose network serves nothing still installs and
        // answers from the persisted cache.
        let offline = Arc::new(
            CountingNetwork::site()
                .without("/")
                .without("/static/style.css"),
        );
        let host = WorkerHost::new(worker(
            Arc::new(DiskCacheStorage::new(temp.path())),
            offline.clone(),
        ));
        host.install().await.unwrap();
        assert_eq!(host.state().await, WorkerState::Activated);

        let served = host.fetch(&get("/static/style.css")).await.unwrap();
        assert_eq!(served.source, FetchSource::Cache);
        assert_eq!(served.response.body, b"body { font-family: sans-serif }");
        assert_eq!(offline.calls(), 0);
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn precache() -> Command {
        cargo_bin_cmd!("precache")
    }

    /// Write a config pointing at a closed local port and a temp cache dir
    fn write_config(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("config.toml");
        let caches = dir.join("caches");
        let content = format!(
            concat!(
                "[origin]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n\n",
                "[storage]\ndir = {:?}\n"
            ),
            caches.display().to_string()
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        precache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline pre-cache shim"));
    }

    #[test]
    fn version_displays() {
        precache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("precache"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        precache()
            .args(["config", "path"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        precache()
            .args(["config", "show"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("[origin]"))
            .stdout(predicate::str::contains("127.0.0.1:9"));
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("nested").join("config.toml");

        precache()
            .args(["config", "init"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        let written = std::fs::read_to_string(&config).unwrap();
        assert!(written.contains("http://localhost:5000"));
    }

    #[test]
    fn config_init_keeps_existing_without_force() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        precache()
            .args(["config", "init"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stderr(predicate::str::contains("already exists"));
        assert!(std::fs::read_to_string(&config).unwrap().contains("127.0.0.1:9"));

        precache()
            .args(["config", "init", "--force"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success();
        assert!(std::fs::read_to_string(&config).unwrap().contains("localhost:5000"));
    }

    #[test]
    fn install_unreachable_origin_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        precache()
            .arg("install")
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to pre-cache"));
    }

    #[test]
    fn entries_before_install_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        precache()
            .arg("entries")
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("gestione-spese-cache-v1"));
    }

    #[test]
    fn fetch_offline_miss_reports_network_error() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        precache()
            .args(["fetch", "/api/data"])
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request failed"));
    }
}
