//! Integration tests for ddddctl

mod mock;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Binary isolated from the user's config and cache
    fn ddddctl(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("ddddctl");
        cmd.env("DDDDCTL_CONFIG", home.path().join("config.toml"))
            .env("DDDDCTL_CACHE_DIR", home.path().join("cache"))
            .env_remove("DDDDCTL_RELEASE_API_URL")
            .env("CI", "1");
        cmd
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ddddocr"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ddddctl"));
    }

    #[test]
    fn det_missing_image() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .args(["det", "missing.png"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Image file not found: missing.png"));
    }

    #[test]
    fn slide_missing_background() {
        let home = TempDir::new().unwrap();
        let target = home.path().join("t.png");
        std::fs::write(&target, b"png").unwrap();

        ddddctl(&home)
            .arg("slide")
            .arg(&target)
            .arg("nope.png")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Background image not found: nope.png"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[service]"))
            .stdout(predicate::str::contains("port = 8000"));
    }

    #[test]
    fn config_set_then_show() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .args(["config", "set", "service.port", "9898"])
            .assert()
            .success();
        ddddctl(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 9898"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join("config.toml"), "[service]\nport = \"x\"").unwrap();
        ddddctl(&home)
            .args(["cache", "path"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn cache_path_follows_env() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn cache_clear_when_empty() {
        let home = TempDir::new().unwrap();
        ddddctl(&home)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("does not exist"));
    }
}

mod service_tests {
    use crate::mock::{closed_port, MockServer};
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn ddddctl(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("ddddctl");
        cmd.env("DDDDCTL_CONFIG", home.path().join("config.toml"))
            .env("DDDDCTL_CACHE_DIR", home.path().join("cache"))
            .env("CI", "1");
        cmd
    }

    fn image(home: &TempDir) -> std::path::PathBuf {
        let path = home.path().join("captcha.png");
        std::fs::write(&path, b"not really a png").unwrap();
        path
    }

    #[test]
    fn ocr_service_unreachable() {
        let home = TempDir::new().unwrap();
        let endpoint = format!("http://127.0.0.1:{}/ocr", closed_port());
        ddddctl(&home)
            .arg("ocr")
            .arg(image(&home))
            .args(["--endpoint", &endpoint])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "Failed to connect to ddddocr service",
            ))
            .stderr(predicate::str::contains("ddddctl start"));
    }

    #[test]
    fn ocr_prints_text() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| {
            (
                200,
                br#"{"code":200,"msg":"ok","data":{"text":"3n7b"}}"#.to_vec(),
            )
        });
        ddddctl(&home)
            .arg("ocr")
            .arg(image(&home))
            .args(["--endpoint", &format!("{}/ocr", server.base_url)])
            .assert()
            .success()
            .stdout(predicate::str::diff("Text: 3n7b\n"));
    }

    #[test]
    fn det_application_error() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| {
            (200, br#"{"code":500,"msg":"image decode failed"}"#.to_vec())
        });
        ddddctl(&home)
            .arg("det")
            .arg(image(&home))
            .args(["--endpoint", &format!("{}/det", server.base_url)])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("image decode failed"));
    }

    #[test]
    fn slide_comparison_position() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| {
            (200, br#"{"code":200,"data":{"x":144,"y":0}}"#.to_vec())
        });
        let img = image(&home);
        ddddctl(&home)
            .arg("slide")
            .arg(&img)
            .arg(&img)
            .args(["--algorithm", "comparison"])
            .args(["--endpoint", &format!("{}/slide-comparison", server.base_url)])
            .assert()
            .success()
            .stdout(predicate::str::contains("Position: x=144, y=0"));
    }

    #[test]
    fn ping_prints_pong() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| (200, b"pong".to_vec()));
        ddddctl(&home)
            .args(["ping", "--base-url", &server.base_url])
            .assert()
            .success()
            .stdout(predicate::str::contains("pong"));
        assert_eq!(server.hits("/ping"), 1);
    }

    #[test]
    fn legacy_json_route() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| (200, br#"{"status":200,"result":"abcd"}"#.to_vec()));
        ddddctl(&home)
            .args(["legacy", "ocr"])
            .arg(image(&home))
            .args(["--base-url", &server.base_url])
            .assert()
            .success()
            .stdout(predicate::str::diff("abcd\n"));
        assert_eq!(server.hits("/ocr/b64/json"), 1);
    }

    #[test]
    fn mcp_lists_tools() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| {
            (
                200,
                br#"{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"ocr"},{"name":"det"}]}}"#
                    .to_vec(),
            )
        });
        ddddctl(&home)
            .args(["mcp", "tools", "--endpoint", &format!("{}/mcp", server.base_url)])
            .assert()
            .success()
            .stdout(predicate::str::diff("ocr\ndet\n"));
        assert_eq!(server.hits("/mcp"), 2);
    }
}

mod launcher_tests {
    use crate::mock::{closed_port, MockServer};
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use ddddctl::platform::{AssetTable, Platform};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn start(home: &TempDir, feed: &str, port: u16) -> Command {
        let mut cmd = cargo_bin_cmd!("ddddctl");
        cmd.env("DDDDCTL_CONFIG", home.path().join("config.toml"))
            .env("DDDDCTL_CACHE_DIR", home.path().join("cache"))
            .env("DDDDCTL_RELEASE_API_URL", feed)
            .env_remove("GITHUB_TOKEN")
            .env("CI", "1")
            .args(["start", "--readiness", "tcp", "--port", &port.to_string()]);
        cmd
    }

    fn asset_name() -> &'static str {
        Platform::detect()
            .asset_filename(AssetTable::Musl)
            .expect("tests run on a supported platform")
    }

    #[test]
    fn release_without_matching_asset() {
        let home = TempDir::new().unwrap();
        let server = MockServer::start(|_, _| {
            (
                200,
                br#"{"tag_name":"v1.0.0","assets":[{"name":"something-else.zip","browser_download_url":"http://127.0.0.1:9/x.zip"}]}"#
                    .to_vec(),
            )
        });

        start(&home, &format!("{}/latest", server.base_url), closed_port())
            .assert()
            .code(1)
            .stderr(predicate::str::contains(format!(
                "Could not find release for {}",
                asset_name()
            )));
    }

    #[test]
    fn feed_unreachable_without_cache() {
        let home = TempDir::new().unwrap();
        let feed = format!("http://127.0.0.1:{}/latest", closed_port());

        start(&home, &feed, closed_port())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Could not find release for"));
    }

    #[test]
    fn already_running_short_circuits() {
        let home = TempDir::new().unwrap();
        let service = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = service.local_addr().unwrap().port();

        start(&home, "http://127.0.0.1:9/latest", port)
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "DDDDOCR service already running on 127.0.0.1:{}",
                port
            )))
            .stdout(predicate::str::contains(format!(
                "http://127.0.0.1:{}/mcp",
                port
            )));
    }

    #[cfg(unix)]
    fn release_zip() -> Vec<u8> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default().unix_permissions(0o644);
            zip.add_directory("ddddocr-release/", options).unwrap();
            zip.start_file("ddddocr-release/ddddocr", options).unwrap();
            zip.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
            zip.start_file("ddddocr-release/README.md", options).unwrap();
            zip.write_all(b"readme").unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[cfg(unix)]
    #[test]
    fn second_start_uses_cache() {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().unwrap();
        let archive = release_zip();
        let asset = asset_name();
        let server = MockServer::start(move |base, path| match path {
            "/latest" => (
                200,
                format!(
                    r#"{{"tag_name":"v9.9.9","assets":[{{"name":"{}","browser_download_url":"{}/download/{}"}}]}}"#,
                    asset, base, asset
                )
                .into_bytes(),
            ),
            p if p.starts_with("/download/") => (200, archive.clone()),
            _ => (404, Vec::new()),
        });
        let feed = format!("{}/latest", server.base_url);
        let download_path = format!("/download/{}", asset);

        start(&home, &feed, closed_port())
            .assert()
            .success()
            .stdout(predicate::str::contains("Downloading from"))
            .stdout(predicate::str::contains("Service started with PID"));

        let cache = home.path().join("cache");
        assert_eq!(
            std::fs::read_to_string(cache.join(".version")).unwrap().trim(),
            "v9.9.9"
        );
        let exe = cache.join("ddddocr-release").join("ddddocr");
        let mode = std::fs::metadata(&exe).unwrap().permissions().mode();
        assert_eq!(mode & 0o755, 0o755);

        start(&home, &feed, closed_port())
            .assert()
            .success()
            .stdout(predicate::str::contains("Using cached DDDDOCR: v9.9.9"));

        assert_eq!(server.hits(&download_path), 1);
        assert_eq!(server.hits("/latest"), 2);
    }

    #[cfg(unix)]
    #[test]
    fn new_tag_replaces_cache() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");
        std::fs::create_dir_all(cache.join("old")).unwrap();
        std::fs::write(cache.join("old").join("ddddocr"), b"#!/bin/sh\nexit 0\n").unwrap();
        std::fs::write(cache.join("old").join("stale.txt"), b"stale").unwrap();
        std::fs::write(cache.join(".version"), "v1.0.0").unwrap();

        let archive = release_zip();
        let asset = asset_name();
        let server = MockServer::start(move |base, path| match path {
            "/latest" => (
                200,
                format!(
                    r#"{{"tag_name":"v2.0.0","assets":[{{"name":"{}","browser_download_url":"{}/dl/{}"}}]}}"#,
                    asset, base, asset
                )
                .into_bytes(),
            ),
            _ => (200, archive.clone()),
        });

        start(&home, &format!("{}/latest", server.base_url), closed_port())
            .assert()
            .success()
            .stdout(predicate::str::contains("Updating (v1.0.0 -> v2.0.0)"));

        assert!(!cache.join("old").exists());
        assert!(cache.join("ddddocr-release").join("ddddocr").exists());
        assert_eq!(
            std::fs::read_to_string(cache.join(".version")).unwrap().trim(),
            "v2.0.0"
        );
    }

    #[cfg(unix)]
    #[test]
    fn offline_start_uses_cached_executable() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("ddddocr"), b"#!/bin/sh\nexit 0\n").unwrap();
        std::fs::write(cache.join(".version"), "v1.0.0").unwrap();

        let feed = format!("http://127.0.0.1:{}/latest", closed_port());
        start(&home, &feed, closed_port())
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "Release feed unavailable, using cached executable",
            ))
            .stdout(predicate::str::contains("Service started with PID"));
    }

    #[cfg(unix)]
    #[test]
    fn failed_update_falls_back_to_cache() {
        let home = TempDir::new().unwrap();
        let cache = home.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("ddddocr"), b"#!/bin/sh\nexit 0\n").unwrap();
        std::fs::write(cache.join(".version"), "v1.0.0").unwrap();

        let asset = asset_name();
        let server = MockServer::start(move |base, path| match path {
            "/latest" => (
                200,
                format!(
                    r#"{{"tag_name":"v2.0.0","assets":[{{"name":"{}","browser_download_url":"{}/gone/{}"}}]}}"#,
                    asset, base, asset
                )
                .into_bytes(),
            ),
            _ => (404, Vec::new()),
        });

        start(&home, &format!("{}/latest", server.base_url), closed_port())
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "Falling back to cached DDDDOCR v1.0.0",
            ))
            .stderr(predicate::str::contains("Install failed").not())
            .stdout(predicate::str::contains("Service started with PID"));

        assert_eq!(
            std::fs::read_to_string(cache.join(".version")).unwrap().trim(),
            "v1.0.0"
        );
        assert!(cache.join("ddddocr").exists());
    }

    #[test]
    fn offline_fallback_disabled_is_fatal() {
        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join("config.toml"),
            "[launcher]\noffline_fallback = false\n",
        )
        .unwrap();
        let cache = home.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join(platform_exe()), b"#!/bin/sh\nexit 0\n").unwrap();
        std::fs::write(cache.join(".version"), "v1.0.0").unwrap();

        let feed = format!("http://127.0.0.1:{}/latest", closed_port());
        start(&home, &feed, closed_port())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Could not find release for"))
            .stdout(predicate::str::contains("Service started").not());
    }

    fn platform_exe() -> &'static str {
        Platform::detect().executable_name()
    }
}
