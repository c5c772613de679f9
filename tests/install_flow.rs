use chromedriver_fetch::cli::OutputFormat;
use chromedriver_fetch::infrastructure::remote::DownloadOptions;
use chromedriver_fetch::{AppError, CommandHandler, Mode, Platform, RunOptions};
use mockito::{Server, ServerGuard};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

const INDEX_PAGE: &str = r#"<html><body>
<p><a class="XqQF9c" href="https://chromedriver.storage.googleapis.com/index.html?path=101.0.4951.41/">ChromeDriver 101.0.4951.41</a></p>
<p><a class="XqQF9c" href="https://chromedriver.storage.googleapis.com/index.html?path=100.0.4896.127/">ChromeDriver 100.0.4896.127</a></p>
<p><a class="XqQF9c" href="https://chromedriver.storage.googleapis.com/index.html?path=101.0.4951.15/">ChromeDriver 101.0.4951.15</a></p>
<p><a class="XqQF9c" href="https://chromedriver.storage.googleapis.com/index.html?path=99.0.4844.51/">ChromeDriver 99.0.4844.51</a></p>
</body></html>"#;

fn driver_zip() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("chromedriver", FileOptions::default().unix_permissions(0o755))
        .unwrap();
    writer.write_all(b"#!/bin/sh\necho chromedriver\n").unwrap();
    writer
        .start_file(
            "LICENSE.chromedriver",
            FileOptions::default().unix_permissions(0o644),
        )
        .unwrap();
    writer.write_all(b"BSD-style license").unwrap();
    writer.finish().unwrap().into_inner()
}

async fn server_with_index() -> ServerGuard {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/downloads")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(INDEX_PAGE)
        .create_async()
        .await;
    server
}

fn options(server: &ServerGuard, mode: Mode, work: &Path, out: &Path) -> RunOptions {
    RunOptions {
        mode,
        out_dir: out.to_path_buf(),
        index_url: format!("{}/downloads", server.url()),
        url_template: format!("{}/{{version}}/{{archive}}", server.url()),
        platform: Platform::Linux64,
        work_dir: work.to_path_buf(),
        max_workers: 2,
        timeout_secs: 30,
        download: DownloadOptions::default(),
    }
}

fn install_mode(major: &str) -> Mode {
    Mode::Install {
        major: major.to_string(),
    }
}

#[tokio::test]
async fn installs_latest_release_of_requested_major() {
    let mut server = server_with_index().await;
    let archive = server
        .mock("GET", "/101.0.4951.41/chromedriver_linux64.zip")
        .with_status(200)
        .with_body(driver_zip())
        .create_async()
        .await;

    let work = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let handler =
        CommandHandler::new(options(&server, install_mode("101"), work.path(), out.path())).unwrap();

    let (entry, report) = handler.install("101").await.unwrap();

    archive.assert_async().await;
    assert_eq!(entry.version, "101.0.4951.41");
    assert_eq!(report.files, 2);
    assert_eq!(
        fs::read_to_string(out.path().join("chromedriver")).unwrap(),
        "#!/bin/sh\necho chromedriver\n"
    );
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(out.path().join("chromedriver"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unknown_major_is_reported_without_downloading() {
    let mut server = server_with_index().await;
    let archive = server
        .mock("GET", mockito::Matcher::Regex(r"\.zip$".to_string()))
        .expect(0)
        .create_async()
        .await;

    let work = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let handler =
        CommandHandler::new(options(&server, install_mode("42"), work.path(), out.path())).unwrap();

    let err = handler.install("42").await.unwrap_err();

    assert!(matches!(err.error, AppError::VersionNotFound { ref major } if major == "42"));
    archive.assert_async().await;
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn corrupt_download_is_cleaned_up_and_reported() {
    let mut server = server_with_index().await;
    server
        .mock("GET", "/100.0.4896.127/chromedriver_linux64.zip")
        .with_status(200)
        .with_body("definitely not a zip file")
        .create_async()
        .await;

    let work = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let handler =
        CommandHandler::new(options(&server, install_mode("100"), work.path(), out.path())).unwrap();

    let err = handler.install("100").await.unwrap_err();

    assert!(matches!(err.error, AppError::Extraction { .. }));
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn lists_latest_release_per_major() {
    let server = server_with_index().await;
    let work = TempDir::new().unwrap();
    let handler = CommandHandler::new(options(
        &server,
        Mode::List { json: false },
        work.path(),
        work.path(),
    ))
    .unwrap();

    let output = handler.list(OutputFormat::Text).await.unwrap();

    assert_eq!(
        output,
        "Specifiable chrome driver versions.\n\
         Major\tLatest\n\
         101\t101.0.4951.41\n\
         100\t100.0.4896.127\n\
         99\t99.0.4844.51\n"
    );
}
