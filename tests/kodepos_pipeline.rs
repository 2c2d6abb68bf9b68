use std::fs;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use predicates::prelude::*;
use url::Url;

fn row(
    id: &str,
    postal: &str,
    subdistrict: &str,
    code: &str,
    district: &str,
    city_type: &str,
    city: &str,
    province: &str,
) -> String {
    format!(
        "<tr><td>{id}</td><td><a href=\"/kodepos/{postal}\">{postal}</a></td><td><a>{subdistrict}</a></td><td><a>{code}</a></td><td><a>{district}</a></td><td>{city_type}</td><td><a>{city}</a></td><td><a>{province}</a></td></tr>"
    )
}

fn listing_page(rows: &[String]) -> String {
    format!(
        r#"<!doctype html>
<html>
  <head><title>Kode Pos</title></head>
  <body>
    <table>
      <tbody class="header_mentok">
        <tr><td>No</td><td>Kode Pos</td><td>Desa</td><td>Kode Wilayah</td><td>Kecamatan</td><td colspan="2">Kota</td><td>Provinsi</td></tr>
      </tbody>
      <tbody>
        {}
      </tbody>
    </table>
  </body>
</html>
"#,
        rows.join("\n        ")
    )
}

fn page_for(kk: Option<&str>, no1: Option<&str>, no2: Option<&str>) -> Option<String> {
    match (kk, no1, no2) {
        (None, None, None) => Some(listing_page(&[
            row("1", "10110", "Gambir", "31.71.01.1001", "Gambir", "Kota", "Jakarta Pusat", "DKI Jakarta"),
            row("2", "10460", "Bungur", "31.71.02.1005", "Senen", "Kota", "Jakarta Pusat", "DKI Jakarta"),
        ])),
        (Some("2"), Some("1"), Some("2")) => Some(listing_page(&[
            row("3", "23232", "Lam'Ara", "11.71.04.2001", "Banda Raya", "Kota", "Banda Aceh", "Aceh"),
            row("4", "23238", "Mulia", "11.71.04.2002", "Banda Raya", "Kota", "Banda Aceh", "Aceh"),
        ])),
        (Some("3"), Some("3"), Some("4")) => Some(listing_page(&[row(
            "5",
            "02345",
            "Ujung",
            "11.09.01.2001",
            "Tengah",
            "Kabupaten",
            "Sample",
            "Aceh",
        )])),
        _ => None,
    }
}

fn spawn_listing_server(
    maintenance: bool,
) -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let addr = server.server_addr();
    let base_url = format!("http://{addr}/_kodepos.php");

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let url = Url::parse(&format!("http://{addr}{}", request.url())).expect("request url");
            let param = |key: &str| {
                url.query_pairs()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.into_owned())
            };
            let (kk, no1, no2) = (param("kk"), param("no1"), param("no2"));

            let body = if url.path() != "/_kodepos.php" || param("perhal").as_deref() != Some("2") {
                None
            } else if maintenance {
                Some("<!doctype html><html><body><p>Sedang perbaikan</p></body></html>".to_owned())
            } else {
                page_for(kk.as_deref(), no1.as_deref(), no2.as_deref())
            };

            let response = match body {
                Some(html) => {
                    let header = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"text/html; charset=utf-8"[..],
                    )
                    .expect("build header");
                    tiny_http::Response::from_string(html).with_header(header)
                }
                None => tiny_http::Response::from_string("not found").with_status_code(404),
            };

            let _ = request.respond(response);
        }
    });

    (base_url, shutdown_tx, handle)
}

fn lines(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::to_owned)
        .collect())
}

#[test]
fn build_writes_five_sql_files() -> anyhow::Result<()> {
    let (base_url, shutdown_tx, server_handle) = spawn_listing_server(false);
    let temp = tempfile::TempDir::new()?;
    let out_dir = temp.path().join("sql");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kodepos");
    cmd.args([
        "build",
        "--base-url",
        base_url.as_str(),
        "--total",
        "5",
        "--per-page",
        "2",
        "--delay-secs",
        "0",
        "--out",
        out_dir.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stderr(predicate::str::contains("wrote sql file"));

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    assert_eq!(
        lines(&out_dir.join("provinces.sql"))?,
        vec![
            r#"INSERT INTO "provinces" ("id", "name") VALUES (1, 'DKI Jakarta');"#,
            r#"INSERT INTO "provinces" ("id", "name") VALUES (2, 'Aceh');"#,
        ]
    );
    assert_eq!(
        lines(&out_dir.join("cities.sql"))?,
        vec![
            r#"INSERT INTO "cities" ("id", "province_id", "name") VALUES (1, 1, 'Kota Jakarta Pusat');"#,
            r#"INSERT INTO "cities" ("id", "province_id", "name") VALUES (2, 2, 'Kota Banda Aceh');"#,
            r#"INSERT INTO "cities" ("id", "province_id", "name") VALUES (3, 2, 'Kabupaten Sample');"#,
        ]
    );
    assert_eq!(
        lines(&out_dir.join("districts.sql"))?,
        vec![
            r#"INSERT INTO "districts" ("id", "city_id", "name") VALUES (1, 1, 'Gambir');"#,
            r#"INSERT INTO "districts" ("id", "city_id", "name") VALUES (2, 1, 'Senen');"#,
            r#"INSERT INTO "districts" ("id", "city_id", "name") VALUES (3, 2, 'Banda Raya');"#,
            r#"INSERT INTO "districts" ("id", "city_id", "name") VALUES (4, 3, 'Tengah');"#,
        ]
    );

    let subdistricts = lines(&out_dir.join("subdistricts.sql"))?;
    assert_eq!(subdistricts.len(), 5);
    assert_eq!(
        subdistricts[2],
        r#"INSERT INTO "subdistricts" ("id", "district_id", "name", "code", "postal_code") VALUES (3, 3, 'Lam''Ara', '11.71.04.2001', '23232');"#
    );
    assert_eq!(
        subdistricts[4],
        r#"INSERT INTO "subdistricts" ("id", "district_id", "name", "code", "postal_code") VALUES (5, 4, 'Ujung', '11.09.01.2001', '02345');"#
    );

    let flat = lines(&out_dir.join("subdistricts_to_provinces.sql"))?;
    assert_eq!(flat.len(), 5);
    assert_eq!(
        flat[0],
        r#"INSERT INTO "subdistricts_to_provinces" ("subdistrict_id", "subdistrict_name", "subdistrict_code", "postal_code", "district_name", "city_name", "province_name") VALUES (1, 'Gambir', '31.71.01.1001', '10110', 'Gambir', 'Kota Jakarta Pusat', 'DKI Jakarta');"#
    );

    Ok(())
}

#[test]
fn crawl_snapshot_feeds_export() -> anyhow::Result<()> {
    let (base_url, shutdown_tx, server_handle) = spawn_listing_server(false);
    let temp = tempfile::TempDir::new()?;
    let rows_path = temp.path().join("rows.jsonl");
    let out_dir = temp.path().join("sql");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kodepos");
    cmd.args([
        "crawl",
        "--base-url",
        base_url.as_str(),
        "--total",
        "5",
        "--per-page",
        "2",
        "--delay-secs",
        "0",
        "--out",
        rows_path.to_str().unwrap(),
    ])
    .assert()
    .success();

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    let snapshot = fs::read_to_string(&rows_path)?;
    assert_eq!(snapshot.lines().count(), 5);
    let first: kodepos::formats::FlatRecord =
        serde_json::from_str(snapshot.lines().next().unwrap_or_default())?;
    assert_eq!(first.city_name, "Kota Jakarta Pusat");
    assert_eq!(first.postal_code, "10110");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kodepos");
    cmd.args([
        "export",
        "--rows",
        rows_path.to_str().unwrap(),
        "--out",
        out_dir.to_str().unwrap(),
    ])
    .assert()
    .success();

    for file in [
        "subdistricts_to_provinces.sql",
        "provinces.sql",
        "cities.sql",
        "districts.sql",
        "subdistricts.sql",
    ] {
        assert!(out_dir.join(file).is_file(), "missing {file}");
    }
    assert_eq!(lines(&out_dir.join("districts.sql"))?.len(), 4);
    assert_eq!(lines(&out_dir.join("subdistricts.sql"))?.len(), 5);

    Ok(())
}

#[test]
fn build_fails_when_listing_table_is_missing() -> anyhow::Result<()> {
    let (base_url, shutdown_tx, server_handle) = spawn_listing_server(true);
    let temp = tempfile::TempDir::new()?;
    let out_dir = temp.path().join("sql");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kodepos");
    cmd.args([
        "build",
        "--base-url",
        base_url.as_str(),
        "--total",
        "5",
        "--per-page",
        "2",
        "--delay-secs",
        "0",
        "--out",
        out_dir.to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("table container not found"));

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    assert!(!out_dir.join("provinces.sql").exists());
    Ok(())
}

#[test]
fn build_fails_on_http_error_status() -> anyhow::Result<()> {
    let (base_url, shutdown_tx, server_handle) = spawn_listing_server(false);
    let temp = tempfile::TempDir::new()?;

    // The test server only answers perhal=2, so perhal=3 is a 404.
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kodepos");
    cmd.args([
        "build",
        "--base-url",
        base_url.as_str(),
        "--total",
        "5",
        "--per-page",
        "3",
        "--delay-secs",
        "0",
        "--out",
        temp.path().to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("404"));

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();
    Ok(())
}
