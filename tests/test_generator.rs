mod common;

use std::collections::HashSet;

use common::{FixedIndex, TempDir};
use csvpage::content::generator::{NOT_FOUND_BODY, csv_page, generate, try_generate};
use csvpage::content::random::ThreadRandom;
use csvpage::content::resolver::ResolvedSource;
use csvpage::http::response::StatusCode;

#[tokio::test]
async fn test_static_file_passthrough() {
    let dir = TempDir::new("gen-static");
    let file = dir.write("index.html", "<p>hi</p>");

    let payload = generate(ResolvedSource::StaticFile(file), &FixedIndex(0)).await;

    assert_eq!(payload.status, StatusCode::Ok);
    assert_eq!(payload.body, "<p>hi</p>".as_bytes());
}

#[tokio::test]
async fn test_static_file_binary_passthrough() {
    let dir = TempDir::new("gen-binary");
    let bytes = vec![0u8, 159, 146, 150, 255];
    let file = dir.write("blob.html", &bytes);

    let payload = generate(ResolvedSource::StaticFile(file), &FixedIndex(0)).await;

    assert_eq!(payload.body, bytes);
}

#[tokio::test]
async fn test_missing_static_file_is_not_found() {
    let dir = TempDir::new("gen-missing");

    let payload = generate(ResolvedSource::StaticFile(dir.path().join("nope.html")), &FixedIndex(0)).await;

    assert_eq!(payload.status, StatusCode::NotFound);
    assert_eq!(payload.body, NOT_FOUND_BODY.as_bytes());
}

#[tokio::test]
async fn test_directory_is_not_found() {
    let dir = TempDir::new("gen-dir");
    std::fs::create_dir(dir.path().join("sub.html")).unwrap();

    let payload = generate(ResolvedSource::StaticFile(dir.path().join("sub.html")), &FixedIndex(0)).await;

    assert_eq!(payload.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_csv_line_selected_by_index() {
    let dir = TempDir::new("gen-csv");
    let file = dir.write("data.csv", "alpha\r\nbeta\r\ngamma\r\n");

    let payload = generate(ResolvedSource::RandomCsv(file), &FixedIndex(2)).await;

    assert_eq!(payload.status, StatusCode::Ok);
    assert_eq!(payload.body, "<html><body><h1>gamma</h1></body></html>".as_bytes());
}

#[tokio::test]
async fn test_csv_byte_order_mark_is_dropped() {
    let dir = TempDir::new("gen-bom");
    let file = dir.write("data.csv", b"\xEF\xBB\xBFalpha\nbeta\n");

    let first = generate(ResolvedSource::RandomCsv(file.clone()), &FixedIndex(0)).await;
    assert_eq!(first.status, StatusCode::Ok);
    assert_eq!(first.body, "<html><body><h1>alpha</h1></body></html>".as_bytes());

    let second = generate(ResolvedSource::RandomCsv(file), &FixedIndex(1)).await;
    assert_eq!(second.body, csv_page("beta").as_bytes());
}

#[tokio::test]
async fn test_csv_line_is_not_escaped() {
    let dir = TempDir::new("gen-raw");
    let file = dir.write("data.csv", "<b>bold</b>,&amp;\n");

    let payload = generate(ResolvedSource::RandomCsv(file), &FixedIndex(0)).await;

    assert_eq!(payload.body, csv_page("<b>bold</b>,&amp;").as_bytes());
}

#[tokio::test]
async fn test_csv_lines_all_reachable() {
    let dir = TempDir::new("gen-uniform");
    let file = dir.write("data.csv", "alpha\nbeta\ngamma\n");
    let mut seen = HashSet::new();

    for _ in 0..300 {
        let payload = generate(ResolvedSource::RandomCsv(file.clone()), &ThreadRandom).await;
        seen.insert(String::from_utf8(payload.body.to_vec()).unwrap());
    }

    let expected: HashSet<String> = ["alpha", "beta", "gamma"].iter().map(|l| csv_page(l)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_missing_csv_is_not_found() {
    let dir = TempDir::new("gen-csv-missing");

    let payload = generate(ResolvedSource::RandomCsv(dir.path().join("gone.csv")), &FixedIndex(0)).await;

    assert_eq!(payload.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_empty_csv_is_internal_error() {
    let dir = TempDir::new("gen-csv-empty");
    let file = dir.write("empty.csv", "");

    let payload = generate(ResolvedSource::RandomCsv(file.clone()), &FixedIndex(0)).await;
    assert_eq!(payload.status, StatusCode::InternalServerError);
    assert!(payload.body.is_empty());

    assert!(try_generate(&ResolvedSource::RandomCsv(file), &FixedIndex(0)).await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_file_is_internal_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new("gen-perm");
    let file = dir.write("locked.html", "secret");
    std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read anything; nothing to assert then.
    if std::fs::read(&file).is_ok() {
        return;
    }

    let payload = generate(ResolvedSource::StaticFile(file), &FixedIndex(0)).await;
    assert_eq!(payload.status, StatusCode::InternalServerError);
}
