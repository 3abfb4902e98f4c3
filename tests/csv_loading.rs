use std::fs;
use std::path::PathBuf;

use movie_docload::SourceReadError;
use movie_docload::ingestion::{LoaderOptions, ScalarInference, SourceFormat, load_from_path};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(name)
}

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("movie_docload_{}_{name}", std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn fixture_loads_with_header_order_and_numeric_columns() {
    let ds = load_from_path(fixture("movies.csv"), &LoaderOptions::default()).unwrap();

    assert_eq!(ds.row_count(), 5);
    assert_eq!(ds.columns.len(), 14);
    assert_eq!(ds.columns[0], "adult");
    assert_eq!(ds.columns[4], "id");
    assert_eq!(ds.columns[13], "vote_average");

    let first = &ds.rows[0];
    assert_eq!(first["id"], json!(862));
    assert_eq!(first["budget"], json!(30000000));
    assert_eq!(first["popularity"], json!(21.946943));
    assert_eq!(first["title"], json!("Toy Story"));
    // Structured and boolean cells stay as source text until normalization.
    assert_eq!(first["adult"], json!("False"));
    assert_eq!(first["spoken_languages"], json!("[{'iso_639_1': 'en', 'name': 'English'}]"));

    // Missing markers are skipped by inference and left in place.
    assert_eq!(ds.rows[3]["vote_average"], json!("NaN"));
    assert_eq!(ds.rows[2]["vote_average"], json!(6.5));
    assert_eq!(ds.rows[1]["belongs_to_collection"], json!(""));
}

#[test]
fn inference_off_keeps_every_cell_as_text() {
    let opts = LoaderOptions {
        inference: ScalarInference::Off,
        ..Default::default()
    };
    let ds = load_from_path(fixture("movies.csv"), &opts).unwrap();
    assert_eq!(ds.rows[0]["id"], json!("862"));
    assert_eq!(ds.rows[0]["vote_average"], json!("7.7"));
}

#[test]
fn custom_delimiter_is_honored() {
    let path = write_temp("semicolon.csv", "id;title;adult\n5;Four Rooms;False\n");
    let opts = LoaderOptions {
        delimiter: ';',
        ..Default::default()
    };
    let ds = load_from_path(&path, &opts).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(ds.columns, vec!["id", "title", "adult"]);
    assert_eq!(ds.rows[0]["id"], json!(5));
    assert_eq!(ds.rows[0]["title"], json!("Four Rooms"));
}

#[test]
fn ragged_record_is_fatal() {
    let path = write_temp("ragged.csv", "id,title\n1,Heat\n2\n");
    let err = load_from_path(&path, &LoaderOptions::default()).unwrap_err();
    fs::remove_file(&path).ok();

    assert!(matches!(err, SourceReadError::Csv(_)));
}

#[test]
fn duplicate_header_is_rejected() {
    let path = write_temp("dupe_header.csv", "id,title,id\n1,Heat,1\n");
    let err = load_from_path(&path, &LoaderOptions::default()).unwrap_err();
    fs::remove_file(&path).ok();

    match err {
        SourceReadError::SchemaMismatch { message } => assert!(message.contains("duplicate column 'id'")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_extension_needs_an_explicit_format() {
    let err = load_from_path("tests/fixtures/movies.txt", &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err, SourceReadError::UnsupportedFormat { .. }));

    let path = write_temp("movies.data", "id,title\n1,Heat\n");
    let opts = LoaderOptions {
        format: Some(SourceFormat::Csv),
        ..Default::default()
    };
    let ds = load_from_path(&path, &opts).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(ds.row_count(), 1);
}
