//! Integration tests for the ado-cli library
//!
//! These tests drive the public API end to end: command line parsing,
//! dispatch through the real HTTP transport against a local server,
//! and output files.

use ado_cli::api::{AdoClient, ClientOptions, HttpTransport, StaticCredential};
use ado_cli::cli::{Category, Cli, ReposCommand, WitCommand};
use ado_cli::commands::{CommandOutput, dispatch};
use ado_cli::download::DownloadOptions;
use ado_cli::output::OutputSink;
use clap::Parser;
use mockito::{Matcher, Server};
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("ado").chain(args.iter().copied()))
        .expect("command line should parse")
}

fn client_for(server: &Server) -> AdoClient {
    AdoClient::new(
        &format!("{}/contoso", server.url()),
        Arc::new(HttpTransport::new().expect("transport")),
        Arc::new(StaticCredential::pat(SecretString::from("secret".to_string()))),
        ClientOptions {
            retry_backoff: Duration::ZERO,
            ..ClientOptions::default()
        },
    )
    .expect("client")
}

#[test]
fn test_global_flags_anywhere() {
    let cli = parse(&[
        "repos",
        "get-pr",
        "--project",
        "Web",
        "--repo",
        "app",
        "--pr-id",
        "42",
        "--org",
        "contoso",
        "-o",
        "out/pr.json",
        "--include-work-items",
        "Yes",
    ]);

    assert_eq!(cli.global.org.as_deref(), Some("contoso"));
    assert_eq!(
        cli.global.output_file.as_deref(),
        Some(std::path::Path::new("out/pr.json"))
    );
    match cli.command {
        Some(Category::Repos {
            command:
                ReposCommand::GetPr {
                    pr,
                    include_work_items,
                },
        }) => {
            assert_eq!(pr.pr_id, 42);
            assert_eq!(pr.repo.project, "Web");
            assert_eq!(include_work_items, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_list_arguments_and_defaults() {
    let cli = parse(&[
        "wit",
        "batch",
        "--project",
        "Web",
        "--ids",
        "1, 2,3",
        "--fields",
        "System.Title,System.State",
    ]);
    match cli.command {
        Some(Category::Wit {
            command: WitCommand::Batch { ids, fields, .. },
        }) => {
            assert_eq!(ids.0, vec![1, 2, 3]);
            assert_eq!(
                fields.map(|f| f.0),
                Some(vec!["System.Title".to_string(), "System.State".to_string()])
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = parse(&["repos", "list-items", "--project", "Web", "--repo", "app"]);
    match cli.command {
        Some(Category::Repos {
            command: ReposCommand::ListItems {
                path, recursion, ..
            },
        }) => {
            assert_eq!(path, "/");
            assert_eq!(recursion, "oneLevel");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_invalid_command_lines() {
    // Missing required flag
    assert!(Cli::try_parse_from(["ado", "repos", "get-pr", "--project", "Web"]).is_err());
    // Non-numeric id
    assert!(Cli::try_parse_from(["ado", "wit", "batch", "--project", "Web", "--ids", "1,a"]).is_err());
    // --create-config needs no command
    let cli = Cli::try_parse_from(["ado", "--create-config"]).expect("should parse");
    assert!(cli.global.create_config);
    assert!(cli.command.is_none());
}

#[tokio::test]
async fn test_paged_listing_over_http() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/contoso/_apis/projects")
        .match_query(Matcher::Regex("^api-version=7\\.2-preview$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-ms-continuationtoken", "page-2")
        .with_body(r#"{"count":1,"value":[{"name":"Web"}]}"#)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/contoso/_apis/projects")
        .match_query(Matcher::UrlEncoded(
            "continuationToken".into(),
            "page-2".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"count":1,"value":[{"name":"Mobile"}]}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let cli = parse(&["core", "list-projects"]);
    let output = dispatch(
        &client,
        cli.command.expect("command"),
        &DownloadOptions::default(),
    )
    .await
    .expect("dispatch");

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(
        output,
        CommandOutput::Json(json!([{"name": "Web"}, {"name": "Mobile"}]))
    );
}

#[tokio::test]
async fn test_unauthorized_over_http() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/contoso/Web/_apis/git/repositories/app")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("denied")
        .create_async()
        .await;

    let client = client_for(&server);
    let cli = parse(&["repos", "get", "--project", "Web", "--repo", "app"]);
    let error = dispatch(
        &client,
        cli.command.expect("command"),
        &DownloadOptions::default(),
    )
    .await
    .expect_err("401 should fail");

    assert!(error.to_string().starts_with("Unauthorized"));
}

#[tokio::test]
async fn test_output_file_written() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("reports/summary.json");

    CommandOutput::Json(json!({"title": "Fix", "files": []}))
        .emit(&OutputSink::new(Some(path.clone())))
        .expect("emit");

    let written = std::fs::read_to_string(&path).expect("file exists");
    assert!(written.ends_with("}\n"));
    let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid json");
    assert_eq!(parsed["title"], "Fix");
}

#[test]
fn test_library_version() {
    let version = ado_cli::VERSION;
    assert!(!version.is_empty());
    assert!(version.contains('.'));
}
