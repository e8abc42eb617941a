use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn postindex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("postindex");
    path
}

fn write_post(root: &Path, dir: &str, date: Option<&str>, title: &str, tags: &str) {
    let post_dir = root.join("posts").join(dir);
    fs::create_dir_all(&post_dir).unwrap();
    let date_meta = date
        .map(|d| format!("<meta name=\"post-date\" content=\"{}\">", d))
        .unwrap_or_default();
    fs::write(
        post_dir.join("index.html"),
        format!(
            "<!doctype html><html><head>\n{}\n<meta name=\"post-title\" content=\"{}\">\n\
             <meta name=\"post-summary\" content=\"About {}\">\n\
             <meta name=\"post-tags\" content=\"{}\">\n</head><body></body></html>\n",
            date_meta, title, title, tags
        ),
    )
    .unwrap();
}

/// 45 dated posts (one per day from 2024-01-01) plus one undated draft.
fn setup_site() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    for i in 0..45u32 {
        let date = chrono_free_date(i);
        let tags = if i % 5 == 0 { "rust, release" } else { "notes" };
        write_post(&root, &format!("post-{:02}", i), Some(&date), &format!("Post {}", i), tags);
    }
    write_post(&root, "draft", None, "Draft", "notes");

    fs::create_dir_all(root.join("public")).unwrap();
    let config = r#"[site]
url = "https://blog.example.com"
name = "Example Blog"
description = "Posts about things"

[content]
root = "posts"

[output]
dir = "public"
per_page = 20

[[sitemap.static_pages]]
path = "/"
lastmod = "2024-01-01"
changefreq = "weekly"
priority = "1.0"
"#;
    let config_path = root.join("postindex.toml");
    fs::write(&config_path, config).unwrap();
    (tmp, config_path)
}

/// `2024-01-01` plus `offset` days, for offsets inside January and February.
fn chrono_free_date(offset: u32) -> String {
    if offset < 31 {
        format!("2024-01-{:02}", offset + 1)
    } else {
        format!("2024-02-{:02}", offset - 30)
    }
}

fn run_postindex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = postindex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run postindex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_build_writes_index() {
    let (tmp, config_path) = setup_site();
    let (stdout, stderr, success) = run_postindex(&config_path, &["build"]);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Indexed 45 items into 3 pages (1 skipped)"));

    let public = tmp.path().join("public");
    let summary = read_json(&public.join("posts-index.json"));
    assert_eq!(summary["total_posts"], 45);
    assert_eq!(summary["total_pages"], 3);
    assert_eq!(summary["per_page"], 20);

    let page1 = read_json(&public.join("posts-index-page-1.json"));
    assert_eq!(page1["posts"].as_array().unwrap().len(), 20);
    assert_eq!(page1["posts"][0]["slug"], "post-44");
    assert_eq!(page1["posts"][0]["date"], "2024-02-14");
    assert_eq!(page1["posts"][0]["url"], "/posts/post-44/");

    let page3 = read_json(&public.join("posts-index-page-3.json"));
    assert_eq!(page3["posts"].as_array().unwrap().len(), 5);
    assert_eq!(page3["posts"][4]["slug"], "post-00");

    let sitemap = fs::read_to_string(public.join("sitemap.xml")).unwrap();
    assert!(sitemap.contains("<loc>https://blog.example.com/</loc>"));
    assert!(sitemap.contains("<loc>https://blog.example.com/posts/post-44/</loc>"));
    assert!(!sitemap.contains("draft"));

    let feed = fs::read_to_string(public.join("rss.xml")).unwrap();
    assert!(feed.contains("<title>Example Blog</title>"));
    assert!(feed.contains("<category>rust</category>"));
}

#[test]
fn test_rebuild_without_changes_is_noop() {
    let (tmp, config_path) = setup_site();
    let (_, _, success) = run_postindex(&config_path, &["build"]);
    assert!(success);

    let public = tmp.path().join("public");
    let before: Vec<(String, Vec<u8>)> = ["posts-index.json", "posts-index-page-1.json", "rss.xml", "sitemap.xml"]
        .iter()
        .map(|n| (n.to_string(), fs::read(public.join(n)).unwrap()))
        .collect();

    let (stdout, stderr, success) = run_postindex(&config_path, &["build"]);
    assert!(success, "second build failed: {}", stderr);
    assert!(stdout.contains("no changes"), "stdout={}", stdout);

    for (name, bytes) in before {
        assert_eq!(fs::read(public.join(&name)).unwrap(), bytes, "{} changed", name);
    }
}

#[test]
fn test_new_post_changes_output_and_drops_stale_shard() {
    let (tmp, config_path) = setup_site();
    run_postindex(&config_path, &["build"]);

    write_post(tmp.path(), "post-new", Some("2024-03-01"), "Newest", "rust");
    let (stdout, _, success) = run_postindex(&config_path, &["build"]);
    assert!(success);
    assert!(stdout.contains("wrote posts-index-page-1.json"));
    let page1 = read_json(&tmp.path().join("public/posts-index-page-1.json"));
    assert_eq!(page1["posts"][0]["slug"], "post-new");

    // Shrink to one page: pages 2 and 3 go away.
    for i in 19..45 {
        fs::remove_dir_all(tmp.path().join(format!("posts/post-{:02}", i))).unwrap();
    }
    let (stdout, _, success) = run_postindex(&config_path, &["build"]);
    assert!(success);
    assert!(stdout.contains("removed posts-index-page-3.json"));
    assert!(!tmp.path().join("public/posts-index-page-2.json").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let (tmp, config_path) = setup_site();
    let (stdout, _, success) = run_postindex(&config_path, &["build", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("would write posts-index.json"));
    assert!(!tmp.path().join("public/posts-index.json").exists());
}

#[test]
fn test_missing_content_root_fails_without_writing() {
    let (tmp, config_path) = setup_site();
    fs::remove_dir_all(tmp.path().join("posts")).unwrap();

    let (_, stderr, success) = run_postindex(&config_path, &["build"]);
    assert!(!success);
    assert!(stderr.contains("Content root does not exist"), "stderr={}", stderr);
    assert!(!tmp.path().join("public/posts-index.json").exists());
}

#[test]
fn test_browse_last_page() {
    let (_tmp, config_path) = setup_site();
    run_postindex(&config_path, &["build"]);

    let (stdout, stderr, success) = run_postindex(&config_path, &["browse", "--page", "3", "--json"]);
    assert!(success, "browse failed: {}", stderr);
    let view: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(view["status"], "ready");
    assert_eq!(view["current_page"], 3);
    assert_eq!(view["records"].as_array().unwrap().len(), 5);
    assert_eq!(view["has_next"], false);
    assert_eq!(view["has_previous"], true);
}

#[test]
fn test_browse_infinite_with_tag() {
    let (_tmp, config_path) = setup_site();
    run_postindex(&config_path, &["build"]);

    let (stdout, _, success) = run_postindex(
        &config_path,
        &["browse", "--infinite", "--pages", "3", "--tag", "rust", "--json"],
    );
    assert!(success);
    let view: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(view["current_page"], 3);
    assert_eq!(view["records"].as_array().unwrap().len(), 9);
    assert!(view["pagination"].as_array().unwrap().is_empty());
}

#[test]
fn test_browse_out_of_range_page_keeps_first_page() {
    let (_tmp, config_path) = setup_site();
    run_postindex(&config_path, &["build"]);

    let (stdout, _, success) = run_postindex(&config_path, &["browse", "--page", "9"]);
    assert!(success);
    assert!(stdout.contains("1. 2024-02-14  Post 44"));
    assert!(stdout.contains("[1] 2 3 »"));
}

#[test]
fn test_browse_without_index_fails() {
    let (_tmp, config_path) = setup_site();
    let (_, stderr, success) = run_postindex(&config_path, &["browse"]);
    assert!(!success);
    assert!(stderr.contains("status 404"), "stderr={}", stderr);
}

#[test]
fn test_stats_verifies_chain() {
    let (_tmp, config_path) = setup_site();
    run_postindex(&config_path, &["build"]);

    let (stdout, stderr, success) = run_postindex(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Items:       45"));
    assert!(stdout.contains("Chain OK"));
}

#[test]
fn test_session_reads_commands_from_stdin() {
    let (_tmp, config_path) = setup_site();
    run_postindex(&config_path, &["build"]);

    let mut child = Command::new(postindex_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(["session", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"page 2\nsearch post 1\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let last: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    assert_eq!(last["current_page"], 2);
    assert_eq!(last["search_query"], "post 1");
    // Page 2 holds posts 24 down to 5.
    assert_eq!(last["records"].as_array().unwrap().len(), 10);
}
