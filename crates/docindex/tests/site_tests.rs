//! End-to-end tests against a generated documentation site fixture.

use std::path::{Path, PathBuf};

use docindex::config::SourceConfig;
use docindex::docset::Severity;
use docindex::search::MatchKind;
use docindex::{DocSet, Error, ImportOutcome, NavChildren, SearchMode, SearchQuery, Storage};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fsp")
}

fn load() -> DocSet {
    DocSet::load(fixture_root(), &SourceConfig::default()).expect("fixture site should load")
}

#[test]
fn loads_navigation_tree() {
    let site = load();
    let nav = &site.nav;

    assert_eq!(nav.roots.len(), 1);
    assert_eq!(nav.roots[0].label, "RZN Flexible Software Package Documentation");
    assert_eq!(nav.len(), 46);
    assert_eq!(nav.max_depth(), Some(4));
    assert_eq!(nav.deferred(), vec!["modules"]);
    assert_eq!(nav.chunk_index.len(), 24);
    assert!(nav.sync_messages.is_some());

    let api = nav.find_by_link("modules.html").unwrap();
    assert_eq!(api.children, NavChildren::Deferred("modules".to_string()));
}

#[test]
fn locates_breadcrumbs() {
    let site = load();
    let path = site
        .nav
        .locate("_f_s_p__a_r_c_h_i_t_e_c_t_u_r_e.html#fsp-interface-api-structure")
        .unwrap();
    let labels: Vec<_> = path.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "RZN Flexible Software Package Documentation",
            "FSP Architecture",
            "FSP Interfaces",
            "FSP Interface Data Structures",
            "FSP Interface API Structure",
        ]
    );
}

#[test]
fn loads_search_tables_by_category() {
    let site = load();
    assert_eq!(site.search.len(), 36);
    assert_eq!(site.search.categories().get("enums"), Some(&36));
    assert_eq!(site.sources.len(), 2);
    assert_eq!(site.sources[0].path, "navtreedata.js");
    assert_eq!(site.sources[1].path, "search/enums_d.js");
}

#[test]
fn searches_loaded_site() {
    let site = load();

    let hits = site
        .search
        .search(&SearchQuery::new("spi_ssl").mode(SearchMode::Prefix))
        .unwrap();
    let names: Vec<_> = hits.iter().map(|h| h.entry.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["spi_ssl_mode_t", "spi_ssl_polarity_t", "spi_ssl_select_t"]
    );

    let hits = site
        .search
        .search(&SearchQuery::new("clock_source").source("r_sci_uart.h"))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.name, "sci_uart_clock_source_t");
    assert_eq!(hits[0].kind, MatchKind::Interior);
    assert_eq!(
        hits[0].entry.targets[0].root_link(),
        "group___s_c_i___u_a_r_t.html#ga62708954aea3d9755a464318c83055fb"
    );
}

#[test]
fn check_reports_only_informational_findings() {
    let report = load().check();
    assert!(report.is_clean(), "unexpected warnings: {:?}", report.findings);
    assert!(report
        .findings
        .iter()
        .all(|f| f.severity == Severity::Info));
    assert!(report
        .findings
        .iter()
        .any(|f| f.message.contains("group___s_p_i___a_p_i.html")));
}

#[test]
fn indexes_into_storage() {
    let site = load();
    let mut storage = Storage::open_in_memory().unwrap();

    assert_eq!(
        storage.import(&site, false).unwrap(),
        ImportOutcome::Imported {
            nav_nodes: 46,
            search_entries: 36
        }
    );
    assert_eq!(storage.import(&site, false).unwrap(), ImportOutcome::Unchanged);

    let hits = storage.search("sdram", Some("enums"), None, 0).unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|h| h.targets[0].source.as_deref() == Some("r_sdram_api.h")));

    let path = storage.locate("index.html#purpose-fsp").unwrap().unwrap();
    assert_eq!(path.last().map(|n| n.label.as_str()), Some("Purpose"));
}

#[test]
fn missing_navtree_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DocSet::load(dir.path(), &SourceConfig::default()).unwrap_err();
    assert!(matches!(err, Error::ReadFile { .. }));
}

#[test]
fn missing_search_dir_gives_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("navtreedata.js"),
        r#"var NAVTREE = [ [ "Home", "index.html", null ] ];"#,
    )
    .unwrap();

    let site = DocSet::load(dir.path(), &SourceConfig::default()).unwrap();
    assert!(site.search.is_empty());
    assert_eq!(site.nav.len(), 1);
}

#[test]
fn non_table_files_are_skipped_and_bad_tables_fail() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("navtreedata.js"),
        r#"var NAVTREE = [ [ "Home", "index.html", null ] ];"#,
    )
    .unwrap();
    let search = dir.path().join("search");
    std::fs::create_dir(&search).unwrap();
    std::fs::write(search.join("search.js"), "function ignored() {}").unwrap();
    std::fs::write(
        search.join("functions_0.js"),
        "var searchData=[['open',['open',['../index.html#a',1,'r_x.h']]]];",
    )
    .unwrap();

    let site = DocSet::load(dir.path(), &SourceConfig::default()).unwrap();
    assert_eq!(site.search.len(), 1);
    assert_eq!(site.search.categories().get("functions"), Some(&1));

    std::fs::write(search.join("functions_1.js"), "var searchData=[['broken'];").unwrap();
    let err = DocSet::load(dir.path(), &SourceConfig::default()).unwrap_err();
    assert!(err.is_parse_error());
}
