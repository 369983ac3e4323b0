mod common;

use std::fs;
use std::sync::Arc;

use common::{name, people_schema};
use sombra_planner::config::{ConfigError, PlannerConfig};
use sombra_planner::query::metadata::TxSnapshot;
use sombra_planner::query::serializer::StandardIndexSerializer;
use sombra_planner::query::GraphQueryBuilder;
use sombra_planner::schema::{ElementCategory, IndexDescriptor};
use sombra_planner::types::{IndexId, Result, SombraError};
use tempfile::tempdir;

fn load(path: &std::path::Path) -> Result<PlannerConfig> {
    Ok(PlannerConfig::load(path)?)
}

#[test]
fn file_config_drives_index_limits() -> Result<()> {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planner.toml");
    fs::write(
        &path,
        "adjust_query_limit = true\ndefault_no_limit = 40\nmax_base_limit = 500\nhard_max_limit = 1000\n",
    )
    .expect("write config");
    let config = load(&path)?;

    let index =
        IndexDescriptor::composite(IndexId(1), "by_name", ElementCategory::Vertex, [name()]);
    let tx = TxSnapshot::new(Arc::new(people_schema().with_index(index)), config);
    let serializer = StandardIndexSerializer::new();
    let builder = GraphQueryBuilder::new(&tx, &serializer)
        .has_value("name", "ada")?
        .freeze();

    let unlimited = builder.construct_query(ElementCategory::Vertex)?;
    assert_eq!(unlimited.plan().limit(), 80);

    let capped = builder
        .clone()
        .limit(5_000)
        .construct_query(ElementCategory::Vertex)?;
    assert_eq!(capped.plan().limit(), 1000);
    Ok(())
}

#[test]
fn config_errors_surface_through_the_crate_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "hard_max_limit = \"lots\"\n").expect("write config");
    match load(&path) {
        Err(SombraError::Config(ConfigError::Parse { path: Some(p), .. })) => assert_eq!(p, path),
        other => panic!("expected parse error, found {other:?}"),
    }

    fs::write(&path, "default_no_limit = 0\n").expect("write config");
    let err = load(&path).expect_err("zero limit rejected");
    assert!(err.to_string().contains("greater than zero"));
}
