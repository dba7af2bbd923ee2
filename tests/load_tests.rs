// tests/load_tests.rs

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tiled_ir::{Loader, MapError};

fn temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("tiled_ir_load_{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

const TSX: &str = r#"
    <tileset name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
      <image source="terrain.png" width="32" height="32"/>
    </tileset>
"#;

const TMX: &str = r#"
    <map version="1.10" orientation="orthogonal" width="2" height="2"
         tilewidth="16" tileheight="16">
      <tileset firstgid="1" source="terrain.tsx"/>
      <layer id="1" name="ground" width="2" height="2">
        <data encoding="csv">1,2,3,4</data>
      </layer>
    </map>
"#;

#[test]
fn external_tileset_loads_relative_to_the_map() -> Result<()> {
    let dir = temp_dir();
    fs::write(dir.join("terrain.tsx"), TSX)?;
    fs::write(dir.join("map.tmx"), TMX)?;

    let map = Loader::new().load_map(dir.join("map.tmx"))?;
    let (first_gid, tileset) = map.tilesets().next().expect("one tileset");
    assert_eq!(first_gid, 1);
    assert_eq!(tileset.name, "terrain");
    assert_eq!(tileset.tile_count, 4);
    Ok(())
}

#[test]
fn two_maps_share_one_parsed_tileset() -> Result<()> {
    let dir = temp_dir();
    fs::write(dir.join("terrain.tsx"), TSX)?;
    fs::write(dir.join("a.tmx"), TMX)?;
    fs::write(dir.join("b.tmx"), TMX)?;

    let loader = Loader::new();
    let a = loader.load_map(dir.join("a.tmx"))?;
    let b = loader.load_map(dir.join("b.tmx"))?;

    let (_, ts_a) = a.tilesets().next().unwrap();
    let (_, ts_b) = b.tilesets().next().unwrap();
    assert!(Arc::ptr_eq(ts_a, ts_b));
    Ok(())
}

#[test]
fn missing_map_file_is_a_missing_resource() {
    let err = Loader::new().load_map("nonexistent.tmx").unwrap_err();
    assert!(matches!(err, MapError::MissingExternalResource { .. }));
}

#[test]
fn missing_external_tileset_fails_the_map_parse() {
    let dir = temp_dir();
    fs::write(dir.join("map.tmx"), TMX).unwrap();

    let err = Loader::new().load_map(dir.join("map.tmx")).unwrap_err();
    assert!(matches!(err, MapError::MissingExternalResource { .. }));
}
