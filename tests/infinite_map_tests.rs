// tests/infinite_map_tests.rs

use std::path::Path;

use tiled_ir::{Gid, Layer, Loader, MapError, TileLayer, Tilemap};

/// A 16x16 chunk as csv, empty except for `gid` at chunk-local `(col, row)`.
fn chunk_csv(col: usize, row: usize, gid: u32) -> String {
    let cells: Vec<String> = (0..256)
        .map(|i| if i == row * 16 + col { gid.to_string() } else { "0".to_string() })
        .collect();
    cells.join(",")
}

fn infinite_map(chunks: &str) -> Result<Tilemap, MapError> {
    let xml = format!(
        r#"<map version="1.10" orientation="orthogonal" renderorder="right-down"
                width="4" height="4" tilewidth="16" tileheight="16" infinite="1">
             <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16"
                      tilecount="8" columns="4">
               <image source="terrain.png" width="64" height="32"/>
             </tileset>
             <layer id="1" name="ground" width="4" height="4">
               <data encoding="csv">{}</data>
             </layer>
           </map>"#,
        chunks
    );
    Loader::new().parse_map_str(&xml, Path::new("."))
}

fn ground(map: &Tilemap) -> &TileLayer {
    match map.layer_named("ground") {
        Some(Layer::Tile(layer)) => layer,
        _ => panic!("ground layer missing"),
    }
}

#[test]
fn tiles_resolve_inside_their_chunk_and_gaps_are_empty() {
    let chunks = format!(
        r#"<chunk x="0" y="0" width="16" height="16">{}</chunk>
           <chunk x="-16" y="16" width="16" height="16">{}</chunk>"#,
        chunk_csv(2, 3, 7),
        chunk_csv(0, 0, 3),
    );
    let map = infinite_map(&chunks).unwrap();
    let layer = ground(&map);

    let hit = map.tile_at(layer, 2, 3).expect("tile inside first chunk");
    assert_eq!(hit.local_id, 6);

    let negative = map.tile_at(layer, -16, 16).expect("tile inside negative chunk");
    assert_eq!(negative.local_id, 2);

    // a coordinate covered by a chunk but not set is empty
    assert_eq!(map.tile_at(layer, 5, 5), None);
    // a coordinate in no chunk at all is empty too, not an error
    assert_eq!(map.tile_at(layer, 1000, 1000), None);
    assert_eq!(layer.gid_at(1000, 1000), Gid::EMPTY);
}

#[test]
fn chunk_payload_must_match_declared_size() {
    let chunks = r#"<chunk x="0" y="0" width="16" height="16">1,2,3</chunk>"#;
    let err = infinite_map(chunks).unwrap_err();
    assert_eq!(err, MapError::CellCountMismatch { expected: 256, actual: 3 });
}

#[test]
fn misaligned_chunk_origin_is_malformed() {
    let chunks = format!(
        r#"<chunk x="3" y="0" width="16" height="16">{}</chunk>"#,
        chunk_csv(0, 0, 1)
    );
    let err = infinite_map(&chunks).unwrap_err();
    assert!(matches!(err, MapError::MalformedDocument { element, .. } if element == "chunk"));
}

#[test]
fn duplicate_chunk_origin_is_malformed() {
    let chunks = format!(
        r#"<chunk x="0" y="0" width="16" height="16">{}</chunk>
           <chunk x="0" y="0" width="16" height="16">{}</chunk>"#,
        chunk_csv(0, 0, 1),
        chunk_csv(1, 0, 1),
    );
    let err = infinite_map(&chunks).unwrap_err();
    assert!(matches!(err, MapError::MalformedDocument { .. }));
}
