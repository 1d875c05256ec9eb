mod util;
use util::*;

use mesh_scatter::algs::distribute::{DistributedIndex, LocalOrdering, build_distributed_index};
use mesh_scatter::grid::data::GridData;
use mesh_scatter::grid::DistributionConfig;
use mesh_scatter::topology::ownership::Attribute;

#[test]
fn distributed_index_survives_json() {
    let export = [
        exp(0, 0, Attribute::Owner),
        exp(1, 1, Attribute::Owner),
        exp(1, 0, Attribute::Copy),
    ];
    let mut import = vec![imp(0, 0, Attribute::Owner), imp(1, 0, Attribute::Copy)];
    let index = build_distributed_index(&export, &mut import, 1, LocalOrdering::GlobalOrder).unwrap();

    let json = serde_json::to_string(&index).unwrap();
    let back: DistributedIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(back, index);
    assert_eq!(back.interfaces.send_list(0), &[0, 1]);
    assert_eq!(back.interfaces.send_list(1), &[1]);
}

#[test]
fn attribute_and_config_encoding() {
    let v = serde_json::to_value(Attribute::Overlap).unwrap();
    assert_eq!(v, serde_json::json!("Overlap"));

    let config = DistributionConfig {
        ordering: LocalOrdering::OwnersFirst,
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(serde_json::from_str::<DistributionConfig>(&json).unwrap(), config);
}

#[test]
fn grid_data_dump() {
    let g = GridData::cartesian([2, 1, 1], [1.0; 3]);
    let v = serde_json::to_value(&g).unwrap();
    assert_eq!(v["global_cell"], serde_json::json!([0, 1]));
    assert_eq!(v["face_cells"], serde_json::json!([[0, 1]]));
    let back: GridData = serde_json::from_value(v).unwrap();
    assert_eq!(back, g);
}
