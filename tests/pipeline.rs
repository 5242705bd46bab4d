use std::fs;
use std::path::Path;

use rvedeck::deck::{DeckOptions, OrientationSource, generate_deck};
use rvedeck::model::AssignedOrientations;
use rvedeck::store::load_assignment;
use tempfile::TempDir;

const FACES: [&str; 6] = ["x0", "x1", "y0", "y1", "z0", "z1"];

/// Unit cube meshed with 3x3x3 nodes plus its six face node sets.
fn cube_mesh() -> String {
    let coord = [0.0, 0.5, 1.0];
    let mut text = String::from("*Part, name=TESS\n*Node\n");
    let mut sets: [Vec<u64>; 6] = Default::default();
    let mut id = 0u64;
    for k in 0..3 {
        for j in 0..3 {
            for i in 0..3 {
                id += 1;
                text.push_str(&format!("{id}, {}, {}, {}\n", coord[i], coord[j], coord[k]));
                for (axis, idx) in [i, j, k].into_iter().enumerate() {
                    match idx {
                        0 => sets[axis * 2].push(id),
                        2 => sets[axis * 2 + 1].push(id),
                        _ => {}
                    }
                }
            }
        }
    }
    text.push_str("*Element, type=C3D8\n1, 1, 2, 5, 4, 10, 11, 14, 13\n");
    text.push_str("*Elset, elset=poly1\n1\n");
    for (name, set) in FACES.iter().zip(&sets) {
        text.push_str(&format!("*Nset, nset={name}\n"));
        let ids: Vec<String> = set.iter().map(|n| n.to_string()).collect();
        text.push_str(&ids.join(", "));
        text.push_str("\n\n");
    }
    text.push_str("*End Part\n");
    text
}

const TESS: &str = "\
***tess
 **format
   3.4
 **cell
   3
  *ori
   euler-bunge
   10.0 20.0 30.0
   -5.0 45.0 90.0
   120.5 0.0 270.0
 **vertex
 0
***end
";

const STELSET: &str = "0.412\n0.5\n0.3333\n";

const STCELL: &str = "1 1 1\n1 1 2\n1 2 1\n";

const BANK: &str = r#"{
    "PAG_7": {
        "PCK_small": [{"phi1": 40.0, "phi": 50.0, "phi2": 60.0}],
        "PCK_big": [
            {"phi1": 11.0, "phi": 21.0, "phi2": 31.0},
            {"phi1": 12.0, "phi": 22.0, "phi2": 32.0},
            {"phi1": 13.0, "phi": 23.0, "phi2": 33.0}
        ]
    }
}"#;

fn rve_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let p = dir.path();
    fs::write(p.join("rve.inp"), cube_mesh()).unwrap();
    fs::write(p.join("rve.tess"), TESS).unwrap();
    fs::write(p.join("rve.stelset"), STELSET).unwrap();
    fs::write(p.join("rve.stcell"), STCELL).unwrap();
    fs::write(p.join("bank.json"), BANK).unwrap();
    dir
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn tess_orientations_produce_full_deck() {
    let dir = rve_dir();
    let report = generate_deck(dir.path(), &DeckOptions::default()).unwrap();

    assert_eq!(report.grains, 3);
    assert_eq!(report.deck, dir.path().join("rve_deck.inp"));
    assert_eq!(report.written.len(), 10);
    assert!(report.snapshot.is_none());
    for name in [
        "graindata.inp",
        "rve_sections.inp",
        "rve_materials.inp",
        "LeftToRight.inp",
        "BottomToTop.inp",
        "FrontToRear.inp",
        "Edges.inp",
        "Corners.inp",
        "VerticeSets.inp",
    ] {
        assert!(dir.path().join(name).is_file(), "{name} not written");
    }

    assert_eq!(
        read(&dir.path().join("graindata.inp")),
        "!MMM Crystal Plasticity Input File\n\n\
         Grain : 1 : 10.000 : 20.000 : 30.000 : 0.412\n\
         Grain : 2 : 355.000 : 45.000 : 90.000 : 0.500\n\
         Grain : 3 : 120.500 : 360.000 : 270.000 : 0.333\n"
    );

    let deck = read(&report.deck);
    assert!(deck.starts_with("*Heading\n"));
    assert!(deck.contains("\n1, 0, 0, 0\n"));
    assert!(deck.contains("*Include, Input = rve_sections.inp\n"));
    assert!(deck.contains("*Include, input=rve_materials.inp\n"));
    assert_eq!(deck.matches("*End Part").count(), 1);

    // The mesh itself is left alone.
    assert_eq!(read(&dir.path().join("rve.inp")), cube_mesh());
}

#[test]
fn rerun_ignores_generated_files() {
    let dir = rve_dir();
    generate_deck(dir.path(), &DeckOptions::default()).unwrap();
    let first = read(&dir.path().join("rve_deck.inp"));
    generate_deck(dir.path(), &DeckOptions::default()).unwrap();
    assert_eq!(read(&dir.path().join("rve_deck.inp")), first);
}

#[test]
fn bank_assignment_then_resume() {
    let dir = rve_dir();
    let out = dir.path().join("out");
    let report = generate_deck(
        dir.path(),
        &DeckOptions {
            source: OrientationSource::Bank(dir.path().join("bank.json")),
            out_dir: Some(out.clone()),
            progress: false,
        },
    )
    .unwrap();

    assert!(report.extensions.is_empty());
    let snapshot = report.snapshot.clone().unwrap();
    assert_eq!(snapshot, out.join("rve_assignment.npz"));

    // Sub-group sizes [2, 1] take the two leading records of the larger
    // bank sub-group and the single record of the smaller one.
    let assigned = load_assignment(&snapshot).unwrap();
    let phi1: Vec<f64> = assigned.iter().map(|(_, e)| e.phi1).collect();
    assert_eq!(phi1, vec![11.0, 12.0, 40.0]);
    let graindata = read(&out.join("graindata.inp"));
    assert!(graindata.contains("Grain : 3 : 40.000 : 50.000 : 60.000 : 0.333\n"));

    let resumed_out = dir.path().join("resumed");
    generate_deck(
        dir.path(),
        &DeckOptions {
            source: OrientationSource::Snapshot(snapshot),
            out_dir: Some(resumed_out.clone()),
            progress: false,
        },
    )
    .unwrap();
    assert_eq!(read(&resumed_out.join("graindata.inp")), graindata);
}

#[test]
fn missing_stelset_is_reported() {
    let dir = rve_dir();
    fs::remove_file(dir.path().join("rve.stelset")).unwrap();
    let err = generate_deck(dir.path(), &DeckOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains(".stelset"));
}

#[test]
fn gapped_snapshot_is_rejected() {
    let dir = rve_dir();
    let mut assigned = AssignedOrientations::new();
    assigned.insert(1, rvedeck::model::EulerAngles::new(1.0, 2.0, 3.0));
    assigned.insert(3, rvedeck::model::EulerAngles::new(4.0, 5.0, 6.0));
    let snap = dir.path().join("gapped.npz");
    rvedeck::store::save_assignment(&snap, &assigned).unwrap();

    let err = generate_deck(
        dir.path(),
        &DeckOptions {
            source: OrientationSource::Snapshot(snap),
            out_dir: None,
            progress: false,
        },
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("1..N"));
}
