// tests/stockpile_verify.rs

use sdmflow::fs::mock::MockFileSystem;
use sdmflow::stockpile::{
    ArtifactKind, ArtifactRef, ArtifactValidator, Status, StatusRegion, ValidationFailure,
    Validators, verify,
};

fn one(path: &str, kind: ArtifactKind) -> Vec<ArtifactRef> {
    vec![ArtifactRef::new(path, kind)]
}

#[test]
fn status_regions() {
    assert_eq!(Status::Complete.region(), StatusRegion::Complete);
    assert_eq!(Status::NotFound.region(), StatusRegion::Error);
    assert_eq!(Status::GeneralError.region(), StatusRegion::Error);
    assert_eq!(Status::Other(2500).region(), StatusRegion::Error);
    assert_eq!(Status::Running.region(), StatusRegion::InProgress);
    assert_eq!(Status::Other(301).region(), StatusRegion::InProgress);

    assert_eq!(Status::from_code(6000), Status::IoError);
    assert_eq!(Status::IoError.code(), 6000);
    assert_eq!(Status::NotFound.to_string(), "NOT_FOUND(404)");
}

#[test]
fn worst_prefers_errors_then_higher_codes() {
    assert_eq!(Status::Complete.worst(Status::NotFound), Status::NotFound);
    assert_eq!(Status::NotFound.worst(Status::IoError), Status::IoError);
    assert_eq!(Status::IoError.worst(Status::GeneralError), Status::IoError);
    assert_eq!(Status::Running.worst(Status::Complete), Status::Running);
}

#[test]
fn missing_output_is_not_found() {
    let fs = MockFileSystem::new();
    let v = verify(
        None,
        &one("sdm/model.json", ArtifactKind::Json),
        &Validators::standard(),
        &fs,
    );

    assert_eq!(v.status, Status::NotFound);
    assert_eq!(v.diagnostics, vec!["File sdm/model.json does not exist".to_string()]);
}

#[test]
fn assumed_error_is_never_upgraded() {
    let fs = MockFileSystem::new();
    fs.add_file("good.json", "{}");

    let v = verify(
        Some(Status::Other(3000)),
        &one("good.json", ArtifactKind::Json),
        &Validators::standard(),
        &fs,
    );
    assert_eq!(v.status, Status::Other(3000));
    assert!(v.status.is_error());
}

#[test]
fn assumed_non_error_still_checks_outputs() {
    let fs = MockFileSystem::new();
    fs.add_file("good.json", "{\"a\": 1}");

    let v = verify(
        Some(Status::Running),
        &one("good.json", ArtifactKind::Json),
        &Validators::standard(),
        &fs,
    );
    assert_eq!(v.status, Status::Complete);
    assert!(v.is_complete());
}

#[test]
fn empty_output_list_is_complete() {
    let fs = MockFileSystem::new();
    let v = verify(None, &[], &Validators::standard(), &fs);
    assert_eq!(v.status, Status::Complete);
}

#[test]
fn every_output_is_checked_and_worst_wins() {
    let fs = MockFileSystem::new();
    fs.add_file("bad.csv", "1,2\n3\n");
    fs.add_file("bad.json", "{not json");

    let outputs = vec![
        ArtifactRef::new("missing.json", ArtifactKind::Json),
        ArtifactRef::new("bad.json", ArtifactKind::Json),
        ArtifactRef::new("bad.csv", ArtifactKind::Matrix),
    ];
    let v = verify(None, &outputs, &Validators::standard(), &fs);

    assert_eq!(v.status, Status::IoError);
    assert_eq!(v.diagnostics.len(), 3);
}

#[test]
fn unreadable_file_is_io_error() {
    let fs = MockFileSystem::new();
    fs.add_unreadable("locked.tif");

    let v = verify(
        None,
        &one("locked.tif", ArtifactKind::Raster),
        &Validators::standard(),
        &fs,
    );
    assert_eq!(v.status, Status::IoError);
}

#[test]
fn unregistered_kind_is_general_error() {
    let fs = MockFileSystem::new();
    fs.add_file("x.json", "{}");

    let v = verify(None, &one("x.json", ArtifactKind::Json), &Validators::empty(), &fs);
    assert_eq!(v.status, Status::GeneralError);
}

#[test]
fn validator_is_chosen_by_kind_not_extension() {
    let fs = MockFileSystem::new();
    // Valid GeoJSON content behind a misleading extension.
    fs.add_file("layer.tif", r#"{"type": "Point", "coordinates": [1, 2]}"#);

    let as_vector = verify(
        None,
        &one("layer.tif", ArtifactKind::Vector),
        &Validators::standard(),
        &fs,
    );
    let as_raster = verify(
        None,
        &one("layer.tif", ArtifactKind::Raster),
        &Validators::standard(),
        &fs,
    );

    assert_eq!(as_vector.status, Status::Complete);
    assert_eq!(as_raster.status, Status::GeneralError);
}

#[test]
fn matrix_accepts_header_and_whitespace() {
    let fs = MockFileSystem::new();
    fs.add_file("m1.csv", "lon,lat,value\n1.5,2.5,0.3\n-3,4,1e-3\n");
    fs.add_file("m2.txt", "1 2 3\n4 5 6\n");
    fs.add_file("m3.csv", "a,b\n");

    let validators = Validators::standard();
    let check = |p: &str| verify(None, &one(p, ArtifactKind::Matrix), &validators, &fs).status;

    assert_eq!(check("m1.csv"), Status::Complete);
    assert_eq!(check("m2.txt"), Status::Complete);
    assert_eq!(check("m3.csv"), Status::IoError);
}

#[test]
fn vector_without_features_passes_with_a_note() {
    let fs = MockFileSystem::new();
    fs.add_file("occ.geojson", r#"{"type": "FeatureCollection", "features": []}"#);
    fs.add_file("junk.geojson", r#"{"type": "Banana"}"#);

    let v = verify(
        None,
        &one("occ.geojson", ArtifactKind::Vector),
        &Validators::standard(),
        &fs,
    );
    assert_eq!(v.status, Status::Complete);
    assert_eq!(v.diagnostics, vec!["Vector occ.geojson has no features".to_string()]);

    let junk = verify(
        None,
        &one("junk.geojson", ArtifactKind::Vector),
        &Validators::standard(),
        &fs,
    );
    assert_eq!(junk.status, Status::GeneralError);
}

#[test]
fn raster_accepts_tiff_and_ascii_grid() {
    let fs = MockFileSystem::new();
    fs.add_file("a.tif", b"II*\0rest-of-file".to_vec());
    fs.add_file(
        "b.asc",
        "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 0.5\nNODATA_value -9999\n1 2\n3 4\n",
    );
    fs.add_file("c.asc", "ncols 2\nnrows 2\ncellsize 1\n");

    let validators = Validators::standard();
    let check = |p: &str| verify(None, &one(p, ArtifactKind::Raster), &validators, &fs).status;

    assert_eq!(check("a.tif"), Status::Complete);
    assert_eq!(check("b.asc"), Status::Complete);
    assert_eq!(check("c.asc"), Status::GeneralError);
}

struct NonEmpty;

impl ArtifactValidator for NonEmpty {
    fn check(&self, path: &str, contents: &[u8], _: &mut Vec<String>) -> Result<(), ValidationFailure> {
        if contents.is_empty() {
            Err(ValidationFailure::io(format!("{path} is empty")))
        } else {
            Ok(())
        }
    }
}

#[test]
fn custom_validator_can_replace_a_kind() {
    let fs = MockFileSystem::new();
    fs.add_file("marker", "");

    let mut validators = Validators::standard();
    assert_eq!(
        verify(None, &one("marker", ArtifactKind::Generic), &validators, &fs).status,
        Status::Complete
    );

    validators.register(ArtifactKind::Generic, NonEmpty);
    assert_eq!(
        verify(None, &one("marker", ArtifactKind::Generic), &validators, &fs).status,
        Status::IoError
    );
}
