use std::fs;
use std::path::Path;

use rental_cleaner::error::CleanerError;
use rental_cleaner::pipeline::processing::address::{AddressInference, StationList};
use rental_cleaner::pipeline::processing::geocode::Geocoder;
use rental_cleaner::pipeline::processing::normalize::DropReason;
use rental_cleaner::pipeline::processing::outlier::BoundingBox;
use rental_cleaner::pipeline::{Pipeline, SourcePaths};

/// Resolves any query containing a known fragment.
struct FragmentGeocoder(Vec<(&'static str, (f64, f64))>);

impl Geocoder for FragmentGeocoder {
    fn geocode(&self, address: &str) -> anyhow::Result<Option<(f64, f64)>> {
        Ok(self
            .0
            .iter()
            .find(|(fragment, _)| address.contains(fragment))
            .map(|(_, point)| *point))
    }
}

const GUY_HOQUET: &str = "\
prop_type|city|price|descr|feats|feats2
Appartement|Paris 75008|1 200 €|Bel appartement rue de Miromesnil|['45 m²', '2 pièces', '1 chambre(s)', '3e étage']|['Ascenseur', 'Meublé Oui', 'Cave']
Appartement|Paris 75008|1 200 €|Bel appartement rue de Miromesnil|['45 m²', '2 pièces', '1 chambre(s)', '3e étage']|['Ascenseur', 'Meublé Oui', 'Cave']
Maison|Argenteuil 95100|1 500 €|Maison avec jardin|['80 m²', '4 pièces']|['Jardin', 'Meublé Non', 'Cave']
";

const LAFORET: &str = "\
title|price|descr|feats|dept|furnitures
Appartement T3 Paris 13|1 300 €|Lumineux, proche de Bastille|60 m²#3 pièces#2 chbre|94|is_unfurnished
Parking Orsay|100 €|Box fermé|12 m²#1 pièce|91|
";

const ORPI: &str = "\
ref|prop_type|city|dept|rooms|surface|price|descr|conso|emiss|feats
O1|Appartement|Paris 4|75|2 pièces|38,5 m²|1 100 €|Charmant deux pièces quai des Celestins|||['Meublé', '1 chambre']
O2|Maison|Vincennes|94|4 pièces|90 m²|Loué|Maison familiale|||[]
O3|Appartement|Nanterre|92|1 pièce|20 m²|700 €|Studio lumineux|||[]
";

fn write_sources(dir: &Path) -> SourcePaths {
    let paths = SourcePaths {
        guy_hoquet: dir.join("guy_hoquet.csv"),
        laforet: dir.join("laforet.csv"),
        orpi: dir.join("orpi.csv"),
    };
    fs::write(&paths.guy_hoquet, GUY_HOQUET).unwrap();
    fs::write(&paths.laforet, LAFORET).unwrap();
    fs::write(&paths.orpi, ORPI).unwrap();
    paths
}

fn pipeline() -> Pipeline {
    let stations = StationList::from_names(["Bastille", "Commerce"]);
    let inference = AddressInference::new(&stations).unwrap();
    let geocoder = FragmentGeocoder(vec![
        ("miromesnil", (48.87, 2.31)),
        ("argenteuil", (50.0, 2.0)),
        ("metro bastille", (48.853, 2.369)),
        ("celestins", (48.85, 2.35)),
    ]);
    Pipeline::new(inference, Box::new(geocoder), BoundingBox::default())
}

#[test]
fn test_full_run_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path());

    let (rows, result) = pipeline().run(&paths).unwrap();

    let depts: Vec<u32> = rows.iter().map(|r| r.dept).collect();
    assert_eq!(depts, vec![75008, 75013, 75004]);

    let eighth = &rows[0];
    assert_eq!(eighth.price, 1200);
    assert_eq!(eighth.surface, 45.0);
    assert_eq!(eighth.furnished, 1);
    assert_eq!(eighth.is_house, 0);
    assert_eq!((eighth.lat, eighth.lon), (48.87, 2.31));

    assert_eq!(rows[1].bedrooms, 2);
    assert_eq!(rows[1].furnished, 0);
    assert_eq!(rows[2].surface, 38.5);

    let (source, guy_hoquet) = &result.sources[0];
    assert_eq!(*source, "guy_hoquet");
    assert_eq!(guy_hoquet.rows_in, 3);
    assert_eq!(guy_hoquet.duplicates_removed, 1);
    assert_eq!(guy_hoquet.rows_kept, 2);

    let (_, orpi) = &result.sources[2];
    assert_eq!(orpi.rows_kept, 2);
    assert_eq!(orpi.total_dropped(), 1);

    assert_eq!(result.merged_rows, 5);
    assert_eq!(result.geocode.found, 4);
    assert_eq!(result.geocode.no_match, 1);
    assert_eq!(result.outliers.outside_box, 1);
    assert_eq!(result.outliers.retained, 3);
}

#[test]
fn test_run_to_disk_writes_monthly_table() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path());
    let data_folder = dir.path().join("data");

    let result = pipeline().run_to_disk(&paths, &data_folder).unwrap();

    let output = result.output_file.unwrap();
    assert!(output.ends_with("_clean.csv"));
    let file_name = Path::new(&output).file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("locations_"));

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "price|surface|rooms|bedrooms|is_house|furnished|dept|lat|lon");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("1200|45.0|2|1|0|1|75008|"));
    assert!(!content.contains("50.0|2.0"));
}

#[test]
fn test_normalize_to_disk_keeps_addresses() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path());
    let output = dir.path().join("addressed.csv");

    let result = pipeline().normalize_to_disk(&paths, &output).unwrap();
    assert_eq!(result.merged_rows, 5);
    assert_eq!(result.addressed_rows, 5);

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("rue de miromesnil paris  france"));
    assert!(content.contains("nanterre hauts-de-seine france"));
}

#[test]
fn test_missing_column_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path());
    fs::write(&paths.orpi, "ref|prop_type|city\nO1|Maison|Vincennes\n").unwrap();

    match pipeline().run(&paths) {
        Err(CleanerError::MissingColumn { source_name, column }) => {
            assert_eq!(source_name, "orpi");
            assert_eq!(column, "dept");
        }
        other => panic!("expected a missing column error, got {:?}", other.map(|(rows, _)| rows.len())),
    }
}

#[test]
fn test_undecodable_row_only_costs_that_row() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path());
    let mut guy_hoquet = GUY_HOQUET.as_bytes().to_vec();
    guy_hoquet.extend_from_slice(b"Appartement|Paris 75011|900 \xe2\x82\xac|Caf\xff cr\xe8me|['20 m2', '1 piece']|[]\n");
    fs::write(&paths.guy_hoquet, guy_hoquet).unwrap();

    let (rows, result) = pipeline().run(&paths).unwrap();

    let (_, summary) = &result.sources[0];
    assert_eq!(summary.rows_in, 4);
    assert_eq!(summary.rows_kept, 2);
    assert_eq!(summary.dropped.get(&DropReason::UnreadableRow), Some(&1));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].dept, 75008);
}
