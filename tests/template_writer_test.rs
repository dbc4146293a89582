// ==========================================
// 模板写出集成测试
// ==========================================
// 覆盖: 仅表头模板、JSON 请求体、校验失败时不落盘
// ==========================================

use staging_service::import_specifications::{
    write_import_specification, CellValue, SpecFormat, TemplateSpecs, WriteError,
};
use std::fs;

use test_helpers::{row, template};

fn single(datatype: &str, spec: staging_service::TemplateSpec) -> TemplateSpecs {
    let mut types = TemplateSpecs::new();
    types.insert(datatype.to_string(), spec);
    types
}

#[test]
fn test_header_only_csv_template() {
    let dir = tempfile::tempdir().unwrap();
    let types = single("genome", template(&[("id", "ID"), ("name", "Name")], vec![]));

    let created = write_import_specification(dir.path(), SpecFormat::Csv, &types).unwrap();
    assert_eq!(created["genome"], "genome.csv");

    let content = fs::read_to_string(dir.path().join("genome.csv")).unwrap();
    assert_eq!(
        content,
        "Data type: genome; Columns: 2; Version: 1\nid,name\nID,Name\n"
    );
}

#[test]
fn test_tsv_template_from_json_request() {
    let dir = tempfile::tempdir().unwrap();
    let types: TemplateSpecs = serde_json::from_str(
        r#"{
            "media": {
                "order_and_display": [["compound", "Compound"], ["conc", "Concentration (mM)"]],
                "data": [
                    {"compound": "glucose", "conc": 10},
                    {"compound": "nitrate", "conc": null}
                ]
            }
        }"#,
    )
    .unwrap();
    assert_eq!(types["media"].data[1]["conc"], CellValue::Null);

    let created = write_import_specification(dir.path(), SpecFormat::Tsv, &types).unwrap();
    let content = fs::read_to_string(dir.path().join(&created["media"])).unwrap();
    assert_eq!(
        content,
        "Data type: media; Columns: 2; Version: 1\n\
         compound\tconc\n\
         Compound\tConcentration (mM)\n\
         glucose\t10\n\
         nitrate\t\n"
    );
}

#[test]
fn test_mismatched_keys_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut types = single(
        "genome",
        template(
            &[("id", "ID"), ("name", "Name")],
            vec![row(&[("id", CellValue::Int(1)), ("name", CellValue::from("a"))])],
        ),
    );
    // 第二个数据类型的数据行缺少 name
    types.insert(
        "reads".to_string(),
        template(
            &[("id", "ID"), ("name", "Name")],
            vec![row(&[("id", CellValue::Int(2))])],
        ),
    );

    for format in SpecFormat::ALL {
        let err = write_import_specification(dir.path(), format, &types).unwrap_err();
        assert!(matches!(err, WriteError::InvalidSpecification(_)));
        assert_eq!(
            err.to_string(),
            "Data type reads data row 0 does not have the same keys as order_and_display"
        );
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_specifications() {
    let dir = tempfile::tempdir().unwrap();

    let err = write_import_specification(dir.path(), SpecFormat::Csv, &TemplateSpecs::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "At least one data type must be specified");

    let types = single("a/b", template(&[("id", "ID")], vec![]));
    let err = write_import_specification(dir.path(), SpecFormat::Csv, &types).unwrap_err();
    assert_eq!(err.to_string(), "Data type a/b cannot contain path separators");

    let types = single("genome", template(&[], vec![]));
    let err = write_import_specification(dir.path(), SpecFormat::Tsv, &types).unwrap_err();
    assert_eq!(
        err.to_string(),
        "At least one entry is required for order_and_display for type genome"
    );

    let types = single("genome", template(&[("id", "ID"), ("id", "Other")], vec![]));
    let err = write_import_specification(dir.path(), SpecFormat::Excel, &types).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid order_and_display entry for datatype genome at index 1 - duplicate parameter ID id"
    );

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_unparseable_datatype_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let types = single("gff-genome", template(&[("id", "ID")], vec![]));

    for format in SpecFormat::ALL {
        let err = write_import_specification(dir.path(), format, &types).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data type gff-genome may only contain letters, digits and underscores"
        );
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let types = single("genome", template(&[("id", "ID")], vec![]));

    let err = write_import_specification(&missing, SpecFormat::Csv, &types).unwrap_err();
    assert!(matches!(err, WriteError::MissingDirectory(ref p) if p == &missing));
    assert!(!missing.exists());
}
