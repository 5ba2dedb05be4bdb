//! Integration test: settings and mapping tables read from disk

use std::io::Write;
use zq_transform::{InMemoryLookup, MappingLookup, MappingType, TransformerConfig};

#[test]
fn test_load_config_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "strict_mode: true")?;
    writeln!(file, "include_attachments: false")?;
    writeln!(file, "project_key: QA")?;

    let config = TransformerConfig::load_from_file(file.path())?;
    assert_eq!(
        config,
        TransformerConfig::default()
            .strict(true)
            .attachments(false)
            .with_project_key("QA")
    );
    Ok(())
}

#[test]
fn test_load_mapping_table() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{"QA": {{"folder_to_cycle": {{"8": 81}}, "test_cycle": {{"QA-R2": "902"}}}}}}"#
    )?;

    let lookup = InMemoryLookup::load_from_file(file.path())?;
    assert_eq!(lookup.len(), 2);
    assert_eq!(
        lookup.lookup("QA", MappingType::FolderToCycle, "8")?,
        Some("81".to_string())
    );
    Ok(())
}

#[test]
fn test_invalid_mapping_table() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "not json")?;
    let err = InMemoryLookup::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
    Ok(())
}
