// Copyright 2022 Strata Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use common_exception::Result;
use strata_engine::storages::archive::ArchiveContents;
use strata_engine::storages::archive::DirArchiveReader;
use strata_engine::storages::archive::DirArchiveWriter;
use strata_engine::storages::archive::ARCHIVE_INI_FILE;

use crate::common::int_column;
use crate::common::make_frame;
use crate::common::string_column;

#[test]
fn test_archive_column_roundtrip() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let column = int_column(&[3, 1, 4, 1, 5], 2);

    let mut archive = DirArchiveWriter::create(dir.path())?;
    archive.set_metadata("creator", "unit test");
    archive.save_column(&column)?;
    archive.close()?;

    let reader = DirArchiveReader::open(dir.path())?;
    assert_eq!(reader.contents()?, ArchiveContents::SArray);
    assert_eq!(reader.metadata("creator"), Some("unit test"));
    let loaded = reader.load_column()?;
    assert_eq!(loaded.to_values()?, column.to_values()?);
    Ok(())
}

#[test]
fn test_archive_frame_roundtrip() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let frame = make_frame(vec![
        ("id", int_column(&[1, 2, 3], 2)),
        ("name", string_column(&["a", "b", "c"], 2)),
    ]);

    let mut archive = DirArchiveWriter::create(dir.path())?;
    archive.save_frame(&frame)?;
    archive.close()?;

    let reader = DirArchiveReader::open(dir.path())?;
    assert_eq!(reader.contents()?, ArchiveContents::SFrame);
    let loaded = reader.load_frame()?;
    assert_eq!(loaded.column_names(), vec!["id", "name"]);
    assert_eq!(loaded.to_rows()?, frame.to_rows()?);
    Ok(())
}

#[test]
fn test_archive_contents_validated_before_loading() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let column = int_column(&[1], 1);
    let mut archive = DirArchiveWriter::create(dir.path())?;
    archive.save_column(&column)?;
    archive.close()?;

    let reader = DirArchiveReader::open(dir.path())?;
    let err = reader.load_frame().unwrap_err();
    assert_eq!(err.name(), "BadArchive");
    Ok(())
}

#[test]
fn test_archive_requires_metadata_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = DirArchiveReader::open(dir.path()).unwrap_err();
    assert_eq!(err.name(), "NotFound");
}

#[test]
fn test_archive_close_requires_contents() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let archive = DirArchiveWriter::create(dir.path())?;
    let err = archive.close().unwrap_err();
    assert_eq!(err.name(), "BadArchive");
    assert!(!dir.path().join(ARCHIVE_INI_FILE).exists());
    Ok(())
}

#[test]
fn test_archive_graph_contents_recognized() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let mut archive = DirArchiveWriter::create(dir.path())?;
    archive.set_metadata("contents", "graph");
    archive.close()?;

    let reader = DirArchiveReader::open(dir.path())?;
    assert_eq!(reader.contents()?, ArchiveContents::Graph);
    let err = reader.load_column().unwrap_err();
    assert_eq!(err.name(), "BadArchive");
    Ok(())
}
