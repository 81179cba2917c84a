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

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use common_datavalues::DataValue;
use common_datavalues::TypeId;
use common_exception::Result;
use strata_engine::formats::csv::make_unique_column_names;
use strata_engine::formats::csv::read_csv;
use strata_engine::formats::csv::write_csv;
use strata_engine::formats::csv::CsvReadOptions;
use strata_engine::formats::csv::CsvWriteOptions;

use crate::common::int_column;
use crate::common::make_frame;
use crate::common::string_column;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_csv_mixed_types() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "mixed.csv",
        "float,int,str,vec,dict,rec\n\
         1.1,1,one,[1 1 1],\"{1:1,\"\"a\"\":\"\"a\"\"}\",\"[a,a]\"\n\
         2.2,2,two,[2 2 2],\"{2:2,\"\"b\"\":\"\"b\"\"}\",\"[b,b]\"\n\
         3.3,3,three,[3 3 3],\"{3:3,\"\"c\"\":\"\"c\"\"}\",\"[c,c]\"\n",
    );

    let mut options = CsvReadOptions::default();
    options.column_type_hints.insert("float".to_string(), TypeId::Float64);
    options.column_type_hints.insert("int".to_string(), TypeId::Int64);
    options.column_type_hints.insert("str".to_string(), TypeId::String);
    options.column_type_hints.insert("vec".to_string(), TypeId::Vector);
    options.column_type_hints.insert("dict".to_string(), TypeId::Dict);
    options.column_type_hints.insert("rec".to_string(), TypeId::List);

    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.num_rows, 3);
    assert_eq!(
        result.frame.column_names(),
        vec!["float", "int", "str", "vec", "dict", "rec"]
    );
    assert_eq!(
        result.frame.tags(),
        vec![
            TypeId::Float64,
            TypeId::Int64,
            TypeId::String,
            TypeId::Vector,
            TypeId::Dict,
            TypeId::List,
        ]
    );

    let rows = result.frame.to_rows()?;
    assert_eq!(rows[0][0], DataValue::Float64(1.1));
    assert_eq!(rows[1][1], DataValue::Int64(2));
    assert_eq!(rows[2][2], DataValue::String("three".to_string()));
    assert_eq!(rows[0][3], DataValue::Vector(vec![1.0, 1.0, 1.0]));
    assert_eq!(
        rows[1][4],
        DataValue::Dict(vec![
            (DataValue::Int64(2), DataValue::Int64(2)),
            (
                DataValue::String("b".to_string()),
                DataValue::String("b".to_string())
            ),
        ])
    );
    assert_eq!(
        rows[2][5],
        DataValue::List(vec![
            DataValue::String("c".to_string()),
            DataValue::String("c".to_string()),
        ])
    );
    Ok(())
}

#[test]
fn test_csv_duplicate_headers() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "dup.csv",
        "A,A,A.1,B,C,D\n1,2,3,4,5,6\n7,8,9,10,11,12\n13,14,15,16,17,18\n",
    );
    let result = read_csv(&[path.to_str().unwrap()], &CsvReadOptions::default())?;
    assert_eq!(
        result.frame.column_names(),
        vec!["A", "A.2", "A.1", "B", "C", "D"]
    );
    assert_eq!(result.num_rows, 3);
    Ok(())
}

#[test]
fn test_make_unique_column_names_suffix_skipping() {
    let mut names = vec!["A".to_string(), "A".to_string(), "A".to_string()];
    make_unique_column_names(&mut names);
    assert_eq!(names, vec!["A", "A.1", "A.2"]);

    let mut names = vec!["A".to_string(), "A".to_string(), "A.1".to_string()];
    make_unique_column_names(&mut names);
    assert_eq!(names, vec!["A", "A.2", "A.1"]);
}

#[test]
fn test_csv_no_header_synthesizes_names() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "plain.csv", "1,2,3\n4,5,6\n");
    let options = CsvReadOptions {
        use_header: false,
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.frame.column_names(), vec!["X1", "X2", "X3"]);
    assert_eq!(result.num_rows, 2);
    Ok(())
}

#[test]
fn test_csv_row_limit_is_exact() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let mut body = String::from("n\n");
    for i in 0..5000 {
        body.push_str(&format!("{}\n", i));
    }
    let path = write_file(dir.path(), "big.csv", &body);
    let options = CsvReadOptions {
        row_limit: 1234,
        column_type_hints: [("n".to_string(), TypeId::Int64)].into_iter().collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.num_rows, 1234);
    assert_eq!(result.frame.len(), 1234);
    Ok(())
}

#[test]
fn test_csv_na_values_become_undefined() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "na.csv", "v\n1\nNA\n3\n");
    let options = CsvReadOptions {
        na_values: vec!["NA".to_string()],
        column_type_hints: [("v".to_string(), TypeId::Int64)].into_iter().collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    let rows = result.frame.to_rows()?;
    assert_eq!(rows[1][0], DataValue::Undefined);
    Ok(())
}

#[test]
fn test_csv_bad_line_aborts_without_continue() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad.csv", "a,b\n1,2\nonly-one-field\n");
    let err = read_csv(&[path.to_str().unwrap()], &CsvReadOptions::default()).unwrap_err();
    assert_eq!(err.name(), "Parse");
}

#[test]
fn test_csv_continue_on_failure_stores_errors() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "bad.csv",
        "a,b\n1,2\nonly-one-field\n3,4\nsecond bad\n5,6\n",
    );
    let options = CsvReadOptions {
        continue_on_failure: true,
        store_errors: true,
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.num_rows, 3);
    assert_eq!(result.num_failures, 2);
    assert_eq!(result.errors.len(), 1);
    let bad_lines = result.errors[0].1.to_values()?;
    assert_eq!(
        bad_lines,
        vec![
            DataValue::String("only-one-field".to_string()),
            DataValue::String("second bad".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_csv_header_mismatch_skips_file() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(dir.path(), "a_good.csv", "a,b\n1,2\n3,4\n");
    let bad = write_file(dir.path(), "b_bad.csv", "x,y,z\n1,2,3\n");
    let options = CsvReadOptions {
        continue_on_failure: true,
        ..Default::default()
    };
    let result = read_csv(
        &[good.to_str().unwrap(), bad.to_str().unwrap()],
        &options,
    )?;
    // the mismatched file contributes nothing
    assert_eq!(result.num_rows, 2);
    Ok(())
}

#[test]
fn test_csv_header_mismatch_with_store_errors_diverts_rows() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(dir.path(), "a_good.csv", "a,b\n1,2\n3,4\n");
    let bad = write_file(dir.path(), "b_bad.csv", "x,y,z\n1,2,3\n");
    let options = CsvReadOptions {
        continue_on_failure: true,
        store_errors: true,
        ..Default::default()
    };
    let result = read_csv(
        &[good.to_str().unwrap(), bad.to_str().unwrap()],
        &options,
    )?;
    // the file is parsed; its three-field rows divert to the error column
    assert_eq!(result.num_rows, 2);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[1].1.len(), 1);
    Ok(())
}

#[test]
fn test_csv_glob_reads_files_in_order() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "part_1.csv", "v\n1\n2\n");
    write_file(dir.path(), "part_2.csv", "v\n3\n4\n");
    let pattern = dir.path().join("part_*.csv");
    let options = CsvReadOptions {
        column_type_hints: [("v".to_string(), TypeId::Int64)].into_iter().collect(),
        ..Default::default()
    };
    let result = read_csv(&[pattern.to_str().unwrap()], &options)?;
    let values: Vec<DataValue> = result
        .frame
        .to_rows()?
        .into_iter()
        .map(|mut r| r.remove(0))
        .collect();
    assert_eq!(
        values,
        vec![
            DataValue::Int64(1),
            DataValue::Int64(2),
            DataValue::Int64(3),
            DataValue::Int64(4),
        ]
    );
    Ok(())
}

#[test]
fn test_csv_gzip_input() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv.gz");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(b"v\n10\n20\n30\n").unwrap();
    encoder.finish().unwrap();

    let options = CsvReadOptions {
        column_type_hints: [("v".to_string(), TypeId::Int64)].into_iter().collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.num_rows, 3);
    Ok(())
}

#[test]
fn test_csv_carriage_return_line_endings() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "cr.csv", "v\r\n1\r2\r\n3\n");
    let options = CsvReadOptions {
        column_type_hints: [("v".to_string(), TypeId::Int64)].into_iter().collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.num_rows, 3);
    Ok(())
}

#[test]
fn test_csv_comment_lines_skipped() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "comments.csv", "# leading\nv\n# middle\n1\n\n2\n");
    let options = CsvReadOptions {
        comment_char: '#',
        column_type_hints: [("v".to_string(), TypeId::Int64)].into_iter().collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.num_rows, 2);
    Ok(())
}

#[test]
fn test_csv_positional_and_all_column_hints() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "hints.csv", "a,b\n1,2\n");
    let options = CsvReadOptions {
        column_type_hints: [
            ("__X0__".to_string(), TypeId::Int64),
            ("__X1__".to_string(), TypeId::Float64),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.frame.tags(), vec![TypeId::Int64, TypeId::Float64]);

    let options = CsvReadOptions {
        column_type_hints: [("__all_columns__".to_string(), TypeId::Float64)]
            .into_iter()
            .collect(),
        ..Default::default()
    };
    let result = read_csv(&[path.to_str().unwrap()], &options)?;
    assert_eq!(result.frame.tags(), vec![TypeId::Float64, TypeId::Float64]);
    Ok(())
}

#[test]
fn test_csv_write_roundtrip() -> Result<()> {
    let frame = make_frame(vec![
        ("n", int_column(&[1, 2], 1)),
        ("s", string_column(&["plain", "with,comma"], 1)),
    ]);
    let mut out = Vec::new();
    write_csv(&frame, &mut out, &CsvWriteOptions::default())?;
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "n,s\n1,\"plain\"\n2,\"with,comma\"\n");

    let plain = CsvWriteOptions {
        use_quote_char: false,
        header: false,
        ..Default::default()
    };
    let mut out = Vec::new();
    write_csv(&frame, &mut out, &plain)?;
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "1,plain\n2,\"with,comma\"\n");
    Ok(())
}
