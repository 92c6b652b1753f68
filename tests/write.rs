use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tcsv::{CodecError, Error, FuncRegistry, Header, Reader, Row, Value, Writer, WriterBuilder};

fn output(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn test_write_header_and_row() {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_header(&[Header::typed("a", "int").with_convert("default|0")])
        .unwrap();
    writer.write_row(&Row::from_iter([("a", Value::Int(5))])).unwrap();
    assert_eq!(output(writer), "a:int=default|0\n5\n");
}

#[test]
fn test_row_cells_follow_row_order() {
    // the header promises an order but rows are emitted in their own
    // insertion order
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_header(&[Header::untyped("a"), Header::untyped("b")])
        .unwrap();
    writer
        .write_row(&Row::from_iter([
            ("b", Value::from("bv")),
            ("a", Value::from("av")),
        ]))
        .unwrap();
    assert_eq!(output(writer), "a,b\nbv,av\n");
}

#[test]
fn test_extra_row_key_is_still_written() {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_header(&[Header::untyped("a")]).unwrap();
    let mut row = Row::new();
    row.insert("a", Value::Int(1));
    row.insert("extra", Value::from("x"));
    writer.write_row(&row).unwrap();
    assert_eq!(output(writer), "a\n1,x\n");
}

#[test]
fn test_write_two_tables() {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_header(&[
            Header::typed("name", "str").with_convert("default|Unknown"),
            Header::untyped("country"),
            Header::untyped("province").with_convert("default|NA"),
        ])
        .unwrap();
    writer
        .write_row(&Row::from_iter([
            ("name", Value::from("Alice")),
            ("country", Value::from("Georgia")),
            ("province", Value::from("Imereti")),
        ]))
        .unwrap();
    writer.write_empty_row().unwrap();
    writer
        .write_header(&[Header::typed("city", "str"), Header::typed("population", "int")])
        .unwrap();
    writer
        .write_row(&Row::from_iter([
            ("city", Value::from("Kutaisi")),
            ("population", Value::Int(147635)),
        ]))
        .unwrap();
    assert_eq!(writer.header_names(), ["city", "population"]);
    assert_eq!(
        output(writer),
        "name:str=default|Unknown,country,province=default|NA\n\
         Alice,Georgia,Imereti\n\
         \n\
         city:str,population:int\n\
         Kutaisi,147635\n"
    );
}

#[test]
fn test_write_rows() {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_header(&[Header::typed("n", "int")]).unwrap();
    let rows = vec![
        Row::from_iter([("n", Value::Int(1))]),
        Row::from_iter([("n", Value::Int(2))]),
    ];
    writer.write_rows(&rows).unwrap();
    assert_eq!(output(writer), "n:int\n1\n2\n");
}

#[test]
fn test_empty_row_writes_blank_line() {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_header(&[Header::untyped("a")]).unwrap();
    writer.write_row(&Row::new()).unwrap();
    writer.write_empty_row().unwrap();
    assert_eq!(output(writer), "a\n\n\n");
}

#[test]
fn test_write_row_with_applies_specs() {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_header(&[Header::typed("event", "str"), Header::typed("when", "datetime")])
        .unwrap();
    let specs = HashMap::from([("when".to_string(), "strftime|%Y-%m-%d".to_string())]);
    writer
        .write_row_with(
            &Row::from_iter([
                ("event", Value::from("launch")),
                (
                    "when",
                    Value::DateTime(Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()),
                ),
            ]),
            &specs,
        )
        .unwrap();
    // strftime cannot render "NA" but the writer is lenient by default
    writer
        .write_row_with(
            &Row::from_iter([("event", Value::from("tbd")), ("when", Value::from("NA"))]),
            &specs,
        )
        .unwrap();
    assert_eq!(
        output(writer),
        "event:str,when:datetime\nlaunch,2024-06-15\ntbd,NA\n"
    );
}

#[test]
fn test_strict_writer_surfaces_value_errors() {
    let mut writer = WriterBuilder::new()
        .ignore_value_errors(false)
        .from_writer(Vec::new());
    writer.write_header(&[Header::typed("when", "datetime")]).unwrap();
    let specs = HashMap::from([("when".to_string(), "strftime|%Y-%m-%d".to_string())]);
    let err = writer
        .write_row_with(&Row::from_iter([("when", Value::from("NA"))]), &specs)
        .unwrap_err();
    match err {
        Error::Codec(CodecError::Cast { column, .. }) => assert_eq!(column, "when"),
        other => panic!("expected Cast error, got {other:?}"),
    }
}

#[test]
fn test_unknown_spec_func_is_never_suppressed() {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_header(&[Header::untyped("n")]).unwrap();
    let specs = HashMap::from([("n".to_string(), "nope".to_string())]);
    let err = writer
        .write_row_with(&Row::from_iter([("n", Value::Int(1))]), &specs)
        .unwrap_err();
    match err {
        Error::Codec(CodecError::UnknownConvert(name)) => assert_eq!(name, "nope"),
        other => panic!("expected UnknownConvert, got {other:?}"),
    }
}

#[test]
fn test_foreign_type_handle_is_rejected() {
    // a header resolved against some other registry cannot be
    // stringified, and the failed call leaves the writer untouched
    let reader_funcs = FuncRegistry::reader_builtins();
    let header = Header::parse("ts:datetime", &reader_funcs).unwrap();
    let mut writer = Writer::from_writer(Vec::new());
    let err = writer.write_header(&[header]).unwrap_err();
    match err {
        Error::Codec(CodecError::TypeFuncNotRegistered(name)) => assert_eq!(name, "datetime"),
        other => panic!("expected TypeFuncNotRegistered, got {other:?}"),
    }
    assert!(writer.header_names().is_empty());
    assert!(writer.into_inner().is_empty());
}

#[test]
fn test_resolved_handle_from_own_registry() {
    let mut writer = Writer::from_writer(Vec::new());
    let header = Header::parse("ts:strftime", writer.funcs()).unwrap();
    writer.write_header(&[header]).unwrap();
    assert_eq!(output(writer), "ts:strftime\n");
}

#[test]
fn test_custom_writer_function() {
    let mut writer = Writer::from_writer(Vec::new());
    writer.add_func("money", |value, _args| match value {
        Value::Decimal(d) => Ok(Value::Str(format!("{d} GEL"))),
        other => Ok(other),
    });
    writer.write_header(&[Header::untyped("price")]).unwrap();
    let specs = HashMap::from([("price".to_string(), "money".to_string())]);
    writer
        .write_row_with(
            &Row::from_iter([("price", Value::Decimal(Decimal::from_str("19.50").unwrap()))]),
            &specs,
        )
        .unwrap();
    assert_eq!(output(writer), "price\n19.50 GEL\n");
}

#[test]
fn test_custom_delimiter() {
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    writer
        .write_header(&[Header::untyped("a"), Header::untyped("b")])
        .unwrap();
    writer
        .write_row(&Row::from_iter([("a", Value::Int(1)), ("b", Value::Int(2))]))
        .unwrap();
    assert_eq!(output(writer), "a;b\n1;2\n");
}

#[test]
fn test_cells_are_quoted_when_needed() {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_header(&[Header::untyped("note")]).unwrap();
    writer
        .write_row(&Row::from_iter([("note", Value::from("a,b"))]))
        .unwrap();
    assert_eq!(output(writer), "note\n\"a,b\"\n");
}

#[test]
fn test_round_trip_preserves_typed_values() {
    let ts = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
    let row = Row::from_iter([
        ("id", Value::Int(7)),
        ("price", Value::Decimal(Decimal::from_str("19.95").unwrap())),
        ("ts", Value::DateTime(ts)),
        ("note", Value::from("ok")),
    ]);

    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_header(&[
            Header::typed("id", "int"),
            Header::typed("price", "decimal"),
            Header::typed("ts", "datetime"),
            Header::typed("note", "str"),
        ])
        .unwrap();
    writer.write_row(&row).unwrap();
    let data = output(writer);

    let mut reader = Reader::from_reader(data.as_bytes());
    let parsed = reader.read_row().unwrap().unwrap();
    assert_eq!(parsed, row);
    assert!(reader.read_row().unwrap().is_none());
}

#[test]
fn test_write_to_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let mut writer = Writer::from_path(&path).unwrap();
    writer.write_header(&[Header::typed("n", "int")]).unwrap();
    writer.write_row(&Row::from_iter([("n", Value::Int(42))])).unwrap();
    writer.flush().unwrap();
    drop(writer);

    let mut reader = Reader::from_path(&path).unwrap();
    let row = reader.read_row().unwrap().unwrap();
    assert_eq!(row.get("n"), Some(&Value::Int(42)));
}
