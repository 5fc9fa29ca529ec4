#![allow(missing_docs)]

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyInit};
use proptest::prelude::*;
use sqlset::{Catalog, Element, MapRow, PropertySink, Result, SqlsetError, Value};

const KEY_HEX: &str = "2b7e151628aed2a6abf7158809cf4f3c";

#[derive(Debug, Default, Clone, PartialEq)]
struct Member {
    id: i64,
    name: String,
    enabled: bool,
    score: f64,
    ssn: Option<String>,
}

impl PropertySink for Member {
    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        match (property, value) {
            ("id", Value::Int(v)) => self.id = v,
            ("name", Value::String(v)) => self.name = v,
            ("enabled", Value::Bool(v)) => self.enabled = v,
            ("score", Value::Float(v)) => self.score = v,
            ("ssn", Value::String(v)) => self.ssn = Some(v),
            ("ssn", Value::Null) => self.ssn = None,
            (property, value) => {
                return Err(SqlsetError::Property {
                    property: property.to_owned(),
                    reason: format!("unexpected {}", value.type_name()),
                })
            }
        }
        Ok(())
    }
}

fn mapping(name: &str, column: &str, java_type: &str) -> Element {
    Element::new("parameterMapping")
        .attr("name", name)
        .attr("column", column)
        .attr("javaType", java_type)
}

fn member_catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.register_target::<Member>("com.acme.Member");
    let root = Element::new("sqlset")
        .attr("namespace", "members")
        .child(
            Element::new("row-mapper")
                .attr("id", "plain")
                .attr("class", "com.acme.Member")
                .child(mapping("id", "ID", "long"))
                .child(mapping("name", "NAME", "string"))
                .child(mapping("enabled", "ENABLED", "boolean"))
                .child(mapping("score", "SCORE", "double")),
        )
        .child(
            Element::new("row-mapper")
                .attr("id", "secure")
                .attr("class", "Member")
                .child(mapping("id", "ID", "long"))
                .child(
                    mapping("ssn", "SSN", "string")
                        .attr("cipher", "AES/ECB/PKCS5Padding")
                        .attr("cipherKey", KEY_HEX)
                        .attr("cipherKeyAlg", "AES")
                        .attr("encoding", "BASE64"),
                ),
        )
        .child(Element::new("row-mapper").attr("id", "missing").attr("class", "com.acme.Nope"))
        .child(
            Element::new("row-mapper")
                .attr("id", "loose")
                .attr("class", "map")
                .child(mapping("age", "AGE", "int")),
        );
    catalog.load("members.json", &root).unwrap();
    catalog
}

fn encrypt_base64(plain: &str) -> String {
    use base64::Engine as _;
    let key = hex::decode(KEY_HEX).unwrap();
    let sealed = ecb::Encryptor::<aes::Aes128>::new_from_slice(&key)
        .unwrap()
        .encrypt_padded_vec_mut::<Pkcs7>(plain.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(sealed)
}

#[test]
fn one_zero_columns_map_to_booleans() {
    let catalog = member_catalog();
    let mapper = catalog.row_mapper("members", "plain").unwrap();
    let on: Member = mapper.map_row(&MapRow::new().with("ENABLED", 1i64)).unwrap();
    assert!(on.enabled);
    let off: Member = mapper.map_row(&MapRow::new().with("ENABLED", 0i64)).unwrap();
    assert!(!off.enabled);
}

#[test]
fn unresolvable_target_was_skipped_at_load() {
    let catalog = member_catalog();
    assert_eq!(
        catalog.row_mapper_ids(),
        ["members.loose", "members.plain", "members.secure"]
    );
}

#[test]
fn encrypted_column_is_decrypted() {
    let catalog = member_catalog();
    let mapper = catalog.row_mapper("members", "secure").unwrap();
    let row = MapRow::new()
        .with("ID", 3i64)
        .with("SSN", encrypt_base64("800101-1000000"));
    let member: Member = mapper.map_row(&row).unwrap();
    assert_eq!(member.ssn.as_deref(), Some("800101-1000000"));
}

#[test]
fn undecryptable_column_falls_back_to_raw_value() {
    let catalog = member_catalog();
    let mapper = catalog.row_mapper("members", "secure").unwrap();
    let row = MapRow::new().with("ID", 3i64).with("SSN", "not-base64!");
    let member: Member = mapper.map_row(&row).unwrap();
    assert_eq!(member.ssn.as_deref(), Some("not-base64!"));
}

#[test]
fn record_targets_collect_mapped_columns_only() {
    let catalog = member_catalog();
    let mapper = catalog.row_mapper("members", "loose").unwrap();
    let rows = vec![
        MapRow::new().with("AGE", "41").with("IGNORED", true),
        MapRow::new().with("age", 7i64),
    ];
    let records: Vec<Value> = mapper.map_rows(rows).unwrap();
    assert_eq!(records[0].lookup("age"), Some(&Value::Int(41)));
    assert_eq!(records[0].lookup("IGNORED"), None);
    assert_eq!(records[1].lookup("age"), Some(&Value::Int(7)));
}

#[test]
fn mapping_into_the_wrong_type_is_rejected() {
    let catalog = member_catalog();
    let mapper = catalog.row_mapper("members", "plain").unwrap();
    assert!(matches!(
        mapper.map_row::<Value>(&MapRow::new()),
        Err(SqlsetError::TargetMismatch { .. })
    ));
}

fn arb_member() -> impl Strategy<Value = Member> {
    (any::<i64>(), "[A-Za-z ]{0,16}", any::<bool>(), -1.0e9f64..1.0e9f64).prop_map(
        |(id, name, enabled, score)| Member {
            id,
            name,
            enabled,
            score,
            ssn: None,
        },
    )
}

proptest! {
    #[test]
    fn member_round_trips_through_a_row(member in arb_member()) {
        let catalog = member_catalog();
        let mapper = catalog.row_mapper("members", "plain").unwrap();
        let row = MapRow::new()
            .with("ID", member.id)
            .with("NAME", member.name.clone())
            .with("ENABLED", i64::from(member.enabled))
            .with("SCORE", member.score);
        let back: Member = mapper.map_row(&row).unwrap();
        prop_assert_eq!(back, member);
    }
}
