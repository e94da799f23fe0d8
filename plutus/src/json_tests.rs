use super::data_tests::{
    big_test, largest_test, my_test, my_test_value, vesting_param, vesting_value,
};
use super::prelude::*;
use hex_literal::hex;

const VESTING_JSON: &str = "{\"constructor\":1,\"fields\":[\
    {\"bytes\":\"c2ff616e11299d9094ce0a7eb5b7284b705147a822f4ffbd471f971a\"},\
    {\"int\":1643235300000},\
    {\"constructor\":8,\"fields\":[{\"constructor\":130,\"fields\":[\
    {\"int\":123},{\"bytes\":\"31323334\"},\
    {\"list\":[{\"int\":4},{\"int\":5},{\"int\":6}]},\
    {\"map\":[{\"k\":{\"int\":1},\"v\":{\"bytes\":\"31\"}},\
    {\"k\":{\"int\":2},\"v\":{\"bytes\":\"32\"}}]}]}]},\
    {\"constructor\":9,\"fields\":[]}]}";

#[test]
fn vesting_datum_matches_reference_json() {
    let value = vesting_value();
    assert_eq!(value.to_json_string().unwrap(), VESTING_JSON);
    assert_eq!(vesting_param().from_json(VESTING_JSON).unwrap(), value);
}

#[test]
fn list_datum_json_round_trip() {
    let shape = Shape::build(
        "ListTest",
        Some(0),
        vec![Field::new(
            "a",
            TypeDesc::list(TypeDesc::Constr(largest_test())),
        )],
    );
    let value = PlutusData::constr(
        &shape,
        vec![PlutusData::List(vec![
            PlutusData::constr(&largest_test(), vec![]),
            PlutusData::constr(&largest_test(), vec![]),
        ])],
    );
    let text = value.to_json_string().unwrap();
    assert_eq!(
        text,
        "{\"constructor\":0,\"fields\":[{\"list\":[\
         {\"constructor\":9,\"fields\":[]},{\"constructor\":9,\"fields\":[]}]}]}"
    );
    assert_eq!(shape.from_json(&text).unwrap(), value);
}

#[test]
fn map_datum_json_round_trip() {
    let shape = Shape::build(
        "DictTest",
        Some(3),
        vec![Field::new(
            "a",
            TypeDesc::map(TypeDesc::Int, TypeDesc::Constr(largest_test())),
        )],
    );
    let value = PlutusData::constr(
        &shape,
        vec![PlutusData::Map(vec![
            (
                PlutusData::int(0),
                PlutusData::constr(&largest_test(), vec![]),
            ),
            (
                PlutusData::int(1),
                PlutusData::constr(&largest_test(), vec![]),
            ),
        ])],
    );
    let text = value.to_json_string().unwrap();
    assert_eq!(
        text,
        "{\"constructor\":3,\"fields\":[{\"map\":[\
         {\"k\":{\"int\":0},\"v\":{\"constructor\":9,\"fields\":[]}},\
         {\"k\":{\"int\":1},\"v\":{\"constructor\":9,\"fields\":[]}}]}]}"
    );
    assert_eq!(shape.from_json(&text).unwrap(), value);
}

#[test]
fn map_entries_decode_in_either_key_order() {
    // entry objects written value-first parse identically
    let text = "{\"constructor\":130,\"fields\":[{\"int\":123},{\"bytes\":\"31323334\"},\
        {\"list\":[{\"int\":4},{\"int\":5},{\"int\":6}]},\
        {\"map\":[{\"v\":{\"bytes\":\"31\"},\"k\":{\"int\":1}},\
        {\"v\":{\"bytes\":\"32\"},\"k\":{\"int\":2}}]}]}";
    assert_eq!(my_test().from_json(text).unwrap(), my_test_value(b"1234"));
}

#[test]
fn json_and_binary_codecs_agree() {
    let value = vesting_value();
    let via_json = vesting_param()
        .from_json(&value.to_json_string().unwrap())
        .unwrap();
    assert_eq!(via_json.to_bytes().unwrap(), value.to_bytes().unwrap());

    let decoded = vesting_param()
        .decode(&value.to_bytes().unwrap())
        .unwrap();
    assert_eq!(decoded.to_json().unwrap(), value.to_json().unwrap());
}

#[test]
fn rejects_wrong_constructor_id() {
    let text = "{\"constructor\": 129, \"fields\": [{\"int\": 123}, {\"bytes\": \"31323334\"}, \
        {\"list\": [{\"int\": 4}, {\"int\": 5}, {\"int\": 6}]}, \
        {\"map\": [{\"v\": {\"bytes\": \"31\"}, \"k\": {\"int\": 1}}, \
        {\"v\": {\"bytes\": \"32\"}, \"k\": {\"int\": 2}}]}]}";
    assert!(matches!(
        my_test().from_json(text).unwrap_err(),
        Error::ShapeMismatch {
            expected: 130,
            found: 129,
            ..
        }
    ));
}

#[test]
fn rejects_unmatched_union_constructor() {
    // neither id 22 nor id 23 matches the declared alternatives (8 and 9)
    let text = VESTING_JSON
        .replace("\"constructor\":8", "\"constructor\":22")
        .replace("\"constructor\":9", "\"constructor\":23");
    let err = vesting_param().from_json(&text).unwrap_err();
    let Error::InvalidField { field, source } = err else {
        panic!("expected a field error, got {err}")
    };
    assert_eq!(field, "testa");
    assert!(matches!(*source, Error::AlternativesExhausted { .. }));
}

#[test]
fn rejects_unknown_value_tag() {
    let text = "{\"constructor\": 130, \"fields\": [{\"int\": 123}, {\"bytes\": \"31323334\"}, \
        {\"wrong_list\": [{\"int\": 4}, {\"int\": 5}, {\"int\": 6}]}, \
        {\"map\": [{\"k\": {\"int\": 1}, \"v\": {\"bytes\": \"31\"}}]}]}";
    let err = my_test().from_json(text).unwrap_err();
    let Error::InvalidField { field, source } = err else {
        panic!("expected a field error, got {err}")
    };
    assert_eq!(field, "c");
    assert!(matches!(*source, Error::MalformedJson(_)));
}

#[test]
fn rejects_non_object_top_level() {
    let text = "[{\"constructor\": 130, \"fields\": []}]";
    assert!(matches!(
        my_test().from_json(text).unwrap_err(),
        Error::UnsupportedInput(_)
    ));

    assert!(matches!(
        my_test().from_json("42").unwrap_err(),
        Error::UnsupportedInput(_)
    ));
}

#[test]
fn rejects_malformed_json_text() {
    assert!(matches!(
        my_test().from_json("{\"constructor\":").unwrap_err(),
        Error::InvalidJson(_)
    ));
}

#[test]
fn rejects_missing_or_extra_keys() {
    assert!(matches!(
        largest_test()
            .from_json("{\"constructor\":9}")
            .unwrap_err(),
        Error::MalformedJson(_)
    ));
    assert!(matches!(
        largest_test()
            .from_json("{\"constructor\":9,\"fields\":[],\"extra\":0}")
            .unwrap_err(),
        Error::MalformedJson(_)
    ));
}

#[test]
fn encode_rejects_mistyped_fields() {
    let mut value = my_test_value(b"1234");
    let PlutusData::Constr(constr) = &mut value else {
        unreachable!()
    };
    constr.fields[0] = PlutusData::bytes(*b"123");
    assert!(matches!(
        value.to_json().unwrap_err(),
        Error::FieldType { .. }
    ));
}

#[test]
fn opaque_payloads_have_no_json_form() {
    let raw = RawData::from_slice(&hex!("d87980")).unwrap();
    assert!(matches!(
        PlutusData::Raw(raw).to_json().unwrap_err(),
        Error::OpaqueNotRepresentable
    ));
}

#[test]
fn integer_bounds() {
    assert_eq!(
        PlutusData::Int(u64::MAX as i128).to_json_string().unwrap(),
        "{\"int\":18446744073709551615}"
    );
    assert_eq!(
        PlutusData::Int(i64::MIN as i128).to_json_string().unwrap(),
        "{\"int\":-9223372036854775808}"
    );
    // representable in the binary form but not in a JSON number
    assert!(matches!(
        PlutusData::Int(i64::MIN as i128 - 1).to_json().unwrap_err(),
        Error::IntOutOfRange(_)
    ));

    let shape = Shape::build("I", Some(0), vec![Field::new("i", TypeDesc::Int)]);
    assert!(matches!(
        shape
            .from_json("{\"constructor\":0,\"fields\":[{\"int\":1.5}]}")
            .unwrap_err(),
        Error::InvalidField { .. }
    ));
}

#[test]
fn untyped_lists_round_trip_as_indefinite() {
    let value = my_test_value(b"1234");
    let text = value.to_json_string().unwrap();
    let back = my_test().from_json(&text).unwrap();
    assert_eq!(back, value);
    // the untyped field keeps its indefinite framing through the bridge
    assert_eq!(back.to_bytes().unwrap(), value.to_bytes().unwrap());

    // nested untyped structure: lists and maps of primitives
    let nested = PlutusData::constr(
        &big_test(),
        vec![my_test_value(b"1234")],
    );
    let nested_text = nested.to_json_string().unwrap();
    assert_eq!(big_test().from_json(&nested_text).unwrap(), nested);
}
