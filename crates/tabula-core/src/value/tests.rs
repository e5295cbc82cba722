use crate::value::{Value, ValueKind};

// ---- helpers -----------------------------------------------------------

fn v_txt(s: &str) -> Value {
    Value::Text(s.to_string())
}

// ---- coercion ----------------------------------------------------------

#[test]
fn text_coerces_into_numbers() {
    assert_eq!(v_txt("42").coerce(ValueKind::Int), Some(Value::Int(42)));
    assert_eq!(v_txt(" 7 ").coerce(ValueKind::Uint), Some(Value::Uint(7)));
    assert_eq!(v_txt("2.5").coerce(ValueKind::Float), Some(Value::Float(2.5)));
    assert_eq!(v_txt("forty").coerce(ValueKind::Int), None);
}

#[test]
fn integral_floats_coerce_but_fractions_do_not() {
    assert_eq!(Value::Float(3.0).coerce(ValueKind::Int), Some(Value::Int(3)));
    assert_eq!(Value::Float(3.5).coerce(ValueKind::Int), None);
    assert_eq!(Value::Float(-1.0).coerce(ValueKind::Uint), None);
}

#[test]
fn signed_and_unsigned_cross_only_when_in_range() {
    assert_eq!(Value::Int(-1).coerce(ValueKind::Uint), None);
    assert_eq!(Value::Uint(u64::MAX).coerce(ValueKind::Int), None);
    assert_eq!(Value::Uint(9).coerce(ValueKind::Int), Some(Value::Int(9)));
}

#[test]
fn bool_accepts_common_encodings() {
    assert_eq!(Value::Int(1).coerce(ValueKind::Bool), Some(Value::Bool(true)));
    assert_eq!(v_txt("FALSE").coerce(ValueKind::Bool), Some(Value::Bool(false)));
    assert_eq!(Value::Int(2).coerce(ValueKind::Bool), None);
}

#[test]
fn null_and_lists_never_coerce() {
    for kind in [ValueKind::Int, ValueKind::Text, ValueKind::Bool] {
        assert_eq!(Value::Null.coerce(kind), None);
        assert_eq!(Value::List(vec![Value::Int(1)]).coerce(kind), None);
    }
}

#[test]
fn byte_lists_coerce_to_blobs() {
    let bytes = Value::List(vec![Value::Int(0), Value::Uint(255)]);

    assert_eq!(bytes.coerce(ValueKind::Blob), Some(Value::Blob(vec![0, 255])));
    assert_eq!(v_txt("ab").coerce(ValueKind::Blob), Some(Value::Blob(b"ab".to_vec())));
    assert_eq!(Value::List(vec![Value::Int(-1)]).coerce(ValueKind::Blob), None);
    assert_eq!(Value::Null.coerce(ValueKind::Blob), None);
}

#[test]
fn scalars_render_as_text() {
    assert_eq!(Value::Int(-4).coerce(ValueKind::Text), Some(v_txt("-4")));
    assert_eq!(Value::Bool(true).coerce(ValueKind::Text), Some(v_txt("true")));
}

// ---- rendering ---------------------------------------------------------

#[test]
fn render_uses_empty_string_for_null() {
    assert_eq!(Value::Null.render(), "");
    assert_eq!(v_txt("Ada").render(), "Ada");
    assert_eq!(Value::Blob(vec![0xde, 0xad]).render(), "dead");
    assert_eq!(
        Value::from_list(vec![1i64, 2, 3]).render(),
        "1,2,3".to_string()
    );
}

#[test]
fn kind_is_none_for_null_and_list() {
    assert_eq!(Value::Null.kind(), None);
    assert_eq!(Value::List(vec![]).kind(), None);
    assert_eq!(Value::Uint(1).kind(), Some(ValueKind::Uint));
}

// ---- serde -------------------------------------------------------------

#[test]
fn json_cells_deserialize_untagged() {
    let cells: Vec<Value> = serde_json::from_str(r#"[null, true, 42, 1.5, "x", [1, 2]]"#).unwrap();

    assert_eq!(
        cells,
        vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(42),
            Value::Float(1.5),
            v_txt("x"),
            Value::List(vec![Value::Int(1), Value::Int(2)]),
        ]
    );
}

#[test]
fn option_converts_to_null() {
    assert_eq!(Value::from(None::<i32>), Value::Null);
    assert_eq!(Value::from(Some("a")), v_txt("a"));
}
