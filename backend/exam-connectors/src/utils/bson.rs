use mongodb::bson::{Bson, Document};

/// Integer view of a numeric BSON value. Doubles count only when they carry
/// no fractional part; strings are never parsed.
pub fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
        _ => None,
    }
}

pub fn as_text(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Text view of a scalar BSON value: strings as-is, numbers and booleans
/// rendered. Null, documents and arrays have no text form.
pub fn render_text(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        Bson::Double(v) => Some(v.to_string()),
        Bson::Boolean(v) => Some(v.to_string()),
        _ => None,
    }
}

pub fn get_integer(doc: &Document, key: &str) -> Option<i64> {
    doc.get(key).and_then(as_integer)
}

pub fn get_text(doc: &Document, key: &str) -> Option<String> {
    doc.get(key).and_then(as_text)
}

pub fn get_rendered(doc: &Document, key: &str) -> Option<String> {
    doc.get(key).and_then(render_text)
}
