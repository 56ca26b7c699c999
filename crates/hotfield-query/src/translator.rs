//! Compiles a [`Filter`] into parameterised SQL against the `documents`
//! table (§4.D).
//!
//! Translation is a pure function of `(collection, filter, options,
//! snapshot)` — it never touches storage itself. A field with a registry
//! binding is addressed through its slot column; everything else falls
//! back to `json_extract` over the `payload` column. Operators that need
//! the full JSON shape (`$all`, `$elemMatch`, `$size`, `$type`) always use
//! the JSON path, even for a bound field, since slot columns only ever
//! hold a single scalar.

use hotfield_core::Json;
use hotfield_filter::{Filter, Operator};
use hotfield_index::{slot_column_name, IndexSnapshot};
use libsql::Value;

use crate::error::QueryError;
use crate::options::QueryOptions;

/// The result of translating a filter: the SQL body (everything after the
/// select list), its positional parameters in emission order, the leaf
/// field paths the filter touched, and whether any of them resolved to an
/// indexed slot.
#[derive(Debug, Clone)]
pub struct Translation {
    pub sql: String,
    pub params: Vec<Value>,
    pub touched_fields: Vec<String>,
    pub uses_indexed_fields: bool,
}

/// Translate `filter` against `collection` into a full `SELECT * FROM
/// documents ...` query.
///
/// # Errors
///
/// Returns `QueryError::UnsupportedType` if a `$type` operand names an
/// unrecognised type.
pub fn translate(
    collection: &str,
    filter: &Filter,
    options: &QueryOptions,
    snapshot: &IndexSnapshot,
) -> Result<Translation, QueryError> {
    translate_with_select(collection, filter, options, snapshot, "*")
}

/// Like [`translate`], but with a custom select list (e.g. `COUNT(*)` for
/// the count path in §4.G).
///
/// # Errors
///
/// See [`translate`].
pub fn translate_with_select(
    collection: &str,
    filter: &Filter,
    options: &QueryOptions,
    snapshot: &IndexSnapshot,
    select_list: &str,
) -> Result<Translation, QueryError> {
    let mut params = vec![Value::Text(collection.to_string())];
    let mut sql = format!("SELECT {select_list} FROM documents WHERE collection = ? AND deleted = 0");

    let mut depth = 0u32;
    let predicate = translate_node(filter, Some(snapshot), "payload", &mut depth, &mut params)?;
    if predicate != "1=1" {
        sql.push_str(" AND (");
        sql.push_str(&predicate);
        sql.push(')');
    }

    if !options.sort.is_empty() {
        sql.push_str(" ORDER BY ");
        let clauses: Vec<String> = options
            .sort
            .iter()
            .map(|(path, dir)| {
                if let Some(binding) = snapshot.mapping(path) {
                    format!("{} {}", slot_column_name(binding.slot), dir.as_sql())
                } else {
                    params.push(Value::Text(format!("$.{path}")));
                    format!("json_extract(payload, ?) {}", dir.as_sql())
                }
            })
            .collect();
        sql.push_str(&clauses.join(", "));
    }

    if let Some(limit) = options.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(skip) = options.skip {
        sql.push_str(&format!(" OFFSET {skip}"));
    }

    let mut touched_fields = Vec::new();
    filter.collect_field_paths(&mut touched_fields);
    let uses_indexed_fields = touched_fields.iter().any(|f| snapshot.mapping(f).is_some());

    Ok(Translation { sql, params, touched_fields, uses_indexed_fields })
}

fn translate_node(
    filter: &Filter,
    snapshot: Option<&IndexSnapshot>,
    src: &str,
    depth: &mut u32,
    params: &mut Vec<Value>,
) -> Result<String, QueryError> {
    match filter {
        Filter::Field { path, op } => translate_field(path, op, snapshot, src, depth, params),
        Filter::And(children) => translate_logical(children, "AND", snapshot, src, depth, params),
        Filter::Or(children) => translate_logical(children, "OR", snapshot, src, depth, params),
        Filter::Not(inner) => {
            let inner_sql = translate_node(inner, snapshot, src, depth, params)?;
            Ok(format!("NOT ({inner_sql})"))
        }
    }
}

fn translate_logical(
    children: &[Filter],
    joiner: &str,
    snapshot: Option<&IndexSnapshot>,
    src: &str,
    depth: &mut u32,
    params: &mut Vec<Value>,
) -> Result<String, QueryError> {
    if children.is_empty() {
        return Ok("1=1".to_string());
    }
    let parts: Result<Vec<String>, QueryError> =
        children.iter().map(|c| translate_node(c, snapshot, src, depth, params)).collect();
    let parts = parts?;
    Ok(format!("({})", parts.join(&format!(" {joiner} "))))
}

/// Envelope fields (§3 glossary) live as real columns on `documents`, not
/// inside `payload` — they're stripped from the JSON blob before storage,
/// so a filter on e.g. `_id` must address the `id` column directly rather
/// than falling through to `json_extract`.
fn envelope_column(path: &str) -> Option<&'static str> {
    match path {
        "_id" => Some("id"),
        "_collection" => Some("collection"),
        "_version" => Some("version"),
        "_created_at" => Some("created_at"),
        "_updated_at" => Some("updated_at"),
        "_deleted" => Some("deleted"),
        _ => None,
    }
}

fn translate_field(
    path: &str,
    op: &Operator,
    snapshot: Option<&IndexSnapshot>,
    src: &str,
    depth: &mut u32,
    params: &mut Vec<Value>,
) -> Result<String, QueryError> {
    let slot_eligible = matches!(
        op,
        Operator::Eq(_)
            | Operator::Ne(_)
            | Operator::Gt(_)
            | Operator::Gte(_)
            | Operator::Lt(_)
            | Operator::Lte(_)
            | Operator::In(_)
            | Operator::Nin(_)
            | Operator::Exists(_)
            | Operator::Regex { .. }
    );

    if src == "payload" && slot_eligible {
        if let Some(column) = envelope_column(path) {
            return Ok(indexed_predicate(column, op, params));
        }
        if let Some(binding) = snapshot.and_then(|s| s.mapping(path)) {
            // §9 open question: an `$in`/`$nin` list with an element whose
            // inferred type conflicts with the slot's bound type degrades
            // the whole predicate to the JSON path, rather than comparing
            // mismatched types against a typed column.
            let type_conflict = match op {
                Operator::In(vals) | Operator::Nin(vals) => {
                    vals.iter().any(|v| v.infer_data_type() != binding.data_type)
                }
                _ => false,
            };
            if !type_conflict {
                let col = slot_column_name(binding.slot);
                return Ok(indexed_predicate(&col, op, params));
            }
        }
    }

    json_predicate(src, path, op, depth, params)
}

fn indexed_predicate(col: &str, op: &Operator, params: &mut Vec<Value>) -> String {
    match op {
        Operator::Eq(v) => {
            params.push(json_to_sql_value(v));
            format!("{col} = ?")
        }
        Operator::Ne(v) => {
            params.push(json_to_sql_value(v));
            format!("{col} != ?")
        }
        Operator::Gt(v) => {
            params.push(json_to_sql_value(v));
            format!("{col} > ?")
        }
        Operator::Gte(v) => {
            params.push(json_to_sql_value(v));
            format!("{col} >= ?")
        }
        Operator::Lt(v) => {
            params.push(json_to_sql_value(v));
            format!("{col} < ?")
        }
        Operator::Lte(v) => {
            params.push(json_to_sql_value(v));
            format!("{col} <= ?")
        }
        Operator::In(vals) => {
            if vals.is_empty() {
                return "0=1".to_string();
            }
            let placeholders = vals
                .iter()
                .map(|v| {
                    params.push(json_to_sql_value(v));
                    "?"
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{col} IN ({placeholders})")
        }
        Operator::Nin(vals) => {
            if vals.is_empty() {
                return "1=1".to_string();
            }
            let placeholders = vals
                .iter()
                .map(|v| {
                    params.push(json_to_sql_value(v));
                    "?"
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{col} NOT IN ({placeholders})")
        }
        Operator::Exists(true) => format!("{col} IS NOT NULL"),
        Operator::Exists(false) => format!("{col} IS NULL"),
        Operator::Regex { pattern, .. } => {
            params.push(Value::Text(regex_to_like(pattern)));
            format!("{col} LIKE ? ESCAPE '\\'")
        }
        // Unreachable: caller gates on `slot_eligible`.
        _ => unreachable!("operator {} is not slot-eligible", op.name()),
    }
}

fn json_predicate(
    src: &str,
    path: &str,
    op: &Operator,
    depth: &mut u32,
    params: &mut Vec<Value>,
) -> Result<String, QueryError> {
    let json_path = format!("$.{path}");
    let extraction = format!("json_extract({src}, ?)");

    Ok(match op {
        Operator::Eq(v) | Operator::Ne(v) | Operator::Gt(v) | Operator::Gte(v) | Operator::Lt(v) | Operator::Lte(v) => {
            let comparator = match op {
                Operator::Eq(_) => "=",
                Operator::Ne(_) => "!=",
                Operator::Gt(_) => ">",
                Operator::Gte(_) => ">=",
                Operator::Lt(_) => "<",
                Operator::Lte(_) => "<=",
                _ => unreachable!(),
            };
            params.push(Value::Text(json_path));
            if v.as_f64().is_some() {
                params.push(json_to_sql_value(v));
                format!("CAST({extraction} AS REAL) {comparator} ?")
            } else {
                params.push(json_to_sql_value(v));
                format!("{extraction} {comparator} ?")
            }
        }
        Operator::In(vals) | Operator::Nin(vals) => {
            let joiner = if matches!(op, Operator::In(_)) { "OR" } else { "AND" };
            if vals.is_empty() {
                return Ok(if joiner == "OR" { "0=1".to_string() } else { "1=1".to_string() });
            }
            let clauses: Vec<String> = vals
                .iter()
                .map(|v| {
                    params.push(Value::Text(json_path.clone()));
                    params.push(json_to_sql_value(v));
                    let cmp = if joiner == "OR" { "=" } else { "!=" };
                    format!("{extraction} {cmp} ?")
                })
                .collect();
            format!("({})", clauses.join(&format!(" {joiner} ")))
        }
        Operator::Exists(present) => {
            params.push(Value::Text(json_path));
            if *present { format!("{extraction} IS NOT NULL") } else { format!("{extraction} IS NULL") }
        }
        Operator::Regex { pattern, .. } => {
            params.push(Value::Text(json_path));
            params.push(Value::Text(regex_to_like(pattern)));
            format!("{extraction} LIKE ? ESCAPE '\\'")
        }
        Operator::Type(type_name) => {
            let sql_types = sql_json_type_names(type_name)?;
            params.push(Value::Text(json_path));
            let placeholders = sql_types.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            for t in &sql_types {
                params.push(Value::Text((*t).to_string()));
            }
            format!("json_type({src}, ?) IN ({placeholders})")
        }
        Operator::Size(n) => {
            params.push(Value::Text(json_path));
            params.push(Value::Integer(*n));
            format!("json_array_length({src}, ?) = ?")
        }
        Operator::All(vals) => {
            if vals.is_empty() {
                return Ok("1=1".to_string());
            }
            let clauses: Vec<String> = vals
                .iter()
                .map(|v| {
                    params.push(Value::Text(json_path.clone()));
                    params.push(json_to_sql_value(v));
                    format!("EXISTS (SELECT 1 FROM json_each({src}, ?) WHERE value = ?)")
                })
                .collect();
            format!("({})", clauses.join(" AND "))
        }
        Operator::ElemMatch(inner) => {
            *depth += 1;
            let alias = format!("je{depth}");
            params.push(Value::Text(json_path));
            let inner_sql = translate_node(inner, None, &format!("{alias}.value"), depth, params)?;
            format!("EXISTS (SELECT 1 FROM json_each({src}, ?) AS {alias} WHERE {inner_sql})")
        }
    })
}

fn json_to_sql_value(v: &Json) -> Value {
    match v {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Integer(i64::from(*b)),
        Json::Int(i) => Value::Integer(*i),
        Json::Float(f) => Value::Real(*f),
        Json::Str(s) => Value::Text(s.clone()),
        Json::Array(_) | Json::Object(_) => {
            let as_json: serde_json::Value = v.clone().into();
            Value::Text(as_json.to_string())
        }
    }
}

/// Map the client-facing `$type` name to SQLite's `json_type()` output
/// vocabulary.
fn sql_json_type_names(name: &str) -> Result<Vec<&'static str>, QueryError> {
    match name {
        "string" => Ok(vec!["text"]),
        "number" => Ok(vec!["integer", "real"]),
        "integer" | "int" => Ok(vec!["integer"]),
        "double" | "real" => Ok(vec!["real"]),
        "bool" | "boolean" => Ok(vec!["true", "false"]),
        "array" => Ok(vec!["array"]),
        "object" => Ok(vec!["object"]),
        "null" => Ok(vec!["null"]),
        other => Err(QueryError::UnsupportedType(other.to_string())),
    }
}

/// Translate a restricted regex subset into a SQL `LIKE` pattern: `.*`
/// becomes `%`, `.` becomes `_`, leading/trailing anchors are dropped, and
/// every other character is emitted literally (escaping it first if it is
/// itself a `LIKE` metacharacter), per §4.D.
#[must_use]
pub fn regex_to_like(pattern: &str) -> String {
    let stripped = pattern.strip_prefix('^').unwrap_or(pattern);
    let stripped = stripped.strip_suffix('$').unwrap_or(stripped);
    let chars: Vec<char> = stripped.chars().collect();

    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '.' && chars.get(i + 1) == Some(&'*') {
            out.push('%');
            i += 2;
            continue;
        }
        match chars[i] {
            '.' => out.push('_'),
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(chars[i]);
            }
            other => out.push(other),
        }
        i += 1;
    }
    out
}
