use super::error::SqlError;
use super::types::{FieldNameMap, SqlParam, SqlResult};

/// Build the `SET` clause of a partial update.
///
/// `{firstName: "joel", lastName: "schmole"}` with
/// `{firstName: "first_name", lastName: "last_name"}` becomes
/// `"first_name"=$1, "last_name"=$2` with params `["joel", "schmole"]`.
///
/// Fails with [`SqlError::NoData`] when there is nothing to update.
pub fn sql_for_partial_update(
    updates: &[(&str, SqlParam)],
    js_to_sql: FieldNameMap,
) -> Result<SqlResult, SqlError> {
    if updates.is_empty() {
        return Err(SqlError::NoData);
    }

    let columns: Vec<String> = updates
        .iter()
        .enumerate()
        .map(|(idx, (field, _))| format!("\"{}\"=${}", column_for(field, js_to_sql), idx + 1))
        .collect();

    Ok(SqlResult {
        query: columns.join(", "),
        params: updates.iter().map(|(_, value)| value.clone()).collect(),
    })
}

fn column_for<'a>(field: &'a str, js_to_sql: FieldNameMap<'a>) -> &'a str {
    js_to_sql
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .unwrap_or(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn works_with_good_data() {
        let updates = vec![("firstName", SqlParam::from("joel")), ("lastName", SqlParam::from("schmole"))];
        let map = [("firstName", "first_name"), ("lastName", "last_name")];

        let result = sql_for_partial_update(&updates, &map).unwrap();

        assert_eq!(result.query, r#""first_name"=$1, "last_name"=$2"#);
        assert_eq!(result.params, vec![SqlParam::from("joel"), SqlParam::from("schmole")]);
    }

    #[test]
    fn unmapped_fields_pass_through() {
        let updates = vec![("title", SqlParam::from("new")), ("isAdmin", SqlParam::from(true))];
        let map = [("isAdmin", "is_admin")];

        let result = sql_for_partial_update(&updates, &map).unwrap();

        assert_eq!(result.query, r#""title"=$1, "is_admin"=$2"#);
    }

    #[test]
    fn null_values_keep_their_slot() {
        let updates = vec![("salary", SqlParam::Int(None)), ("equity", SqlParam::Float(Some(0.25)))];

        let result = sql_for_partial_update(&updates, &[]).unwrap();

        assert_eq!(result.query, r#""salary"=$1, "equity"=$2"#);
        assert_eq!(result.params, vec![SqlParam::Int(None), SqlParam::Float(Some(0.25))]);
    }

    #[test]
    fn placeholders_follow_input_order() {
        let fields = ["a", "b", "c", "d", "e"];
        for len in 1..=fields.len() {
            let updates: Vec<(&str, SqlParam)> = fields[..len]
                .iter()
                .enumerate()
                .map(|(i, f)| (*f, SqlParam::from(i as i32)))
                .collect();

            let result = sql_for_partial_update(&updates, &[]).unwrap();
            let fragments: Vec<&str> = result.query.split(", ").collect();

            assert_eq!(fragments.len(), len);
            for (i, fragment) in fragments.iter().enumerate() {
                assert_eq!(*fragment, format!("\"{}\"=${}", fields[i], i + 1));
            }
            let expected: Vec<SqlParam> = (0..len as i32).map(SqlParam::from).collect();
            assert_eq!(result.params, expected);
        }
    }

    #[test]
    fn throws_error_with_no_data() {
        let err = sql_for_partial_update(&[], &[("firstName", "first_name")]).unwrap_err();
        assert_eq!(err, SqlError::NoData);
        assert_eq!(err.to_string(), "No data");
    }
}
