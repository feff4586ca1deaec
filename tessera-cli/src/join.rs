use tessera_schema::ArraySchema;

/// Describes whether `left` and `right` can be joined.
pub fn exec_join_check(left: &ArraySchema, right: &ArraySchema) -> String {
    match left.join_compatible(right) {
        Ok(()) => format!("{} and {} are join compatible", left.name(), right.name()),
        Err(mismatch) => format!(
            "{} and {} are not join compatible: {mismatch}",
            left.name(),
            right.name()
        ),
    }
}
