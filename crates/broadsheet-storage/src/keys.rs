//! Deterministic key generation for dithered outputs.

/// Key of the dithered output for image `id`: `{prefix}/{id}_processed.png`.
///
/// The key depends only on the id, so a re-run overwrites the previous output
/// instead of leaving orphans behind.
pub fn processed_key(prefix: &str, id: i64) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}_processed.png", id)
    } else {
        format!("{}/{}_processed.png", prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_key_is_keyed_by_id() {
        assert_eq!(
            processed_key("images/processed", 42),
            "images/processed/42_processed.png"
        );
        assert_eq!(processed_key("/src/images/", 7), "src/images/7_processed.png");
        assert_eq!(processed_key("", 3), "3_processed.png");
    }
}
