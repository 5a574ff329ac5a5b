//! Typed identifiers for the catalog entities.

crate::define_id_type!(AuthorId);
crate::define_id_type!(GenreId);
crate::define_id_type!(BookId);
crate::define_id_type!(BookInstanceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trips_through_text() {
        let id = AuthorId::generate();
        let parsed: AuthorId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        assert!("not-an-id".parse::<BookId>().is_err());
        assert!("".parse::<GenreId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = BookInstanceId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
