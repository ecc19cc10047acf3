use kernel::id::Id;

pub struct ResetTokenMarker;
pub type ResetTokenId = Id<ResetTokenMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_token_id_roundtrip() {
        let id = ResetTokenId::from_raw(3);
        assert_eq!(id.as_i32(), 3);
    }
}
