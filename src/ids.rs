use rand::Rng;

const PUBLIC_ID_LEN: usize = 10;
const PUBLIC_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a short random identifier safe to expose outside the API.
///
/// Public ids are unrelated to internal row ids so external callers cannot
/// enumerate sequential keys.
pub fn public_id() -> String {
    let mut rng = rand::thread_rng();
    (0..PUBLIC_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..PUBLIC_ID_ALPHABET.len());
            PUBLIC_ID_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_length() {
        assert_eq!(public_id().len(), PUBLIC_ID_LEN);
    }

    #[test]
    fn test_public_id_alphabet() {
        let id = public_id();
        assert!(id
            .bytes()
            .all(|b| PUBLIC_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_public_id_uniqueness() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| public_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
