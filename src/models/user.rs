/// A registered account
///
/// Created at signup and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Random 12-byte identifier, hex encoded
    pub id: String,
    /// Unique login name
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

impl User {
    pub fn new(id: String, username: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            password_hash,
        }
    }

    /// Build a user with a freshly generated id
    pub fn register(username: String, password_hash: String) -> Self {
        let id = hex::encode(rand::random::<[u8; 12]>());
        Self::new(id, username, password_hash)
    }
}
