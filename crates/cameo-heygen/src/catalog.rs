use serde::{Deserialize, Serialize};

/// One selectable avatar: a display identity plus the provider ids needed
/// to render it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    pub id: String,
    pub name: String,
    pub image: String,
    pub voice_id: String,
    pub avatar_id: String,
}

/// Static avatar catalog, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct AvatarCatalog {
    avatars: Vec<Avatar>,
}

impl AvatarCatalog {
    /// The demo catalog.
    pub fn builtin() -> Self {
        let avatars = vec![
            Avatar {
                id: "gala".to_string(),
                name: "Gala".to_string(),
                image: "/avatars/gala.jpg".to_string(),
                voice_id: "35b75145af9041b298c720f23375f578".to_string(),
                avatar_id: "Gala_sitting_casualsofawithipad_front".to_string(),
            },
            Avatar {
                id: "conrad".to_string(),
                name: "Conrad".to_string(),
                image: "/avatars/conrad.jpg".to_string(),
                voice_id: "5403a745860347beb7d342e07eef33fb".to_string(),
                avatar_id: "Conrad_sitting_sofa_front".to_string(),
            },
            Avatar {
                id: "jocelyn".to_string(),
                name: "Jocelyn".to_string(),
                image: "/avatars/jocelyn.jpg".to_string(),
                voice_id: "7194df66c861492fb6cc379e99905e22".to_string(),
                avatar_id: "Jocelyn_sitting_sofa_front".to_string(),
            },
        ];
        Self { avatars }
    }

    pub fn get(&self, id: &str) -> Option<&Avatar> {
        self.avatars.iter().find(|a| a.id == id)
    }

    pub fn all(&self) -> &[Avatar] {
        &self.avatars
    }
}

impl Default for AvatarCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
