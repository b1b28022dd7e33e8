use uuid::Uuid;

/// Whoever is making the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    User(Uuid),
}

impl Actor {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<Option<Uuid>> for Actor {
    fn from(id: Option<Uuid>) -> Self {
        id.map_or(Self::Anonymous, Self::User)
    }
}
