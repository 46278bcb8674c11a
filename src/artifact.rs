/// Conversational persona served behind the chat endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Artifact {
    A,
    #[default]
    B,
}

impl Artifact {
    /// Tag sent as `artifact_id`
    pub fn as_str(&self) -> &'static str {
        match self {
            Artifact::A => "a",
            Artifact::B => "b",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" => Some(Artifact::A),
            "b" => Some(Artifact::B),
            _ => None,
        }
    }

    pub fn all() -> Vec<Artifact> {
        vec![Artifact::A, Artifact::B]
    }

    /// Sender label for replies
    pub fn label(&self) -> &'static str {
        match self {
            Artifact::A => "유물 A",
            Artifact::B => "유물 B",
        }
    }
}
