#[derive(Clone, Copy, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Fixture {
    /// Sentences only; every highlight goes through fuzzy matching.
    #[strum(serialize = "parthenon")]
    #[value(name = "parthenon")]
    Parthenon,
    /// Same narration with offsets aligned against the document up front.
    #[strum(serialize = "parthenon-aligned")]
    #[value(name = "parthenon-aligned")]
    ParthenonAligned,
}

impl Fixture {
    pub fn transcript(&self) -> &'static str {
        include_str!("data/parthenon.json")
    }

    pub fn document(&self) -> &'static str {
        include_str!("data/parthenon.md")
    }

    pub fn aligned(&self) -> bool {
        matches!(self, Self::ParthenonAligned)
    }
}
