/// Page state definitions for tracking a single traversal
///
/// A page moves through `Pending → Fetching → Cleaning → ExtractingLinks →
/// Recursing → Merged`. `Failed` is terminal for that page only and never
/// aborts sibling branches. `Listed` marks a page that was discovered at the
/// depth boundary but not downloaded.
use std::fmt;

/// Represents the current state of a page in one traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// Address has been claimed but its fetch has not started
    Pending,

    /// Waiting for a fetch permit or for the retrieval collaborator
    Fetching,

    /// Raw content is being cleaned
    Cleaning,

    /// Outbound links are being extracted from raw content
    ExtractingLinks,

    /// Child branches are running
    Recursing,

    // ===== Terminal States =====
    /// Page content (and any child results) merged into the result
    Merged,

    /// Discovered at the depth boundary and recorded without downloading
    Listed,

    /// Retrieval failed after all retries; the page contributes nothing
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged | Self::Listed | Self::Failed)
    }

    /// Returns true if the page is still being worked on
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the page content was downloaded and kept
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Merged)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// Link extraction and recursion are skipped at low depth budgets, so
    /// `Cleaning` and `ExtractingLinks` may go straight to `Merged`.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use PageState::*;

        matches!(
            (self, next),
            (Pending, Fetching)
                | (Pending, Listed)
                | (Fetching, Cleaning)
                | (Fetching, Failed)
                | (Cleaning, ExtractingLinks)
                | (Cleaning, Merged)
                | (ExtractingLinks, Recursing)
                | (ExtractingLinks, Merged)
                | (Recursing, Merged)
        )
    }

    /// Short lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Cleaning => "cleaning",
            Self::ExtractingLinks => "extracting_links",
            Self::Recursing => "recursing",
            Self::Merged => "merged",
            Self::Listed => "listed",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its short name
    pub fn from_name(s: &str) -> Option<Self> {
        Self::all_states().into_iter().find(|state| state.as_str() == s)
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Fetching,
            Self::Cleaning,
            Self::ExtractingLinks,
            Self::Recursing,
            Self::Merged,
            Self::Listed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
