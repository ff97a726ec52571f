//! Platform services shown on the Services tab

/// A shared platform service every agent assist deployment depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformService {
    /// Card title
    pub name: &'static str,
    /// One-line summary under the title
    pub description: &'static str,
}

/// The fixed service catalogue
pub const PLATFORM_SERVICES: [PlatformService; 5] = [
    PlatformService {
        name: "DB",
        description: "Configuration and audit database",
    },
    PlatformService {
        name: "MQ",
        description: "Message queue carrying call events between units",
    },
    PlatformService {
        name: "ASR",
        description: "Speech recognition for live calls",
    },
    PlatformService {
        name: "Summary Handler",
        description: "Post-call summary generation",
    },
    PlatformService {
        name: "Call Handler",
        description: "Call session routing to agent assist units",
    },
];
