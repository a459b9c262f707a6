use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved keywords that unlock privileged protocols.
///
/// Declaration order is the precedence order used everywhere a single
/// keyword has to be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolKeyword {
    #[serde(rename = "kernel.space")]
    KernelSpace,
    #[serde(rename = "root.entropy")]
    RootEntropy,
    #[serde(rename = "void.manifest")]
    VoidManifest,
    #[serde(rename = "quantum.superposition")]
    QuantumSuperposition,
    #[serde(rename = "paradox.engine")]
    ParadoxEngine,
}

impl ProtocolKeyword {
    pub const ALL: [ProtocolKeyword; 5] = [
        ProtocolKeyword::KernelSpace,
        ProtocolKeyword::RootEntropy,
        ProtocolKeyword::VoidManifest,
        ProtocolKeyword::QuantumSuperposition,
        ProtocolKeyword::ParadoxEngine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKeyword::KernelSpace => "kernel.space",
            ProtocolKeyword::RootEntropy => "root.entropy",
            ProtocolKeyword::VoidManifest => "void.manifest",
            ProtocolKeyword::QuantumSuperposition => "quantum.superposition",
            ProtocolKeyword::ParadoxEngine => "paradox.engine",
        }
    }
}

impl fmt::Display for ProtocolKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan text case-insensitively for privileged keywords.
///
/// Returns matches in table order, each at most once.
pub fn scan(text: &str) -> Vec<ProtocolKeyword> {
    let lowered = text.to_lowercase();
    ProtocolKeyword::ALL
        .into_iter()
        .filter(|k| lowered.contains(k.as_str()))
        .collect()
}
