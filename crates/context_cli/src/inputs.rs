//! Loading the files a context build reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chat_core::paths::load_config_file;
use chat_core::{AgentConfig, PipelineSettings, UserProfile};
use context_manager::ChatSession;

/// Agent, profile and settings files; the three rule layers live here
pub struct Configs {
    pub agent: Option<AgentConfig>,
    pub profile: Option<UserProfile>,
    pub settings: PipelineSettings,
}

impl Configs {
    pub fn load(agent: Option<&PathBuf>, profile: Option<&PathBuf>, settings: Option<&PathBuf>) -> Result<Self> {
        let agent = agent
            .map(|path| load_config_file::<AgentConfig>(path))
            .transpose()
            .context("failed to load agent config")?;
        let profile = profile
            .map(|path| load_config_file::<UserProfile>(path))
            .transpose()
            .context("failed to load user profile")?;
        let settings = match settings {
            Some(path) => PipelineSettings::load_from(path).context("failed to load pipeline settings")?,
            None => PipelineSettings::load(),
        };

        Ok(Self {
            agent,
            profile,
            settings,
        })
    }
}

/// Everything a build reads from disk
pub struct Inputs {
    pub session: ChatSession,
    pub configs: Configs,
}

impl Inputs {
    pub fn load(
        session: &Path,
        agent: Option<&PathBuf>,
        profile: Option<&PathBuf>,
        settings: Option<&PathBuf>,
    ) -> Result<Self> {
        let session = load_session(session)?;
        let configs = Configs::load(agent, profile, settings)?;
        Ok(Self { session, configs })
    }
}

/// Read a session snapshot, warning about any structural problems.
pub fn load_session(path: &Path) -> Result<ChatSession> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session {}", path.display()))?;
    let session: ChatSession = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse session {}", path.display()))?;

    for issue in session.validate() {
        tracing::warn!(session_id = %session.id, %issue, "session snapshot is inconsistent");
    }
    tracing::debug!(session_id = %session.id, nodes = session.len(), "loaded session");

    Ok(session)
}
